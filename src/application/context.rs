/// Identity of the caller, passed explicitly into every store operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub org_id: String,
    pub user_id: String,
}

impl RequestContext {
    pub fn new(org_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            org_id: org_id.into(),
            user_id: user_id.into(),
        }
    }
}
