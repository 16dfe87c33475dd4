/// Where users and groups live in the directory and which attributes carry
/// the fields the application reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectorySchema {
    pub base_dn: String,
    pub user_filter: String,
    pub group_filter: String,
    pub attributes: AttributeMap,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeMap {
    pub user_rdn: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub display_name: String,
    pub group_member: String,
}

impl Default for AttributeMap {
    fn default() -> Self {
        Self {
            user_rdn: "uid".into(),
            first_name: "givenName".into(),
            last_name: "sn".into(),
            email: "mail".into(),
            display_name: "cn".into(),
            group_member: "member".into(),
        }
    }
}

pub const DEFAULT_USER_FILTER: &str =
    "(|(objectCategory=person)(objectClass=person)(objectClass=user)(objectClass=inetOrgPerson))";

impl DirectorySchema {
    pub fn effective_user_filter(&self) -> &str {
        let f = self.user_filter.trim();
        if f.is_empty() { DEFAULT_USER_FILTER } else { f }
    }

    pub fn user_attributes(&self) -> Vec<&str> {
        let a = &self.attributes;
        vec![
            "dn",
            a.display_name.as_str(),
            a.first_name.as_str(),
            a.last_name.as_str(),
            a.email.as_str(),
            a.user_rdn.as_str(),
        ]
    }

    pub fn group_attributes(&self) -> Vec<&str> {
        vec![
            self.attributes.display_name.as_str(),
            self.attributes.group_member.as_str(),
        ]
    }
}
