use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkType {
    Document,
    Section,
    File,
}

impl LinkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkType::Document => "document",
            LinkType::Section => "section",
            LinkType::File => "file",
        }
    }

    // Pages are typed by their own `pagetype` column; tabs and any other
    // page flavour link like sections do.
    pub fn from_page_type(page_type: &str) -> Self {
        page_type.parse().unwrap_or(LinkType::Section)
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown link type: {0}")]
pub struct UnknownLinkType(pub String);

impl FromStr for LinkType {
    type Err = UnknownLinkType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "document" => Ok(LinkType::Document),
            "section" => Ok(LinkType::Section),
            "file" => Ok(LinkType::File),
            other => Err(UnknownLinkType(other.to_string())),
        }
    }
}

/// A reference from a source document (and optionally one of its pages) to
/// another document, page or attachment.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub ref_id: String,
    pub org_id: String,
    pub folder_id: String,
    pub user_id: String,
    pub source_document_id: String,
    pub source_page_id: String,
    pub target_document_id: String,
    pub target_id: String,
    pub link_type: LinkType,
    /// Set once the target is deleted. Orphaned rows stay in place.
    pub orphan: bool,
    pub created: chrono::DateTime<chrono::Utc>,
    pub revised: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub ref_id: String,
    pub folder_id: String,
    pub document_id: String,
    pub target_id: String,
    pub link_type: LinkType,
    pub title: String,
    pub context: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateSet {
    pub documents: Vec<Candidate>,
    pub pages: Vec<Candidate>,
    pub attachments: Vec<Candidate>,
}

impl CandidateSet {
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty() && self.pages.is_empty() && self.attachments.is_empty()
    }
}
