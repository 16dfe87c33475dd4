//! In-memory port implementations shared by unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::application::context::RequestContext;
use crate::application::ports::directory_port::{
    DirectoryConnector, DirectoryError, DirectorySession,
};
use crate::application::ports::link_repository::{LinkRepository, LinkTransaction};
use crate::domain::directory::entry::DirectoryEntry;
use crate::domain::directory::schema::{AttributeMap, DEFAULT_USER_FILTER, DirectorySchema};
use crate::domain::links::link::{Candidate, CandidateSet, Link, LinkType};

pub fn planet_express_schema() -> DirectorySchema {
    DirectorySchema {
        base_dn: "dc=planetexpress,dc=com".into(),
        user_filter: String::new(),
        group_filter: String::new(),
        attributes: AttributeMap::default(),
    }
}

fn person(cn: &str, uid: &str, given: &str, sn: &str) -> DirectoryEntry {
    DirectoryEntry::new(format!("cn={},ou=people,dc=planetexpress,dc=com", cn))
        .with_attr("objectClass", &["inetOrgPerson"])
        .with_attr("cn", &[cn])
        .with_attr("uid", &[uid])
        .with_attr("givenName", &[given])
        .with_attr("sn", &[sn])
        .with_attr("mail", &[format!("{}@planetexpress.com", uid).as_str()])
}

#[derive(Debug, Default, Clone)]
pub struct FakeDirectory {
    pub people: Vec<DirectoryEntry>,
    pub groups: Vec<DirectoryEntry>,
    pub passwords: HashMap<String, String>,
    pub bound_as: Option<String>,
    pub bind_attempts: usize,
    pub searches: Vec<String>,
}

impl FakeDirectory {
    pub fn planet_express() -> Self {
        let people = vec![
            person("Hubert J. Farnsworth", "professor", "Hubert", "Farnsworth"),
            person("Philip J. Fry", "fry", "Philip", "Fry"),
            person("Turanga Leela", "leela", "Leela", "Turanga"),
            person("Twin One", "twin", "Twin", "One"),
            person("Twin Two", "twin", "Twin", "Two"),
        ];
        let crew = DirectoryEntry::new("cn=ship_crew,ou=people,dc=planetexpress,dc=com")
            .with_attr("cn", &["ship_crew"])
            .with_attr(
                "member",
                &[
                    "cn=Philip J. Fry,ou=people,dc=planetexpress,dc=com",
                    "cn=Turanga Leela,ou=people,dc=planetexpress,dc=com",
                    "cn=Ghost,ou=people,dc=planetexpress,dc=com",
                    "cn=Philip J. Fry,ou=people,dc=planetexpress,dc=com",
                ],
            );
        let mut passwords = HashMap::new();
        passwords.insert(
            "cn=Hubert J. Farnsworth,ou=people,dc=planetexpress,dc=com".to_string(),
            "professor".to_string(),
        );
        passwords.insert(
            "cn=Philip J. Fry,ou=people,dc=planetexpress,dc=com".to_string(),
            "fry".to_string(),
        );
        Self {
            people,
            groups: vec![crew],
            passwords,
            ..Default::default()
        }
    }

    fn matches(&self, filter: &str) -> Vec<DirectoryEntry> {
        if filter == DEFAULT_USER_FILTER {
            return self.people.clone();
        }
        if let Some(rest) = filter.strip_prefix("(&(objectClass=group)") {
            let Some((attr, value)) = simple_equality(rest.trim_end_matches(')')) else {
                return vec![];
            };
            return self
                .groups
                .iter()
                .filter(|g| g.values(attr).iter().any(|v| v == value))
                .cloned()
                .collect();
        }
        match simple_equality(filter) {
            Some((attr, value)) => self
                .people
                .iter()
                .filter(|p| p.values(attr).iter().any(|v| v == value))
                .cloned()
                .collect(),
            None => vec![],
        }
    }
}

fn simple_equality(filter: &str) -> Option<(&str, &str)> {
    let inner = filter.strip_prefix('(')?;
    let inner = inner.strip_suffix(')').unwrap_or(inner);
    inner.split_once('=')
}

#[async_trait]
impl DirectorySession for FakeDirectory {
    async fn bind(&mut self, dn: &str, password: &str) -> Result<(), DirectoryError> {
        self.bind_attempts += 1;
        match self.passwords.get(dn) {
            Some(expected) if expected == password => {
                self.bound_as = Some(dn.to_string());
                Ok(())
            }
            _ => Err(DirectoryError::Bind {
                dn: dn.to_string(),
                source: anyhow::anyhow!("invalidCredentials"),
            }),
        }
    }

    async fn search(
        &mut self,
        _base_dn: &str,
        filter: &str,
        _attrs: &[&str],
    ) -> Result<Vec<DirectoryEntry>, DirectoryError> {
        self.searches.push(filter.to_string());
        Ok(self.matches(filter))
    }

    async fn close(self: Box<Self>) {}
}

pub struct FakeConnector {
    pub directory: FakeDirectory,
    pub schema: DirectorySchema,
}

#[async_trait]
impl DirectoryConnector for FakeConnector {
    async fn open(&self) -> Result<Box<dyn DirectorySession>, DirectoryError> {
        Ok(Box::new(self.directory.clone()))
    }

    fn schema(&self) -> &DirectorySchema {
        &self.schema
    }
}

#[derive(Debug, Default)]
pub struct LinkState {
    pub links: Vec<Link>,
    pub commits: usize,
}

/// Writes are staged per transaction and only land on commit.
#[derive(Clone, Default)]
pub struct FakeLinkRepository {
    pub state: Arc<Mutex<LinkState>>,
    pub candidates: CandidateSet,
}

impl FakeLinkRepository {
    pub fn with_links(links: Vec<Link>) -> Self {
        let repo = Self::default();
        repo.state.lock().unwrap().links = links;
        repo
    }

    pub fn links(&self) -> Vec<Link> {
        self.state.lock().unwrap().links.clone()
    }
}

pub fn link(ref_id: &str, source_doc: &str, source_page: &str, target: &str, lt: LinkType) -> Link {
    let now = chrono::Utc::now();
    let (target_document_id, target_id) = match lt {
        LinkType::Document => (target.to_string(), target.to_string()),
        _ => ("doc-of-".to_string() + target, target.to_string()),
    };
    Link {
        ref_id: ref_id.into(),
        org_id: "org-1".into(),
        folder_id: "folder-1".into(),
        user_id: "user-1".into(),
        source_document_id: source_doc.into(),
        source_page_id: source_page.into(),
        target_document_id,
        target_id,
        link_type: lt,
        orphan: false,
        created: now,
        revised: now,
    }
}

pub fn candidate(title: &str, lt: LinkType) -> Candidate {
    Candidate {
        ref_id: format!("cand-{}", title),
        folder_id: "folder-1".into(),
        document_id: "doc-1".into(),
        target_id: "target-1".into(),
        link_type: lt,
        title: title.into(),
        context: String::new(),
    }
}

#[async_trait]
impl LinkRepository for FakeLinkRepository {
    async fn begin(&self) -> anyhow::Result<Box<dyn LinkTransaction>> {
        let staged = self.state.lock().unwrap().links.clone();
        Ok(Box::new(FakeLinkTransaction {
            state: self.state.clone(),
            staged,
        }))
    }

    async fn document_outbound_links(
        &self,
        ctx: &RequestContext,
        document_id: &str,
    ) -> anyhow::Result<Vec<Link>> {
        Ok(self
            .links()
            .into_iter()
            .filter(|l| l.org_id == ctx.org_id && l.source_document_id == document_id)
            .collect())
    }

    async fn page_links(
        &self,
        ctx: &RequestContext,
        document_id: &str,
        page_id: &str,
    ) -> anyhow::Result<Vec<Link>> {
        Ok(self
            .document_outbound_links(ctx, document_id)
            .await?
            .into_iter()
            .filter(|l| l.source_page_id == page_id)
            .collect())
    }

    async fn search_candidates(
        &self,
        _ctx: &RequestContext,
        keywords: &str,
    ) -> anyhow::Result<CandidateSet> {
        let pick = |items: &[Candidate]| {
            items
                .iter()
                .filter(|c| c.title.contains(keywords))
                .cloned()
                .collect::<Vec<_>>()
        };
        Ok(CandidateSet {
            documents: pick(&self.candidates.documents),
            pages: pick(&self.candidates.pages),
            attachments: pick(&self.candidates.attachments),
        })
    }
}

pub struct FakeLinkTransaction {
    state: Arc<Mutex<LinkState>>,
    staged: Vec<Link>,
}

impl FakeLinkTransaction {
    fn mark(&mut self, ctx: &RequestContext, pred: impl Fn(&Link) -> bool) -> u64 {
        let now = chrono::Utc::now();
        let mut n = 0;
        for l in self.staged.iter_mut() {
            if l.org_id == ctx.org_id && pred(l) {
                l.orphan = true;
                l.revised = now;
                n += 1;
            }
        }
        n
    }

    fn remove(&mut self, ctx: &RequestContext, pred: impl Fn(&Link) -> bool) -> u64 {
        let before = self.staged.len();
        self.staged.retain(|l| !(l.org_id == ctx.org_id && pred(l)));
        (before - self.staged.len()) as u64
    }
}

#[async_trait]
impl LinkTransaction for FakeLinkTransaction {
    async fn add(&mut self, _ctx: &RequestContext, link: &mut Link) -> anyhow::Result<()> {
        let now = chrono::Utc::now();
        link.created = now;
        link.revised = now;
        self.staged.push(link.clone());
        Ok(())
    }

    async fn mark_orphan_document_link(
        &mut self,
        ctx: &RequestContext,
        document_id: &str,
    ) -> anyhow::Result<u64> {
        Ok(self.mark(ctx, |l| {
            l.link_type == LinkType::Document && l.target_document_id == document_id
        }))
    }

    async fn mark_orphan_page_link(
        &mut self,
        ctx: &RequestContext,
        page_id: &str,
    ) -> anyhow::Result<u64> {
        Ok(self.mark(ctx, |l| {
            l.link_type == LinkType::Section && l.target_id == page_id
        }))
    }

    async fn mark_orphan_attachment_link(
        &mut self,
        ctx: &RequestContext,
        attachment_id: &str,
    ) -> anyhow::Result<u64> {
        Ok(self.mark(ctx, |l| {
            l.link_type == LinkType::File && l.target_id == attachment_id
        }))
    }

    async fn delete_source_page_links(
        &mut self,
        ctx: &RequestContext,
        page_id: &str,
    ) -> anyhow::Result<u64> {
        Ok(self.remove(ctx, |l| l.source_page_id == page_id))
    }

    async fn delete_source_document_links(
        &mut self,
        ctx: &RequestContext,
        document_id: &str,
    ) -> anyhow::Result<u64> {
        Ok(self.remove(ctx, |l| l.source_document_id == document_id))
    }

    async fn delete_link(&mut self, ctx: &RequestContext, id: &str) -> anyhow::Result<u64> {
        Ok(self.remove(ctx, |l| l.ref_id == id))
    }

    async fn commit(self: Box<Self>) -> anyhow::Result<()> {
        let this = *self;
        let mut state = this.state.lock().unwrap();
        state.links = this.staged;
        state.commits += 1;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> anyhow::Result<()> {
        Ok(())
    }
}
