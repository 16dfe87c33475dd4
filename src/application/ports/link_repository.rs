use async_trait::async_trait;

use crate::application::context::RequestContext;
use crate::domain::links::link::{CandidateSet, Link};

#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Opens a unit of work for writes. The caller decides whether it is
    /// committed or rolled back.
    async fn begin(&self) -> anyhow::Result<Box<dyn LinkTransaction>>;

    async fn document_outbound_links(
        &self,
        ctx: &RequestContext,
        document_id: &str,
    ) -> anyhow::Result<Vec<Link>>;

    async fn page_links(
        &self,
        ctx: &RequestContext,
        document_id: &str,
        page_id: &str,
    ) -> anyhow::Result<Vec<Link>>;

    async fn search_candidates(
        &self,
        ctx: &RequestContext,
        keywords: &str,
    ) -> anyhow::Result<CandidateSet>;
}

#[async_trait]
pub trait LinkTransaction: Send {
    /// Stamps `created` and `revised` on `link` with the current time, then
    /// inserts it.
    async fn add(&mut self, ctx: &RequestContext, link: &mut Link) -> anyhow::Result<()>;

    async fn mark_orphan_document_link(
        &mut self,
        ctx: &RequestContext,
        document_id: &str,
    ) -> anyhow::Result<u64>;

    async fn mark_orphan_page_link(
        &mut self,
        ctx: &RequestContext,
        page_id: &str,
    ) -> anyhow::Result<u64>;

    async fn mark_orphan_attachment_link(
        &mut self,
        ctx: &RequestContext,
        attachment_id: &str,
    ) -> anyhow::Result<u64>;

    async fn delete_source_page_links(
        &mut self,
        ctx: &RequestContext,
        page_id: &str,
    ) -> anyhow::Result<u64>;

    async fn delete_source_document_links(
        &mut self,
        ctx: &RequestContext,
        document_id: &str,
    ) -> anyhow::Result<u64>;

    async fn delete_link(&mut self, ctx: &RequestContext, id: &str) -> anyhow::Result<u64>;

    async fn commit(self: Box<Self>) -> anyhow::Result<()>;

    async fn rollback(self: Box<Self>) -> anyhow::Result<()>;
}
