use crate::application::context::RequestContext;
use crate::application::ports::link_repository::LinkRepository;
use crate::domain::links::link::Link;

pub struct GetDocumentLinks<'a, R: LinkRepository + ?Sized> {
    pub repo: &'a R,
}

impl<'a, R: LinkRepository + ?Sized> GetDocumentLinks<'a, R> {
    pub async fn execute(&self, ctx: &RequestContext, document_id: &str) -> anyhow::Result<Vec<Link>> {
        self.repo.document_outbound_links(ctx, document_id).await
    }
}

pub struct GetPageLinks<'a, R: LinkRepository + ?Sized> {
    pub repo: &'a R,
}

impl<'a, R: LinkRepository + ?Sized> GetPageLinks<'a, R> {
    pub async fn execute(
        &self,
        ctx: &RequestContext,
        document_id: &str,
        page_id: &str,
    ) -> anyhow::Result<Vec<Link>> {
        self.repo.page_links(ctx, document_id, page_id).await
    }
}
