use crate::application::context::RequestContext;
use crate::application::ports::link_repository::LinkRepository;
use crate::domain::links::link::CandidateSet;

pub struct SearchCandidates<'a, R: LinkRepository + ?Sized> {
    pub repo: &'a R,
}

impl<'a, R: LinkRepository + ?Sized> SearchCandidates<'a, R> {
    pub async fn execute(&self, ctx: &RequestContext, keywords: &str) -> anyhow::Result<CandidateSet> {
        self.repo.search_candidates(ctx, keywords.trim()).await
    }
}
