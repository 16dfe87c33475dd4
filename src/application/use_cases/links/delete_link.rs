use crate::application::context::RequestContext;
use crate::application::ports::link_repository::LinkRepository;

pub struct DeleteLink<'a, R: LinkRepository + ?Sized> {
    pub repo: &'a R,
}

impl<'a, R: LinkRepository + ?Sized> DeleteLink<'a, R> {
    /// Returns false when no link with that id exists in the caller's org.
    pub async fn execute(&self, ctx: &RequestContext, id: &str) -> anyhow::Result<bool> {
        let mut tx = self.repo.begin().await?;
        match tx.delete_link(ctx, id).await {
            Ok(rows) => {
                tx.commit().await?;
                Ok(rows > 0)
            }
            Err(e) => {
                tx.rollback().await?;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{FakeLinkRepository, link};
    use crate::domain::links::link::LinkType;

    #[tokio::test]
    async fn deletes_only_within_org() {
        let repo = FakeLinkRepository::with_links(vec![link(
            "l1",
            "doc-a",
            "p1",
            "doc-b",
            LinkType::Document,
        )]);
        let other_org = RequestContext::new("org-2", "user-1");
        assert!(!DeleteLink { repo: &repo }.execute(&other_org, "l1").await.unwrap());
        assert_eq!(repo.links().len(), 1);

        let ctx = RequestContext::new("org-1", "user-1");
        assert!(DeleteLink { repo: &repo }.execute(&ctx, "l1").await.unwrap());
        assert!(repo.links().is_empty());
    }
}
