use tracing::debug;

use crate::application::context::RequestContext;
use crate::application::ports::link_repository::{LinkRepository, LinkTransaction};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemovalOutcome {
    pub deleted: u64,
    pub orphaned: u64,
}

async fn finish(
    tx: Box<dyn LinkTransaction>,
    result: anyhow::Result<RemovalOutcome>,
) -> anyhow::Result<RemovalOutcome> {
    match result {
        Ok(outcome) => {
            tx.commit().await?;
            Ok(outcome)
        }
        Err(e) => {
            tx.rollback().await?;
            Err(e)
        }
    }
}

/// A document is going away: its own outbound links are dropped and links
/// pointing at it become orphans.
pub struct RemoveDocumentLinks<'a, R: LinkRepository + ?Sized> {
    pub repo: &'a R,
}

impl<'a, R: LinkRepository + ?Sized> RemoveDocumentLinks<'a, R> {
    pub async fn execute(
        &self,
        ctx: &RequestContext,
        document_id: &str,
    ) -> anyhow::Result<RemovalOutcome> {
        let mut tx = self.repo.begin().await?;
        let result = async {
            let deleted = tx.delete_source_document_links(ctx, document_id).await?;
            let orphaned = tx.mark_orphan_document_link(ctx, document_id).await?;
            Ok::<_, anyhow::Error>(RemovalOutcome { deleted, orphaned })
        }
        .await;
        debug!(document_id, ?result, "remove_document_links");
        finish(tx, result).await
    }
}

pub struct RemovePageLinks<'a, R: LinkRepository + ?Sized> {
    pub repo: &'a R,
}

impl<'a, R: LinkRepository + ?Sized> RemovePageLinks<'a, R> {
    pub async fn execute(&self, ctx: &RequestContext, page_id: &str) -> anyhow::Result<RemovalOutcome> {
        let mut tx = self.repo.begin().await?;
        let result = async {
            let deleted = tx.delete_source_page_links(ctx, page_id).await?;
            let orphaned = tx.mark_orphan_page_link(ctx, page_id).await?;
            Ok::<_, anyhow::Error>(RemovalOutcome { deleted, orphaned })
        }
        .await;
        debug!(page_id, ?result, "remove_page_links");
        finish(tx, result).await
    }
}

pub struct OrphanAttachmentLinks<'a, R: LinkRepository + ?Sized> {
    pub repo: &'a R,
}

impl<'a, R: LinkRepository + ?Sized> OrphanAttachmentLinks<'a, R> {
    pub async fn execute(&self, ctx: &RequestContext, attachment_id: &str) -> anyhow::Result<u64> {
        let mut tx = self.repo.begin().await?;
        let result = tx
            .mark_orphan_attachment_link(ctx, attachment_id)
            .await
            .map(|orphaned| RemovalOutcome {
                deleted: 0,
                orphaned,
            });
        finish(tx, result).await.map(|o| o.orphaned)
    }
}
