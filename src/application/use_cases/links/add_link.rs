use uuid::Uuid;

use crate::application::context::RequestContext;
use crate::application::ports::link_repository::LinkRepository;
use crate::domain::links::link::Link;

pub struct AddLink<'a, R: LinkRepository + ?Sized> {
    pub repo: &'a R,
}

impl<'a, R: LinkRepository + ?Sized> AddLink<'a, R> {
    pub async fn execute(&self, ctx: &RequestContext, mut link: Link) -> anyhow::Result<Link> {
        if link.ref_id.trim().is_empty() {
            link.ref_id = Uuid::new_v4().simple().to_string();
        }
        link.org_id = ctx.org_id.clone();
        link.user_id = ctx.user_id.clone();
        link.orphan = false;

        let mut tx = self.repo.begin().await?;
        if let Err(e) = tx.add(ctx, &mut link).await {
            tx.rollback().await?;
            return Err(e);
        }
        tx.commit().await?;
        Ok(link)
    }
}
