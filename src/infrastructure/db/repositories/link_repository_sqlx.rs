use anyhow::Context;
use async_trait::async_trait;
use chrono::SubsecRound;
use once_cell::sync::Lazy;
use sqlx::Row;
use sqlx::postgres::{PgRow, Postgres};
use uuid::Uuid;

use crate::application::context::RequestContext;
use crate::application::ports::link_repository::{LinkRepository, LinkTransaction};
use crate::domain::links::link::{Candidate, CandidateSet, Link, LinkType};
use crate::infrastructure::db::PgPool;

const LINK_COLUMNS: &str = "l.refid, l.orgid, l.folderid, l.userid, l.sourcedocumentid, l.sourcepageid, l.targetdocumentid, l.targetid, l.linktype, l.orphan, l.created, l.revised";

// Folders the user may see: private folders they own, folders open to every
// user, and restricted folders with an explicit grant. $1 = org, $2 = user.
const VISIBLE_FOLDERS: &str = r#"(SELECT refid FROM label WHERE orgid=$1 AND type=2 AND userid=$2
    UNION ALL SELECT refid FROM label a WHERE orgid=$1 AND type=1 AND refid IN (SELECT labelid FROM labelrole WHERE orgid=$1 AND userid='' AND (canedit=TRUE OR canview=TRUE))
    UNION ALL SELECT refid FROM label a WHERE orgid=$1 AND type=3 AND refid IN (SELECT labelid FROM labelrole WHERE orgid=$1 AND userid=$2 AND (canedit=TRUE OR canview=TRUE)))"#;

static DOCUMENT_CANDIDATES_SQL: Lazy<String> = Lazy::new(|| {
    format!(
        r#"SELECT refid AS documentid, labelid AS folderid, title FROM document
           WHERE orgid=$1 AND title LIKE $3 AND labelid IN {VISIBLE_FOLDERS}
           ORDER BY title"#
    )
});

static PAGE_CANDIDATES_SQL: Lazy<String> = Lazy::new(|| {
    format!(
        r#"SELECT p.refid AS targetid, p.documentid AS documentid, p.title AS title, p.pagetype AS linktype, d.title AS context, d.labelid AS folderid
           FROM page p LEFT JOIN document d ON d.refid=p.documentid
           WHERE p.orgid=$1 AND p.title LIKE $3 AND d.labelid IN {VISIBLE_FOLDERS}
           ORDER BY p.title"#
    )
});

static ATTACHMENT_CANDIDATES_SQL: Lazy<String> = Lazy::new(|| {
    format!(
        r#"SELECT a.refid AS targetid, a.documentid AS documentid, a.filename AS title, a.extension AS context, d.labelid AS folderid
           FROM attachment a LEFT JOIN document d ON d.refid=a.documentid
           WHERE a.orgid=$1 AND a.filename LIKE $3 AND d.labelid IN {VISIBLE_FOLDERS}
           ORDER BY a.filename"#
    )
});

/// Keywords are bound as a parameter; LIKE wildcards typed by the user keep
/// their meaning.
fn like_pattern(keywords: &str) -> String {
    format!("%{}%", keywords)
}

fn new_candidate_id() -> String {
    Uuid::new_v4().simple().to_string()
}

fn map_link(r: &PgRow) -> anyhow::Result<Link> {
    let link_type: String = r.get("linktype");
    Ok(Link {
        ref_id: r.get("refid"),
        org_id: r.get("orgid"),
        folder_id: r.get("folderid"),
        user_id: r.get("userid"),
        source_document_id: r.get("sourcedocumentid"),
        source_page_id: r.get("sourcepageid"),
        target_document_id: r.get("targetdocumentid"),
        target_id: r.get("targetid"),
        link_type: link_type.parse()?,
        orphan: r.get("orphan"),
        created: r.get("created"),
        revised: r.get("revised"),
    })
}

pub struct SqlxLinkRepository {
    pub pool: PgPool,
}

impl SqlxLinkRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LinkRepository for SqlxLinkRepository {
    async fn begin(&self) -> anyhow::Result<Box<dyn LinkTransaction>> {
        let tx = self.pool.begin().await.context("begin link transaction")?;
        Ok(Box::new(SqlxLinkTransaction::new(tx)))
    }

    async fn document_outbound_links(
        &self,
        ctx: &RequestContext,
        document_id: &str,
    ) -> anyhow::Result<Vec<Link>> {
        let rows = sqlx::query(&format!(
            "SELECT {LINK_COLUMNS} FROM link l WHERE l.orgid = $1 AND l.sourcedocumentid = $2"
        ))
        .bind(&ctx.org_id)
        .bind(document_id)
        .fetch_all(&self.pool)
        .await
        .context("select document outbound links")?;
        rows.iter().map(map_link).collect()
    }

    async fn page_links(
        &self,
        ctx: &RequestContext,
        document_id: &str,
        page_id: &str,
    ) -> anyhow::Result<Vec<Link>> {
        let rows = sqlx::query(&format!(
            "SELECT {LINK_COLUMNS} FROM link l WHERE l.orgid = $1 AND l.sourcedocumentid = $2 AND l.sourcepageid = $3"
        ))
        .bind(&ctx.org_id)
        .bind(document_id)
        .bind(page_id)
        .fetch_all(&self.pool)
        .await
        .context("select page links")?;
        rows.iter().map(map_link).collect()
    }

    async fn search_candidates(
        &self,
        ctx: &RequestContext,
        keywords: &str,
    ) -> anyhow::Result<CandidateSet> {
        let pattern = like_pattern(keywords);

        let rows = sqlx::query(DOCUMENT_CANDIDATES_SQL.as_str())
            .bind(&ctx.org_id)
            .bind(&ctx.user_id)
            .bind(&pattern)
            .fetch_all(&self.pool)
            .await
            .context("execute search links 1")?;
        let documents = rows
            .into_iter()
            .map(|r| {
                let document_id: String = r.get("documentid");
                Candidate {
                    ref_id: new_candidate_id(),
                    folder_id: r.get("folderid"),
                    target_id: document_id.clone(),
                    document_id,
                    link_type: LinkType::Document,
                    title: r.get("title"),
                    context: String::new(),
                }
            })
            .collect();

        let rows = sqlx::query(PAGE_CANDIDATES_SQL.as_str())
            .bind(&ctx.org_id)
            .bind(&ctx.user_id)
            .bind(&pattern)
            .fetch_all(&self.pool)
            .await
            .context("execute search links 2")?;
        let pages = rows
            .into_iter()
            .map(|r| Candidate {
                ref_id: new_candidate_id(),
                folder_id: r.get("folderid"),
                document_id: r.get("documentid"),
                target_id: r.get("targetid"),
                link_type: LinkType::from_page_type(&r.get::<String, _>("linktype")),
                title: r.get("title"),
                context: r.get("context"),
            })
            .collect();

        let rows = sqlx::query(ATTACHMENT_CANDIDATES_SQL.as_str())
            .bind(&ctx.org_id)
            .bind(&ctx.user_id)
            .bind(&pattern)
            .fetch_all(&self.pool)
            .await
            .context("execute search links 3")?;
        let attachments = rows
            .into_iter()
            .map(|r| Candidate {
                ref_id: new_candidate_id(),
                folder_id: r.get("folderid"),
                document_id: r.get("documentid"),
                target_id: r.get("targetid"),
                link_type: LinkType::File,
                title: r.get("title"),
                context: r.get("context"),
            })
            .collect();

        Ok(CandidateSet {
            documents,
            pages,
            attachments,
        })
    }
}

/// Write side of the link store, running on a transaction owned by the
/// caller. Nothing here commits implicitly.
pub struct SqlxLinkTransaction {
    tx: sqlx::Transaction<'static, Postgres>,
}

impl SqlxLinkTransaction {
    pub fn new(tx: sqlx::Transaction<'static, Postgres>) -> Self {
        Self { tx }
    }

    async fn mark_orphan(
        &mut self,
        ctx: &RequestContext,
        link_type: LinkType,
        target_column: &str,
        target: &str,
    ) -> anyhow::Result<u64> {
        let revised = chrono::Utc::now().trunc_subsecs(6);
        let res = sqlx::query(&format!(
            "UPDATE link SET orphan = TRUE, revised = $1 WHERE linktype = $2 AND orgid = $3 AND {target_column} = $4"
        ))
        .bind(revised)
        .bind(link_type.as_str())
        .bind(&ctx.org_id)
        .bind(target)
        .execute(&mut *self.tx)
        .await
        .with_context(|| format!("execute mark orphan {} link", link_type))?;
        Ok(res.rows_affected())
    }
}

#[async_trait]
impl LinkTransaction for SqlxLinkTransaction {
    async fn add(&mut self, ctx: &RequestContext, link: &mut Link) -> anyhow::Result<()> {
        // Postgres keeps microseconds; truncate so the caller's copy matches the row.
        let now = chrono::Utc::now().trunc_subsecs(6);
        link.created = now;
        link.revised = now;

        sqlx::query(
            r#"INSERT INTO link (refid, orgid, folderid, userid, sourcedocumentid, sourcepageid,
                                 targetdocumentid, targetid, linktype, orphan, created, revised)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)"#,
        )
        .bind(&link.ref_id)
        .bind(&ctx.org_id)
        .bind(&link.folder_id)
        .bind(&link.user_id)
        .bind(&link.source_document_id)
        .bind(&link.source_page_id)
        .bind(&link.target_document_id)
        .bind(&link.target_id)
        .bind(link.link_type.as_str())
        .bind(link.orphan)
        .bind(link.created)
        .bind(link.revised)
        .execute(&mut *self.tx)
        .await
        .context("execute link insert")?;
        Ok(())
    }

    async fn mark_orphan_document_link(
        &mut self,
        ctx: &RequestContext,
        document_id: &str,
    ) -> anyhow::Result<u64> {
        self.mark_orphan(ctx, LinkType::Document, "targetdocumentid", document_id)
            .await
    }

    async fn mark_orphan_page_link(
        &mut self,
        ctx: &RequestContext,
        page_id: &str,
    ) -> anyhow::Result<u64> {
        self.mark_orphan(ctx, LinkType::Section, "targetid", page_id)
            .await
    }

    async fn mark_orphan_attachment_link(
        &mut self,
        ctx: &RequestContext,
        attachment_id: &str,
    ) -> anyhow::Result<u64> {
        self.mark_orphan(ctx, LinkType::File, "targetid", attachment_id)
            .await
    }

    async fn delete_source_page_links(
        &mut self,
        ctx: &RequestContext,
        page_id: &str,
    ) -> anyhow::Result<u64> {
        let res = sqlx::query("DELETE FROM link WHERE orgid = $1 AND sourcepageid = $2")
            .bind(&ctx.org_id)
            .bind(page_id)
            .execute(&mut *self.tx)
            .await
            .context("delete source page links")?;
        Ok(res.rows_affected())
    }

    async fn delete_source_document_links(
        &mut self,
        ctx: &RequestContext,
        document_id: &str,
    ) -> anyhow::Result<u64> {
        let res = sqlx::query("DELETE FROM link WHERE orgid = $1 AND sourcedocumentid = $2")
            .bind(&ctx.org_id)
            .bind(document_id)
            .execute(&mut *self.tx)
            .await
            .context("delete source document links")?;
        Ok(res.rows_affected())
    }

    async fn delete_link(&mut self, ctx: &RequestContext, id: &str) -> anyhow::Result<u64> {
        let res = sqlx::query("DELETE FROM link WHERE orgid = $1 AND refid = $2")
            .bind(&ctx.org_id)
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .context("delete link")?;
        Ok(res.rows_affected())
    }

    async fn commit(self: Box<Self>) -> anyhow::Result<()> {
        self.tx.commit().await.context("commit link transaction")?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> anyhow::Result<()> {
        self.tx.rollback().await.context("rollback link transaction")?;
        Ok(())
    }
}
