use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
};
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

use crate::application::use_cases::links::add_link::AddLink;
use crate::application::use_cases::links::delete_link::DeleteLink;
use crate::application::use_cases::links::get_links::{GetDocumentLinks, GetPageLinks};
use crate::application::use_cases::links::remove_links::{
    OrphanAttachmentLinks, RemovalOutcome, RemoveDocumentLinks, RemovePageLinks,
};
use crate::application::use_cases::links::search_candidates::SearchCandidates;
use crate::bootstrap::app_context::AppContext;
use crate::domain::links::link::{Candidate, CandidateSet, Link, LinkType};
use crate::presentation::http::auth::{self, Bearer};

#[derive(Debug, Serialize, ToSchema)]
pub struct LinkItem {
    pub id: String,
    pub folder_id: String,
    pub user_id: String,
    pub source_document_id: String,
    pub source_page_id: String,
    pub target_document_id: String,
    pub target_id: String,
    pub link_type: String,
    pub orphan: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<Link> for LinkItem {
    fn from(l: Link) -> Self {
        LinkItem {
            id: l.ref_id,
            folder_id: l.folder_id,
            user_id: l.user_id,
            source_document_id: l.source_document_id,
            source_page_id: l.source_page_id,
            target_document_id: l.target_document_id,
            target_id: l.target_id,
            link_type: l.link_type.to_string(),
            orphan: l.orphan,
            created_at: l.created,
            updated_at: l.revised,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LinkListResponse {
    pub items: Vec<LinkItem>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateLinkRequest {
    pub folder_id: String,
    #[serde(default)]
    pub source_page_id: String,
    pub target_document_id: String,
    #[serde(default)]
    pub target_id: String,
    /// `document`, `section` or `file`
    pub link_type: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CandidateItem {
    pub id: String,
    pub folder_id: String,
    pub document_id: String,
    pub target_id: String,
    pub link_type: String,
    pub title: String,
    pub context: String,
}

impl From<Candidate> for CandidateItem {
    fn from(c: Candidate) -> Self {
        CandidateItem {
            id: c.ref_id,
            folder_id: c.folder_id,
            document_id: c.document_id,
            target_id: c.target_id,
            link_type: c.link_type.to_string(),
            title: c.title,
            context: c.context,
        }
    }
}

/// Always carries all three lists; an empty match is `[]`, never `null`.
#[derive(Debug, Serialize, ToSchema)]
pub struct CandidateSetResponse {
    pub documents: Vec<CandidateItem>,
    pub pages: Vec<CandidateItem>,
    pub attachments: Vec<CandidateItem>,
}

impl From<CandidateSet> for CandidateSetResponse {
    fn from(s: CandidateSet) -> Self {
        let conv = |v: Vec<Candidate>| v.into_iter().map(Into::into).collect();
        CandidateSetResponse {
            documents: conv(s.documents),
            pages: conv(s.pages),
            attachments: conv(s.attachments),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RemovalResponse {
    pub deleted: u64,
    pub orphaned: u64,
}

impl From<RemovalOutcome> for RemovalResponse {
    fn from(o: RemovalOutcome) -> Self {
        RemovalResponse {
            deleted: o.deleted,
            orphaned: o.orphaned,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CandidateQuery {
    pub keywords: Option<String>,
}

fn internal(stage: &'static str) -> impl Fn(anyhow::Error) -> StatusCode {
    move |e| {
        error!(error = ?e, stage, "link_request_failed");
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

#[utoipa::path(get, path = "/api/links/candidates", tag = "Links",
    params(("keywords" = Option<String>, Query, description = "Substring of a title or file name")),
    responses((status = 200, body = CandidateSetResponse)))]
pub async fn search_candidates(
    State(ctx): State<AppContext>,
    bearer: Bearer,
    q: Option<Query<CandidateQuery>>,
) -> Result<Json<CandidateSetResponse>, StatusCode> {
    let rc = auth::request_context(&ctx.cfg, bearer)?;
    let keywords = q.and_then(|Query(v)| v.keywords).unwrap_or_default();
    let repo = ctx.link_repo();
    let uc = SearchCandidates {
        repo: repo.as_ref(),
    };
    let set = uc
        .execute(&rc, &keywords)
        .await
        .map_err(internal("search_candidates"))?;
    Ok(Json(set.into()))
}

#[utoipa::path(get, path = "/api/documents/{id}/links", tag = "Links",
    params(("id" = String, Path, description = "Source document ID")),
    responses((status = 200, body = LinkListResponse)))]
pub async fn list_document_links(
    State(ctx): State<AppContext>,
    bearer: Bearer,
    Path(id): Path<String>,
) -> Result<Json<LinkListResponse>, StatusCode> {
    let rc = auth::request_context(&ctx.cfg, bearer)?;
    let repo = ctx.link_repo();
    let uc = GetDocumentLinks {
        repo: repo.as_ref(),
    };
    let links = uc
        .execute(&rc, &id)
        .await
        .map_err(internal("document_links"))?;
    Ok(Json(LinkListResponse {
        items: links.into_iter().map(Into::into).collect(),
    }))
}

#[utoipa::path(post, path = "/api/documents/{id}/links", tag = "Links",
    params(("id" = String, Path, description = "Source document ID")),
    request_body = CreateLinkRequest,
    responses((status = 200, body = LinkItem), (status = 400, description = "Unknown link type")))]
pub async fn create_link(
    State(ctx): State<AppContext>,
    bearer: Bearer,
    Path(id): Path<String>,
    Json(req): Json<CreateLinkRequest>,
) -> Result<Json<LinkItem>, StatusCode> {
    let rc = auth::request_context(&ctx.cfg, bearer)?;
    let link_type: LinkType = req
        .link_type
        .parse()
        .map_err(|_| StatusCode::BAD_REQUEST)?;
    // Document links point at the document itself.
    let target_id = if link_type == LinkType::Document && req.target_id.is_empty() {
        req.target_document_id.clone()
    } else {
        req.target_id
    };
    if req.target_document_id.trim().is_empty() || target_id.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    let now = chrono::Utc::now();
    let link = Link {
        ref_id: String::new(),
        org_id: rc.org_id.clone(),
        folder_id: req.folder_id,
        user_id: rc.user_id.clone(),
        source_document_id: id,
        source_page_id: req.source_page_id,
        target_document_id: req.target_document_id,
        target_id,
        link_type,
        orphan: false,
        created: now,
        revised: now,
    };
    let repo = ctx.link_repo();
    let uc = AddLink {
        repo: repo.as_ref(),
    };
    let saved = uc.execute(&rc, link).await.map_err(internal("add_link"))?;
    Ok(Json(saved.into()))
}

#[utoipa::path(delete, path = "/api/documents/{id}/links", tag = "Links",
    params(("id" = String, Path, description = "Removed document ID")),
    responses((status = 200, body = RemovalResponse)))]
pub async fn remove_document_links(
    State(ctx): State<AppContext>,
    bearer: Bearer,
    Path(id): Path<String>,
) -> Result<Json<RemovalResponse>, StatusCode> {
    let rc = auth::request_context(&ctx.cfg, bearer)?;
    let repo = ctx.link_repo();
    let uc = RemoveDocumentLinks {
        repo: repo.as_ref(),
    };
    let outcome = uc
        .execute(&rc, &id)
        .await
        .map_err(internal("remove_document_links"))?;
    Ok(Json(outcome.into()))
}

#[utoipa::path(get, path = "/api/documents/{id}/pages/{page_id}/links", tag = "Links",
    params(
        ("id" = String, Path, description = "Source document ID"),
        ("page_id" = String, Path, description = "Source page ID")
    ),
    responses((status = 200, body = LinkListResponse)))]
pub async fn list_page_links(
    State(ctx): State<AppContext>,
    bearer: Bearer,
    Path((id, page_id)): Path<(String, String)>,
) -> Result<Json<LinkListResponse>, StatusCode> {
    let rc = auth::request_context(&ctx.cfg, bearer)?;
    let repo = ctx.link_repo();
    let uc = GetPageLinks {
        repo: repo.as_ref(),
    };
    let links = uc
        .execute(&rc, &id, &page_id)
        .await
        .map_err(internal("page_links"))?;
    Ok(Json(LinkListResponse {
        items: links.into_iter().map(Into::into).collect(),
    }))
}

#[utoipa::path(delete, path = "/api/pages/{page_id}/links", tag = "Links",
    params(("page_id" = String, Path, description = "Removed page ID")),
    responses((status = 200, body = RemovalResponse)))]
pub async fn remove_page_links(
    State(ctx): State<AppContext>,
    bearer: Bearer,
    Path(page_id): Path<String>,
) -> Result<Json<RemovalResponse>, StatusCode> {
    let rc = auth::request_context(&ctx.cfg, bearer)?;
    let repo = ctx.link_repo();
    let uc = RemovePageLinks {
        repo: repo.as_ref(),
    };
    let outcome = uc
        .execute(&rc, &page_id)
        .await
        .map_err(internal("remove_page_links"))?;
    Ok(Json(outcome.into()))
}

#[utoipa::path(delete, path = "/api/attachments/{id}/links", tag = "Links",
    params(("id" = String, Path, description = "Removed attachment ID")),
    responses((status = 200, body = RemovalResponse)))]
pub async fn orphan_attachment_links(
    State(ctx): State<AppContext>,
    bearer: Bearer,
    Path(id): Path<String>,
) -> Result<Json<RemovalResponse>, StatusCode> {
    let rc = auth::request_context(&ctx.cfg, bearer)?;
    let repo = ctx.link_repo();
    let uc = OrphanAttachmentLinks {
        repo: repo.as_ref(),
    };
    let orphaned = uc
        .execute(&rc, &id)
        .await
        .map_err(internal("orphan_attachment_links"))?;
    Ok(Json(RemovalResponse {
        deleted: 0,
        orphaned,
    }))
}

#[utoipa::path(delete, path = "/api/links/{id}", tag = "Links",
    params(("id" = String, Path, description = "Link ID")),
    responses((status = 204), (status = 404)))]
pub async fn delete_link(
    State(ctx): State<AppContext>,
    bearer: Bearer,
    Path(id): Path<String>,
) -> Result<StatusCode, StatusCode> {
    let rc = auth::request_context(&ctx.cfg, bearer)?;
    let repo = ctx.link_repo();
    let uc = DeleteLink {
        repo: repo.as_ref(),
    };
    let removed = uc.execute(&rc, &id).await.map_err(internal("delete_link"))?;
    if removed {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

pub fn routes(ctx: AppContext) -> Router {
    Router::new()
        .route("/links/candidates", get(search_candidates))
        .route("/links/:id", delete(delete_link))
        .route(
            "/documents/:id/links",
            get(list_document_links)
                .post(create_link)
                .delete(remove_document_links),
        )
        .route("/documents/:id/pages/:page_id/links", get(list_page_links))
        .route("/pages/:page_id/links", delete(remove_page_links))
        .route("/attachments/:id/links", delete(orphan_attachment_links))
        .with_state(ctx)
}
