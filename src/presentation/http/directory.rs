use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

use crate::application::ports::directory_port::DirectoryError;
use crate::application::use_cases::directory::preview_users::PreviewDirectoryUsers;
use crate::bootstrap::app_context::AppContext;
use crate::presentation::http::auth::{self, Bearer, DirectoryUserResponse};

#[derive(Debug, Serialize, ToSchema)]
pub struct DirectoryUsersResponse {
    pub items: Vec<DirectoryUserResponse>,
}

#[utoipa::path(get, path = "/api/directory/users", tag = "Directory",
    responses(
        (status = 200, body = DirectoryUsersResponse),
        (status = 502, description = "Directory unavailable")
    ))]
pub async fn list_directory_users(
    State(ctx): State<AppContext>,
    bearer: Bearer,
) -> Result<Json<DirectoryUsersResponse>, StatusCode> {
    auth::request_context(&ctx.cfg, bearer)?;
    let directory = ctx.directory();
    let uc = PreviewDirectoryUsers {
        directory: directory.as_ref(),
    };
    match uc.execute().await {
        Ok(users) => Ok(Json(DirectoryUsersResponse {
            items: users.into_iter().map(Into::into).collect(),
        })),
        Err(DirectoryError::NotFound { .. }) => {
            Ok(Json(DirectoryUsersResponse { items: vec![] }))
        }
        Err(e) => {
            error!(error = ?e, "directory_preview_failed");
            Err(StatusCode::BAD_GATEWAY)
        }
    }
}

pub fn routes(ctx: AppContext) -> Router {
    Router::new()
        .route("/directory/users", get(list_directory_users))
        .with_state(ctx)
}
