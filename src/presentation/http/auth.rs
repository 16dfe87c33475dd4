use crate::application::context::RequestContext;
use crate::application::ports::directory_port::DirectoryError;
use crate::application::use_cases::auth::directory_login::{
    DirectoryLogin, DirectoryLoginRequest,
};
use crate::bootstrap::app_context::AppContext;
use crate::bootstrap::config::Config;
use crate::domain::directory::entry::DirectoryUser;
use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct LdapLoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DirectoryUserResponse {
    pub user_id: String,
    pub dn: String,
    pub common_name: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl From<DirectoryUser> for DirectoryUserResponse {
    fn from(u: DirectoryUser) -> Self {
        Self {
            user_id: u.user_id,
            dn: u.dn,
            common_name: u.common_name,
            first_name: u.first_name,
            last_name: u.last_name,
            email: u.email,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub user: DirectoryUserResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub user_id: String,
    pub org_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub org: String,
    pub exp: usize,
}

pub fn routes(ctx: AppContext) -> Router {
    Router::new()
        .route("/ldap/login", post(ldap_login))
        .route("/logout", post(logout))
        .route("/me", get(me))
        .with_state(ctx)
}

/// Lookup misses and rejected binds are the caller's problem; everything else
/// means the directory itself is unhealthy.
pub(crate) fn directory_status(err: &DirectoryError) -> StatusCode {
    match err {
        DirectoryError::NotFound { .. }
        | DirectoryError::Ambiguous { .. }
        | DirectoryError::InvalidCredentials(_) => StatusCode::UNAUTHORIZED,
        DirectoryError::Connect(_)
        | DirectoryError::StartTls(_)
        | DirectoryError::Bind { .. }
        | DirectoryError::Search(_) => StatusCode::BAD_GATEWAY,
    }
}

#[utoipa::path(post, path = "/api/auth/ldap/login", tag = "Auth", request_body = LdapLoginRequest, security(()), responses(
    (status = 200, body = LoginResponse),
    (status = 401, description = "Unknown user or wrong password"),
    (status = 502, description = "Directory unavailable")
))]
pub async fn ldap_login(
    State(ctx): State<AppContext>,
    Json(req): Json<LdapLoginRequest>,
) -> Result<(HeaderMap, Json<LoginResponse>), StatusCode> {
    let directory = ctx.directory();
    let uc = DirectoryLogin {
        directory: directory.as_ref(),
    };
    let dto = DirectoryLoginRequest {
        username: req.username.clone(),
        password: req.password,
    };
    let user = uc.execute(&dto).await.map_err(|e| {
        let status = directory_status(&e);
        if status == StatusCode::UNAUTHORIZED {
            warn!(username = %req.username, error = %e, "ldap_login_rejected");
        } else {
            error!(username = %req.username, error = ?e, "ldap_login_failed");
        }
        status
    })?;
    info!(user = %user.user_id, "ldap_login_ok");

    let token = issue_token(&ctx.cfg, &user.user_id)?;

    // Set HttpOnly cookie with the access token
    let mut headers = HeaderMap::new();
    let cookie = build_access_cookie(&token, ctx.cfg.jwt_expires_secs, secure_cookies(&ctx.cfg));
    headers.insert(
        axum::http::header::SET_COOKIE,
        axum::http::HeaderValue::from_str(&cookie)
            .unwrap_or(axum::http::HeaderValue::from_static("")),
    );

    Ok((
        headers,
        Json(LoginResponse {
            access_token: token,
            user: user.into(),
        }),
    ))
}

#[utoipa::path(get, path = "/api/auth/me", tag = "Auth", responses((status = 200, body = SessionResponse)))]
pub async fn me(
    State(ctx): State<AppContext>,
    bearer: Result<Bearer, StatusCode>,
) -> Result<Json<SessionResponse>, StatusCode> {
    let rc = request_context(&ctx.cfg, bearer?)?;
    Ok(Json(SessionResponse {
        user_id: rc.user_id,
        org_id: rc.org_id,
    }))
}

pub(crate) fn issue_token(cfg: &Config, user_id: &str) -> Result<String, StatusCode> {
    let now = chrono::Utc::now().timestamp() as usize;
    let claims = Claims {
        sub: user_id.to_string(),
        org: cfg.org_id.clone(),
        exp: now + (cfg.jwt_expires_secs as usize),
    };
    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(cfg.jwt_secret_pem.as_bytes()),
    )
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

// --- Bearer extractor & JWT utils ---
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

pub struct Bearer(pub String);

#[axum::async_trait]
impl<S> FromRequestParts<S> for Bearer
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // 1) Prefer Authorization header if present
        if let Some(auth) = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
        {
            if let Some(t) = auth.strip_prefix("Bearer ") {
                return Ok(Bearer(t.to_string()));
            }
        }

        // 2) Fallback to HttpOnly cookie `access_token`
        if let Some(cookie_hdr) = parts
            .headers
            .get(axum::http::header::COOKIE)
            .and_then(|v| v.to_str().ok())
        {
            if let Some(token) = get_cookie(cookie_hdr, "access_token") {
                return Ok(Bearer(token));
            }
        }

        Err(StatusCode::UNAUTHORIZED)
    }
}

fn decode_claims(cfg: &Config, token: &str) -> Result<Claims, StatusCode> {
    let data = jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(cfg.jwt_secret_pem.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| StatusCode::UNAUTHORIZED)?;
    Ok(data.claims)
}

/// Resolves the caller's organization and user from a validated token.
/// Tokens minted for another organization are rejected.
pub fn request_context(cfg: &Config, bearer: Bearer) -> Result<RequestContext, StatusCode> {
    let claims = decode_claims(cfg, &bearer.0)?;
    if claims.org != cfg.org_id || claims.sub.is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(RequestContext::new(claims.org, claims.sub))
}

// --- Cookie helpers & logout ---

fn get_cookie(cookie_header: &str, name: &str) -> Option<String> {
    for part in cookie_header.split(';') {
        let kv = part.trim();
        if let Some((k, v)) = kv.split_once('=') {
            if k.trim() == name {
                return Some(v.trim().to_string());
            }
        }
    }
    None
}

fn secure_cookies(cfg: &Config) -> bool {
    cfg.frontend_url
        .as_deref()
        .map(|u| u.starts_with("https://"))
        .unwrap_or(false)
}

fn build_access_cookie(token: &str, max_age_secs: i64, secure: bool) -> String {
    let secure_attr = if secure { "; Secure" } else { "" };
    format!(
        "access_token={}; HttpOnly{}; Path=/; Max-Age={}; SameSite=Lax",
        token,
        secure_attr,
        max_age_secs.max(0)
    )
}

#[utoipa::path(post, path = "/api/auth/logout", tag = "Auth", responses((status = 204)))]
pub async fn logout(State(ctx): State<AppContext>) -> Result<(HeaderMap, StatusCode), StatusCode> {
    // Clear cookie by setting it expired
    let mut headers = HeaderMap::new();
    let cookie = if secure_cookies(&ctx.cfg) {
        "access_token=; HttpOnly; Secure; Path=/; Max-Age=0; SameSite=Lax"
    } else {
        "access_token=; HttpOnly; Path=/; Max-Age=0; SameSite=Lax"
    };
    headers.insert(
        axum::http::header::SET_COOKIE,
        axum::http::HeaderValue::from_static(cookie),
    );
    Ok((headers, StatusCode::NO_CONTENT))
}
