use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::MatchedPath;
use dotenvy::dotenv;
use http::HeaderValue;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use doclinks::bootstrap::app_context::{AppContext, AppServices};
use doclinks::bootstrap::config::Config;
use doclinks::infrastructure::db::repositories::link_repository_sqlx::SqlxLinkRepository;
use doclinks::infrastructure::ldap::LdapConnector;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
        paths(
            doclinks::presentation::http::auth::ldap_login,
            doclinks::presentation::http::auth::logout,
            doclinks::presentation::http::auth::me,
            doclinks::presentation::http::links::search_candidates,
            doclinks::presentation::http::links::list_document_links,
            doclinks::presentation::http::links::create_link,
            doclinks::presentation::http::links::remove_document_links,
            doclinks::presentation::http::links::list_page_links,
            doclinks::presentation::http::links::remove_page_links,
            doclinks::presentation::http::links::orphan_attachment_links,
            doclinks::presentation::http::links::delete_link,
            doclinks::presentation::http::directory::list_directory_users,
            doclinks::presentation::http::health::health,
        ),
        components(schemas(
            doclinks::presentation::http::auth::LdapLoginRequest,
            doclinks::presentation::http::auth::LoginResponse,
            doclinks::presentation::http::auth::DirectoryUserResponse,
            doclinks::presentation::http::auth::SessionResponse,
            doclinks::presentation::http::links::LinkItem,
            doclinks::presentation::http::links::LinkListResponse,
            doclinks::presentation::http::links::CreateLinkRequest,
            doclinks::presentation::http::links::CandidateItem,
            doclinks::presentation::http::links::CandidateSetResponse,
            doclinks::presentation::http::links::RemovalResponse,
            doclinks::presentation::http::directory::DirectoryUsersResponse,
            doclinks::presentation::http::health::HealthResp,
        )),
        tags(
            (name = "Auth", description = "Directory authentication"),
            (name = "Links", description = "Document links and link candidates"),
            (name = "Directory", description = "Directory user preview"),
            (name = "Health", description = "System health checks")
        )
    )]
struct ApiDoc;

fn cors_layer(cfg: &Config) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([
            http::Method::GET,
            http::Method::POST,
            http::Method::DELETE,
            http::Method::OPTIONS,
        ])
        .allow_headers([http::header::CONTENT_TYPE, http::header::AUTHORIZATION]);
    match cfg.frontend_url.as_deref().map(HeaderValue::from_str) {
        Some(Ok(v)) => base.allow_origin(v).allow_credentials(true),
        // In production, FRONTEND_URL is mandatory (enforced earlier); deny everything else
        _ if cfg.is_production => {
            base.allow_origin(AllowOrigin::exact(HeaderValue::from_static("http://invalid")))
        }
        // Development convenience
        _ => base
            .allow_origin(AllowOrigin::mirror_request())
            .allow_credentials(true),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "doclinks=debug,axum=info,tower_http=info".into()),
        )
        .init();

    let cfg = Config::from_env()?;
    info!(?cfg, "Starting doclinks backend");

    // Database
    let pool = doclinks::infrastructure::db::connect_pool(&cfg.database_url).await?;
    doclinks::infrastructure::db::migrate(&pool).await?;

    let link_repo = Arc::new(SqlxLinkRepository::new(pool.clone()));
    let directory = Arc::new(LdapConnector::new(cfg.ldap.clone()));
    let services = AppServices::new(link_repo, directory);
    let ctx = AppContext::new(cfg.clone(), services);

    let app = Router::new()
        .nest(
            "/api",
            doclinks::presentation::http::health::routes(pool.clone()),
        )
        .nest(
            "/api/auth",
            doclinks::presentation::http::auth::routes(ctx.clone()),
        )
        .nest(
            "/api",
            doclinks::presentation::http::links::routes(ctx.clone()),
        )
        .nest(
            "/api",
            doclinks::presentation::http::directory::routes(ctx.clone()),
        )
        .merge(SwaggerUi::new("/api/docs").url("/api/openapi.json", ApiDoc::openapi()))
        .layer(cors_layer(&cfg))
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &http::Request<_>| {
                let method = req.method().clone();
                let uri = req.uri().clone();
                let matched = req
                    .extensions()
                    .get::<MatchedPath>()
                    .map(|p| p.as_str().to_string())
                    .unwrap_or_default();
                tracing::info_span!("http", %method, %uri, matched_path = %matched)
            }),
        );

    let api_addr = SocketAddr::from(([0, 0, 0, 0], cfg.api_port));
    info!(%api_addr, "HTTP API listening");
    let listener = tokio::net::TcpListener::bind(api_addr).await?;

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!(?e, "API server failed");
        return Err(e.into());
    }
    info!("HTTP API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(?e, "failed to listen for shutdown signal");
    }
}
