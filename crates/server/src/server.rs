use crate::{handlers::recovery, Result, ServerConfig};
use axum::{
    extract::Extension,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    response::{IntoResponse, Json},
    routing::{get, post, put},
    Router,
};
use axum_server::Handle;
use colored::Colorize;
use std::{net::SocketAddr, sync::Arc};
use svr_core::UtcDateTime;
use svr_recovery::{RecoveryOptions, RecoveryService, TracingNotifier};
use time::Duration;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Build the application router.
///
/// Exposed so tests can drive the HTTP surface without binding
/// a socket.
pub fn router(
    service: Arc<RecoveryService>,
    origins: Vec<HeaderValue>,
) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(vec![Method::GET, Method::POST, Method::PUT])
        .allow_credentials(true)
        .allow_headers(vec![AUTHORIZATION, CONTENT_TYPE])
        .expose_headers(vec![])
        .allow_origin(origins);

    Router::new()
        .route("/recover/request", post(recovery::request_recovery))
        .route("/recover/cancel", get(recovery::cancel_by_token))
        .route(
            "/recover/cancel/{request_id}",
            post(recovery::cancel_request),
        )
        .route("/recover/shards", put(recovery::save_shards))
        .route("/recover/status", get(recovery::recovery_status))
        .route("/recover/requests", get(recovery::pending_requests))
        .route(
            "/recover/guardians",
            post(recovery::invite_guardian)
                .get(recovery::list_guardians),
        )
        .route(
            "/recover/guardians/{guardian_id}/accept",
            post(recovery::accept_guardian),
        )
        .route("/docs/openapi.json", get(openapi))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .on_request(DefaultOnRequest::new().level(Level::TRACE))
                .on_response(
                    DefaultOnResponse::new().level(Level::TRACE),
                ),
        )
        .layer(Extension(service))
}

/// Web server implementation.
pub struct Server;

impl Server {
    /// Start the server.
    pub async fn start(
        config: ServerConfig,
        handle: Handle,
    ) -> Result<()> {
        let addr = *config.bind_address();
        let origins = read_origins(&config)?;

        let mut client =
            svr_database::open_file(config.database_path()).await?;
        svr_database::migrations::migrate_client(&mut client).await?;

        let options = RecoveryOptions {
            timelock: Duration::hours(config.recovery.timelock_hours),
            cancel_url: config.recovery.cancel_url.clone(),
        };
        let service = Arc::new(RecoveryService::new(
            client,
            Arc::new(TracingNotifier),
            options,
        ));

        let app = router(service, origins);
        startup_message(&config, &addr);

        axum_server::bind(addr)
            .handle(handle)
            .serve(app.into_make_service())
            .await?;
        Ok(())
    }
}

fn read_origins(config: &ServerConfig) -> Result<Vec<HeaderValue>> {
    let mut origins = Vec::new();
    if let Some(cors) = config.net.cors.as_ref() {
        for url in cors.origins.iter() {
            origins.push(HeaderValue::from_str(
                url.as_str().trim_end_matches('/'),
            )?);
        }
    }
    Ok(origins)
}

fn startup_message(config: &ServerConfig, addr: &SocketAddr) {
    let now = UtcDateTime::now().to_rfc3339().unwrap_or_default();
    println!("Started        {}", now.yellow());
    println!("Listen         {}", addr.to_string().yellow());
    println!(
        "Database       {}",
        config.database_path().display().to_string().yellow()
    );
    println!(
        "Timelock       {}",
        format!("{}h", config.recovery.timelock_hours).yellow()
    );
}

/// Get OpenAPI JSON definition.
#[utoipa::path(
    get,
    path = "/docs/openapi.json",
    responses(
        (
            status = StatusCode::OK,
            description = "OpenAPI definition",
        ),
    ),
)]
pub(crate) async fn openapi() -> impl IntoResponse {
    let value = crate::api_docs::openapi();
    Json(serde_json::json!(&value))
}
