use crate::config::ServerConfig;
use crate::signaling::{SignalingService, ws_handler, ws_handler_with_id};
use anyhow::{Context, Result};
use axum::http::HeaderValue;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

pub fn router(service: SignalingService, config: &ServerConfig) -> Result<Router> {
    let app = Router::new()
        .route("/ws", get(ws_handler))
        .route("/ws/{connection_id}", get(ws_handler_with_id))
        .route("/health", get(|| async { "ok" }))
        .layer(cors_layer(config.allowed_origin.as_deref())?)
        .with_state(service);

    Ok(app)
}

fn cors_layer(allowed_origin: Option<&str>) -> Result<CorsLayer> {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    let cors = match allowed_origin {
        None | Some("*") => cors.allow_origin(Any),
        Some(origin) => {
            let origin = HeaderValue::from_str(origin)
                .with_context(|| format!("Invalid allowed origin `{}`", origin))?;
            cors.allow_origin(origin)
        }
    };

    Ok(cors)
}

/// Binds `config.bind` and serves until the listener fails.
pub async fn serve(config: ServerConfig) -> Result<()> {
    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;

    serve_on(listener, config).await
}

pub async fn serve_on(listener: TcpListener, config: ServerConfig) -> Result<()> {
    let service = SignalingService::new(config.ice_servers.clone());
    let app = router(service, &config)?;

    let addr = listener.local_addr().context("Listener has no local address")?;
    info!("Signaling server listening on http://{}", addr);

    axum::serve(listener, app)
        .await
        .context("Signaling server stopped")?;
    Ok(())
}
