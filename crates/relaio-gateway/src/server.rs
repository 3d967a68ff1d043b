// SPDX-FileCopyrightText: 2026 Relaio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state.

use std::sync::Arc;

use axum::{
    Router,
    middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;

use relaio_core::RelaioError;
use relaio_relay::Relay;

use crate::auth::{AuthConfig, auth_middleware};
use crate::handlers;
use crate::rooms::RoomRegistry;
use crate::ws;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// The relay orchestrator.
    pub relay: Arc<Relay>,
    /// Room registry backing the live publisher port.
    pub rooms: Arc<RoomRegistry>,
    /// Admin surface authentication.
    pub auth: AuthConfig,
}

/// Start the gateway HTTP/WebSocket server.
///
/// Routes:
/// - `GET /health` (public)
/// - `GET /ws` (public; `admin_join` is token-checked in-protocol)
/// - `GET /api/threads`, `GET /api/messages`,
///   `POST /api/threads/{id}/purge`, `POST /api/purge_all` (bearer-guarded
///   when an admin token is configured)
pub async fn start_server(
    host: &str,
    port: u16,
    state: GatewayState,
) -> Result<(), RelaioError> {
    let app = build_router(state);

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| RelaioError::Channel {
            message: format!("failed to bind gateway to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .await
        .map_err(|e| RelaioError::Channel {
            message: format!("gateway server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    Ok(())
}

/// Assemble the router (exposed separately for tests).
pub fn build_router(state: GatewayState) -> Router {
    let auth_state = state.auth.clone();

    let public_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .route("/ws", get(ws::ws_handler))
        .with_state(state.clone());

    let api_routes = Router::new()
        .route("/api/threads", get(handlers::get_threads))
        .route("/api/messages", get(handlers::get_messages))
        .route("/api/threads/{id}/purge", post(handlers::post_purge_thread))
        .route("/api/purge_all", post(handlers::post_purge_all))
        .route_layer(axum_middleware::from_fn_with_state(
            auth_state,
            auth_middleware,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use relaio_cache::MessageCache;
    use relaio_limiter::RateLimiter;
    use relaio_test_utils::{test_codec, test_store};

    #[tokio::test]
    async fn gateway_state_is_clone_and_router_builds() {
        let (store, _dir) = test_store().await;
        let rooms = Arc::new(RoomRegistry::new());
        let relay = Arc::new(Relay::new(
            store,
            test_codec(),
            Arc::new(MessageCache::new(10, Duration::from_secs(300))),
            Arc::new(RateLimiter::new()),
            rooms.clone(),
        ));

        let state = GatewayState {
            relay,
            rooms,
            auth: AuthConfig { admin_token: None },
        };
        let _cloned = state.clone();
        let _router = build_router(state);
    }
}
