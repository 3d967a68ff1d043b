// SPDX-FileCopyrightText: 2026 Relaio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bearer-token guard for the admin REST surface.
//!
//! Cookie/session admin login lives outside this system's boundary; the
//! gateway only checks a static token. With no token configured the
//! admin surface is open (development mode).

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

/// Authentication configuration for admin surfaces.
#[derive(Clone)]
pub struct AuthConfig {
    /// Static bearer token; `None` disables the check.
    pub admin_token: Option<String>,
}

impl AuthConfig {
    /// Validate a presented token against the configured one.
    pub fn token_matches(&self, presented: Option<&str>) -> bool {
        match (&self.admin_token, presented) {
            (None, _) => true,
            (Some(expected), Some(given)) => expected == given,
            (Some(_), None) => false,
        }
    }
}

/// Axum middleware rejecting unauthenticated admin requests.
pub async fn auth_middleware(
    State(auth): State<AuthConfig>,
    request: Request,
    next: Next,
) -> Response {
    let presented = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    if !auth.token_matches(presented) {
        warn!(path = %request.uri().path(), "rejected unauthenticated admin request");
        return (StatusCode::UNAUTHORIZED, "unauthorized").into_response();
    }

    next.run(request).await
}
