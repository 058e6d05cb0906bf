use axum::{Json, extract::State, http::StatusCode};

use crate::{server::ServerState, types::health::Health};

pub(crate) async fn get(State(state): State<ServerState>) -> (StatusCode, Json<Health>) {
    let identity = if state.verifier.is_configured() {
        "configured"
    } else {
        "not_configured"
    };

    let (code, status) = match state.engine.ping().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(err) => {
            tracing::error!("health check failed: {err}");
            (StatusCode::SERVICE_UNAVAILABLE, "degraded")
        }
    };

    (
        code,
        Json(Health {
            status: status.to_string(),
            app: "Suma".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            identity: identity.to_string(),
        }),
    )
}
