use axum::{
    Router,
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};

use std::{net::SocketAddr, sync::Arc};

use crate::{
    ServerError, auth, catalogs, health,
    identity::{Identity, IdentityVerifier},
    kpis, movements,
};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub verifier: Arc<IdentityVerifier>,
}

impl ServerState {
    pub fn new(engine: Engine, verifier: IdentityVerifier) -> Self {
        Self {
            engine: Arc::new(engine),
            verifier: Arc::new(verifier),
        }
    }
}

/// Resolves `Authorization: Bearer <token>` into an [`Identity`] request
/// extension.
async fn authenticate(
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    if !request.headers().contains_key(AUTHORIZATION) {
        return Err(ServerError::Unauthorized(
            "Authorization header required".to_string(),
        ));
    }
    let Some(bearer) = request.headers().typed_get::<Authorization<Bearer>>() else {
        return Err(ServerError::Unauthorized(
            "Invalid authorization header".to_string(),
        ));
    };

    let identity: Identity = state.verifier.verify(bearer.token()).await?;
    tracing::debug!(uid = %identity.uid, "request authenticated");

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

pub fn router(state: ServerState) -> Router {
    let protected = Router::new()
        .route(
            "/v1/movements",
            get(movements::list).post(movements::create),
        )
        .route(
            "/v1/movements/{id}",
            get(movements::get)
                .patch(movements::update)
                .delete(movements::delete),
        )
        .route("/v1/kpis/summary", get(kpis::summary))
        .route("/v1/auth/register", post(auth::register))
        .route("/v1/auth/me", get(auth::me))
        .route_layer(middleware::from_fn_with_state(state.clone(), authenticate));

    let public = Router::new()
        .route("/health", get(health::get))
        .route(
            "/v1/business-units",
            get(catalogs::list_business_units).post(catalogs::create_business_unit),
        )
        .route("/v1/tags", get(catalogs::list_tags).post(catalogs::create_tag));

    Router::new()
        .nest("/api", protected.merge(public))
        .with_state(state)
}

pub async fn run(engine: Engine, verifier: IdentityVerifier, addr: SocketAddr) {
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener on {addr}: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, verifier, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    verifier: IdentityVerifier,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!(
        identity = verifier.is_configured(),
        "Server listening on {}",
        addr
    );

    axum::serve(listener, router(ServerState::new(engine, verifier))).await
}

pub fn spawn_with_listener(
    engine: Engine,
    verifier: IdentityVerifier,
    listener: tokio::net::TcpListener,
) -> Result<SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, verifier, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
