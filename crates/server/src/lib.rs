use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::IntoResponse,
};
use engine::EngineError;

use api_types::ErrorBody;
pub use identity::{DEFAULT_LOOKUP_URL, Identity, IdentityVerifier, VerifyError};
pub use server::{ServerState, router, run, run_with_listener, spawn_with_listener};

mod auth;
mod catalogs;
mod health;
mod identity;
mod kpis;
mod movements;
mod server;

pub mod types {
    pub mod movement {
        pub use api_types::movement::{
            Movement, MovementDeleted, MovementListQuery, MovementNew, MovementStatus,
            MovementType, MovementUpdate,
        };
    }

    pub mod kpi {
        pub use api_types::kpi::{BreakdownEntry, KpiQuery, KpiSummary};
    }

    pub mod auth {
        pub use api_types::auth::{RegisterUser, UserView};
    }

    pub mod catalog {
        pub use api_types::catalog::{BusinessUnit, BusinessUnitNew, BusinessUnitType, Tag, TagNew};
    }

    pub mod health {
        pub use api_types::health::Health;
    }
}

#[derive(Debug)]
pub enum ServerError {
    Engine(EngineError),
    Identity(VerifyError),
    Unauthorized(String),
    Rejection(StatusCode, String),
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::ExistingKey(_) => StatusCode::CONFLICT,
        EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::InvalidAmount(_)
        | EngineError::CurrencyMismatch(_)
        | EngineError::InvalidKind(_)
        | EngineError::InvalidStatus(_)
        | EngineError::InvalidTransition(_)
        | EngineError::InvalidName(_)
        | EngineError::InvalidPeriod(_)
        | EngineError::InvalidId(_)
        | EngineError::InvalidFilter(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

fn status_for_verify_error(err: &VerifyError) -> StatusCode {
    match err {
        VerifyError::InvalidToken => StatusCode::UNAUTHORIZED,
        VerifyError::NotConfigured | VerifyError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, detail) = match self {
            ServerError::Engine(err) => (status_for_engine_error(&err), message_for_engine_error(err)),
            ServerError::Identity(err) => {
                if let VerifyError::Unavailable(reason) = &err {
                    tracing::error!("identity provider error: {reason}");
                }
                (status_for_verify_error(&err), err.to_string())
            }
            ServerError::Unauthorized(detail) => (StatusCode::UNAUTHORIZED, detail),
            ServerError::Rejection(status, detail) => (status, detail),
        };

        (status, Json(ErrorBody { detail })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

impl From<VerifyError> for ServerError {
    fn from(value: VerifyError) -> Self {
        Self::Identity(value)
    }
}

impl From<JsonRejection> for ServerError {
    fn from(value: JsonRejection) -> Self {
        Self::Rejection(value.status(), value.body_text())
    }
}

impl From<QueryRejection> for ServerError {
    fn from(value: QueryRejection) -> Self {
        Self::Rejection(value.status(), value.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_not_found_maps_to_404() {
        let res = ServerError::from(EngineError::KeyNotFound("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn engine_conflict_maps_to_409() {
        let res = ServerError::from(EngineError::ExistingKey("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn engine_validation_maps_to_422() {
        for err in [
            EngineError::InvalidAmount("x".to_string()),
            EngineError::CurrencyMismatch("x".to_string()),
            EngineError::InvalidTransition("x".to_string()),
            EngineError::InvalidPeriod("x".to_string()),
            EngineError::InvalidFilter("x".to_string()),
        ] {
            let res = ServerError::from(err).into_response();
            assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        }
    }

    #[test]
    fn engine_database_maps_to_500() {
        let err = EngineError::Database(sea_orm::DbErr::Custom("boom".to_string()));
        let res = ServerError::from(err).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn invalid_token_maps_to_401() {
        let res = ServerError::from(VerifyError::InvalidToken).into_response();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn unconfigured_identity_maps_to_503() {
        let res = ServerError::from(VerifyError::NotConfigured).into_response();
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
        let res = ServerError::from(VerifyError::Unavailable("down".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
