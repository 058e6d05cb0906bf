use axum::{Extension, Json, body::Bytes, extract::State, http::StatusCode};
use engine::RegisterUserCmd;

use crate::{
    ServerError,
    identity::Identity,
    server::ServerState,
    types::auth::{RegisterUser, UserView},
};

fn user_view(user: engine::User) -> UserView {
    UserView {
        id: user.id,
        email: user.email,
        phone_number: user.phone_number,
        display_name: user.display_name,
        photo_url: user.photo_url,
        created_at: user.created_at,
        last_login_at: user.last_login_at,
    }
}

/// Body values win over the provider's when they are not blank.
fn pick(body: Option<String>, provider: Option<String>) -> Option<String> {
    body.filter(|value| !value.trim().is_empty()).or(provider)
}

/// The body is optional: an empty request registers with the provider profile.
fn parse_body(body: &Bytes) -> Result<RegisterUser, ServerError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(RegisterUser::default());
    }
    serde_json::from_slice(body).map_err(|err| {
        ServerError::Rejection(
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("Invalid registration body: {err}"),
        )
    })
}

pub(crate) async fn register(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
    body: Bytes,
) -> Result<(StatusCode, Json<UserView>), ServerError> {
    let payload = parse_body(&body)?;

    let (user, created) = state
        .engine
        .register_user(RegisterUserCmd {
            id: identity.uid,
            email: identity.email,
            phone_number: identity.phone_number,
            display_name: pick(payload.display_name, identity.display_name),
            photo_url: pick(payload.photo_url, identity.photo_url),
        })
        .await?;

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(user_view(user))))
}

pub(crate) async fn me(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
) -> Result<Json<UserView>, ServerError> {
    let user = state.engine.user(&identity.uid).await?;
    Ok(Json(user_view(user)))
}
