use axum::{
    extract::{
        rejection::{FormRejection, JsonRejection},
        FromRef, State,
    },
    routing::{get, post},
    Form, Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{LoginForm, PublicUser, RegisterRequest, TokenResponse},
        extractors::BearerToken,
        jwt::JwtKeys,
        services,
    },
    error::AppError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(register))
        .route("/users/", post(register))
        .route("/token", post(login))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/users/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<PublicUser>, AppError> {
    let Json(payload) = payload?;
    let username = payload.username.trim();

    let user = services::register(state.users.as_ref(), username, &payload.password).await?;
    Ok(Json(PublicUser {
        id: user.id,
        username: user.username,
    }))
}

#[instrument(skip(state, form))]
pub async fn login(
    State(state): State<AppState>,
    form: Result<Form<LoginForm>, FormRejection>,
) -> Result<Json<TokenResponse>, AppError> {
    let Form(form) = form?;
    let keys = JwtKeys::from_ref(&state);

    let token = services::login(
        state.users.as_ref(),
        &keys,
        form.username.trim(),
        &form.password,
    )
    .await?;
    Ok(Json(TokenResponse::bearer(token)))
}

#[instrument(skip(state, bearer))]
pub async fn get_me(
    State(state): State<AppState>,
    bearer: BearerToken,
) -> Result<Json<PublicUser>, AppError> {
    let identity = state.identify(&bearer).await?;
    Ok(Json(PublicUser {
        id: identity.user_id(),
        username: identity.username().to_owned(),
    }))
}
