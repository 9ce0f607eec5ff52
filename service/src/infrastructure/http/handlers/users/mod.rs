use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use crate::domain::AppState;
use crate::domain::accounts::Accounts;
use crate::infrastructure::http::api::{ApiError, ApiSuccess};
use crate::infrastructure::http::identity::Caller;
use dto::{RegisterRequest, UpdateProfileRequest, UserResponse};

mod dto;

pub async fn register<S: AppState>(
    State(state): State<S>,
    Json(body): Json<RegisterRequest>,
) -> Result<ApiSuccess<UserResponse>, ApiError> {
    let user = Accounts::new(state.content(), state.clock())
        .register(body.into())
        .await?;
    Ok(ApiSuccess::new(StatusCode::CREATED, UserResponse::from(&user)))
}

pub async fn me<S: AppState>(
    State(state): State<S>,
    Caller(caller): Caller,
) -> Result<ApiSuccess<UserResponse>, ApiError> {
    let user = Accounts::new(state.content(), state.clock()).me(caller).await?;
    Ok(ApiSuccess::ok(UserResponse::from(&user)))
}

pub async fn update_profile<S: AppState>(
    State(state): State<S>,
    Caller(caller): Caller,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<ApiSuccess<UserResponse>, ApiError> {
    let user = Accounts::new(state.content(), state.clock())
        .update_profile(caller, body.into())
        .await?;
    Ok(ApiSuccess::ok(UserResponse::from(&user)))
}

pub async fn upgrade_to_creator<S: AppState>(
    State(state): State<S>,
    Caller(caller): Caller,
) -> Result<ApiSuccess<UserResponse>, ApiError> {
    let user = Accounts::new(state.content(), state.clock())
        .upgrade_to_creator(caller)
        .await?;
    Ok(ApiSuccess::ok(UserResponse::from(&user)))
}
