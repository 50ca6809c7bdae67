use crate::db;
use crate::domain::models::PublicUser;
use crate::state::SharedState;
use crate::web::session::UserSession;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct ProfileUpdateRequest {
    pub name: String,
    pub age: Option<i16>,
    pub gender: Option<String>,
    pub occupation: Option<String>,
}

#[derive(Serialize)]
pub struct ProfileUpdateResponse {
    pub success: bool,
    pub user: PublicUser,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(get_profile).put(update_profile))
        .with_state(state)
}

async fn get_profile(
    UserSession(user_id): UserSession,
    State(state): State<SharedState>,
) -> Result<Json<PublicUser>, StatusCode> {
    let user = db::find_user_by_id(&state.pool, user_id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(user.into()))
}

async fn update_profile(
    UserSession(user_id): UserSession,
    State(state): State<SharedState>,
    Json(payload): Json<ProfileUpdateRequest>,
) -> Result<Json<ProfileUpdateResponse>, StatusCode> {
    let user = db::update_user_profile(
        &state.pool,
        user_id,
        &payload.name,
        payload.age,
        payload.gender.as_deref(),
        payload.occupation.as_deref(),
    )
    .await
    .map_err(|e| {
        tracing::error!("Profile update failed: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?
    .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(ProfileUpdateResponse {
        success: true,
        user: user.into(),
    }))
}
