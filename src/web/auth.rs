use crate::db;
use crate::domain::models::PublicUser;
use crate::state::SharedState;
use crate::web::session;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, SaltString},
    Argon2, PasswordHasher, PasswordVerifier,
};
use axum::{
    extract::{ConnectInfo, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub age: Option<i16>,
    pub gender: Option<String>,
    pub occupation: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: PublicUser,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

type AuthError = (StatusCode, Json<MessageResponse>);

fn auth_error(status: StatusCode, message: &str) -> AuthError {
    (
        status,
        Json(MessageResponse {
            message: message.to_string(),
        }),
    )
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .with_state(state)
}

async fn register(
    State(state): State<SharedState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, AuthError> {
    let existing = db::find_user_by_email(&state.pool, &payload.email)
        .await
        .map_err(|e| {
            tracing::error!("Registration lookup failed: {}", e);
            auth_error(StatusCode::INTERNAL_SERVER_ERROR, "Registration failed")
        })?;
    if existing.is_some() {
        return Err(auth_error(StatusCode::BAD_REQUEST, "Email already exists"));
    }

    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(payload.password.as_bytes(), &salt)
        .map_err(|e| {
            tracing::error!("Password hashing failed: {}", e);
            auth_error(StatusCode::INTERNAL_SERVER_ERROR, "Registration failed")
        })?
        .to_string();

    let user = db::insert_user(
        &state.pool,
        db::NewUser {
            name: &payload.name,
            email: &payload.email,
            hash: &hash,
            age: payload.age,
            gender: payload.gender.as_deref(),
            occupation: payload.occupation.as_deref(),
        },
    )
    .await
    .map_err(|e| {
        tracing::error!("User insert failed: {}", e);
        auth_error(StatusCode::INTERNAL_SERVER_ERROR, "Registration failed")
    })?;

    let token = session::sign_session(user.id, &state.session_key)
        .map_err(|_| auth_error(StatusCode::INTERNAL_SERVER_ERROR, "Registration failed"))?;

    tracing::info!("Registered user {}", user.id);

    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}

async fn login(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<SharedState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AuthError> {
    let ip = addr.ip().to_string();
    if !state.login_limiter.check(&ip).await {
        tracing::warn!("Login rate limit exceeded for IP: {}", ip);
        return Err(auth_error(
            StatusCode::TOO_MANY_REQUESTS,
            "Too many login attempts",
        ));
    }

    let user = db::find_user_by_email(&state.pool, &payload.email)
        .await
        .map_err(|e| {
            tracing::error!("Login lookup failed: {}", e);
            auth_error(StatusCode::INTERNAL_SERVER_ERROR, "Login failed")
        })?
        .ok_or_else(|| auth_error(StatusCode::UNAUTHORIZED, "Invalid credentials"))?;

    let parsed_hash = PasswordHash::new(&user.hash)
        .map_err(|_| auth_error(StatusCode::UNAUTHORIZED, "Invalid credentials"))?;
    Argon2::default()
        .verify_password(payload.password.as_bytes(), &parsed_hash)
        .map_err(|_| auth_error(StatusCode::UNAUTHORIZED, "Invalid credentials"))?;

    let token = session::sign_session(user.id, &state.session_key)
        .map_err(|_| auth_error(StatusCode::INTERNAL_SERVER_ERROR, "Login failed"))?;

    tracing::info!("User {} logged in", user.id);

    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}
