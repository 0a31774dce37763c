//! Registration, login and the caller's own profile.

use axum::extract::State;
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;

use super::{ApiResponse, MessageResponse, UserResponse, ValidJson};
use crate::auth::{clear_session_cookie, hash_password, session_cookie, verify_password, AuthError, SessionUser};
use crate::domain::{LoginRequest, NewUser, RegisterRequest, UpdateProfileRequest, UserProfile, UserRole};
use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::store::StoreError;

/// A freshly minted bearer token and how to send it.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccessToken {
    pub access_token: String,
    pub user: UserProfile,
    pub usage: TokenUsage,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    pub header_name: String,
    pub header_value: String,
    pub example: String,
}

fn email_conflict(err: StoreError) -> AppError {
    match err {
        StoreError::Conflict(_) => AppError::EmailTaken,
        other => other.into(),
    }
}

fn login_cookie(state: &AppState, jar: CookieJar, user: &UserProfile) -> Result<CookieJar> {
    let token = state.auth.tokens.sign(user)?;
    Ok(jar.add(session_cookie(token, state.config.production)))
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Registered and logged in", body = UserResponse),
        (status = 400, description = "Validation failed", body = crate::error::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::error::ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidJson(request): ValidJson<RegisterRequest>,
) -> Result<(CookieJar, UserResponse)> {
    if state.store.find_user_by_email(&request.email).await?.is_some() {
        return Err(AppError::EmailTaken);
    }
    let user = state
        .store
        .insert_user(NewUser {
            name: request.name,
            email: request.email,
            password_hash: hash_password(&request.password)?,
            role: UserRole::User,
        })
        .await
        .map_err(email_conflict)?
        .profile();

    info!(user_id = %user.id, "user registered");
    let jar = login_cookie(&state, jar, &user)?;
    Ok((jar, UserResponse::new(user).with_message("User registered successfully")))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in; sets the auth-token cookie", body = UserResponse),
        (status = 401, description = "Wrong email or password", body = crate::error::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidJson(request): ValidJson<LoginRequest>,
) -> Result<(CookieJar, UserResponse)> {
    let user = state
        .store
        .find_user_by_email(&request.email)
        .await?
        .filter(|u| verify_password(&request.password, &u.password_hash))
        .ok_or(AuthError::InvalidCredentials)?
        .profile();

    let jar = login_cookie(&state, jar, &user)?;
    Ok((jar, UserResponse::new(user).with_message("Login successful")))
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Auth",
    responses((status = 200, description = "Cookie cleared", body = MessageResponse))
)]
pub async fn logout(jar: CookieJar) -> (CookieJar, MessageResponse) {
    (jar.remove(clear_session_cookie()), MessageResponse::new("Logged out successfully"))
}

#[utoipa::path(
    get,
    path = "/api/auth/profile",
    tag = "Auth",
    security(("bearerAuth" = []), ("cookieAuth" = [])),
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse)
    )
)]
pub async fn profile(SessionUser(user): SessionUser) -> UserResponse {
    UserResponse::new(user)
}

#[utoipa::path(
    put,
    path = "/api/auth/profile",
    tag = "Auth",
    request_body = UpdateProfileRequest,
    security(("bearerAuth" = []), ("cookieAuth" = [])),
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 400, description = "Validation failed", body = crate::error::ErrorResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 409, description = "Email belongs to another user", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_profile(
    State(state): State<AppState>,
    SessionUser(user): SessionUser,
    ValidJson(request): ValidJson<UpdateProfileRequest>,
) -> Result<UserResponse> {
    let updated = state
        .store
        .update_user_profile(user.id, &request.name, &request.email)
        .await
        .map_err(email_conflict)?
        .ok_or(AuthError::InvalidToken)?;
    Ok(UserResponse::new(updated.profile()))
}

/// Mint a bearer token for API clients.
#[utoipa::path(
    get,
    path = "/api/auth/token",
    tag = "Auth",
    security(("bearerAuth" = []), ("cookieAuth" = [])),
    responses(
        (status = 200, description = "New access token", body = crate::http::response::AccessTokenResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse)
    )
)]
pub async fn token(State(state): State<AppState>, SessionUser(user): SessionUser) -> Result<ApiResponse<AccessToken>> {
    let access_token = state.auth.tokens.sign(&user)?;
    let base_url = state
        .config
        .public_base_url
        .clone()
        .unwrap_or_else(|| format!("http://localhost:{}", state.config.port));
    let header_value = format!("Bearer {access_token}");
    let usage = TokenUsage {
        header_name: "Authorization".to_string(),
        example: format!("curl -H \"Authorization: {header_value}\" {base_url}/api/products"),
        header_value,
    };
    Ok(ApiResponse::ok(AccessToken { access_token, user, usage }))
}
