//! Request extractors over the authentication chain.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::cookie::{Cookie, SameSite};

use super::{AuthError, Principal, TOKEN_TTL_DAYS};
use crate::domain::UserProfile;
use crate::error::AppError;
use crate::state::AppState;

pub const AUTH_COOKIE: &str = "auth-token";

/// Any caller the chain accepts, user or API key.
pub struct Authenticated(pub Principal);

/// A caller with a user identity; key callers are rejected.
pub struct RequireUser(pub UserProfile);

/// A user resolved from the token alone.
pub struct SessionUser(pub UserProfile);

/// An administrator. Rejects before the body is read.
pub struct AdminUser(pub UserProfile);

#[async_trait]
impl FromRequestParts<AppState> for Authenticated {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        state.auth.authenticate(state.store.as_ref(), parts).await.map(Self)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Authenticated(principal) = Authenticated::from_request_parts(parts, state).await?;
        principal.into_user().map(Self).ok_or_else(|| AuthError::MissingAuth.into())
    }
}

#[async_trait]
impl FromRequestParts<AppState> for SessionUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        state.auth.resolve_token(state.store.as_ref(), &parts.headers).await.map(Self)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Authenticated(principal) = Authenticated::from_request_parts(parts, state).await?;
        match principal.into_user() {
            Some(user) if user.is_admin() => Ok(Self(user)),
            _ => Err(AuthError::AdminRequired.into()),
        }
    }
}

/// Session cookie carrying `token`.
pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE, token))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::days(TOKEN_TTL_DAYS))
        .secure(secure)
        .build()
}

/// Removal cookie for the session; the path must match the one it was set with.
pub fn clear_session_cookie() -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE, "")).path("/").build()
}
