//! Authentication.
//!
//! Requests authenticate through an ordered chain:
//!
//! 1. a signed token from the `auth-token` cookie or the `Authorization:
//!    Bearer` header, resolved to a stored user;
//! 2. failing that, a legacy `X-API-Key` from the configured allow-list,
//!    which resolves no identity. Writes made with a key must declare a
//!    JSON body.
//!
//! When both fail the token error is reported.

mod api_key;
mod extract;
mod password;
mod token;

pub use api_key::{require_json_body, ApiKeyValidator, API_KEY_HEADER};
pub use extract::{clear_session_cookie, session_cookie, AdminUser, Authenticated, RequireUser, SessionUser, AUTH_COOKIE};
pub use password::{hash_password, verify_password};
pub use token::{Claims, TokenService, TOKEN_TTL_DAYS};

use axum::http::{header, request::Parts, HeaderMap, StatusCode};
use axum_extra::extract::cookie::CookieJar;
use thiserror::Error;
use tracing::debug;

use crate::domain::{OrderScope, UserProfile};
use crate::error::{AppError, Result};
use crate::store::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Authentication required")]
    MissingAuth,
    #[error("Invalid or expired token")]
    InvalidToken,
    #[error("API key required")]
    MissingApiKey,
    #[error("Invalid API key")]
    InvalidApiKey,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Content-Type header is required")]
    MissingContentType,
    #[error("Content-Type must be application/json")]
    InvalidContentType,
    #[error("Admin access required")]
    AdminRequired,
}

impl AuthError {
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingAuth => "MISSING_AUTH",
            AuthError::InvalidToken => "INVALID_TOKEN",
            AuthError::MissingApiKey => "MISSING_API_KEY",
            AuthError::InvalidApiKey => "INVALID_API_KEY",
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::MissingContentType => "MISSING_CONTENT_TYPE",
            AuthError::InvalidContentType => "INVALID_CONTENT_TYPE",
            AuthError::AdminRequired => "ADMIN_REQUIRED",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::MissingContentType => StatusCode::BAD_REQUEST,
            AuthError::InvalidContentType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AuthError::AdminRequired => StatusCode::FORBIDDEN,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

/// Who is calling.
#[derive(Debug, Clone, PartialEq)]
pub enum Principal {
    User(UserProfile),
    /// Authenticated by a legacy API key; no identity attached.
    ApiKey,
}

impl Principal {
    pub fn user(&self) -> Option<&UserProfile> {
        match self {
            Principal::User(user) => Some(user),
            Principal::ApiKey => None,
        }
    }

    pub fn into_user(self) -> Option<UserProfile> {
        match self {
            Principal::User(user) => Some(user),
            Principal::ApiKey => None,
        }
    }

    /// Orders this caller may read or cancel. Key callers are unscoped.
    pub fn order_scope(&self) -> OrderScope {
        self.user().map_or(OrderScope::All, OrderScope::for_user)
    }
}

pub struct Authenticator {
    pub tokens: TokenService,
    pub api_keys: ApiKeyValidator,
}

impl Authenticator {
    pub fn new(tokens: TokenService, api_keys: ApiKeyValidator) -> Self {
        Self { tokens, api_keys }
    }

    /// Runs the full chain for a request.
    pub async fn authenticate(&self, store: &dyn Store, parts: &Parts) -> Result<Principal> {
        let token_error = match self.resolve_token(store, &parts.headers).await {
            Ok(user) => return Ok(Principal::User(user)),
            Err(AppError::Auth(e)) => e,
            Err(other) => return Err(other),
        };

        match self.api_keys.validate(&parts.headers) {
            Ok(()) => {
                require_json_body(&parts.method, &parts.headers)?;
                Ok(Principal::ApiKey)
            }
            Err(key_error) => {
                debug!(token = token_error.code(), api_key = key_error.code(), "request not authenticated");
                Err(token_error.into())
            }
        }
    }

    /// Token step of the chain: cookie first, then the bearer header.
    pub async fn resolve_token(&self, store: &dyn Store, headers: &HeaderMap) -> Result<UserProfile> {
        let jar = CookieJar::from_headers(headers);
        if let Some(cookie) = jar.get(AUTH_COOKIE) {
            match self.lookup(store, cookie.value()).await {
                Ok(user) => return Ok(user),
                Err(AppError::Auth(e)) => debug!(error = e.code(), "session cookie rejected"),
                Err(other) => return Err(other),
            }
        }

        let bearer = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingAuth)?;
        self.lookup(store, bearer).await
    }

    async fn lookup(&self, store: &dyn Store, token: &str) -> Result<UserProfile> {
        let claims = self.tokens.verify(token)?;
        let user = store.find_user(claims.user_id).await?.ok_or(AuthError::InvalidToken)?;
        Ok(user.profile())
    }
}
