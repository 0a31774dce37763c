use std::collections::HashSet;

use axum::http::{header, HeaderMap, Method};

use super::AuthError;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Legacy static key allow-list.
#[derive(Debug, Clone, Default)]
pub struct ApiKeyValidator {
    keys: HashSet<String>,
}

impl ApiKeyValidator {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { keys: keys.into_iter().map(Into::into).collect() }
    }

    pub fn validate(&self, headers: &HeaderMap) -> Result<(), AuthError> {
        let key = headers
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .ok_or(AuthError::MissingApiKey)?;
        if self.keys.contains(key) { Ok(()) } else { Err(AuthError::InvalidApiKey) }
    }
}

/// Writes authenticated by API key must send `Content-Type: application/json`.
pub fn require_json_body(method: &Method, headers: &HeaderMap) -> Result<(), AuthError> {
    if !matches!(*method, Method::POST | Method::PUT | Method::PATCH) {
        return Ok(());
    }
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingContentType)?;
    let mime = content_type.split(';').next().unwrap_or_default().trim();
    if mime.eq_ignore_ascii_case("application/json") { Ok(()) } else { Err(AuthError::InvalidContentType) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(v));
        }
        map
    }

    #[test]
    fn test_key_validation() {
        let validator = ApiKeyValidator::new(["student-demo-key"]);
        assert_eq!(validator.validate(&HeaderMap::new()), Err(AuthError::MissingApiKey));
        assert_eq!(validator.validate(&headers(&[("x-api-key", "nope")])), Err(AuthError::InvalidApiKey));
        assert!(validator.validate(&headers(&[("x-api-key", "student-demo-key")])).is_ok());
    }

    #[test]
    fn test_content_type_guard() {
        assert!(require_json_body(&Method::GET, &HeaderMap::new()).is_ok());
        assert_eq!(require_json_body(&Method::POST, &HeaderMap::new()), Err(AuthError::MissingContentType));
        assert_eq!(
            require_json_body(&Method::PUT, &headers(&[("content-type", "text/plain")])),
            Err(AuthError::InvalidContentType)
        );
        assert!(require_json_body(&Method::PATCH, &headers(&[("content-type", "application/json; charset=utf-8")])).is_ok());
    }
}
