//! Back-office authentication
//!
//! Provides:
//! - API key hashing and validation
//! - Bearer token parsing
//! - Editor context extraction

use crate::errors::{AppError, Result};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Configured editor key hash, pulled from application state
#[derive(Debug, Clone, Default)]
pub struct AdminKey(pub Option<String>);

impl AdminKey {
    pub fn new(hash: Option<String>) -> Self {
        Self(hash.map(|h| h.trim().to_lowercase()).filter(|h| !h.is_empty()))
    }
}

/// Authenticated editor, available to back-office handlers
#[derive(Debug, Clone)]
pub struct AdminContext {
    /// Request ID for tracing
    pub request_id: Option<String>,
}

impl AdminContext {
    /// Span for one back-office operation, tagged with the request ID
    pub fn span(&self, operation: &'static str) -> tracing::Span {
        tracing::info_span!(
            "admin",
            operation,
            request_id = self.request_id.as_deref().unwrap_or("-"),
        )
    }
}

/// Hash an API key for storage
pub fn hash_api_key(api_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(api_key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Validate an API key against a stored hash in constant time
pub fn validate_api_key(api_key: &str, stored_hash: &str) -> bool {
    let stored = stored_hash.to_ascii_lowercase();
    hash_api_key(api_key).as_bytes().ct_eq(stored.as_bytes()).into()
}

/// Extract API key from Authorization header
pub fn extract_api_key(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|key| !key.is_empty())
}

/// Axum extractor for AdminContext
impl<S> FromRequestParts<S> for AdminContext
where
    AdminKey: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        let AdminKey(stored) = AdminKey::from_ref(state);

        let stored = stored.ok_or_else(|| AppError::Forbidden {
            message: "Back-office is disabled".to_string(),
        })?;

        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized {
                message: "Missing Authorization header".to_string(),
            })?;

        let api_key = extract_api_key(auth_header).ok_or(AppError::InvalidApiKey)?;

        if !validate_api_key(api_key, &stored) {
            return Err(AppError::InvalidApiKey);
        }

        let request_id = parts
            .headers
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        Ok(AdminContext { request_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Request, StatusCode};

    async fn extract(key: AdminKey, auth: Option<&str>) -> Result<AdminContext> {
        extract_with_id(key, auth, None).await
    }

    async fn extract_with_id(
        key: AdminKey,
        auth: Option<&str>,
        request_id: Option<&str>,
    ) -> Result<AdminContext> {
        let mut builder = Request::builder().uri("/admin/movies");
        if let Some(id) = request_id {
            builder = builder.header("x-request-id", id);
        }
        if let Some(auth) = auth {
            builder = builder.header("authorization", auth);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        AdminContext::from_request_parts(&mut parts, &key).await
    }

    #[test]
    fn test_hash_api_key() {
        let key = "editor-secret";
        let hash = hash_api_key(key);
        assert_eq!(hash.len(), 64);
        assert!(validate_api_key(key, &hash));
        assert!(validate_api_key(key, &hash.to_uppercase()));
        assert!(!validate_api_key("wrong_key", &hash));
        assert!(!validate_api_key(key, &hash[..63]));
        assert!(!validate_api_key(key, ""));
    }

    #[test]
    fn test_extract_api_key() {
        assert_eq!(extract_api_key("Bearer abc123"), Some("abc123"));
        assert_eq!(extract_api_key("abc123"), None);
        assert_eq!(extract_api_key("Basic abc"), None);
        assert_eq!(extract_api_key("Bearer   "), None);
    }

    #[test]
    fn test_blank_hash_disables_back_office() {
        assert!(AdminKey::new(Some("  ".into())).0.is_none());
        assert!(AdminKey::new(None).0.is_none());
    }

    #[tokio::test]
    async fn test_extractor_accepts_matching_key() {
        let key = AdminKey::new(Some(hash_api_key("editor-secret")));
        let ctx = extract(key, Some("Bearer editor-secret")).await.unwrap();
        assert!(ctx.request_id.is_none());
    }

    #[tokio::test]
    async fn test_extractor_carries_request_id() {
        let key = AdminKey::new(Some(hash_api_key("editor-secret")));
        let ctx = extract_with_id(key, Some("Bearer editor-secret"), Some("req-42"))
            .await
            .unwrap();
        assert_eq!(ctx.request_id.as_deref(), Some("req-42"));
    }

    #[tokio::test]
    async fn test_extractor_rejections() {
        let key = AdminKey::new(Some(hash_api_key("editor-secret")));

        let err = extract(key.clone(), None).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);

        let err = extract(key, Some("Bearer nope")).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);

        let err = extract(AdminKey::default(), Some("Bearer editor-secret"))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }
}
