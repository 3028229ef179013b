//! Request extractors

use axum::{extract::FromRequestParts, http::request::Parts};
use cinema_common::errors::{AppError, Result};

/// Query string that keeps repeated keys (`?year=1999&year=2000`)
#[derive(Debug, Clone, Default)]
pub struct MultiQuery {
    pairs: Vec<(String, String)>,
}

impl MultiQuery {
    pub fn parse(query: &str) -> Self {
        let pairs = url::form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect();
        Self { pairs }
    }

    /// Every value of `key`, in order
    pub fn all(&self, key: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn first(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Every value of `key` as an integer; blank values are skipped
    pub fn ints(&self, key: &str) -> Result<Vec<i32>> {
        self.all(key)
            .into_iter()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| {
                v.parse::<i32>()
                    .map_err(|_| AppError::invalid_field(key, format!("'{}' is not an integer", v)))
            })
            .collect()
    }

    /// `key=value&` for every value of `key`, for building page links
    pub fn echo(&self, key: &str) -> String {
        self.all(key)
            .into_iter()
            .map(|v| {
                url::form_urlencoded::Serializer::new(String::new())
                    .append_pair(key, v)
                    .finish()
                    + "&"
            })
            .collect()
    }
}

impl<S> FromRequestParts<S> for MultiQuery
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        Ok(Self::parse(parts.uri.query().unwrap_or_default()))
    }
}
