//! Application services
//!
//! Each service owns a [`Repository`](crate::db::Repository) handle and holds
//! the rules for one area of the catalog. Handlers stay thin and only translate
//! HTTP input into service calls.

pub mod admin;
pub mod catalog;
pub mod rating;
pub mod review;

#[cfg(test)]
pub(crate) mod testing;

pub use admin::{ActionReport, AdminService, InlineRows, MovieListQuery};
pub use catalog::{ActorDetail, CatalogService, Facets, MovieCard, MovieDetail, Page};
pub use rating::{RatingForm, RatingService, RatingSummary};
pub use review::{ReviewForm, ReviewOutcome, ReviewService, ReviewThread};

use crate::errors::{AppError, Result};

/// Parse a positive integer id submitted as text
pub(crate) fn parse_id(field: &str, raw: &str) -> Result<i32> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(AppError::MissingField {
            field: field.to_string(),
        });
    }

    match raw.parse::<i32>() {
        Ok(id) if id >= 1 => Ok(id),
        Ok(_) => Err(AppError::invalid_field(field, "must be a positive integer")),
        Err(_) => Err(AppError::invalid_field(field, "must be an integer")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("star", " 4 ").unwrap(), 4);

        for raw in ["", "abc", "0", "-2", "1.5"] {
            let err = parse_id("star", raw).unwrap_err();
            assert_eq!(err.status_code(), StatusCode::BAD_REQUEST, "input {:?}", raw);
        }
    }
}
