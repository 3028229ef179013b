//! Star ratings keyed by client identity
//!
//! A client holds at most one rating per movie. Voting again overwrites the
//! star in place; the storage-level unique index on `(ip, movie_id)` plus a
//! single upsert statement keep concurrent votes from producing duplicates.

use super::parse_id;
use crate::db::models::Rating;
use crate::db::Repository;
use crate::errors::{AppError, Result};
use crate::metrics;
use serde::{Deserialize, Serialize};

/// Longest client identity accepted as a rating key, in bytes.
///
/// Forwarded values are otherwise opaque; this bound keeps the `(ip, movie_id)`
/// index entry within Postgres btree limits.
pub const MAX_IDENTITY_LEN: usize = 1024;

/// Submitted rating form; fields arrive as text and are parsed here
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RatingForm {
    #[serde(default)]
    pub movie: String,

    #[serde(default)]
    pub star: String,
}

/// Aggregate shown next to a movie
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingSummary {
    pub votes: u64,
    /// Mean star value, absent without votes
    pub average: Option<f64>,
}

#[derive(Clone)]
pub struct RatingService {
    repo: Repository,
}

impl RatingService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Store or overwrite the rating of `identity` for the submitted movie.
    ///
    /// Nothing is written unless both ids parse and reference a published
    /// movie and an existing star.
    pub async fn submit(&self, identity: &str, form: &RatingForm) -> Result<Rating> {
        let movie_id = parse_id("movie", &form.movie)?;
        let star_id = parse_id("star", &form.star)?;

        if identity.len() > MAX_IDENTITY_LEN {
            return Err(AppError::Validation {
                message: format!("client identity exceeds {} bytes", MAX_IDENTITY_LEN),
                field: None,
            });
        }

        self.repo
            .find_published_movie(movie_id)
            .await?
            .ok_or_else(|| AppError::invalid_field("movie", "unknown movie"))?;

        self.repo
            .find_star_by_id(star_id)
            .await?
            .ok_or_else(|| AppError::invalid_field("star", "unknown star"))?;

        let rating = self.repo.upsert_rating(identity, movie_id, star_id).await?;

        metrics::record_rating();
        tracing::info!(
            rating_id = rating.id,
            movie_id,
            star_id,
            client = %identity,
            "Rating stored"
        );

        Ok(rating)
    }

    pub async fn summary(&self, movie_id: i32) -> Result<RatingSummary> {
        let values = self.repo.star_values_for_movie(movie_id).await?;
        Ok(summarize(&values))
    }
}

fn summarize(values: &[i32]) -> RatingSummary {
    let votes = values.len() as u64;
    let average = if values.is_empty() {
        None
    } else {
        let total: i64 = values.iter().map(|&v| i64::from(v)).sum();
        Some(total as f64 / values.len() as f64)
    };

    RatingSummary { votes, average }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing;
    use axum::http::StatusCode;
    use futures::future::join_all;
    use tokio_test::assert_ok;

    fn form(movie: i32, star: i32) -> RatingForm {
        RatingForm {
            movie: movie.to_string(),
            star: star.to_string(),
        }
    }

    #[tokio::test]
    async fn test_same_vote_twice_keeps_one_row() {
        let fx = testing::seeded().await;
        let service = RatingService::new(fx.repo.clone());
        let star = fx.stars[3].id;

        let first = assert_ok!(service.submit("1.2.3.4", &form(fx.m1.id, star)).await);
        let second = assert_ok!(service.submit("1.2.3.4", &form(fx.m1.id, star)).await);

        assert_eq!(first.id, second.id);
        assert_eq!(second.star_id, star);
        assert_eq!(fx.repo.count_ratings_for_movie(fx.m1.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_second_vote_overwrites_star() {
        let fx = testing::seeded().await;
        let service = RatingService::new(fx.repo.clone());

        service.submit("1.2.3.4", &form(fx.m1.id, fx.stars[0].id)).await.unwrap();
        let updated = service
            .submit("1.2.3.4", &form(fx.m1.id, fx.stars[4].id))
            .await
            .unwrap();

        assert_eq!(updated.star_id, fx.stars[4].id);
        assert_eq!(fx.repo.count_ratings_for_movie(fx.m1.id).await.unwrap(), 1);

        let stored = fx.repo.find_rating("1.2.3.4", fx.m1.id).await.unwrap().unwrap();
        assert_eq!(stored.star_id, fx.stars[4].id);
    }

    #[tokio::test]
    async fn test_clients_vote_independently() {
        let fx = testing::seeded().await;
        let service = RatingService::new(fx.repo.clone());

        let a = service.submit("10.0.0.1", &form(fx.m2.id, fx.stars[1].id)).await.unwrap();
        let b = service.submit("10.0.0.2", &form(fx.m2.id, fx.stars[2].id)).await.unwrap();

        assert_ne!(a.id, b.id);
        assert_eq!(fx.repo.count_ratings_for_movie(fx.m2.id).await.unwrap(), 2);

        let summary = service.summary(fx.m2.id).await.unwrap();
        assert_eq!(summary.votes, 2);
        assert_eq!(summary.average, Some(2.5));
    }

    #[tokio::test]
    async fn test_invalid_forms_write_nothing() {
        let fx = testing::seeded().await;
        let service = RatingService::new(fx.repo.clone());

        let cases = [
            RatingForm { movie: fx.m1.id.to_string(), star: "five".into() },
            RatingForm { movie: fx.m1.id.to_string(), star: String::new() },
            RatingForm { movie: "x".into(), star: fx.stars[0].id.to_string() },
            form(fx.m1.id, 999),
            form(999, fx.stars[0].id),
            form(fx.hidden.id, fx.stars[0].id),
        ];

        for case in cases {
            let err = service.submit("1.2.3.4", &case).await.unwrap_err();
            assert_eq!(err.status_code(), StatusCode::BAD_REQUEST, "form {:?}", case);
        }

        assert_eq!(fx.repo.count_ratings_for_movie(fx.m1.id).await.unwrap(), 0);
        assert_eq!(fx.repo.count_ratings_for_movie(fx.hidden.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_long_identity_is_stored_or_rejected() {
        let fx = testing::seeded().await;
        let service = RatingService::new(fx.repo.clone());

        let long = format!("client-{}", "a".repeat(300));
        assert_ok!(service.submit(&long, &form(fx.m1.id, fx.stars[0].id)).await);
        let stored = fx.repo.find_rating(&long, fx.m1.id).await.unwrap().unwrap();
        assert_eq!(stored.ip, long);

        let oversized = "b".repeat(MAX_IDENTITY_LEN + 1);
        let err = service
            .submit(&oversized, &form(fx.m2.id, fx.stars[0].id))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(fx.repo.count_ratings_for_movie(fx.m2.id).await.unwrap(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_votes_converge() {
        let dir = tempfile::tempdir().unwrap();
        let fx = testing::seeded_on_disk(dir.path()).await;
        let service = RatingService::new(fx.repo.clone());

        // Every star twice, each vote on its own task and pooled connection
        let votes = fx.stars.iter().chain(fx.stars.iter()).map(|star| {
            let service = service.clone();
            let form = form(fx.m3.id, star.id);
            tokio::spawn(async move { service.submit("7.7.7.7", &form).await })
        });

        let mut chosen = Vec::new();
        for joined in join_all(votes).await {
            let rating = assert_ok!(joined.unwrap());
            chosen.push(rating.star_id);
        }

        assert_eq!(fx.repo.count_ratings_for_movie(fx.m3.id).await.unwrap(), 1);
        let stored = fx.repo.find_rating("7.7.7.7", fx.m3.id).await.unwrap().unwrap();
        assert!(chosen.contains(&stored.star_id));
    }

    #[test]
    fn test_summarize_empty() {
        assert_eq!(
            summarize(&[]),
            RatingSummary {
                votes: 0,
                average: None
            }
        );
    }
}
