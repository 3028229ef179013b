//! Threaded reviews
//!
//! Reviews are append-only. A reply points at an earlier review of the same
//! movie, so the replies of a movie always form a forest.

use crate::db::models::{Review, ReviewActiveModel};
use crate::db::Repository;
use crate::errors::{AppError, Result};
use crate::metrics;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use validator::{Validate, ValidationError, ValidationErrors};

/// Submitted review form
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ReviewForm {
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "Enter your name (up to 100 characters)."))]
    pub name: String,

    #[serde(default)]
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 1, max = 5000, message = "Write a review (up to 5000 characters)."))]
    pub text: String,

    /// Id of the review being answered; blank for a top-level review
    #[serde(default)]
    pub parent: Option<String>,
}

impl ReviewForm {
    fn trimmed(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            text: self.text.trim().to_string(),
            parent: self
                .parent
                .as_deref()
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(String::from),
        }
    }
}

/// Stored review and where the client goes next
#[derive(Debug, Clone)]
pub struct ReviewOutcome {
    pub review: Review,
    pub redirect_to: String,
}

/// A review with its nested replies
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewThread {
    pub review: Review,
    pub replies: Vec<ReviewThread>,
}

#[derive(Clone)]
pub struct ReviewService {
    repo: Repository,
}

impl ReviewService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Validate and store a review for a published movie.
    pub async fn submit(&self, movie_id: i32, form: &ReviewForm) -> Result<ReviewOutcome> {
        let movie = self
            .repo
            .find_published_movie(movie_id)
            .await?
            .ok_or_else(|| AppError::MovieNotFound {
                id: movie_id.to_string(),
            })?;

        let form = form.trimmed();
        let mut errors = match form.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };

        let parent_id = match form.parent.as_deref() {
            None => None,
            Some(raw) => match self.resolve_parent(movie_id, raw).await? {
                Some(id) => Some(id),
                None => {
                    errors.add(
                        "parent",
                        ValidationError::new("invalid_choice")
                            .with_message("Select a review of this movie to reply to.".into()),
                    );
                    None
                }
            },
        };

        if !errors.is_empty() {
            return Err(AppError::InvalidForm(errors));
        }

        let review = self
            .repo
            .create_review(ReviewActiveModel {
                name: Set(form.name),
                email: Set(form.email),
                text: Set(form.text),
                parent_id: Set(parent_id),
                movie_id: Set(movie.id),
                created_at: Set(chrono::Utc::now()),
                ..Default::default()
            })
            .await?;

        metrics::record_review(review.is_reply());
        tracing::info!(
            review_id = review.id,
            movie_id = movie.id,
            parent_id = ?review.parent_id,
            "Review stored"
        );

        Ok(ReviewOutcome {
            review,
            redirect_to: movie.absolute_url(),
        })
    }

    /// Parent id if `raw` names an existing review on the same movie
    async fn resolve_parent(&self, movie_id: i32, raw: &str) -> Result<Option<i32>> {
        let Ok(parent_id) = raw.parse::<i32>() else {
            return Ok(None);
        };

        let parent = self.repo.find_review_by_id(parent_id).await?;
        Ok(parent.filter(|p| p.movie_id == movie_id).map(|p| p.id))
    }

    /// Direct replies to an existing review
    pub async fn replies_to(&self, review_id: i32) -> Result<Vec<Review>> {
        self.repo
            .find_review_by_id(review_id)
            .await?
            .ok_or_else(|| AppError::ReviewNotFound {
                id: review_id.to_string(),
            })?;

        self.repo.replies_to(review_id).await
    }

    /// All reviews of a movie arranged as reply trees
    pub async fn threads(&self, movie_id: i32) -> Result<Vec<ReviewThread>> {
        let reviews = self.repo.reviews_for_movie(movie_id).await?;
        Ok(build_threads(reviews))
    }
}

/// Arrange reviews (ordered by id) into trees. A review whose parent is not
/// among `reviews` becomes a root.
pub fn build_threads(reviews: Vec<Review>) -> Vec<ReviewThread> {
    let ids: HashSet<i32> = reviews.iter().map(|r| r.id).collect();

    let mut children: HashMap<i32, Vec<Review>> = HashMap::new();
    let mut roots = Vec::new();

    for review in reviews {
        match review.parent_id {
            Some(parent) if ids.contains(&parent) => children.entry(parent).or_default().push(review),
            _ => roots.push(review),
        }
    }

    roots
        .into_iter()
        .map(|root| attach(root, &mut children))
        .collect()
}

fn attach(review: Review, children: &mut HashMap<i32, Vec<Review>>) -> ReviewThread {
    let replies = children
        .remove(&review.id)
        .unwrap_or_default()
        .into_iter()
        .map(|child| attach(child, children))
        .collect();

    ReviewThread { review, replies }
}
