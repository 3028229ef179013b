//! Editor back-office operations
//!
//! Every operation checks the [`AdminRegistry`] first: filters, searches,
//! inline edits and bulk actions are only honoured when the model registers
//! them.

use super::catalog::{CatalogService, Page};
use crate::admin::{AdminRegistry, BulkAction, InlineAdmin, ModelAdmin};
use crate::db::models::*;
use crate::db::{MovieFilterQuery, Repository};
use crate::errors::{AppError, Result};
use crate::metrics;
use chrono::NaiveDate;
use regex_lite::Regex;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};
use validator::{Validate, ValidationError};

/// Rows per back-office list page
pub const ADMIN_PAGE_SIZE: u64 = 100;

fn slug_pattern() -> &'static Regex {
    static SLUG: OnceLock<Regex> = OnceLock::new();
    SLUG.get_or_init(|| Regex::new(r"^[-a-zA-Z0-9_]+$").expect("valid slug pattern"))
}

fn validate_slug(slug: &str) -> std::result::Result<(), ValidationError> {
    if slug.len() <= 130 && slug_pattern().is_match(slug) {
        Ok(())
    } else {
        Err(ValidationError::new("slug")
            .with_message("Use only letters, numbers, underscores or hyphens.".into()))
    }
}

/// Back-office movie list query
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MovieListQuery {
    pub category: Option<i32>,
    pub year: Option<i32>,
    pub q: Option<String>,
    pub page: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewMovie {
    #[validate(length(min = 1, max = 100))]
    pub title: String,

    #[serde(default)]
    #[validate(length(max = 100))]
    pub tagline: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub poster: String,

    #[validate(range(min = 1888, max = 2100))]
    pub year: i32,

    #[serde(default)]
    #[validate(length(max = 30))]
    pub country: String,

    pub world_premiere: NaiveDate,

    #[serde(default)]
    #[validate(range(min = 0))]
    pub budget: i64,

    #[serde(default)]
    #[validate(range(min = 0))]
    pub fees_in_usa: i64,

    #[serde(default)]
    #[validate(range(min = 0))]
    pub fees_in_world: i64,

    pub category_id: Option<i32>,

    #[serde(default)]
    pub genres: Vec<i32>,

    #[serde(default)]
    pub actors: Vec<i32>,

    #[serde(default)]
    pub directors: Vec<i32>,

    #[validate(custom(function = "validate_slug"))]
    pub url: String,

    #[serde(default)]
    pub draft: bool,
}

/// Category or genre
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewTaxon {
    #[validate(length(min = 1, max = 150))]
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[validate(custom(function = "validate_slug"))]
    pub url: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewActor {
    #[validate(length(min = 1, max = 100))]
    pub name: String,

    #[serde(default)]
    #[validate(range(min = 0, max = 150))]
    pub age: i32,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub image: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewRatingStar {
    #[validate(range(min = 1, max = 100))]
    pub value: i32,

    #[serde(default)]
    #[validate(length(max = 50))]
    pub label: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewShot {
    #[validate(length(min = 1, max = 100))]
    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub image: String,
}

/// Result of a bulk action
#[derive(Debug, Clone, Serialize)]
pub struct ActionReport {
    pub action: BulkAction,
    pub affected: u64,
    pub message: String,
}

/// Inline children of a parent row, with the inline's options
#[derive(Debug, Clone, Serialize)]
pub struct InlineRows<T> {
    pub inline: InlineAdmin,
    pub rows: Vec<T>,
}

#[derive(Clone)]
pub struct AdminService {
    repo: Repository,
    registry: Arc<AdminRegistry>,
}

impl AdminService {
    pub fn new(repo: Repository, registry: Arc<AdminRegistry>) -> Self {
        Self { repo, registry }
    }

    pub fn registry(&self) -> &AdminRegistry {
        &self.registry
    }

    fn movie_admin(&self) -> Result<&ModelAdmin> {
        self.registry.require("movie")
    }

    /// Movies including drafts, narrowed by the registered filters and search
    pub async fn list_movies(&self, query: &MovieListQuery) -> Result<Page<Movie>> {
        let admin = self.movie_admin()?;

        let mut filter = MovieFilterQuery {
            include_drafts: true,
            ..Default::default()
        };

        if let Some(category) = query.category {
            require_filter(admin, "category")?;
            filter.category_id = Some(category);
        }

        if let Some(year) = query.year {
            require_filter(admin, "year")?;
            filter.year = Some(year);
        }

        if let Some(q) = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            match (admin.is_searchable("title"), admin.is_searchable("category__name")) {
                (true, true) => filter.search = Some(q.to_string()),
                (true, false) => filter.title_contains = Some(q.to_string()),
                _ => return Err(AppError::invalid_field("q", "search is not enabled")),
            }
        }

        CatalogService::paginate_query(&self.repo, &filter, query.page.as_deref(), ADMIN_PAGE_SIZE)
            .await
    }

    pub async fn create_movie(&self, input: NewMovie) -> Result<Movie> {
        input.validate()?;

        let movie = MovieActiveModel {
            title: Set(input.title),
            tagline: Set(input.tagline),
            description: Set(input.description),
            poster: Set(input.poster),
            year: Set(input.year),
            country: Set(input.country),
            world_premiere: Set(input.world_premiere),
            budget: Set(input.budget),
            fees_in_usa: Set(input.fees_in_usa),
            fees_in_world: Set(input.fees_in_world),
            category_id: Set(input.category_id),
            url: Set(input.url),
            draft: Set(input.draft),
            ..Default::default()
        };

        let movie = self
            .repo
            .create_movie(movie, &input.genres, &input.actors, &input.directors)
            .await?;

        self.applied("create_movie", movie.id);
        Ok(movie)
    }

    pub async fn create_category(&self, input: NewTaxon) -> Result<Category> {
        input.validate()?;

        let category = self
            .repo
            .create_category(CategoryActiveModel {
                name: Set(input.name),
                description: Set(input.description),
                url: Set(input.url),
                ..Default::default()
            })
            .await?;

        self.applied("create_category", category.id);
        Ok(category)
    }

    pub async fn create_genre(&self, input: NewTaxon) -> Result<Genre> {
        input.validate()?;

        let genre = self
            .repo
            .create_genre(GenreActiveModel {
                name: Set(input.name),
                description: Set(input.description),
                url: Set(input.url),
                ..Default::default()
            })
            .await?;

        self.applied("create_genre", genre.id);
        Ok(genre)
    }

    pub async fn create_actor(&self, input: NewActor) -> Result<Actor> {
        input.validate()?;

        let actor = self
            .repo
            .create_actor(ActorActiveModel {
                name: Set(input.name),
                age: Set(input.age),
                description: Set(input.description),
                image: Set(input.image),
                ..Default::default()
            })
            .await?;

        self.applied("create_actor", actor.id);
        Ok(actor)
    }

    pub async fn create_star(&self, input: NewRatingStar) -> Result<RatingStar> {
        input.validate()?;

        let star = self
            .repo
            .create_star(RatingStarActiveModel {
                value: Set(input.value),
                label: Set(input.label),
                ..Default::default()
            })
            .await?;

        self.applied("create_rating_star", star.id);
        Ok(star)
    }

    pub async fn create_shot(&self, movie_id: i32, input: NewShot) -> Result<MovieShot> {
        self.require_movie(movie_id).await?;
        input.validate()?;

        let shot = self
            .repo
            .create_shot(MovieShotActiveModel {
                title: Set(input.title),
                description: Set(input.description),
                image: Set(input.image),
                movie_id: Set(movie_id),
                ..Default::default()
            })
            .await?;

        self.applied("create_movie_shot", shot.id);
        Ok(shot)
    }

    /// Edit list-editable fields of one movie
    pub async fn edit_movie(
        &self,
        movie_id: i32,
        changes: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<Movie> {
        self.movie_admin()?
            .require_editable(changes.keys().map(String::as_str))?;

        self.require_movie(movie_id).await?;

        if let Some(value) = changes.get("draft") {
            let draft = value
                .as_bool()
                .ok_or_else(|| AppError::invalid_field("draft", "must be true or false"))?;
            self.repo.set_movies_draft(&[movie_id], draft).await?;
        }

        self.applied("edit_movie", movie_id);
        self.require_movie(movie_id).await
    }

    /// Apply a registered bulk action to the selected movies
    pub async fn apply_action(&self, action: &str, ids: &[i32]) -> Result<ActionReport> {
        let action: BulkAction = action.parse()?;
        self.movie_admin()?.require_action(action)?;

        if ids.is_empty() {
            return Err(AppError::invalid_field(
                "ids",
                "select at least one movie to apply the action to",
            ));
        }

        let affected = self.repo.set_movies_draft(ids, action.draft_value()).await?;

        metrics::record_admin_action(action.as_str());
        tracing::info!(action = action.as_str(), selected = ids.len(), affected, "Bulk action applied");

        Ok(ActionReport {
            action,
            affected,
            message: action.message(affected),
        })
    }

    /// Reviews of a movie as its registered review inline
    pub async fn movie_reviews(&self, movie_id: i32) -> Result<InlineRows<Review>> {
        let inline = self
            .movie_admin()?
            .inline_for("review")
            .cloned()
            .ok_or_else(|| AppError::NotFound {
                resource_type: "inline".to_string(),
                id: "movie.review".to_string(),
            })?;

        self.require_movie(movie_id).await?;
        let rows = self.repo.reviews_for_movie(movie_id).await?;

        Ok(InlineRows { inline, rows })
    }

    /// Remove a review; its replies stay as top-level reviews
    pub async fn delete_review(&self, review_id: i32) -> Result<()> {
        if !self.repo.delete_review(review_id).await? {
            return Err(AppError::ReviewNotFound {
                id: review_id.to_string(),
            });
        }

        self.applied("delete_review", review_id);
        Ok(())
    }

    async fn require_movie(&self, movie_id: i32) -> Result<Movie> {
        self.repo
            .find_movie_by_id(movie_id)
            .await?
            .ok_or_else(|| AppError::MovieNotFound {
                id: movie_id.to_string(),
            })
    }

    fn applied(&self, action: &str, id: i32) {
        metrics::record_admin_action(action);
        tracing::info!(action, id, "Back-office change applied");
    }
}

fn require_filter(admin: &ModelAdmin, field: &str) -> Result<()> {
    if admin.is_filterable(field) {
        Ok(())
    } else {
        Err(AppError::invalid_field(field, "filter is not enabled"))
    }
}
