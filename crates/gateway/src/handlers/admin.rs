//! Editor back-office handlers
//!
//! Every route requires [`AdminContext`]; the declarative registry decides
//! which filters, edits and bulk actions are accepted.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::Instrument;

use crate::AppState;
use cinema_common::{
    admin::AdminRegistry,
    auth::AdminContext,
    db::models::{Actor, Category, Genre, Movie, MovieShot, RatingStar, Review},
    errors::{AppError, Result},
    services::admin::{NewActor, NewMovie, NewRatingStar, NewShot, NewTaxon},
    services::{ActionReport, AdminService, InlineRows, MovieListQuery, Page},
};

#[derive(Debug, Deserialize)]
pub struct ActionRequest {
    pub action: String,
    #[serde(default)]
    pub ids: Vec<i32>,
}

fn service(state: &AppState) -> AdminService {
    AdminService::new(state.repo(), state.registry.clone())
}

fn body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|e| AppError::InvalidFormat {
            message: e.body_text(),
        })
}

/// `GET /admin/registry`
pub async fn registry(_admin: AdminContext, State(state): State<AppState>) -> Json<AdminRegistry> {
    Json(state.registry.as_ref().clone())
}

/// `GET /admin/movies`
pub async fn list_movies(
    admin: AdminContext,
    State(state): State<AppState>,
    Query(query): Query<MovieListQuery>,
) -> Result<Json<Page<Movie>>> {
    let page = service(&state)
        .list_movies(&query)
        .instrument(admin.span("list_movies"))
        .await?;
    Ok(Json(page))
}

/// `POST /admin/movies`
pub async fn create_movie(
    admin: AdminContext,
    State(state): State<AppState>,
    payload: std::result::Result<Json<NewMovie>, JsonRejection>,
) -> Result<(StatusCode, Json<Movie>)> {
    let movie = service(&state)
        .create_movie(body(payload)?)
        .instrument(admin.span("create_movie"))
        .await?;
    Ok((StatusCode::CREATED, Json(movie)))
}

/// `PATCH /admin/movies/{id}`: list-editable fields only
pub async fn edit_movie(
    admin: AdminContext,
    State(state): State<AppState>,
    Path(movie_id): Path<i32>,
    payload: std::result::Result<Json<serde_json::Map<String, serde_json::Value>>, JsonRejection>,
) -> Result<Json<Movie>> {
    let changes = body(payload)?;
    let movie = service(&state)
        .edit_movie(movie_id, &changes)
        .instrument(admin.span("edit_movie"))
        .await?;
    Ok(Json(movie))
}

/// `POST /admin/movies/actions`
pub async fn apply_action(
    admin: AdminContext,
    State(state): State<AppState>,
    payload: std::result::Result<Json<ActionRequest>, JsonRejection>,
) -> Result<Json<ActionReport>> {
    let request = body(payload)?;
    let report = service(&state)
        .apply_action(&request.action, &request.ids)
        .instrument(admin.span("apply_action"))
        .await?;
    Ok(Json(report))
}

/// `GET /admin/movies/{id}/reviews`
pub async fn movie_reviews(
    admin: AdminContext,
    State(state): State<AppState>,
    Path(movie_id): Path<i32>,
) -> Result<Json<InlineRows<Review>>> {
    let inline = service(&state)
        .movie_reviews(movie_id)
        .instrument(admin.span("movie_reviews"))
        .await?;
    Ok(Json(inline))
}

/// `POST /admin/movies/{id}/shots`
pub async fn create_shot(
    admin: AdminContext,
    State(state): State<AppState>,
    Path(movie_id): Path<i32>,
    payload: std::result::Result<Json<NewShot>, JsonRejection>,
) -> Result<(StatusCode, Json<MovieShot>)> {
    let shot = service(&state)
        .create_shot(movie_id, body(payload)?)
        .instrument(admin.span("create_shot"))
        .await?;
    Ok((StatusCode::CREATED, Json(shot)))
}

/// `DELETE /admin/reviews/{id}`
pub async fn delete_review(
    admin: AdminContext,
    State(state): State<AppState>,
    Path(review_id): Path<i32>,
) -> Result<StatusCode> {
    service(&state)
        .delete_review(review_id)
        .instrument(admin.span("delete_review"))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /admin/categories`
pub async fn create_category(
    admin: AdminContext,
    State(state): State<AppState>,
    payload: std::result::Result<Json<NewTaxon>, JsonRejection>,
) -> Result<(StatusCode, Json<Category>)> {
    let category = service(&state)
        .create_category(body(payload)?)
        .instrument(admin.span("create_category"))
        .await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// `POST /admin/genres`
pub async fn create_genre(
    admin: AdminContext,
    State(state): State<AppState>,
    payload: std::result::Result<Json<NewTaxon>, JsonRejection>,
) -> Result<(StatusCode, Json<Genre>)> {
    let genre = service(&state)
        .create_genre(body(payload)?)
        .instrument(admin.span("create_genre"))
        .await?;
    Ok((StatusCode::CREATED, Json(genre)))
}

/// `POST /admin/actors`
pub async fn create_actor(
    admin: AdminContext,
    State(state): State<AppState>,
    payload: std::result::Result<Json<NewActor>, JsonRejection>,
) -> Result<(StatusCode, Json<Actor>)> {
    let actor = service(&state)
        .create_actor(body(payload)?)
        .instrument(admin.span("create_actor"))
        .await?;
    Ok((StatusCode::CREATED, Json(actor)))
}

/// `POST /admin/rating-stars`
pub async fn create_star(
    admin: AdminContext,
    State(state): State<AppState>,
    payload: std::result::Result<Json<NewRatingStar>, JsonRejection>,
) -> Result<(StatusCode, Json<RatingStar>)> {
    let star = service(&state)
        .create_star(body(payload)?)
        .instrument(admin.span("create_star"))
        .await?;
    Ok((StatusCode::CREATED, Json(star)))
}
