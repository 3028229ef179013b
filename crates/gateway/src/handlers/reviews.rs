//! Review submission and reply listing handlers

use axum::{
    extract::{rejection::FormRejection, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Form, Json,
};

use crate::AppState;
use cinema_common::{
    db::models::Review,
    errors::{AppError, Result},
    services::{ReviewForm, ReviewService},
};

/// `POST /movie/{id}/review`: store a review, then redirect to the movie page
pub async fn submit_review(
    State(state): State<AppState>,
    Path(movie_id): Path<String>,
    form: std::result::Result<Form<ReviewForm>, FormRejection>,
) -> Result<impl IntoResponse> {
    let movie_id: i32 = movie_id
        .parse()
        .map_err(|_| AppError::MovieNotFound { id: movie_id.clone() })?;

    let Form(form) = form.map_err(|e| AppError::InvalidFormat {
        message: e.body_text(),
    })?;

    let outcome = ReviewService::new(state.repo()).submit(movie_id, &form).await?;

    Ok((StatusCode::FOUND, [(header::LOCATION, outcome.redirect_to)]))
}

/// `GET /reviews/{id}/replies`: direct replies to a review
pub async fn replies(
    State(state): State<AppState>,
    Path(review_id): Path<String>,
) -> Result<Json<Vec<Review>>> {
    let review_id: i32 = review_id
        .parse()
        .map_err(|_| AppError::ReviewNotFound { id: review_id.clone() })?;

    Ok(Json(ReviewService::new(state.repo()).replies_to(review_id).await?))
}
