//! Star rating handler

use axum::{
    extract::{rejection::FormRejection, State},
    http::StatusCode,
    Form,
};

use crate::AppState;
use cinema_common::{
    errors::{AppError, Result},
    identity::ClientIdentity,
    services::{RatingForm, RatingService},
};

/// `POST /rating`: 201 with an empty body once the vote is stored
pub async fn submit_rating(
    State(state): State<AppState>,
    identity: ClientIdentity,
    form: std::result::Result<Form<RatingForm>, FormRejection>,
) -> Result<StatusCode> {
    let Form(form) = form.map_err(|e| AppError::InvalidFormat {
        message: e.body_text(),
    })?;

    RatingService::new(state.repo())
        .submit(identity.as_str(), &form)
        .await?;

    Ok(StatusCode::CREATED)
}
