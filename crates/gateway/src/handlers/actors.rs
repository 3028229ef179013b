//! Actor profile handler

use axum::{
    extract::{Path, State},
    Json,
};

use crate::AppState;
use cinema_common::{
    errors::Result,
    services::{ActorDetail, CatalogService},
};

/// `GET /actors/{name}`
pub async fn actor_detail(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ActorDetail>> {
    let detail = CatalogService::new(state.repo(), state.config.catalog.clone())
        .actor_detail(&name)
        .await?;

    Ok(Json(detail))
}
