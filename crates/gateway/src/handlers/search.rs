//! Title search handler

use axum::{extract::State, Json};
use serde::Serialize;

use crate::extract::MultiQuery;
use crate::AppState;
use cinema_common::{
    db::models::Movie,
    errors::Result,
    services::{CatalogService, Page},
};

#[derive(Serialize)]
pub struct SearchResponse {
    #[serde(flatten)]
    pub page: Page<Movie>,
    /// `q=..&` prefix for page links
    pub q: String,
}

/// `GET /search?q=...`
pub async fn search(State(state): State<AppState>, query: MultiQuery) -> Result<Json<SearchResponse>> {
    let q = query.first("q").unwrap_or_default();

    let page = CatalogService::new(state.repo(), state.config.catalog.clone())
        .search(q, query.first("page"))
        .await?;

    let echo = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("q", q)
        .finish();

    Ok(Json(SearchResponse {
        page,
        q: format!("{}&", echo),
    }))
}
