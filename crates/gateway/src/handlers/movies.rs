//! Public movie listing, filter and detail handlers

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::extract::MultiQuery;
use crate::AppState;
use cinema_common::{
    db::models::Movie,
    errors::Result,
    services::{CatalogService, Facets, MovieCard, MovieDetail, Page},
};

/// Paginated listing with the filter echoed for page links
#[derive(Serialize)]
pub struct MovieListResponse {
    #[serde(flatten)]
    pub page: Page<Movie>,
    /// `year=..&` pairs of the active filter
    pub year: String,
    /// `genre=..&` pairs of the active filter
    pub genre: String,
}

#[derive(Serialize)]
pub struct MovieCardsResponse {
    pub movies: Vec<MovieCard>,
}

fn catalog(state: &AppState) -> CatalogService {
    CatalogService::new(state.repo(), state.config.catalog.clone())
}

/// `GET /movies`: published movies, narrowed when `year`/`genre` are given
pub async fn list_movies(State(state): State<AppState>, query: MultiQuery) -> Result<Response> {
    let years = query.ints("year")?;
    let genres = query.ints("genre")?;

    if years.is_empty() && genres.is_empty() && query.first("format") != Some("json") {
        let page = catalog(&state).list(query.first("page")).await?;
        return Ok(Json(MovieListResponse {
            page,
            year: String::new(),
            genre: String::new(),
        })
        .into_response());
    }

    filter_movies(State(state), query).await
}

/// `GET /movies/filter`: year OR genre filter; `format=json` returns cards
pub async fn filter_movies(State(state): State<AppState>, query: MultiQuery) -> Result<Response> {
    let years = query.ints("year")?;
    let genres = query.ints("genre")?;
    let catalog = catalog(&state);

    if query.first("format") == Some("json") {
        let movies = catalog.filter_cards(&years, &genres).await?;
        return Ok(Json(MovieCardsResponse { movies }).into_response());
    }

    let page = catalog.filter(&years, &genres, query.first("page")).await?;

    Ok(Json(MovieListResponse {
        page,
        year: query.echo("year"),
        genre: query.echo("genre"),
    })
    .into_response())
}

/// `GET /movies/{slug}`
pub async fn movie_detail(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<MovieDetail>> {
    Ok(Json(catalog(&state).movie_detail(&slug).await?))
}

/// `GET /facets`: genres and release years for the filter form
pub async fn facets(State(state): State<AppState>) -> Result<Json<Facets>> {
    Ok(Json(catalog(&state).facets().await?))
}
