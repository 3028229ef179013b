//! Public catalog: listings, filtering, search and detail documents
//!
//! Only published movies are visible here. Drafts stay hidden from every
//! listing, filter and search regardless of the criteria.

use super::rating::{RatingService, RatingSummary};
use super::review::{ReviewService, ReviewThread};
use crate::config::CatalogConfig;
use crate::db::models::{Actor, Category, CreditRole, Genre, Movie, MovieShot, RatingStar};
use crate::db::{MovieFilterQuery, Repository};
use crate::errors::{AppError, Result};
use crate::metrics;
use serde::Serialize;

/// One page of results
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based page number
    pub number: u64,
    pub num_pages: u64,
    pub total: u64,
    pub per_page: u64,
    pub has_previous: bool,
    pub has_next: bool,
}

/// Resolve a requested page against the page count.
///
/// Accepts a 1-based number or `last`; missing means the first page. An empty
/// result still has one (empty) page.
pub fn resolve_page(requested: Option<&str>, total: u64, per_page: u64) -> Result<u64> {
    let per_page = per_page.max(1);
    let num_pages = total.div_ceil(per_page).max(1);

    let page = match requested.map(str::trim) {
        None | Some("") => 1,
        Some("last") => num_pages,
        Some(raw) => raw.parse::<u64>().map_err(|_| AppError::PageNotFound {
            page: raw.to_string(),
        })?,
    };

    if page == 0 || page > num_pages {
        return Err(AppError::PageNotFound {
            page: page.to_string(),
        });
    }

    Ok(page)
}

/// Compact movie entry of the JSON listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieCard {
    pub title: String,
    pub tagline: String,
    pub url: String,
    pub poster: String,
}

/// Everything shown on a movie page
#[derive(Debug, Clone, Serialize)]
pub struct MovieDetail {
    pub movie: Movie,
    pub category: Option<Category>,
    pub genres: Vec<Genre>,
    pub actors: Vec<Actor>,
    pub directors: Vec<Actor>,
    pub shots: Vec<MovieShot>,
    pub rating: RatingSummary,
    /// Choices offered by the rating form
    pub stars: Vec<RatingStar>,
    pub reviews: Vec<ReviewThread>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActorDetail {
    pub actor: Actor,
    pub acted_in: Vec<Movie>,
    pub directed: Vec<Movie>,
}

/// Sidebar choices for the filter form
#[derive(Debug, Clone, Serialize)]
pub struct Facets {
    pub genres: Vec<Genre>,
    pub years: Vec<i32>,
}

#[derive(Clone)]
pub struct CatalogService {
    repo: Repository,
    config: CatalogConfig,
}

impl CatalogService {
    pub fn new(repo: Repository, config: CatalogConfig) -> Self {
        Self { repo, config }
    }

    /// Published movies, `listing_page_size` per page
    pub async fn list(&self, page: Option<&str>) -> Result<Page<Movie>> {
        self.paginate(&MovieFilterQuery::published(), page, self.config.listing_page_size)
            .await
    }

    /// Movies released in any of `years` or tagged with any of `genre_ids`.
    ///
    /// With both lists empty no restriction applies.
    pub async fn filter(
        &self,
        years: &[i32],
        genre_ids: &[i32],
        page: Option<&str>,
    ) -> Result<Page<Movie>> {
        let query = Self::filter_query(years, genre_ids);
        self.paginate(&query, page, self.config.filter_page_size).await
    }

    /// Unpaginated JSON variant of [`filter`](Self::filter)
    pub async fn filter_cards(&self, years: &[i32], genre_ids: &[i32]) -> Result<Vec<MovieCard>> {
        let movies = self
            .repo
            .all_movies(&Self::filter_query(years, genre_ids))
            .await?;

        let origin = self
            .config
            .site_url
            .as_deref()
            .unwrap_or("")
            .trim_end_matches('/');

        Ok(movies
            .into_iter()
            .map(|movie| MovieCard {
                url: format!("{}{}", origin, movie.absolute_url()),
                title: movie.title,
                tagline: movie.tagline,
                poster: movie.poster,
            })
            .collect())
    }

    /// Case-insensitive title search; an empty query lists everything
    pub async fn search(&self, q: &str, page: Option<&str>) -> Result<Page<Movie>> {
        let q = q.trim();
        let query = MovieFilterQuery {
            title_contains: (!q.is_empty()).then(|| q.to_string()),
            ..MovieFilterQuery::published()
        };

        let result = self.paginate(&query, page, self.config.search_page_size).await?;

        metrics::record_search();
        tracing::debug!(query = %q, total = result.total, "Title search");

        Ok(result)
    }

    pub async fn movie_detail(&self, slug: &str) -> Result<MovieDetail> {
        let movie = self
            .repo
            .find_published_movie_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::MovieNotFound {
                id: slug.to_string(),
            })?;

        let category = match movie.category_id {
            Some(id) => self.repo.find_category_by_id(id).await?,
            None => None,
        };

        let rating = RatingService::new(self.repo.clone()).summary(movie.id).await?;
        let reviews = ReviewService::new(self.repo.clone()).threads(movie.id).await?;

        Ok(MovieDetail {
            category,
            genres: self.repo.genres_for_movie(movie.id).await?,
            actors: self.repo.credits_for_movie(movie.id, CreditRole::Actor).await?,
            directors: self.repo.credits_for_movie(movie.id, CreditRole::Director).await?,
            shots: self.repo.shots_for_movie(movie.id).await?,
            stars: self.repo.list_stars().await?,
            rating,
            reviews,
            movie,
        })
    }

    /// Actor profile with the published movies they appear in or direct
    pub async fn actor_detail(&self, name: &str) -> Result<ActorDetail> {
        let actor = self
            .repo
            .find_actor_by_name(name)
            .await?
            .ok_or_else(|| AppError::ActorNotFound {
                name: name.to_string(),
            })?;

        let credits = self.repo.credits_for_actor(actor.id).await?;
        let movies = self.repo.published_movies_for_actor(actor.id).await?;

        let has_credit = |movie: &Movie, role: CreditRole| {
            credits
                .iter()
                .any(|c| c.movie_id == movie.id && c.credit_role() == role)
        };

        let acted_in = movies
            .iter()
            .filter(|m| has_credit(*m, CreditRole::Actor))
            .cloned()
            .collect();
        let directed = movies
            .iter()
            .filter(|m| has_credit(*m, CreditRole::Director))
            .cloned()
            .collect();

        Ok(ActorDetail {
            actor,
            acted_in,
            directed,
        })
    }

    pub async fn facets(&self) -> Result<Facets> {
        Ok(Facets {
            genres: self.repo.list_genres().await?,
            years: self.repo.published_years().await?,
        })
    }

    fn filter_query(years: &[i32], genre_ids: &[i32]) -> MovieFilterQuery {
        MovieFilterQuery {
            years: years.to_vec(),
            genre_ids: genre_ids.to_vec(),
            ..MovieFilterQuery::published()
        }
    }

    pub(crate) async fn paginate_query(
        repo: &Repository,
        query: &MovieFilterQuery,
        page: Option<&str>,
        per_page: u64,
    ) -> Result<Page<Movie>> {
        let per_page = per_page.max(1);
        let total = repo.count_movies(query).await?;
        let number = resolve_page(page, total, per_page)?;
        let num_pages = total.div_ceil(per_page).max(1);

        let items = repo.fetch_movies(query, number - 1, per_page).await?;

        Ok(Page {
            items,
            number,
            num_pages,
            total,
            per_page,
            has_previous: number > 1,
            has_next: number < num_pages,
        })
    }

    async fn paginate(
        &self,
        query: &MovieFilterQuery,
        page: Option<&str>,
        per_page: u64,
    ) -> Result<Page<Movie>> {
        Self::paginate_query(&self.repo, query, page, per_page).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing;
    use axum::http::StatusCode;

    fn ids(page: &Page<Movie>) -> Vec<i32> {
        page.items.iter().map(|m| m.id).collect()
    }

    fn service(fx: &testing::Fixture) -> CatalogService {
        let config = CatalogConfig {
            listing_page_size: 10,
            filter_page_size: 10,
            search_page_size: 10,
            site_url: None,
        };
        CatalogService::new(fx.repo.clone(), config)
    }

    #[test]
    fn test_resolve_page() {
        assert_eq!(resolve_page(None, 5, 2).unwrap(), 1);
        assert_eq!(resolve_page(Some("2"), 5, 2).unwrap(), 2);
        assert_eq!(resolve_page(Some("last"), 5, 2).unwrap(), 3);
        assert_eq!(resolve_page(None, 0, 2).unwrap(), 1);

        for bad in ["0", "4", "two", "-1"] {
            let err = resolve_page(Some(bad), 5, 2).unwrap_err();
            assert_eq!(err.status_code(), StatusCode::NOT_FOUND, "page {:?}", bad);
        }
    }

    #[tokio::test]
    async fn test_listing_hides_drafts() {
        let fx = testing::seeded().await;
        let page = service(&fx).list(None).await.unwrap();

        assert_eq!(ids(&page), [fx.m1.id, fx.m2.id, fx.m3.id]);
        assert_eq!(page.total, 3);
        assert!(!page.has_next);
    }

    #[tokio::test]
    async fn test_listing_pages_with_default_size() {
        let fx = testing::seeded().await;
        let catalog = CatalogService::new(fx.repo.clone(), CatalogConfig::default());

        let first = catalog.list(None).await.unwrap();
        assert_eq!(ids(&first), [fx.m1.id]);
        assert_eq!(first.num_pages, 3);
        assert!(first.has_next && !first.has_previous);

        let last = catalog.list(Some("last")).await.unwrap();
        assert_eq!(ids(&last), [fx.m3.id]);

        assert!(catalog.list(Some("4")).await.is_err());
    }

    #[tokio::test]
    async fn test_filter_combines_with_or() {
        let fx = testing::seeded().await;
        let page = service(&fx).filter(&[2000], &[fx.g1.id], None).await.unwrap();

        // hidden matches both criteria but is a draft
        assert_eq!(ids(&page), [fx.m1.id, fx.m2.id]);
    }

    #[tokio::test]
    async fn test_filter_genre_matches_are_distinct() {
        let fx = testing::seeded().await;
        let page = service(&fx)
            .filter(&[2010, 1999], &[fx.g1.id, fx.g2.id], None)
            .await
            .unwrap();

        assert_eq!(ids(&page), [fx.m2.id, fx.m3.id]);
    }

    #[tokio::test]
    async fn test_empty_filter_returns_all_published() {
        let fx = testing::seeded().await;
        let page = service(&fx).filter(&[], &[], None).await.unwrap();

        assert_eq!(ids(&page), [fx.m1.id, fx.m2.id, fx.m3.id]);
    }

    #[tokio::test]
    async fn test_filter_cards() {
        let fx = testing::seeded().await;
        let mut catalog = service(&fx);
        catalog.config.site_url = Some("https://cinema.example/".into());

        let cards = catalog.filter_cards(&[1999], &[]).await.unwrap();
        assert_eq!(
            cards,
            [MovieCard {
                title: "Paper Moon 50%".into(),
                tagline: "Paper Moon 50% tagline".into(),
                url: "https://cinema.example/movies/paper-moon".into(),
                poster: "movies/paper-moon.jpg".into(),
            }]
        );
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive_and_hides_drafts() {
        let fx = testing::seeded().await;
        let catalog = service(&fx);

        let page = catalog.search("HARBOR", None).await.unwrap();
        assert_eq!(ids(&page), [fx.m1.id]);

        let all = catalog.search("", None).await.unwrap();
        assert_eq!(all.total, 3);
    }

    #[tokio::test]
    async fn test_search_folds_non_ascii_titles() {
        let fx = testing::seeded().await;
        let brat = fx
            .repo
            .create_movie(testing::movie("Брат", "brat", 1997, false), &[], &[], &[])
            .await
            .unwrap();
        assert_eq!(brat.title_search, "брат");

        let catalog = service(&fx);
        for term in ["Брат", "брат", "БРАТ", "рат"] {
            let page = catalog.search(term, None).await.unwrap();
            assert_eq!(ids(&page), [brat.id], "term {}", term);
        }
    }

    #[tokio::test]
    async fn test_search_treats_wildcards_literally() {
        let fx = testing::seeded().await;
        let catalog = service(&fx);

        assert_eq!(ids(&catalog.search("%", None).await.unwrap()), [fx.m3.id]);
        assert!(catalog.search("_", None).await.unwrap().items.is_empty());
    }

    #[tokio::test]
    async fn test_movie_detail() {
        let fx = testing::seeded().await;
        let catalog = service(&fx);
        testing::review(&fx.repo, fx.m3.id, None).await;

        let detail = catalog.movie_detail("paper-moon").await.unwrap();
        assert_eq!(detail.movie.id, fx.m3.id);
        assert_eq!(detail.genres, [fx.g2.clone()]);
        assert!(detail.actors.is_empty());
        assert_eq!(detail.directors, [fx.director.clone()]);
        assert_eq!(detail.stars.len(), 5);
        assert_eq!(detail.reviews.len(), 1);
        assert_eq!(detail.rating.votes, 0);

        let err = catalog.movie_detail("harbor-lights").await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_actor_detail_lists_published_credits() {
        let fx = testing::seeded().await;
        let catalog = service(&fx);

        let detail = catalog.actor_detail("Ann Lee").await.unwrap();
        let acted: Vec<i32> = detail.acted_in.iter().map(|m| m.id).collect();
        assert_eq!(acted, [fx.m1.id, fx.m2.id]);
        assert!(detail.directed.is_empty());

        let director = catalog.actor_detail("Bo Park").await.unwrap();
        assert_eq!(director.directed.len(), 1);

        assert!(catalog.actor_detail("Nobody").await.is_err());
    }

    #[tokio::test]
    async fn test_facets() {
        let fx = testing::seeded().await;
        let facets = service(&fx).facets().await.unwrap();

        assert_eq!(facets.years, [1999, 2000, 2010]);
        let names: Vec<&str> = facets.genres.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, ["Comedy", "Drama"]);
    }
}
