//! Repository pattern for database operations
//!
//! Provides a clean interface for all data access operations
//! with proper error handling and transaction support.

use crate::db::models::*;
use crate::db::DbPool;
use crate::errors::{AppError, Result};
use sea_orm::sea_query::{Expr, LikeExpr, OnConflict, Query, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set, SqlErr,
    TransactionTrait,
};

/// Criteria for movie listings.
///
/// `years` and `genre_ids` combine with OR; when both are empty no
/// year/genre restriction applies. The remaining criteria combine with AND.
#[derive(Debug, Clone, Default)]
pub struct MovieFilterQuery {
    /// Include draft movies (back-office only)
    pub include_drafts: bool,

    pub years: Vec<i32>,

    pub genre_ids: Vec<i32>,

    /// Case-insensitive substring on title
    pub title_contains: Option<String>,

    /// Case-insensitive substring on title or category name
    pub search: Option<String>,

    pub year: Option<i32>,

    pub category_id: Option<i32>,
}

impl MovieFilterQuery {
    /// Public visibility: published movies only
    pub fn published() -> Self {
        Self::default()
    }

    fn select(&self) -> Select<MovieEntity> {
        let mut select = MovieEntity::find();

        if !self.include_drafts {
            select = select.filter(MovieColumn::Draft.eq(false));
        }

        if !self.years.is_empty() || !self.genre_ids.is_empty() {
            let mut any = Condition::any();
            if !self.years.is_empty() {
                any = any.add(MovieColumn::Year.is_in(self.years.clone()));
            }
            if !self.genre_ids.is_empty() {
                // Subquery keeps each movie once no matter how many genres match
                any = any.add(
                    MovieColumn::Id.in_subquery(
                        Query::select()
                            .column(MovieGenreColumn::MovieId)
                            .from(MovieGenreEntity)
                            .and_where(MovieGenreColumn::GenreId.is_in(self.genre_ids.clone()))
                            .to_owned(),
                    ),
                );
            }
            select = select.filter(any);
        }

        if let Some(year) = self.year {
            select = select.filter(MovieColumn::Year.eq(year));
        }

        if let Some(category_id) = self.category_id {
            select = select.filter(MovieColumn::CategoryId.eq(category_id));
        }

        if let Some(ref term) = self.title_contains {
            select = select.filter(icontains(MovieColumn::TitleSearch, term));
        }

        if let Some(ref term) = self.search {
            select = select.filter(
                Condition::any()
                    .add(icontains(MovieColumn::TitleSearch, term))
                    .add(
                        MovieColumn::CategoryId.in_subquery(
                            Query::select()
                                .column(CategoryColumn::Id)
                                .from(CategoryEntity)
                                .and_where(icontains(CategoryColumn::NameSearch, term))
                                .to_owned(),
                        ),
                    ),
            );
        }

        select.order_by_asc(MovieColumn::Id)
    }
}

/// `key LIKE '%term%'` against a stored [`search_key`] column, with LIKE
/// wildcards in `term` taken literally.
///
/// Folding happens in Rust on both sides; SQLite's `lower()` only folds ASCII.
fn icontains<C: ColumnTrait>(key_column: C, term: &str) -> SimpleExpr {
    let mut escaped = String::with_capacity(term.len());
    for c in search_key(term).chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }

    Expr::col((key_column.entity_name(), key_column))
        .like(LikeExpr::new(format!("%{}%", escaped)).escape('\\'))
}

/// Map unique / foreign key violations to client errors
fn constraint_error(err: DbErr, what: &str) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::Duplicate {
            message: format!("{} already exists", what),
        },
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => AppError::Validation {
            message: format!("{} references a missing record", what),
            field: None,
        },
        _ => AppError::Database(err),
    }
}

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get the read connection
    fn read_conn(&self) -> &DatabaseConnection {
        self.pool.read()
    }

    /// Get the write connection
    fn write_conn(&self) -> &DatabaseConnection {
        self.pool.write()
    }

    // ========================================================================
    // Health Check
    // ========================================================================

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    // ========================================================================
    // Movie Operations
    // ========================================================================

    /// Find movie by ID regardless of draft state
    pub async fn find_movie_by_id(&self, id: i32) -> Result<Option<Movie>> {
        MovieEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Find a published movie by ID
    pub async fn find_published_movie(&self, id: i32) -> Result<Option<Movie>> {
        MovieEntity::find_by_id(id)
            .filter(MovieColumn::Draft.eq(false))
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Find a published movie by slug
    pub async fn find_published_movie_by_slug(&self, slug: &str) -> Result<Option<Movie>> {
        MovieEntity::find()
            .filter(MovieColumn::Url.eq(slug))
            .filter(MovieColumn::Draft.eq(false))
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Count movies matching a filter
    pub async fn count_movies(&self, filter: &MovieFilterQuery) -> Result<u64> {
        filter
            .select()
            .count(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Fetch one page (0-based) of movies matching a filter
    pub async fn fetch_movies(
        &self,
        filter: &MovieFilterQuery,
        page_index: u64,
        per_page: u64,
    ) -> Result<Vec<Movie>> {
        filter
            .select()
            .paginate(self.read_conn(), per_page.max(1))
            .fetch_page(page_index)
            .await
            .map_err(Into::into)
    }

    /// All movies matching a filter, unpaginated
    pub async fn all_movies(&self, filter: &MovieFilterQuery) -> Result<Vec<Movie>> {
        filter
            .select()
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Distinct release years of published movies, ascending
    pub async fn published_years(&self) -> Result<Vec<i32>> {
        MovieEntity::find()
            .select_only()
            .column(MovieColumn::Year)
            .distinct()
            .filter(MovieColumn::Draft.eq(false))
            .order_by_asc(MovieColumn::Year)
            .into_tuple::<i32>()
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Create a movie together with its genre and credit links
    pub async fn create_movie(
        &self,
        movie: MovieActiveModel,
        genre_ids: &[i32],
        actor_ids: &[i32],
        director_ids: &[i32],
    ) -> Result<Movie> {
        let txn = self.write_conn().begin().await?;

        let movie = movie
            .insert(&txn)
            .await
            .map_err(|e| constraint_error(e, "movie"))?;

        if !genre_ids.is_empty() {
            let links = genre_ids.iter().map(|&genre_id| MovieGenreActiveModel {
                movie_id: Set(movie.id),
                genre_id: Set(genre_id),
            });
            MovieGenreEntity::insert_many(links)
                .exec_without_returning(&txn)
                .await
                .map_err(|e| constraint_error(e, "movie genre"))?;
        }

        let credits: Vec<MovieCreditActiveModel> = actor_ids
            .iter()
            .map(|&id| (id, CreditRole::Actor))
            .chain(director_ids.iter().map(|&id| (id, CreditRole::Director)))
            .map(|(actor_id, role)| MovieCreditActiveModel {
                movie_id: Set(movie.id),
                actor_id: Set(actor_id),
                role: Set(role.into()),
            })
            .collect();

        if !credits.is_empty() {
            MovieCreditEntity::insert_many(credits)
                .exec_without_returning(&txn)
                .await
                .map_err(|e| constraint_error(e, "movie credit"))?;
        }

        txn.commit().await?;

        Ok(movie)
    }

    /// Set the draft flag on the given movies, returning how many changed
    pub async fn set_movies_draft(&self, ids: &[i32], draft: bool) -> Result<u64> {
        let result = MovieEntity::update_many()
            .col_expr(MovieColumn::Draft, Expr::value(draft))
            .filter(MovieColumn::Id.is_in(ids.to_vec()))
            .exec(self.write_conn())
            .await?;

        Ok(result.rows_affected)
    }

    // ========================================================================
    // Catalog Reference Data
    // ========================================================================

    /// All genres ordered by name
    pub async fn list_genres(&self) -> Result<Vec<Genre>> {
        GenreEntity::find()
            .order_by_asc(GenreColumn::Name)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Genres linked to a movie
    pub async fn genres_for_movie(&self, movie_id: i32) -> Result<Vec<Genre>> {
        GenreEntity::find()
            .inner_join(MovieGenreEntity)
            .filter(MovieGenreColumn::MovieId.eq(movie_id))
            .order_by_asc(GenreColumn::Name)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    pub async fn create_genre(&self, genre: GenreActiveModel) -> Result<Genre> {
        genre
            .insert(self.write_conn())
            .await
            .map_err(|e| constraint_error(e, "genre"))
    }

    pub async fn find_category_by_id(&self, id: i32) -> Result<Option<Category>> {
        CategoryEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    pub async fn create_category(&self, category: CategoryActiveModel) -> Result<Category> {
        category
            .insert(self.write_conn())
            .await
            .map_err(|e| constraint_error(e, "category"))
    }

    /// Find actor by exact name
    pub async fn find_actor_by_name(&self, name: &str) -> Result<Option<Actor>> {
        ActorEntity::find()
            .filter(ActorColumn::Name.eq(name))
            .order_by_asc(ActorColumn::Id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    pub async fn create_actor(&self, actor: ActorActiveModel) -> Result<Actor> {
        actor
            .insert(self.write_conn())
            .await
            .map_err(|e| constraint_error(e, "actor"))
    }

    /// People credited on a movie in the given role
    pub async fn credits_for_movie(&self, movie_id: i32, role: CreditRole) -> Result<Vec<Actor>> {
        ActorEntity::find()
            .inner_join(MovieCreditEntity)
            .filter(MovieCreditColumn::MovieId.eq(movie_id))
            .filter(MovieCreditColumn::Role.eq(role.as_str()))
            .order_by_asc(ActorColumn::Name)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Credits of an actor across all movies
    pub async fn credits_for_actor(&self, actor_id: i32) -> Result<Vec<MovieCredit>> {
        MovieCreditEntity::find()
            .filter(MovieCreditColumn::ActorId.eq(actor_id))
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Published movies an actor is credited on
    pub async fn published_movies_for_actor(&self, actor_id: i32) -> Result<Vec<Movie>> {
        MovieEntity::find()
            .filter(MovieColumn::Draft.eq(false))
            .filter(
                MovieColumn::Id.in_subquery(
                    Query::select()
                        .column(MovieCreditColumn::MovieId)
                        .from(MovieCreditEntity)
                        .and_where(MovieCreditColumn::ActorId.eq(actor_id))
                        .to_owned(),
                ),
            )
            .order_by_asc(MovieColumn::Year)
            .order_by_asc(MovieColumn::Id)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    pub async fn shots_for_movie(&self, movie_id: i32) -> Result<Vec<MovieShot>> {
        MovieShotEntity::find()
            .filter(MovieShotColumn::MovieId.eq(movie_id))
            .order_by_asc(MovieShotColumn::Id)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    pub async fn create_shot(&self, shot: MovieShotActiveModel) -> Result<MovieShot> {
        shot.insert(self.write_conn())
            .await
            .map_err(|e| constraint_error(e, "movie shot"))
    }

    // ========================================================================
    // Rating Operations
    // ========================================================================

    pub async fn find_star_by_id(&self, id: i32) -> Result<Option<RatingStar>> {
        RatingStarEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// All stars ordered by value, highest first
    pub async fn list_stars(&self) -> Result<Vec<RatingStar>> {
        RatingStarEntity::find()
            .order_by_desc(RatingStarColumn::Value)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    pub async fn create_star(&self, star: RatingStarActiveModel) -> Result<RatingStar> {
        star.insert(self.write_conn())
            .await
            .map_err(|e| constraint_error(e, "rating star"))
    }

    /// Insert or overwrite the single rating of `ip` for `movie_id`.
    ///
    /// One statement, `INSERT .. ON CONFLICT (ip, movie_id) DO UPDATE`, so two
    /// concurrent votes from the same client converge on one row.
    pub async fn upsert_rating(&self, ip: &str, movie_id: i32, star_id: i32) -> Result<Rating> {
        let now = chrono::Utc::now();

        let rating = RatingActiveModel {
            ip: Set(ip.to_string()),
            movie_id: Set(movie_id),
            star_id: Set(star_id),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        RatingEntity::insert(rating)
            .on_conflict(
                OnConflict::columns([RatingColumn::Ip, RatingColumn::MovieId])
                    .update_columns([RatingColumn::StarId, RatingColumn::UpdatedAt])
                    .to_owned(),
            )
            .exec_without_returning(self.write_conn())
            .await
            .map_err(|e| constraint_error(e, "rating"))?;

        // Read back through the unique key; the insert id is unreliable when
        // the statement took the update branch.
        self.find_rating(ip, movie_id)
            .await?
            .ok_or_else(|| AppError::Internal {
                message: format!("rating for movie {} vanished after upsert", movie_id),
            })
    }

    pub async fn find_rating(&self, ip: &str, movie_id: i32) -> Result<Option<Rating>> {
        RatingEntity::find()
            .filter(RatingColumn::Ip.eq(ip))
            .filter(RatingColumn::MovieId.eq(movie_id))
            .one(self.write_conn())
            .await
            .map_err(Into::into)
    }

    pub async fn count_ratings_for_movie(&self, movie_id: i32) -> Result<u64> {
        RatingEntity::find()
            .filter(RatingColumn::MovieId.eq(movie_id))
            .count(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Star values of every vote on a movie
    pub async fn star_values_for_movie(&self, movie_id: i32) -> Result<Vec<i32>> {
        RatingEntity::find()
            .select_only()
            .column(RatingStarColumn::Value)
            .inner_join(RatingStarEntity)
            .filter(RatingColumn::MovieId.eq(movie_id))
            .into_tuple::<i32>()
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    // ========================================================================
    // Review Operations
    // ========================================================================

    pub async fn find_review_by_id(&self, id: i32) -> Result<Option<Review>> {
        ReviewEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Append a review
    pub async fn create_review(&self, review: ReviewActiveModel) -> Result<Review> {
        review
            .insert(self.write_conn())
            .await
            .map_err(|e| constraint_error(e, "review"))
    }

    /// Every review of a movie in submission order
    pub async fn reviews_for_movie(&self, movie_id: i32) -> Result<Vec<Review>> {
        ReviewEntity::find()
            .filter(ReviewColumn::MovieId.eq(movie_id))
            .order_by_asc(ReviewColumn::Id)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Direct replies to a review
    pub async fn replies_to(&self, review_id: i32) -> Result<Vec<Review>> {
        ReviewEntity::find()
            .filter(ReviewColumn::ParentId.eq(review_id))
            .order_by_asc(ReviewColumn::Id)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Delete review by ID; replies are kept and detached
    pub async fn delete_review(&self, id: i32) -> Result<bool> {
        let txn = self.write_conn().begin().await?;

        ReviewEntity::update_many()
            .col_expr(ReviewColumn::ParentId, Expr::value(Option::<i32>::None))
            .filter(ReviewColumn::ParentId.eq(id))
            .exec(&txn)
            .await?;

        let result = ReviewEntity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;

        Ok(result.rows_affected > 0)
    }
}
