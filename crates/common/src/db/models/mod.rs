//! SeaORM entity models
//!
//! Database entities for the movie catalog

mod actor;
mod category;
mod genre;
mod movie;
mod movie_credit;
mod movie_genre;
mod movie_shot;
mod rating;
mod rating_star;
mod review;

pub use category::{
    Entity as CategoryEntity,
    Model as Category,
    ActiveModel as CategoryActiveModel,
    Column as CategoryColumn,
};

pub use genre::{
    Entity as GenreEntity,
    Model as Genre,
    ActiveModel as GenreActiveModel,
    Column as GenreColumn,
};

pub use actor::{
    Entity as ActorEntity,
    Model as Actor,
    ActiveModel as ActorActiveModel,
    Column as ActorColumn,
};

pub use movie::{
    Entity as MovieEntity,
    Model as Movie,
    ActiveModel as MovieActiveModel,
    Column as MovieColumn,
};

pub use movie_genre::{
    Entity as MovieGenreEntity,
    Model as MovieGenre,
    ActiveModel as MovieGenreActiveModel,
    Column as MovieGenreColumn,
};

pub use movie_credit::{
    Entity as MovieCreditEntity,
    Model as MovieCredit,
    ActiveModel as MovieCreditActiveModel,
    Column as MovieCreditColumn,
    CreditRole,
};

pub use movie_shot::{
    Entity as MovieShotEntity,
    Model as MovieShot,
    ActiveModel as MovieShotActiveModel,
    Column as MovieShotColumn,
};

pub use rating_star::{
    Entity as RatingStarEntity,
    Model as RatingStar,
    ActiveModel as RatingStarActiveModel,
    Column as RatingStarColumn,
};

pub use rating::{
    Entity as RatingEntity,
    Model as Rating,
    ActiveModel as RatingActiveModel,
    Column as RatingColumn,
};

pub use review::{
    Entity as ReviewEntity,
    Model as Review,
    ActiveModel as ReviewActiveModel,
    Column as ReviewColumn,
};

/// Case-folded form of `text` stored beside searchable columns.
///
/// Unicode-aware, so `"Брат"` and `"брат"` share a key.
pub fn search_key(text: &str) -> String {
    text.to_lowercase()
}
