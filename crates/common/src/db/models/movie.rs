//! Movie entity

use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "movies")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub title: String,

    /// [`search_key`](super::search_key) of `title`, kept in sync on save
    #[serde(skip)]
    #[sea_orm(column_type = "Text")]
    pub title_search: String,

    pub tagline: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    /// Stored poster path
    pub poster: String,

    pub year: i32,

    pub country: String,

    pub world_premiere: Date,

    /// Budget in dollars
    pub budget: i64,

    pub fees_in_usa: i64,

    pub fees_in_world: i64,

    pub category_id: Option<i32>,

    /// Slug used in public links
    #[sea_orm(unique)]
    pub url: String,

    /// Hidden from public listings while set
    pub draft: bool,
}

impl Model {
    /// Canonical public detail path
    pub fn absolute_url(&self) -> String {
        format!("/movies/{}", self.url)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id",
        on_delete = "SetNull"
    )]
    Category,

    #[sea_orm(has_many = "super::movie_genre::Entity")]
    MovieGenres,

    #[sea_orm(has_many = "super::movie_credit::Entity")]
    Credits,

    #[sea_orm(has_many = "super::movie_shot::Entity")]
    Shots,

    #[sea_orm(has_many = "super::rating::Entity")]
    Ratings,

    #[sea_orm(has_many = "super::review::Entity")]
    Reviews,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::movie_genre::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MovieGenres.def()
    }
}

impl Related<super::genre::Entity> for Entity {
    fn to() -> RelationDef {
        super::movie_genre::Relation::Genre.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::movie_genre::Relation::Movie.def().rev())
    }
}

impl Related<super::movie_credit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Credits.def()
    }
}

impl Related<super::movie_shot::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Shots.def()
    }
}

impl Related<super::rating::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ratings.def()
    }
}

impl Related<super::review::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reviews.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if let ActiveValue::Set(ref title) = self.title {
            self.title_search = ActiveValue::Set(super::search_key(title));
        }
        Ok(self)
    }
}
