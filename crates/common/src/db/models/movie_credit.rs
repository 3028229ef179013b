//! Movie <-> actor junction carrying the credit role

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Credit role on a movie
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditRole {
    Actor,
    Director,
}

impl CreditRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            CreditRole::Actor => "actor",
            CreditRole::Director => "director",
        }
    }
}

impl From<String> for CreditRole {
    fn from(s: String) -> Self {
        match s.as_str() {
            "director" => CreditRole::Director,
            _ => CreditRole::Actor,
        }
    }
}

impl From<CreditRole> for String {
    fn from(role: CreditRole) -> Self {
        role.as_str().to_string()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "movie_credits")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub movie_id: i32,

    #[sea_orm(primary_key, auto_increment = false)]
    pub actor_id: i32,

    #[sea_orm(primary_key, auto_increment = false)]
    pub role: String,
}

impl Model {
    pub fn credit_role(&self) -> CreditRole {
        CreditRole::from(self.role.clone())
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::movie::Entity",
        from = "Column::MovieId",
        to = "super::movie::Column::Id",
        on_delete = "Cascade"
    )]
    Movie,

    #[sea_orm(
        belongs_to = "super::actor::Entity",
        from = "Column::ActorId",
        to = "super::actor::Column::Id",
        on_delete = "Cascade"
    )]
    Actor,
}

impl Related<super::movie::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Movie.def()
    }
}

impl Related<super::actor::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Actor.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
