//! API handlers module

pub mod actors;
pub mod admin;
pub mod health;
pub mod movies;
pub mod ratings;
pub mod reviews;
pub mod search;

use crate::AppState;
use cinema_common::db::Repository;

impl AppState {
    /// Storage handle for one request
    pub fn repo(&self) -> Repository {
        Repository::new(self.db.clone())
    }
}
