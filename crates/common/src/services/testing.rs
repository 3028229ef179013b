//! Seeded in-memory catalog for service tests

use crate::config::DatabaseConfig;
use crate::db::models::*;
use crate::db::{DbPool, Repository};
use chrono::NaiveDate;
use sea_orm::Set;
use std::path::Path;

pub struct Fixture {
    pub repo: Repository,
    /// year 2000, no genres
    pub m1: Movie,
    /// year 2010, genre g1
    pub m2: Movie,
    /// year 1999, genre g2, directed by `director`
    pub m3: Movie,
    /// draft, year 2000, genre g1
    pub hidden: Movie,
    pub g1: Genre,
    pub g2: Genre,
    pub actor: Actor,
    pub director: Actor,
    /// values 1..=5, index 0 is value 1
    pub stars: Vec<RatingStar>,
}

pub fn movie(title: &str, slug: &str, year: i32, draft: bool) -> MovieActiveModel {
    MovieActiveModel {
        title: Set(title.to_string()),
        tagline: Set(format!("{} tagline", title)),
        description: Set(String::new()),
        poster: Set(format!("movies/{}.jpg", slug)),
        year: Set(year),
        country: Set("USA".to_string()),
        world_premiere: Set(NaiveDate::from_ymd_opt(year, 1, 1).unwrap()),
        budget: Set(0),
        fees_in_usa: Set(0),
        fees_in_world: Set(0),
        category_id: Set(None),
        url: Set(slug.to_string()),
        draft: Set(draft),
        ..Default::default()
    }
}

pub async fn repo() -> Repository {
    let pool = DbPool::in_memory().await.unwrap();
    pool.migrate().await.unwrap();
    Repository::new(pool)
}

pub async fn seeded() -> Fixture {
    seed(repo().await).await
}

/// Seeded SQLite file under `dir` behind a multi-connection pool, for tests
/// that need statements from different connections to overlap
pub async fn seeded_on_disk(dir: &Path) -> Fixture {
    let config = DatabaseConfig {
        url: format!("sqlite://{}?mode=rwc", dir.join("cinema.db").display()),
        max_connections: 8,
        ..Default::default()
    };
    let pool = DbPool::new(&config).await.unwrap();
    pool.migrate().await.unwrap();
    seed(Repository::new(pool)).await
}

async fn seed(repo: Repository) -> Fixture {

    let category = repo
        .create_category(CategoryActiveModel {
            name: Set("Feature".into()),
            description: Set(String::new()),
            url: Set("feature".into()),
            ..Default::default()
        })
        .await
        .unwrap();

    let g1 = repo.create_genre(genre("Drama", "drama")).await.unwrap();
    let g2 = repo.create_genre(genre("Comedy", "comedy")).await.unwrap();

    let actor = repo.create_actor(person("Ann Lee")).await.unwrap();
    let director = repo.create_actor(person("Bo Park")).await.unwrap();

    let mut m1 = movie("Quiet Harbor", "quiet-harbor", 2000, false);
    m1.category_id = Set(Some(category.id));
    let m1 = repo.create_movie(m1, &[], &[actor.id], &[]).await.unwrap();
    let m2 = repo
        .create_movie(movie("Night Train", "night-train", 2010, false), &[g1.id], &[actor.id], &[])
        .await
        .unwrap();
    let m3 = repo
        .create_movie(movie("Paper Moon 50%", "paper-moon", 1999, false), &[g2.id], &[], &[director.id])
        .await
        .unwrap();
    let hidden = repo
        .create_movie(movie("Harbor Lights", "harbor-lights", 2000, true), &[g1.id], &[actor.id], &[])
        .await
        .unwrap();

    let mut stars = Vec::new();
    for value in 1..=5 {
        let star = RatingStarActiveModel {
            value: Set(value),
            label: Set(format!("{} stars", value)),
            ..Default::default()
        };
        stars.push(repo.create_star(star).await.unwrap());
    }

    Fixture {
        repo,
        m1,
        m2,
        m3,
        hidden,
        g1,
        g2,
        actor,
        director,
        stars,
    }
}

fn genre(name: &str, slug: &str) -> GenreActiveModel {
    GenreActiveModel {
        name: Set(name.to_string()),
        description: Set(String::new()),
        url: Set(slug.to_string()),
        ..Default::default()
    }
}

fn person(name: &str) -> ActorActiveModel {
    ActorActiveModel {
        name: Set(name.to_string()),
        age: Set(40),
        description: Set(String::new()),
        image: Set(String::new()),
        ..Default::default()
    }
}

/// Store a review directly, bypassing form validation
pub async fn review(repo: &Repository, movie_id: i32, parent_id: Option<i32>) -> Review {
    let review = ReviewActiveModel {
        name: Set("Sam".into()),
        email: Set("sam@example.com".into()),
        text: Set("Loved it".into()),
        parent_id: Set(parent_id),
        movie_id: Set(movie_id),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    repo.create_review(review).await.unwrap()
}
