//! Router-level tests against an in-memory database

use super::{create_router, serve_until, AppState};
use axum::{
    body::Body,
    extract::connect_info::MockConnectInfo,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use cinema_common::{
    auth::hash_api_key,
    config::AppConfig,
    db::models::{Genre, Movie, RatingStar},
    db::{DbPool, Repository},
    services::admin::{NewMovie, NewRatingStar, NewTaxon},
    services::AdminService,
    AdminRegistry,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{oneshot, Notify};
use tower::ServiceExt;

const EDITOR_KEY: &str = "editor-key";

struct TestApp {
    router: Router,
    repo: Repository,
    m1: Movie,
    m2: Movie,
    hidden: Movie,
    g1: Genre,
    stars: Vec<RatingStar>,
}

fn test_config(admin_enabled: bool) -> AppConfig {
    let mut config = AppConfig::default();
    config.catalog.listing_page_size = 10;
    config.catalog.filter_page_size = 10;
    config.catalog.search_page_size = 10;
    config.rate_limit.enabled = false;
    config.admin.api_key_hash = admin_enabled.then(|| hash_api_key(EDITOR_KEY));
    config
}

fn new_movie(title: &str, slug: &str, year: i32, genres: &[i32], draft: bool) -> NewMovie {
    serde_json::from_value(json!({
        "title": title,
        "tagline": format!("{} tagline", title),
        "poster": format!("movies/{}.jpg", slug),
        "year": year,
        "world_premiere": format!("{}-01-01", year),
        "genres": genres,
        "url": slug,
        "draft": draft,
    }))
    .unwrap()
}

async fn spawn_app(admin_enabled: bool) -> TestApp {
    let db = DbPool::in_memory().await.unwrap();
    db.migrate().await.unwrap();
    let repo = Repository::new(db.clone());

    let admin = AdminService::new(repo.clone(), Arc::new(AdminRegistry::catalog()));
    let g1 = admin
        .create_genre(NewTaxon {
            name: "Drama".into(),
            description: String::new(),
            url: "drama".into(),
        })
        .await
        .unwrap();
    let g2 = admin
        .create_genre(NewTaxon {
            name: "Comedy".into(),
            description: String::new(),
            url: "comedy".into(),
        })
        .await
        .unwrap();

    let m1 = admin.create_movie(new_movie("Quiet Harbor", "quiet-harbor", 2000, &[], false)).await.unwrap();
    let m2 = admin.create_movie(new_movie("Night Train", "night-train", 2010, &[g1.id], false)).await.unwrap();
    admin.create_movie(new_movie("Paper Moon", "paper-moon", 1999, &[g2.id], false)).await.unwrap();
    let hidden = admin.create_movie(new_movie("Harbor Lights", "harbor-lights", 2000, &[g1.id], true)).await.unwrap();

    let mut stars = Vec::new();
    for value in 1..=5 {
        let star = admin
            .create_star(NewRatingStar {
                value,
                label: String::new(),
            })
            .await
            .unwrap();
        stars.push(star);
    }

    let state = AppState::new(Arc::new(test_config(admin_enabled)), db);
    let router = create_router(state).layer(MockConnectInfo(SocketAddr::from(([10, 1, 1, 1], 4000))));

    TestApp {
        router,
        repo,
        m1,
        m2,
        hidden,
        g1,
        stars,
    }
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    async fn get(&self, uri: &str) -> Response {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    async fn post_form(&self, uri: &str, forwarded_for: Option<&str>, body: &str) -> Response {
        let mut builder = Request::post(uri).header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(forwarded_for) = forwarded_for {
            builder = builder.header("x-forwarded-for", forwarded_for);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap()).await
    }

    async fn admin(&self, method: &str, uri: &str, key: Option<&str>, body: Option<Value>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(key) = key {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", key));
        }
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        self.send(builder.body(body).unwrap()).await
    }
}

async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn titles(body: &Value) -> Vec<String> {
    body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["title"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_health() {
    let app = spawn_app(false).await;

    let response = app.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["service"], "cinema");

    let response = app.get("/ready").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ready");
    assert_eq!(body["checks"]["schema"]["pending_migrations"], 0);
}

#[tokio::test]
async fn test_ready_reports_unapplied_migrations() {
    let db = DbPool::in_memory().await.unwrap();
    let router = create_router(AppState::new(Arc::new(test_config(false)), db));

    let response = router
        .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = json_body(response).await;
    assert_eq!(body["status"], "not_ready");
    assert_eq!(body["checks"]["database"]["status"], "up");
    assert_eq!(body["checks"]["schema"]["status"], "outdated");
    assert_eq!(body["checks"]["schema"]["pending_migrations"], 2);
}

#[tokio::test]
async fn test_shutdown_gives_up_after_grace_period() {
    let entered = Arc::new(Notify::new());
    let handler_entered = entered.clone();
    let app = Router::new().route(
        "/slow",
        axum::routing::get(move || {
            let entered = handler_entered.clone();
            async move {
                entered.notify_one();
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
        }),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let stop = async move {
        let _ = stop_rx.await;
    };
    let server = tokio::spawn(serve_until(listener, app, stop, Duration::from_millis(200)));

    let mut client = TcpStream::connect(addr).await.unwrap();
    client
        .write_all(b"GET /slow HTTP/1.1\r\nhost: localhost\r\n\r\n")
        .await
        .unwrap();
    entered.notified().await;

    stop_tx.send(()).unwrap();
    let finished = tokio::time::timeout(Duration::from_secs(5), server).await;
    assert!(finished.expect("server still draining").unwrap().is_ok());
}

#[tokio::test]
async fn test_rating_upsert_by_forwarded_client() {
    let app = spawn_app(false).await;
    let movie = app.m1.id;

    let body = format!("movie={}&star={}", movie, app.stars[1].id);
    let response = app.post_form("/rating", Some("1.2.3.4, 5.6.7.8"), &body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(bytes.is_empty());

    let body = format!("movie={}&star={}", movie, app.stars[4].id);
    let response = app.post_form("/rating", Some("1.2.3.4"), &body).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    assert_eq!(app.repo.count_ratings_for_movie(movie).await.unwrap(), 1);
    let rating = app.repo.find_rating("1.2.3.4", movie).await.unwrap().unwrap();
    assert_eq!(rating.star_id, app.stars[4].id);
}

#[tokio::test]
async fn test_rating_falls_back_to_peer_address() {
    let app = spawn_app(false).await;

    let body = format!("movie={}&star={}", app.m2.id, app.stars[0].id);
    let response = app.post_form("/rating", None, &body).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    assert!(app.repo.find_rating("10.1.1.1", app.m2.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_rating_validation_rejects_without_writing() {
    let app = spawn_app(false).await;

    let body = format!("movie={}&star=abc", app.m1.id);
    let response = app.post_form("/rating", Some("1.2.3.4"), &body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .send(Request::post("/rating").body(Body::from("movie=1&star=1")).unwrap())
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert_eq!(app.repo.count_ratings_for_movie(app.m1.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_review_submission_redirects() {
    let app = spawn_app(false).await;
    let uri = format!("/movie/{}/review", app.m1.id);

    let response = app
        .post_form(&uri, None, "name=Dana&email=dana%40example.com&text=Great+pacing")
        .await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()[header::LOCATION], "/movies/quiet-harbor");

    let root = app.repo.reviews_for_movie(app.m1.id).await.unwrap().remove(0);
    let body = format!("name=Eli&email=eli%40example.com&text=Agreed&parent={}", root.id);
    let response = app.post_form(&uri, None, &body).await;
    assert_eq!(response.status(), StatusCode::FOUND);

    let response = app.get(&format!("/reviews/{}/replies", root.id)).await;
    let replies = json_body(response).await;
    assert_eq!(replies.as_array().unwrap().len(), 1);
    assert_eq!(replies[0]["name"], "Eli");
    assert_eq!(replies[0]["parent_id"], root.id);
}

#[tokio::test]
async fn test_review_errors() {
    let app = spawn_app(false).await;

    let uri = format!("/movie/{}/review", app.m1.id);
    let response = app.post_form(&uri, None, "name=Dana&email=nope&text=Hi").await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "INVALID_FORM");
    assert!(body["error"]["details"]["email"].is_array());

    for movie in [app.hidden.id.to_string(), "9999".into(), "abc".into()] {
        let uri = format!("/movie/{}/review", movie);
        let response = app
            .post_form(&uri, None, "name=Dana&email=dana%40example.com&text=Hi")
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "movie {}", movie);
    }
}

#[tokio::test]
async fn test_listing_and_filter() {
    let app = spawn_app(false).await;

    let body = json_body(app.get("/movies").await).await;
    assert_eq!(titles(&body), ["Quiet Harbor", "Night Train", "Paper Moon"]);

    let uri = format!("/movies?year=2000&genre={}", app.g1.id);
    let body = json_body(app.get(&uri).await).await;
    assert_eq!(titles(&body), ["Quiet Harbor", "Night Train"]);
    assert_eq!(body["year"], "year=2000&");

    let body = json_body(app.get("/movies/filter").await).await;
    assert_eq!(body["total"], 3);

    let response = app.get("/movies/filter?year=abc").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.get("/movies?page=9").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_json_cards() {
    let app = spawn_app(false).await;

    let body = json_body(app.get("/movies?format=json&year=2010").await).await;
    assert_eq!(
        body,
        json!({
            "movies": [{
                "title": "Night Train",
                "tagline": "Night Train tagline",
                "url": "/movies/night-train",
                "poster": "movies/night-train.jpg",
            }]
        })
    );
}

#[tokio::test]
async fn test_search_and_detail() {
    let app = spawn_app(false).await;

    let body = json_body(app.get("/search?q=HARBOR").await).await;
    assert_eq!(titles(&body), ["Quiet Harbor"]);
    assert_eq!(body["q"], "q=HARBOR&");

    let body = json_body(app.get("/search").await).await;
    assert_eq!(body["total"], 3);
    assert_eq!(body["q"], "q=&");

    let body = json_body(app.get("/movies/night-train").await).await;
    assert_eq!(body["movie"]["title"], "Night Train");
    assert_eq!(body["genres"][0]["name"], "Drama");
    assert_eq!(body["stars"].as_array().unwrap().len(), 5);

    let response = app.get("/movies/harbor-lights").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = json_body(app.get("/facets").await).await;
    assert_eq!(body["years"], json!([1999, 2000, 2010]));
}

#[tokio::test]
async fn test_admin_requires_key() {
    let app = spawn_app(true).await;

    let response = app.admin("GET", "/admin/movies", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app.admin("GET", "/admin/movies", Some("wrong"), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let disabled = spawn_app(false).await;
    let response = disabled.admin("GET", "/admin/movies", Some(EDITOR_KEY), None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_publish_flow() {
    let app = spawn_app(true).await;

    let body = json_body(app.admin("GET", "/admin/movies", Some(EDITOR_KEY), None).await).await;
    assert_eq!(body["total"], 4);

    let body = json_body(app.admin("GET", "/admin/registry", Some(EDITOR_KEY), None).await).await;
    assert_eq!(body["models"][1]["list_editable"], json!(["draft"]));

    let response = app
        .admin(
            "POST",
            "/admin/movies/actions",
            Some(EDITOR_KEY),
            Some(json!({ "action": "publish", "ids": [app.hidden.id] })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["affected"], 1);

    let body = json_body(app.get("/movies").await).await;
    assert_eq!(body["total"], 4);

    let uri = format!("/admin/movies/{}", app.m1.id);
    let response = app
        .admin("PATCH", &uri, Some(EDITOR_KEY), Some(json!({ "title": "Renamed" })))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .admin("PATCH", &uri, Some(EDITOR_KEY), Some(json!({ "draft": true })))
        .await;
    assert_eq!(json_body(response).await["draft"], true);
}

#[tokio::test]
async fn test_admin_creates_and_moderates() {
    let app = spawn_app(true).await;

    let response = app
        .admin(
            "POST",
            "/admin/categories",
            Some(EDITOR_KEY),
            Some(json!({ "name": "Short", "url": "short" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .admin(
            "POST",
            "/admin/genres",
            Some(EDITOR_KEY),
            Some(json!({ "name": "Drama", "url": "drama" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let uri = format!("/movie/{}/review", app.m2.id);
    app.post_form(&uri, None, "name=Dana&email=dana%40example.com&text=Hi")
        .await;

    let uri = format!("/admin/movies/{}/reviews", app.m2.id);
    let body = json_body(app.admin("GET", &uri, Some(EDITOR_KEY), None).await).await;
    assert_eq!(body["inline"]["extra"], 1);
    let review_id = body["rows"][0]["id"].as_i64().unwrap();

    let uri = format!("/admin/reviews/{}", review_id);
    let response = app.admin("DELETE", &uri, Some(EDITOR_KEY), None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = app.admin("DELETE", &uri, Some(EDITOR_KEY), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
