//! Cinema API Gateway
//!
//! The entry point for all external requests.
//! Handles:
//! - Public catalog, reviews and ratings
//! - Editor back-office
//! - Rate limiting
//! - Observability (logging, metrics, tracing)

mod extract;
mod handlers;
mod middleware;

#[cfg(test)]
mod tests;

use axum::{
    extract::{FromRef, Request},
    middleware::Next,
    routing::{delete, get, patch, post},
    Router,
};
use cinema_common::{
    admin::AdminRegistry,
    auth::AdminKey,
    config::AppConfig,
    db::DbPool,
    metrics,
};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::oneshot;
use tower::{limit::ConcurrencyLimitLayer, ServiceBuilder};
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DbPool,
    pub registry: Arc<AdminRegistry>,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, db: DbPool) -> Self {
        Self {
            config,
            db,
            registry: Arc::new(AdminRegistry::catalog()),
        }
    }
}

impl FromRef<AppState> for AdminKey {
    fn from_ref(state: &AppState) -> Self {
        AdminKey::new(state.config.admin.api_key_hash.clone())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Arc::new(AppConfig::load()?);

    init_tracing(&config);

    info!("Starting Cinema API Gateway v{}", cinema_common::VERSION);

    // Initialize metrics
    if config.observability.metrics_port != 0 {
        let metrics_addr = SocketAddr::from(([0, 0, 0, 0], config.observability.metrics_port));
        PrometheusBuilder::new()
            .with_http_listener(metrics_addr)
            .set_buckets(metrics::LATENCY_BUCKETS)?
            .install()?;
        info!("Metrics exporter listening on {}", metrics_addr);
    }
    metrics::register_metrics();

    // Initialize database connection
    info!("Connecting to database...");
    let db = DbPool::new(&config.database).await?;

    if config.database.run_migrations {
        db.migrate().await?;
    }

    if config.admin.api_key_hash.is_none() {
        warn!("admin.api_key_hash is not set; back-office routes are disabled");
    }

    // Create app state
    let state = AppState::new(config.clone(), db);

    // Build the router
    let app = create_router(state);

    // Start the server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Listening on {}", addr);

    let listener = TcpListener::bind(&addr).await?;

    serve_until(listener, app, shutdown_signal(), config.shutdown_timeout()).await?;

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.observability.log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if config.observability.json_logging {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    let config = state.config.clone();

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    // Public catalog
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        .route("/movies", get(handlers::movies::list_movies))
        .route("/movies/filter", get(handlers::movies::filter_movies))
        .route("/movies/{slug}", get(handlers::movies::movie_detail))
        .route("/facets", get(handlers::movies::facets))
        .route("/search", get(handlers::search::search))
        .route("/actors/{name}", get(handlers::actors::actor_detail))
        .route("/reviews/{id}/replies", get(handlers::reviews::replies))
        .route("/movie/{id}/review", post(handlers::reviews::submit_review))
        .route("/rating", post(handlers::ratings::submit_rating));

    // Editor back-office
    let admin_routes = Router::new()
        .route("/registry", get(handlers::admin::registry))
        .route(
            "/movies",
            get(handlers::admin::list_movies).post(handlers::admin::create_movie),
        )
        .route("/movies/actions", post(handlers::admin::apply_action))
        .route("/movies/{id}", patch(handlers::admin::edit_movie))
        .route("/movies/{id}/reviews", get(handlers::admin::movie_reviews))
        .route("/movies/{id}/shots", post(handlers::admin::create_shot))
        .route("/reviews/{id}", delete(handlers::admin::delete_review))
        .route("/categories", post(handlers::admin::create_category))
        .route("/genres", post(handlers::admin::create_genre))
        .route("/actors", post(handlers::admin::create_actor))
        .route("/rating-stars", post(handlers::admin::create_star));

    let mut app = Router::new()
        .merge(public_routes)
        .nest("/admin", admin_routes)
        .route_layer(axum::middleware::from_fn(middleware::metrics::track_metrics));

    if config.rate_limit.enabled {
        let limiter = middleware::rate_limit::create_rate_limiter(
            config.rate_limit.requests_per_second,
            config.rate_limit.burst,
        );
        let limit = config.rate_limit.requests_per_second;

        app = app.layer(axum::middleware::from_fn(move |request: Request, next: Next| {
            middleware::rate_limit::rate_limit_middleware(request, next, limiter.clone(), limit)
        }));
    }

    // Compose the app
    app.layer(
        ServiceBuilder::new()
            .layer(request_id)
            .layer(propagate_id)
            .layer(TraceLayer::new_for_http())
            .layer(cors)
            // Request timeout
            .layer(TimeoutLayer::new(config.request_timeout()))
            // Concurrency limit for backpressure
            .layer(ConcurrencyLimitLayer::new(config.server.max_concurrent_requests)),
    )
    .with_state(state)
}

/// Serve until `shutdown` resolves, then give in-flight requests `grace`
/// to finish before the remaining connections are dropped
async fn serve_until<F>(
    listener: TcpListener,
    app: Router,
    shutdown: F,
    grace: Duration,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let (drain_tx, drain_rx) = oneshot::channel::<()>();

    let mut server = tokio::spawn(
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            let _ = drain_rx.await;
        })
        .into_future(),
    );

    tokio::select! {
        joined = &mut server => return joined.map_err(std::io::Error::other).and_then(|r| r),
        _ = shutdown => {}
    }

    let _ = drain_tx.send(());

    match tokio::time::timeout(grace, &mut server).await {
        Ok(joined) => joined.map_err(std::io::Error::other).and_then(|r| r),
        Err(_) => {
            warn!(grace_secs = grace.as_secs_f64(), "Shutdown grace period elapsed, dropping open connections");
            server.abort();
            Ok(())
        }
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
