//! Cinema Common Library
//!
//! Shared code for the cinema services including:
//! - Database models, migrations and repository
//! - Catalog, rating, review and back-office services
//! - Client identity resolution
//! - Error types and handling
//! - Configuration management
//! - Back-office authentication and model registry
//! - Metrics and observability

pub mod admin;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod identity;
pub mod metrics;
pub mod services;

// Re-export commonly used types
pub use admin::AdminRegistry;
pub use config::AppConfig;
pub use db::{DbPool, Repository};
pub use errors::{AppError, Result};
pub use identity::ClientIdentity;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
