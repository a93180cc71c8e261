//! # taskapi
//!
//! A REST API for users and their tasks, built on axum and sea-orm.
//!
//! - `POST /api/v1/auth` logs a known email in or registers a new one and
//!   hands out an opaque bearer token
//! - `/api/v1/users` reads and updates the caller's profile and password
//! - `/api/v1/tasks` creates, reads, updates and deletes tasks; the listing
//!   goes through a [`querykit::QueryDefinition`] and so supports filters,
//!   ranges, global and simple search, sorting and pagination
//!
//! Single-task operations are reserved for the task's creator. Every
//! response uses the `{success, message, data}` envelope of
//! [`response::ApiResponse`] or [`errors::ErrorResponse`].
//!
//! ```rust,ignore
//! let config = Config::load()?;
//! let db = Database::connect(&config.database_url).await?;
//! Migrator::up(&db, None).await?;
//! let app = taskapi::router(AppState::new(db, config)?);
//! ```

pub mod auth;
pub mod config;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod migration;
pub mod policy;
pub mod queries;
pub mod rate_limit;
pub mod response;
pub mod routes;
pub mod state;
pub mod telemetry;
pub mod validation;

pub use config::Config;
pub use errors::ApiError;
pub use migration::Migrator;
pub use routes::router;
pub use state::AppState;
