use std::sync::Arc;

use querykit::{DefinitionError, QueryDefinition};
use sea_orm::DatabaseConnection;

use crate::config::Config;
use crate::entities::task;
use crate::queries;
use crate::rate_limit::RateLimiter;

/// Shared by every handler; cheap to clone.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<Config>,
    /// List declarations for `GET /tasks`, validated once at startup.
    pub tasks: Arc<QueryDefinition<task::Entity>>,
    /// `None` when rate limiting is switched off.
    pub limiter: Option<RateLimiter>,
}

impl AppState {
    /// # Errors
    ///
    /// Fails when the task list declarations do not match the entity.
    pub fn new(db: DatabaseConnection, config: Config) -> Result<Self, DefinitionError> {
        let limiter = RateLimiter::from_config(&config.rate_limit);
        Ok(Self {
            db,
            tasks: Arc::new(queries::task_definition()?),
            config: Arc::new(config),
            limiter,
        })
    }
}
