use std::sync::Arc;

use crate::{
    config::{AppConfig, BookingPolicy},
    db::{DbPool, OrmConn, sqlx_pool},
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(orm: OrmConn, config: AppConfig) -> Self {
        Self {
            pool: sqlx_pool(&orm),
            orm,
            config: Arc::new(config),
        }
    }

    pub fn policy(&self) -> &BookingPolicy {
        &self.config.booking
    }
}
