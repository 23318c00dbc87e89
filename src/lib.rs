pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod flash;
pub mod handlers;
pub mod pagination;
pub mod routes;
pub mod seed;
pub mod services;
pub mod slug;
pub mod validation;
pub mod view;

use std::sync::Arc;

use db::pool::Db;

use config::Config;
use error::AppError;
use services::analytics::{self, Analytics};
use services::keygen::{KeyGenerator, Sha256KeyGenerator};

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub jwt: auth::jwt::JwtManager,
    pub config: Config,
    pub keygen: Arc<dyn KeyGenerator>,
    pub analytics: Arc<dyn Analytics>,
}

impl AppState {
    /// State with the default key generator, and the analytics client
    /// configured by `ANALYTICS_URL`.
    pub fn new(db: Db, config: Config) -> Result<Self, AppError> {
        let jwt = auth::jwt::JwtManager::new(&config)?;
        let analytics = analytics::from_config(&config);

        Ok(Self {
            db,
            jwt,
            config,
            keygen: Arc::new(Sha256KeyGenerator),
            analytics,
        })
    }
}

impl AsRef<AppState> for AppState {
    fn as_ref(&self) -> &AppState {
        self
    }
}
