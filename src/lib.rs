use std::sync::Arc;

use tokio_util::sync::CancellationToken;

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod routes;
pub mod services;

use config::Config;
use repository::MoodEntryRepository;

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn MoodEntryRepository>,
    pub config: Arc<Config>,
    /// Cancelled on shutdown; handlers hand child tokens to the repository.
    pub shutdown: CancellationToken,
}
