//! Pocket Miner: REST backend for miners and the rare gems they own.

pub mod config;
pub mod error;
pub mod handlers;
pub mod migration;
pub mod model;
pub mod response;
pub mod routes;
pub mod service;
pub mod state;
pub mod store;

pub use config::{ServerConfig, StoreBackend};
pub use error::{AppError, ConfigError, ValidationErrors};
pub use migration::{apply_migrations, ensure_database_exists};
pub use model::{Miner, MinerChanges, MinerWithGems, RareGem, RareGemChanges};
pub use routes::{app, common_routes, resource_routes};
pub use state::AppState;
pub use store::{MemoryStore, PgStore, Store};
