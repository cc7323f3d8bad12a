//! Persistence seam. Handlers only ever see `dyn Store`; the handle travels in `AppState`.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::error::AppError;
use crate::model::{Miner, MinerChanges, MinerWithGems, RareGem, RareGemChanges};
use async_trait::async_trait;

/// Every method is atomic. Unknown ids yield `AppError::NotFound`; a gem whose
/// miner does not exist yields the `miner: must exist` validation error; deleting
/// a miner that still owns gems yields `AppError::Conflict`.
#[async_trait]
pub trait Store: Send + Sync {
    async fn ping(&self) -> Result<(), AppError>;

    /// All miners ordered by id, gems attached in one batch.
    async fn list_miners(&self) -> Result<Vec<MinerWithGems>, AppError>;
    async fn find_miner(&self, id: i64) -> Result<MinerWithGems, AppError>;
    async fn create_miner(&self, changes: &MinerChanges) -> Result<Miner, AppError>;
    async fn update_miner(&self, id: i64, changes: &MinerChanges) -> Result<Miner, AppError>;
    async fn delete_miner(&self, id: i64) -> Result<(), AppError>;

    async fn list_rare_gems(&self) -> Result<Vec<RareGem>, AppError>;
    async fn find_rare_gem(&self, id: i64) -> Result<RareGem, AppError>;
    async fn create_rare_gem(&self, changes: &RareGemChanges) -> Result<RareGem, AppError>;
    async fn update_rare_gem(&self, id: i64, changes: &RareGemChanges) -> Result<RareGem, AppError>;
    async fn delete_rare_gem(&self, id: i64) -> Result<(), AppError>;
}

pub(crate) fn miner_not_found(id: i64) -> AppError {
    AppError::NotFound(format!("miner {}", id))
}

pub(crate) fn rare_gem_not_found(id: i64) -> AppError {
    AppError::NotFound(format!("rare gem {}", id))
}

pub(crate) fn miner_has_gems(id: i64) -> AppError {
    AppError::Conflict(format!("miner {} still owns rare gems", id))
}
