//! In-process store with the same contract as `PgStore`. Backs the test suite and
//! `POCKET_MINER_STORE=memory`.

use super::{miner_has_gems, miner_not_found, rare_gem_not_found, Store};
use crate::error::AppError;
use crate::model::{Miner, MinerChanges, MinerWithGems, RareGem, RareGemChanges};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::Mutex;

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

#[derive(Default)]
struct Tables {
    miners: BTreeMap<i64, Miner>,
    rare_gems: BTreeMap<i64, RareGem>,
    last_miner_id: i64,
    last_rare_gem_id: i64,
}

impl Tables {
    fn gems_of(&self, miner_id: i64) -> Vec<RareGem> {
        self.rare_gems
            .values()
            .filter(|g| g.miner_id == miner_id)
            .cloned()
            .collect()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn list_miners(&self) -> Result<Vec<MinerWithGems>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .miners
            .values()
            .map(|m| MinerWithGems {
                miner: m.clone(),
                rare_gems: tables.gems_of(m.id),
            })
            .collect())
    }

    async fn find_miner(&self, id: i64) -> Result<MinerWithGems, AppError> {
        let tables = self.tables.lock().await;
        let miner = tables.miners.get(&id).cloned().ok_or_else(|| miner_not_found(id))?;
        Ok(MinerWithGems {
            miner,
            rare_gems: tables.gems_of(id),
        })
    }

    async fn create_miner(&self, changes: &MinerChanges) -> Result<Miner, AppError> {
        let mut tables = self.tables.lock().await;
        tables.last_miner_id += 1;
        let now = Utc::now();
        let miner = Miner {
            id: tables.last_miner_id,
            name: changes.name.clone().flatten(),
            level: changes.level.flatten(),
            created_at: now,
            updated_at: now,
        };
        tables.miners.insert(miner.id, miner.clone());
        Ok(miner)
    }

    async fn update_miner(&self, id: i64, changes: &MinerChanges) -> Result<Miner, AppError> {
        let mut tables = self.tables.lock().await;
        let miner = tables.miners.get_mut(&id).ok_or_else(|| miner_not_found(id))?;
        miner.apply(changes, Utc::now());
        Ok(miner.clone())
    }

    async fn delete_miner(&self, id: i64) -> Result<(), AppError> {
        let mut tables = self.tables.lock().await;
        if !tables.miners.contains_key(&id) {
            return Err(miner_not_found(id));
        }
        if tables.rare_gems.values().any(|g| g.miner_id == id) {
            return Err(miner_has_gems(id));
        }
        tables.miners.remove(&id);
        Ok(())
    }

    async fn list_rare_gems(&self) -> Result<Vec<RareGem>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables.rare_gems.values().cloned().collect())
    }

    async fn find_rare_gem(&self, id: i64) -> Result<RareGem, AppError> {
        let tables = self.tables.lock().await;
        tables.rare_gems.get(&id).cloned().ok_or_else(|| rare_gem_not_found(id))
    }

    async fn create_rare_gem(&self, changes: &RareGemChanges) -> Result<RareGem, AppError> {
        let mut tables = self.tables.lock().await;
        let miner_id = changes
            .miner_id
            .filter(|id| tables.miners.contains_key(id))
            .ok_or_else(AppError::miner_must_exist)?;
        tables.last_rare_gem_id += 1;
        let now = Utc::now();
        let gem = RareGem {
            id: tables.last_rare_gem_id,
            name: changes.name.clone().flatten(),
            color: changes.color.clone().flatten(),
            miner_id,
            created_at: now,
            updated_at: now,
        };
        tables.rare_gems.insert(gem.id, gem.clone());
        Ok(gem)
    }

    async fn update_rare_gem(&self, id: i64, changes: &RareGemChanges) -> Result<RareGem, AppError> {
        let mut tables = self.tables.lock().await;
        if !tables.rare_gems.contains_key(&id) {
            return Err(rare_gem_not_found(id));
        }
        if let Some(miner_id) = changes.miner_id {
            if !tables.miners.contains_key(&miner_id) {
                return Err(AppError::miner_must_exist());
            }
        }
        let gem = tables.rare_gems.get_mut(&id).ok_or_else(|| rare_gem_not_found(id))?;
        gem.apply(changes, Utc::now());
        Ok(gem.clone())
    }

    async fn delete_rare_gem(&self, id: i64) -> Result<(), AppError> {
        let mut tables = self.tables.lock().await;
        tables
            .rare_gems
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| rare_gem_not_found(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str) -> MinerChanges {
        MinerChanges {
            name: Some(Some(name.into())),
            level: Some(Some(1)),
        }
    }

    fn gem_for(miner_id: i64) -> RareGemChanges {
        RareGemChanges {
            name: Some(Some("Emerald".into())),
            color: Some(Some("green".into())),
            miner_id: Some(miner_id),
        }
    }

    #[tokio::test]
    async fn ids_are_assigned_in_order() {
        let store = MemoryStore::new();
        let a = store.create_miner(&named("Balin")).await.unwrap();
        let b = store.create_miner(&named("Dwalin")).await.unwrap();
        assert_eq!((a.id, b.id), (1, 2));
        store.delete_miner(b.id).await.unwrap();
        let c = store.create_miner(&named("Oin")).await.unwrap();
        assert_eq!(c.id, 3);
    }

    #[tokio::test]
    async fn gem_needs_existing_miner() {
        let store = MemoryStore::new();
        let err = store.create_rare_gem(&gem_for(42)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(store.list_rare_gems().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_is_restricted_while_gems_exist() {
        let store = MemoryStore::new();
        let miner = store.create_miner(&named("Gloin")).await.unwrap();
        let gem = store.create_rare_gem(&gem_for(miner.id)).await.unwrap();

        let err = store.delete_miner(miner.id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(store.list_miners().await.unwrap().len(), 1);

        store.delete_rare_gem(gem.id).await.unwrap();
        store.delete_miner(miner.id).await.unwrap();
        assert!(matches!(
            store.find_miner(miner.id).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn gem_cannot_move_to_unknown_miner() {
        let store = MemoryStore::new();
        let miner = store.create_miner(&named("Bifur")).await.unwrap();
        let gem = store.create_rare_gem(&gem_for(miner.id)).await.unwrap();
        let err = store
            .update_rare_gem(
                gem.id,
                &RareGemChanges {
                    miner_id: Some(999),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(store.find_rare_gem(gem.id).await.unwrap().miner_id, miner.id);
    }
}
