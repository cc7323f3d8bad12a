//! PostgreSQL store. Plain statements for fixed shapes, `QueryBuilder` for partial updates.

use super::{miner_has_gems, miner_not_found, rare_gem_not_found, Store};
use crate::error::AppError;
use crate::model::{Miner, MinerChanges, MinerWithGems, RareGem, RareGemChanges};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::collections::HashMap;

const MINER_COLUMNS: &str = "id, name, level, created_at, updated_at";
const RARE_GEM_COLUMNS: &str = "id, name, color, miner_id, created_at, updated_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gems for a batch of miners in one query, grouped by owner.
    async fn gems_by_miner(&self, miner_ids: &[i64]) -> Result<HashMap<i64, Vec<RareGem>>, AppError> {
        if miner_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let sql = format!(
            "SELECT {} FROM rare_gems WHERE miner_id = ANY($1) ORDER BY id",
            RARE_GEM_COLUMNS
        );
        tracing::debug!(sql = %sql, miners = miner_ids.len(), "query");
        let gems = sqlx::query_as::<_, RareGem>(&sql)
            .bind(miner_ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(gems.into_iter().fold(HashMap::new(), |mut m, g| {
            m.entry(g.miner_id).or_default().push(g);
            m
        }))
    }
}

/// Foreign-key violations become a domain error, anything else stays a database error.
fn on_fk_violation(err: sqlx::Error, mapped: AppError) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => mapped,
        _ => AppError::Db(err),
    }
}

/// `UPDATE miners` touching only the fields present in `changes`.
fn miner_update_query(id: i64, changes: &MinerChanges) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("UPDATE miners SET updated_at = NOW()");
    if let Some(name) = &changes.name {
        qb.push(", name = ").push_bind(name.clone());
    }
    if let Some(level) = changes.level {
        qb.push(", level = ").push_bind(level);
    }
    qb.push(" WHERE id = ").push_bind(id);
    qb.push(" RETURNING ").push(MINER_COLUMNS);
    qb
}

fn rare_gem_update_query(id: i64, changes: &RareGemChanges) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("UPDATE rare_gems SET updated_at = NOW()");
    if let Some(name) = &changes.name {
        qb.push(", name = ").push_bind(name.clone());
    }
    if let Some(color) = &changes.color {
        qb.push(", color = ").push_bind(color.clone());
    }
    if let Some(miner_id) = changes.miner_id {
        qb.push(", miner_id = ").push_bind(miner_id);
    }
    qb.push(" WHERE id = ").push_bind(id);
    qb.push(" RETURNING ").push(RARE_GEM_COLUMNS);
    qb
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn list_miners(&self) -> Result<Vec<MinerWithGems>, AppError> {
        let sql = format!("SELECT {} FROM miners ORDER BY id", MINER_COLUMNS);
        tracing::debug!(sql = %sql, "query");
        let miners = sqlx::query_as::<_, Miner>(&sql).fetch_all(&self.pool).await?;
        let ids: Vec<i64> = miners.iter().map(|m| m.id).collect();
        let mut gems = self.gems_by_miner(&ids).await?;
        Ok(miners
            .into_iter()
            .map(|miner| {
                let rare_gems = gems.remove(&miner.id).unwrap_or_default();
                MinerWithGems { miner, rare_gems }
            })
            .collect())
    }

    async fn find_miner(&self, id: i64) -> Result<MinerWithGems, AppError> {
        let sql = format!("SELECT {} FROM miners WHERE id = $1", MINER_COLUMNS);
        tracing::debug!(sql = %sql, id, "query");
        let miner = sqlx::query_as::<_, Miner>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| miner_not_found(id))?;
        let rare_gems = self.gems_by_miner(&[id]).await?.remove(&id).unwrap_or_default();
        Ok(MinerWithGems { miner, rare_gems })
    }

    async fn create_miner(&self, changes: &MinerChanges) -> Result<Miner, AppError> {
        let sql = format!(
            "INSERT INTO miners (name, level) VALUES ($1, $2) RETURNING {}",
            MINER_COLUMNS
        );
        tracing::debug!(sql = %sql, "query");
        let miner = sqlx::query_as::<_, Miner>(&sql)
            .bind(changes.name.clone().flatten())
            .bind(changes.level.flatten())
            .fetch_one(&self.pool)
            .await?;
        Ok(miner)
    }

    async fn update_miner(&self, id: i64, changes: &MinerChanges) -> Result<Miner, AppError> {
        let mut qb = miner_update_query(id, changes);
        tracing::debug!(sql = %qb.sql(), id, "query");
        qb.build_query_as::<Miner>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| miner_not_found(id))
    }

    async fn delete_miner(&self, id: i64) -> Result<(), AppError> {
        tracing::debug!(id, "delete miner");
        let done = sqlx::query("DELETE FROM miners WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| on_fk_violation(e, miner_has_gems(id)))?;
        if done.rows_affected() == 0 {
            return Err(miner_not_found(id));
        }
        Ok(())
    }

    async fn list_rare_gems(&self) -> Result<Vec<RareGem>, AppError> {
        let sql = format!("SELECT {} FROM rare_gems ORDER BY id", RARE_GEM_COLUMNS);
        tracing::debug!(sql = %sql, "query");
        Ok(sqlx::query_as::<_, RareGem>(&sql).fetch_all(&self.pool).await?)
    }

    async fn find_rare_gem(&self, id: i64) -> Result<RareGem, AppError> {
        let sql = format!("SELECT {} FROM rare_gems WHERE id = $1", RARE_GEM_COLUMNS);
        tracing::debug!(sql = %sql, id, "query");
        sqlx::query_as::<_, RareGem>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| rare_gem_not_found(id))
    }

    async fn create_rare_gem(&self, changes: &RareGemChanges) -> Result<RareGem, AppError> {
        let miner_id = changes.miner_id.ok_or_else(AppError::miner_must_exist)?;
        let sql = format!(
            "INSERT INTO rare_gems (name, color, miner_id) VALUES ($1, $2, $3) RETURNING {}",
            RARE_GEM_COLUMNS
        );
        tracing::debug!(sql = %sql, miner_id, "query");
        sqlx::query_as::<_, RareGem>(&sql)
            .bind(changes.name.clone().flatten())
            .bind(changes.color.clone().flatten())
            .bind(miner_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| on_fk_violation(e, AppError::miner_must_exist()))
    }

    async fn update_rare_gem(&self, id: i64, changes: &RareGemChanges) -> Result<RareGem, AppError> {
        let mut qb = rare_gem_update_query(id, changes);
        tracing::debug!(sql = %qb.sql(), id, "query");
        qb.build_query_as::<RareGem>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| on_fk_violation(e, AppError::miner_must_exist()))?
            .ok_or_else(|| rare_gem_not_found(id))
    }

    async fn delete_rare_gem(&self, id: i64) -> Result<(), AppError> {
        tracing::debug!(id, "delete rare gem");
        let done = sqlx::query("DELETE FROM rare_gems WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if done.rows_affected() == 0 {
            return Err(rare_gem_not_found(id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn miner_update_sets_only_given_fields() {
        let changes = MinerChanges {
            level: Some(Some(6)),
            ..Default::default()
        };
        assert_eq!(
            miner_update_query(1, &changes).sql(),
            "UPDATE miners SET updated_at = NOW(), level = $1 WHERE id = $2 \
             RETURNING id, name, level, created_at, updated_at"
        );

        let changes = MinerChanges {
            name: Some(None),
            level: Some(Some(2)),
        };
        assert_eq!(
            miner_update_query(1, &changes).sql(),
            "UPDATE miners SET updated_at = NOW(), name = $1, level = $2 WHERE id = $3 \
             RETURNING id, name, level, created_at, updated_at"
        );
    }

    #[test]
    fn empty_miner_update_only_touches_timestamp() {
        assert_eq!(
            miner_update_query(9, &MinerChanges::default()).sql(),
            "UPDATE miners SET updated_at = NOW() WHERE id = $1 \
             RETURNING id, name, level, created_at, updated_at"
        );
    }

    #[test]
    fn rare_gem_update_binds_miner_reference() {
        let changes = RareGemChanges {
            color: Some(Some("red".into())),
            miner_id: Some(4),
            ..Default::default()
        };
        assert_eq!(
            rare_gem_update_query(2, &changes).sql(),
            "UPDATE rare_gems SET updated_at = NOW(), color = $1, miner_id = $2 WHERE id = $3 \
             RETURNING id, name, color, miner_id, created_at, updated_at"
        );
    }

    #[test]
    fn non_fk_errors_stay_database_errors() {
        let err = on_fk_violation(sqlx::Error::PoolTimedOut, miner_has_gems(1));
        assert!(matches!(err, AppError::Db(sqlx::Error::PoolTimedOut)));
    }
}
