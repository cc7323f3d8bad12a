//! Schema DDL for miners and rare gems, applied in version order and recorded in
//! `schema_migrations` so a restart never re-applies a step.

use crate::error::{AppError, ConfigError};
use sqlx::postgres::PgConnectOptions;
use sqlx::ConnectOptions;
use sqlx::{PgPool, Postgres, Transaction};
use std::str::FromStr;

pub struct Migration {
    pub version: i64,
    pub name: &'static str,
    pub sql: &'static str,
}

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 20250605125613,
        name: "create_miners",
        sql: r#"
            CREATE TABLE miners (
                id BIGSERIAL PRIMARY KEY,
                name TEXT,
                level INTEGER,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
        "#,
    },
    Migration {
        version: 20250605125752,
        name: "create_rare_gems",
        sql: r#"
            CREATE TABLE rare_gems (
                id BIGSERIAL PRIMARY KEY,
                name TEXT,
                color TEXT,
                miner_id BIGINT NOT NULL REFERENCES miners (id) ON DELETE RESTRICT,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            );
            CREATE INDEX index_rare_gems_on_miner_id ON rare_gems (miner_id);
        "#,
    },
];

/// Advisory lock key held while migrating, so concurrent starters apply each step once.
const MIGRATION_LOCK: i64 = 0x706f_636b_6574;

/// Create `schema_migrations` if needed, then apply each pending migration in its own transaction.
pub async fn apply_migrations(pool: &PgPool) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;
    lock(&mut tx).await?;
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version BIGINT PRIMARY KEY,
            applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    for m in MIGRATIONS {
        let mut tx = pool.begin().await?;
        lock(&mut tx).await?;
        let applied: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM schema_migrations WHERE version = $1)")
            .bind(m.version)
            .fetch_one(&mut *tx)
            .await?;
        if applied.0 {
            continue;
        }
        sqlx::raw_sql(m.sql).execute(&mut *tx).await?;
        sqlx::query("INSERT INTO schema_migrations (version) VALUES ($1)")
            .bind(m.version)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        tracing::info!(version = m.version, name = m.name, "applied migration");
    }
    Ok(())
}

async fn lock(tx: &mut Transaction<'_, Postgres>) -> Result<(), AppError> {
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(MIGRATION_LOCK)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// Connect to the server's `postgres` database and create the target database if missing.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let Some((admin, db_name)) = admin_options(database_url)? else {
        return Ok(());
    };
    let mut conn: sqlx::PgConnection = admin.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        sqlx::query(&format!("CREATE DATABASE {}", quote_ident(&db_name)))
            .execute(&mut conn)
            .await?;
        tracing::info!(database = %db_name, "created database");
    }
    Ok(())
}

/// Options for the `postgres` maintenance database plus the target name, or
/// `None` when the URL names no database or already points at `postgres`.
fn admin_options(url: &str) -> Result<Option<(PgConnectOptions, String)>, ConfigError> {
    let opts = PgConnectOptions::from_str(url).map_err(|e| ConfigError::DatabaseUrl(e.to_string()))?;
    let db_name = match opts.get_database() {
        Some(name) if !name.is_empty() && name != "postgres" => name.to_string(),
        _ => return Ok(None),
    };
    Ok(Some((opts.database("postgres"), db_name)))
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
