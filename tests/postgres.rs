//! `PgStore` against a live PostgreSQL. Run with `DATABASE_URL=... cargo test -- --ignored`.

use pocket_miner::{apply_migrations, AppError, MinerChanges, PgStore, RareGemChanges, Store};
use sqlx::postgres::PgPoolOptions;

async fn store(test: &str) -> Option<PgStore> {
    let url = match std::env::var("DATABASE_URL") {
        Ok(v) => v,
        Err(_) => {
            eprintln!("skipping {test}: DATABASE_URL not set");
            return None;
        }
    };
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .expect("connect to DATABASE_URL");
    apply_migrations(&pool).await.expect("apply migrations");
    Some(PgStore::new(pool))
}

fn miner(name: &str) -> MinerChanges {
    MinerChanges {
        name: Some(Some(name.to_string())),
        level: Some(Some(1)),
    }
}

fn gem(miner_id: i64) -> RareGemChanges {
    RareGemChanges {
        name: Some(Some("Opal".to_string())),
        color: Some(Some("white".to_string())),
        miner_id: Some(miner_id),
    }
}

#[tokio::test]
#[ignore = "requires DATABASE_URL and a local PostgreSQL"]
async fn dangling_miner_reference_is_a_validation_error() {
    let Some(store) = store("dangling_miner_reference_is_a_validation_error").await else {
        return;
    };
    let err = store.create_rare_gem(&gem(i64::MAX)).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(ref e) if e.get("miner").is_some()));

    let owner = store.create_miner(&miner("Bifur")).await.expect("create miner");
    let created = store.create_rare_gem(&gem(owner.id)).await.expect("create gem");
    let moved = RareGemChanges {
        miner_id: Some(i64::MAX),
        ..Default::default()
    };
    let err = store.update_rare_gem(created.id, &moved).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    store.delete_rare_gem(created.id).await.expect("delete gem");
    store.delete_miner(owner.id).await.expect("delete miner");
}

#[tokio::test]
#[ignore = "requires DATABASE_URL and a local PostgreSQL"]
async fn miner_with_gems_cannot_be_deleted() {
    let Some(store) = store("miner_with_gems_cannot_be_deleted").await else {
        return;
    };
    let owner = store.create_miner(&miner("Bofur")).await.expect("create miner");
    let created = store.create_rare_gem(&gem(owner.id)).await.expect("create gem");

    let err = store.delete_miner(owner.id).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    let found = store.find_miner(owner.id).await.expect("miner survives");
    assert_eq!(found.rare_gems.len(), 1);

    store.delete_rare_gem(created.id).await.expect("delete gem");
    store.delete_miner(owner.id).await.expect("delete miner");
    assert!(matches!(store.find_miner(owner.id).await, Err(AppError::NotFound(_))));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL and a local PostgreSQL"]
async fn partial_update_keeps_other_fields() {
    let Some(store) = store("partial_update_keeps_other_fields").await else {
        return;
    };
    let created = store.create_miner(&miner("Bombur")).await.expect("create miner");
    let changes = MinerChanges {
        level: Some(Some(8)),
        ..Default::default()
    };
    let updated = store.update_miner(created.id, &changes).await.expect("update miner");
    assert_eq!(updated.name.as_deref(), Some("Bombur"));
    assert_eq!(updated.level, Some(8));
    assert!(updated.updated_at >= created.updated_at);

    store.delete_miner(created.id).await.expect("delete miner");
}
