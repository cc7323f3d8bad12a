//! HTTP handlers for the miner and rare gem resources.

pub mod miners;
pub mod rare_gems;

use crate::error::AppError;

/// Ids are positive integers; anything else is rejected before touching the store.
pub(crate) fn parse_id(id_str: &str) -> Result<i64, AppError> {
    id_str
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::BadRequest(format!("invalid id '{}'", id_str)))
}
