//! Parameter whitelisting: turns an arbitrary JSON body into a typed change set.
//!
//! Attributes may arrive nested under the resource key (`{"miner": {...}}`) or flat.
//! Keys outside the whitelist are dropped. Every field error is collected before failing.

use crate::error::{AppError, ValidationErrors};
use crate::model::{MinerChanges, RareGemChanges};
use serde_json::{Map, Value};

pub struct RequestValidator;

impl RequestValidator {
    /// Whitelist `{name, level}`. Used for both create and update.
    pub fn miner_changes(body: Value) -> Result<MinerChanges, AppError> {
        let attrs = attributes(body, "miner")?;
        let mut errors = ValidationErrors::new();
        let mut changes = MinerChanges::default();

        if let Some(v) = attrs.get("name") {
            match text(v) {
                Ok(name) => changes.name = Some(name),
                Err(msg) => errors.add("name", msg),
            }
        }
        if let Some(v) = attrs.get("level") {
            match integer(v).and_then(|n| n.map(i32::try_from).transpose().map_err(|_| "is out of range")) {
                Ok(level) => changes.level = Some(level),
                Err(msg) => errors.add("level", msg),
            }
        }

        errors.into_result()?;
        Ok(changes)
    }

    /// Whitelist `{name, color, miner_id}`. On create `miner_id` is required;
    /// on update it may be omitted but never set to null.
    pub fn rare_gem_changes(body: Value, creating: bool) -> Result<RareGemChanges, AppError> {
        let attrs = attributes(body, "rare_gem")?;
        let mut errors = ValidationErrors::new();
        let mut changes = RareGemChanges::default();

        for (field, slot) in [("name", &mut changes.name), ("color", &mut changes.color)] {
            if let Some(v) = attrs.get(field) {
                match text(v) {
                    Ok(s) => *slot = Some(s),
                    Err(msg) => errors.add(field, msg),
                }
            }
        }

        match attrs.get("miner_id").map(integer) {
            Some(Ok(Some(id))) => changes.miner_id = Some(id),
            Some(_) => errors.add("miner", "must exist"),
            None if creating => errors.add("miner", "must exist"),
            None => {}
        }

        errors.into_result()?;
        Ok(changes)
    }
}

fn attributes(body: Value, resource: &str) -> Result<Map<String, Value>, AppError> {
    let Value::Object(mut map) = body else {
        return Err(AppError::BadRequest("body must be a JSON object".into()));
    };
    match map.remove(resource) {
        Some(Value::Object(inner)) => Ok(inner),
        Some(_) => Err(AppError::BadRequest(format!("'{}' must be a JSON object", resource))),
        None => Ok(map),
    }
}

fn text(v: &Value) -> Result<Option<String>, &'static str> {
    match v {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        Value::Array(_) | Value::Object(_) => Err("is invalid"),
    }
}

/// Integers and integral strings; blank strings read as null.
fn integer(v: &Value) -> Result<Option<i64>, &'static str> {
    match v {
        Value::Null => Ok(None),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Some(i))
            } else if n.as_u64().is_some() {
                Err("is out of range")
            } else {
                Err("is not a number")
            }
        }
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => s.trim().parse().map(Some).map_err(|_| "is not a number"),
        _ => Err("is not a number"),
    }
}
