//! Success response helpers. Records are rendered bare; only errors carry an envelope.

use axum::{
    http::{header, HeaderMap, HeaderValue, StatusCode},
    Json,
};
use serde::Serialize;

/// 201 with a `Location` header pointing at the new record.
pub fn created<T: Serialize>(location: String, data: T) -> (StatusCode, HeaderMap, Json<T>) {
    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&location) {
        headers.insert(header::LOCATION, value);
    }
    (StatusCode::CREATED, headers, Json(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[test]
    fn created_sets_status_and_location() {
        let resp = created("/miners/3".to_string(), serde_json::json!({"id": 3})).into_response();
        assert_eq!(resp.status(), StatusCode::CREATED);
        assert_eq!(
            resp.headers().get(header::LOCATION).and_then(|v| v.to_str().ok()),
            Some("/miners/3")
        );
    }
}
