//! Resource routes: /miners and /rare_gems. PATCH and PUT share the partial update handler.

use crate::handlers::{miners, rare_gems};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn resource_routes(state: AppState) -> Router {
    Router::new()
        .route("/miners", get(miners::list).post(miners::create))
        .route(
            "/miners/:id",
            get(miners::read)
                .patch(miners::update)
                .put(miners::update)
                .delete(miners::delete),
        )
        .route("/rare_gems", get(rare_gems::list).post(rare_gems::create))
        .route(
            "/rare_gems/:id",
            get(rare_gems::read)
                .patch(rare_gems::update)
                .put(rare_gems::update)
                .delete(rare_gems::delete),
        )
        .with_state(state)
}
