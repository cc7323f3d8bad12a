//! Router assembly.

mod common;
mod resources;

pub use common::common_routes;
pub use resources::resource_routes;

use crate::state::AppState;
use axum::Router;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

/// Full application: common + resource routes, request tracing, body size limit.
pub fn app(state: AppState, body_limit: usize) -> Router {
    Router::new()
        .merge(common_routes(state.clone()))
        .merge(resource_routes(state))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TraceLayer::new_for_http())
}
