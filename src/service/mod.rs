//! Request-side services: parameter whitelisting ahead of the store.

mod validation;
pub use validation::RequestValidator;
