pub mod auth;
pub mod middleware;
pub mod reports;
pub mod rest;
pub mod state;

pub use middleware::require_auth;
pub use rest::ApiDoc;
