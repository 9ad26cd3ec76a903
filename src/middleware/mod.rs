pub mod auth;

pub use auth::api_key_auth_middleware;
