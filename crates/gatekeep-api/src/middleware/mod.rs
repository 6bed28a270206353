//! API Middleware

pub mod auth;

pub use auth::{rejection, require_access, Session};
