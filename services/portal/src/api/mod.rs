//! Portal HTTP API under `/api`.
pub mod error;
pub mod openapi;
pub mod session;
pub mod system;
pub mod types;
