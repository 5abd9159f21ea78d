//! PathExplorer portal service library crate.
//!
//! # Purpose
//! Serves the dashboard behind the request-time route gate and brokers the
//! identity backend for browsers through the session cookies.
//!
//! # Notes
//! The binary only wires configuration and observability; everything
//! testable lives here.
pub mod api;
pub mod app;
pub mod config;
pub mod gate;
pub mod identity;
pub mod observability;
pub mod pages;
