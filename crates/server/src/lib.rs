//! Callback notifier service library.
//!
//! Customers register, log in, and set one callback URL. Payment events
//! posted by the provider are forwarded to that URL in the background.
//! The binary in `main.rs` is a thin wrapper around [`app::build_app`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

pub use app::build_app;
pub use state::AppState;
