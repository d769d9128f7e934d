//! Callback Notifier Core - Shared types library.
//!
//! Types shared by the notifier server, the CLI and the integration tests:
//! - [`CustomerId`] / [`CallbackId`] - typed database identifiers
//! - [`Email`] - the identity key a customer registers and logs in with
//!
//! The crate performs no I/O. Enable the `postgres` feature to get sqlx
//! encode/decode implementations for the identifier and email types.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
