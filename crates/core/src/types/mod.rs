//! Core types for the callback notifier.

pub mod email;
pub mod id;

pub use email::{Email, EmailError};
pub use id::*;
