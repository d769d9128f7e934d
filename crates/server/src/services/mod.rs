//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Customer registration and password login
//! - `callbacks` - Callback URL registration
//! - `notifier` - Fire-and-forget webhook delivery

pub mod auth;
pub mod callbacks;
pub mod notifier;

pub use auth::{AuthError, AuthService};
pub use callbacks::{CallbackError, CallbackService};
pub use notifier::{DeliveryError, Notifier, NotifierError};
