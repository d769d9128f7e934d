//! Domain models.
//!
//! - [`customer`] - the customer aggregate (customer + its single callback)
//! - [`session`] - identity stored in the session

pub mod customer;
pub mod session;

pub use customer::{Callback, Customer, CustomerProfile, NewCustomer};
pub use session::{CurrentCustomer, keys as session_keys};
