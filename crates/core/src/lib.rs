//! Storefront domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod actor;
pub mod contact;
pub mod error;
pub mod id;

pub use actor::Actor;
pub use contact::Contact;
pub use error::{StoreError, StoreResult};
pub use id::{OrderId, ProductId, UserId};
