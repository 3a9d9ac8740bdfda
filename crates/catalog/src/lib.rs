//! Catalog domain: products and the inventory ledger.
//!
//! `count_in_stock` is the one contended resource in the system. It is only
//! ever mutated through the ledger operations on [`CatalogStore`]
//! (conditional decrement, explicit set), never by read-modify-write at a
//! caller.

pub mod product;
pub mod store;

pub use product::{NewProduct, Product};
pub use store::{
    CatalogStore, CommittedDecrement, InMemoryCatalogStore, StockTransition,
};
