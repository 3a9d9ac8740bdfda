//! Order domain: cart intake, order records, status transitions.

pub mod intake;
pub mod order;
pub mod store;

pub use intake::{CartLine, OrderIntake, OrderIntakeRequest, OrderReceipt};
pub use order::{Order, OrderLine, PaymentCapture, ShippingAddress};
pub use store::{InMemoryOrderStore, OrderStore};
