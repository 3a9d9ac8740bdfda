//! Delivery channel chain.
//!
//! Message delivery is a non-critical dependency: nothing in here is allowed
//! to fail a business operation. [`ChannelChain::send`] never errors; every
//! failure mode (handshake refusal, transport error, timeout) is converted
//! into a [`DeliveryResult`] with `success: false` and the chain falls
//! through to the next channel.

pub mod chain;
pub mod channel;
pub mod message;
pub mod sink;
pub mod transport;

pub use chain::ChannelChain;
pub use channel::{
    ChannelError, ChannelReceipt, DeliveryChannel, DeliveryChannelKind, DeliveryResult,
};
pub use message::DeliveryMessage;
pub use sink::SinkChannel;
pub use transport::{MailApiChannel, MailApiConfig};
