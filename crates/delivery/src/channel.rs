use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::message::DeliveryMessage;

/// Which link of the chain handled (or swallowed) a message.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryChannelKind {
    /// Externally configured transport, verified via handshake before use.
    Primary,
    /// Disposable sandbox transport; only reached when Primary is unusable.
    Sandbox,
    /// No-op terminal channel: logs the payload and fabricates a message id.
    Sink,
}

/// Failure inside a single channel attempt.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChannelError {
    #[error("handshake failed: {0}")]
    Handshake(String),

    #[error("transport failed: {0}")]
    Transport(String),

    #[error("attempt timed out")]
    Timeout,
}

/// What a channel reports back after a mechanical delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelReceipt {
    pub message_id: String,
    /// Where the message can be inspected; only the sandbox produces one.
    pub preview_url: Option<String>,
}

/// Uniform contract every delivery attempt resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryResult {
    pub success: bool,
    pub channel: DeliveryChannelKind,
    pub message_id: Option<String>,
    pub preview_url: Option<String>,
    pub error_detail: Option<String>,
}

impl DeliveryResult {
    pub fn delivered(channel: DeliveryChannelKind, receipt: ChannelReceipt) -> Self {
        Self {
            success: true,
            channel,
            message_id: Some(receipt.message_id),
            preview_url: receipt.preview_url,
            error_detail: None,
        }
    }

    /// Sink outcome: mechanically fine, but no real delivery happened.
    pub fn swallowed(receipt: ChannelReceipt, detail: impl Into<String>) -> Self {
        Self {
            success: false,
            channel: DeliveryChannelKind::Sink,
            message_id: Some(receipt.message_id),
            preview_url: None,
            error_detail: Some(detail.into()),
        }
    }

    pub fn failed(channel: DeliveryChannelKind, detail: impl Into<String>) -> Self {
        Self {
            success: false,
            channel,
            message_id: None,
            preview_url: None,
            error_detail: Some(detail.into()),
        }
    }
}

/// One link of the delivery chain.
#[async_trait::async_trait]
pub trait DeliveryChannel: Send + Sync {
    fn kind(&self) -> DeliveryChannelKind;

    /// Verify the channel is usable before committing a message to it.
    async fn handshake(&self) -> Result<(), ChannelError>;

    async fn deliver(&self, message: &DeliveryMessage) -> Result<ChannelReceipt, ChannelError>;
}
