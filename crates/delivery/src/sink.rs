use tracing::info;
use uuid::Uuid;

use crate::channel::{ChannelError, ChannelReceipt, DeliveryChannel, DeliveryChannelKind};
use crate::message::DeliveryMessage;

/// Terminal no-op channel.
///
/// Mechanically it always succeeds: it logs the payload and fabricates a
/// synthetic message id. The chain still reports `success: false` for it,
/// because nothing actually reached the recipient.
#[derive(Debug, Default)]
pub struct SinkChannel;

impl SinkChannel {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl DeliveryChannel for SinkChannel {
    fn kind(&self) -> DeliveryChannelKind {
        DeliveryChannelKind::Sink
    }

    async fn handshake(&self) -> Result<(), ChannelError> {
        Ok(())
    }

    async fn deliver(&self, message: &DeliveryMessage) -> Result<ChannelReceipt, ChannelError> {
        let message_id = format!("sink-{}", Uuid::now_v7());
        info!(
            to = %message.to,
            subject = %message.subject,
            body = %message.body_text,
            message_id = %message_id,
            "delivery sank; message logged instead of sent"
        );
        Ok(ChannelReceipt {
            message_id,
            preview_url: None,
        })
    }
}
