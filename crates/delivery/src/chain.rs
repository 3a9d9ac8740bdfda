//! The ordered channel chain.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::channel::{
    ChannelError, DeliveryChannel, DeliveryChannelKind, DeliveryResult,
};
use crate::message::DeliveryMessage;
use crate::sink::SinkChannel;

const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(5);

/// Prioritized set of delivery channels with a guaranteed outcome.
///
/// `send` walks the channels in order. A channel is only handed the message
/// after its handshake passes; handshake failure, transport failure, and
/// timeout all fall through to the next channel. The trailing [`SinkChannel`]
/// makes the walk total, so a [`DeliveryResult`] is always produced.
pub struct ChannelChain {
    channels: Vec<Arc<dyn DeliveryChannel>>,
    attempt_timeout: Duration,
}

impl ChannelChain {
    /// Build a chain from the given channels, appending the sink terminal.
    pub fn new(channels: Vec<Arc<dyn DeliveryChannel>>) -> Self {
        let mut channels = channels;
        channels.push(Arc::new(SinkChannel::new()));
        Self {
            channels,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
        }
    }

    /// Per-attempt time budget; a slow transport cannot stall a fan-out.
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    /// Send through the chain. Never errors.
    pub async fn send(&self, message: &DeliveryMessage) -> DeliveryResult {
        let mut last_failure = String::from("no channel configured");

        for channel in &self.channels {
            let kind = channel.kind();
            match self.attempt(channel.as_ref(), message).await {
                Ok(receipt) => {
                    if kind == DeliveryChannelKind::Sink {
                        // Mechanical success, but nothing was really sent.
                        return DeliveryResult::swallowed(receipt, last_failure);
                    }
                    debug!(channel = ?kind, to = %message.to, "message delivered");
                    return DeliveryResult::delivered(kind, receipt);
                }
                Err(e) => {
                    warn!(channel = ?kind, to = %message.to, error = %e, "channel attempt failed; falling through");
                    last_failure = format!("{kind:?}: {e}");
                }
            }
        }

        // Only reachable if even the sink misbehaves.
        DeliveryResult::failed(DeliveryChannelKind::Sink, last_failure)
    }

    async fn attempt(
        &self,
        channel: &dyn DeliveryChannel,
        message: &DeliveryMessage,
    ) -> Result<crate::channel::ChannelReceipt, ChannelError> {
        tokio::time::timeout(self.attempt_timeout, async {
            channel.handshake().await?;
            channel.deliver(message).await
        })
        .await
        .map_err(|_| ChannelError::Timeout)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ChannelReceipt;

    use shopfront_core::Contact;

    struct ScriptedChannel {
        kind: DeliveryChannelKind,
        handshake_ok: bool,
        deliver_ok: bool,
    }

    #[async_trait::async_trait]
    impl DeliveryChannel for ScriptedChannel {
        fn kind(&self) -> DeliveryChannelKind {
            self.kind
        }

        async fn handshake(&self) -> Result<(), ChannelError> {
            if self.handshake_ok {
                Ok(())
            } else {
                Err(ChannelError::Handshake("scripted refusal".into()))
            }
        }

        async fn deliver(&self, _: &DeliveryMessage) -> Result<ChannelReceipt, ChannelError> {
            if self.deliver_ok {
                Ok(ChannelReceipt {
                    message_id: format!("{:?}-msg-1", self.kind),
                    preview_url: match self.kind {
                        DeliveryChannelKind::Sandbox => {
                            Some("https://sandbox.test/preview/1".into())
                        }
                        _ => None,
                    },
                })
            } else {
                Err(ChannelError::Transport("scripted bounce".into()))
            }
        }
    }

    struct StalledChannel;

    #[async_trait::async_trait]
    impl DeliveryChannel for StalledChannel {
        fn kind(&self) -> DeliveryChannelKind {
            DeliveryChannelKind::Primary
        }

        async fn handshake(&self) -> Result<(), ChannelError> {
            Ok(())
        }

        async fn deliver(&self, _: &DeliveryMessage) -> Result<ChannelReceipt, ChannelError> {
            std::future::pending().await
        }
    }

    fn message() -> DeliveryMessage {
        DeliveryMessage::new(
            Contact::parse("e1@shop.test").unwrap(),
            "Order confirmed",
            "Thanks for your order.",
        )
    }

    #[tokio::test]
    async fn primary_success_stops_the_chain() {
        let chain = ChannelChain::new(vec![
            Arc::new(ScriptedChannel {
                kind: DeliveryChannelKind::Primary,
                handshake_ok: true,
                deliver_ok: true,
            }),
            Arc::new(ScriptedChannel {
                kind: DeliveryChannelKind::Sandbox,
                handshake_ok: true,
                deliver_ok: true,
            }),
        ]);

        let result = chain.send(&message()).await;
        assert!(result.success);
        assert_eq!(result.channel, DeliveryChannelKind::Primary);
        assert!(result.message_id.is_some());
    }

    #[tokio::test]
    async fn primary_handshake_failure_falls_through_to_sandbox() {
        let chain = ChannelChain::new(vec![
            Arc::new(ScriptedChannel {
                kind: DeliveryChannelKind::Primary,
                handshake_ok: false,
                deliver_ok: true,
            }),
            Arc::new(ScriptedChannel {
                kind: DeliveryChannelKind::Sandbox,
                handshake_ok: true,
                deliver_ok: true,
            }),
        ]);

        let result = chain.send(&message()).await;
        assert!(result.success);
        assert_eq!(result.channel, DeliveryChannelKind::Sandbox);
        assert_eq!(
            result.preview_url.as_deref(),
            Some("https://sandbox.test/preview/1")
        );
    }

    #[tokio::test]
    async fn all_real_channels_failing_lands_in_the_sink() {
        let chain = ChannelChain::new(vec![
            Arc::new(ScriptedChannel {
                kind: DeliveryChannelKind::Primary,
                handshake_ok: false,
                deliver_ok: false,
            }),
            Arc::new(ScriptedChannel {
                kind: DeliveryChannelKind::Sandbox,
                handshake_ok: true,
                deliver_ok: false,
            }),
        ]);

        let result = chain.send(&message()).await;
        assert!(!result.success);
        assert_eq!(result.channel, DeliveryChannelKind::Sink);
        // Sink still fabricates a message id so the attempt is traceable.
        assert!(result.message_id.unwrap().starts_with("sink-"));
        assert!(result.error_detail.unwrap().contains("Sandbox"));
    }

    #[tokio::test]
    async fn empty_chain_still_produces_a_result() {
        let chain = ChannelChain::new(vec![]);
        let result = chain.send(&message()).await;
        assert!(!result.success);
        assert_eq!(result.channel, DeliveryChannelKind::Sink);
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_channel_times_out_and_falls_through() {
        let chain = ChannelChain::new(vec![Arc::new(StalledChannel)])
            .with_attempt_timeout(Duration::from_millis(50));

        let result = chain.send(&message()).await;
        assert!(!result.success);
        assert_eq!(result.channel, DeliveryChannelKind::Sink);
        assert!(result.error_detail.unwrap().contains("timed out"));
    }
}
