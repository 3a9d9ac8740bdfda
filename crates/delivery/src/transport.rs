//! HTTP mail-API transport.
//!
//! Both the Primary and Sandbox channels are the same client shape pointed
//! at different endpoints: Primary at the externally configured provider,
//! Sandbox at a disposable test service that hands back preview URLs.

use serde::{Deserialize, Serialize};

use crate::channel::{ChannelError, ChannelReceipt, DeliveryChannel, DeliveryChannelKind};
use crate::message::DeliveryMessage;

/// Connection settings for a mail API endpoint.
#[derive(Debug, Clone)]
pub struct MailApiConfig {
    pub base_url: String,
    pub api_token: String,
    pub sender: String,
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    html: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    id: String,
    #[serde(default)]
    preview_url: Option<String>,
}

/// Mail delivery over a provider's HTTP API.
pub struct MailApiChannel {
    kind: DeliveryChannelKind,
    config: MailApiConfig,
    client: reqwest::Client,
}

impl MailApiChannel {
    pub fn primary(config: MailApiConfig) -> Self {
        Self::new(DeliveryChannelKind::Primary, config)
    }

    pub fn sandbox(config: MailApiConfig) -> Self {
        Self::new(DeliveryChannelKind::Sandbox, config)
    }

    fn new(kind: DeliveryChannelKind, config: MailApiConfig) -> Self {
        Self {
            kind,
            config,
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait::async_trait]
impl DeliveryChannel for MailApiChannel {
    fn kind(&self) -> DeliveryChannelKind {
        self.kind
    }

    async fn handshake(&self) -> Result<(), ChannelError> {
        if self.config.base_url.is_empty() {
            return Err(ChannelError::Handshake("no endpoint configured".into()));
        }
        let response = self
            .client
            .get(self.url("verify"))
            .bearer_auth(&self.config.api_token)
            .send()
            .await
            .map_err(|e| ChannelError::Handshake(e.to_string()))?;
        if !response.status().is_success() {
            return Err(ChannelError::Handshake(format!(
                "verify returned {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn deliver(&self, message: &DeliveryMessage) -> Result<ChannelReceipt, ChannelError> {
        let body = SendRequest {
            from: &self.config.sender,
            to: message.to.as_str(),
            subject: &message.subject,
            text: &message.body_text,
            html: message.body_html.as_deref(),
        };
        let response = self
            .client
            .post(self.url("messages"))
            .bearer_auth(&self.config.api_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChannelError::Transport(e.to_string()))?;
        if !response.status().is_success() {
            return Err(ChannelError::Transport(format!(
                "send returned {}",
                response.status()
            )));
        }
        let parsed: SendResponse = response
            .json()
            .await
            .map_err(|e| ChannelError::Transport(e.to_string()))?;
        Ok(ChannelReceipt {
            message_id: parsed.id,
            preview_url: parsed.preview_url,
        })
    }
}
