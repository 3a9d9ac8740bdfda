use serde::{Deserialize, Serialize};

use shopfront_core::Contact;

/// A notification message handed to the channel chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryMessage {
    pub to: Contact,
    pub subject: String,
    pub body_text: String,
    pub body_html: Option<String>,
}

impl DeliveryMessage {
    pub fn new(to: Contact, subject: impl Into<String>, body_text: impl Into<String>) -> Self {
        Self {
            to,
            subject: subject.into(),
            body_text: body_text.into(),
            body_html: None,
        }
    }

    pub fn with_html(mut self, body_html: impl Into<String>) -> Self {
        self.body_html = Some(body_html.into());
        self
    }
}
