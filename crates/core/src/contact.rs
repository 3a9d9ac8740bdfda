//! Contact value type for delivery targets.

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// A delivery contact (email address) for confirmations and restock notices.
///
/// Compared case-insensitively so re-subscribing with a different casing
/// collapses onto the same registry record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Contact(String);

impl Contact {
    /// Parse and normalize a contact address.
    ///
    /// Validation is deliberately shallow (non-empty, one `@`, no
    /// whitespace); real mailbox verification belongs to the transport.
    pub fn parse(raw: impl Into<String>) -> Result<Self, StoreError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(StoreError::validation("contact cannot be empty"));
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(StoreError::validation("contact cannot contain whitespace"));
        }
        let mut parts = trimmed.splitn(2, '@');
        let local = parts.next().unwrap_or("");
        let domain = parts.next().unwrap_or("");
        if local.is_empty() || domain.is_empty() || domain.contains('@') {
            return Err(StoreError::validation(format!(
                "contact is not a valid address: {trimmed}"
            )));
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Contact {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl AsRef<str> for Contact {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_normalizes_case_and_whitespace() {
        let c = Contact::parse("  Ada@Example.COM ").unwrap();
        assert_eq!(c.as_str(), "ada@example.com");
    }

    #[test]
    fn rejects_empty_and_malformed() {
        assert!(Contact::parse("").is_err());
        assert!(Contact::parse("no-at-sign").is_err());
        assert!(Contact::parse("@domain").is_err());
        assert!(Contact::parse("user@").is_err());
        assert!(Contact::parse("a b@example.com").is_err());
    }

    #[test]
    fn same_address_different_case_is_equal() {
        let a = Contact::parse("E1@shop.test").unwrap();
        let b = Contact::parse("e1@SHOP.test").unwrap();
        assert_eq!(a, b);
    }
}
