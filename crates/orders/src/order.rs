use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopfront_core::{Actor, Contact, OrderId, ProductId, StoreError, StoreResult};

/// One line of an order.
///
/// `unit_price_cents` is a snapshot taken at order time: later catalog price
/// changes must not retroactively alter historical orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: i64,
    pub unit_price_cents: u64,
}

impl OrderLine {
    pub fn subtotal_cents(&self) -> u64 {
        self.unit_price_cents * self.quantity as u64
    }
}

/// Shipping address.
///
/// Input accepts the `zip` alias for `postal_code`; [`ShippingAddress::normalize`]
/// folds it into the canonical field for carts built programmatically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub address: String,
    pub city: String,
    #[serde(alias = "zip", default)]
    pub postal_code: String,
    /// Alias field populated by legacy clients; drained by `normalize`.
    #[serde(default, skip_serializing)]
    pub zip: Option<String>,
    pub country: String,
}

impl ShippingAddress {
    /// Fold field aliases into their canonical names and validate.
    pub fn normalize(mut self) -> StoreResult<Self> {
        if self.postal_code.is_empty() {
            if let Some(zip) = self.zip.take() {
                self.postal_code = zip;
            }
        }
        self.zip = None;

        let mut missing = Vec::new();
        if self.address.trim().is_empty() {
            missing.push("address");
        }
        if self.city.trim().is_empty() {
            missing.push("city");
        }
        if self.postal_code.trim().is_empty() {
            missing.push("postal_code");
        }
        if self.country.trim().is_empty() {
            missing.push("country");
        }
        if !missing.is_empty() {
            return Err(StoreError::validation(format!(
                "missing shipping fields: {}",
                missing.join(", ")
            )));
        }
        Ok(self)
    }
}

/// Opaque result of an external payment capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentCapture {
    pub capture_id: String,
    pub status: String,
    pub payer_contact: Option<Contact>,
}

/// An order. Durably persisted for identified actors; synthesized and
/// returned without persistence for guests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub owner: Actor,
    pub lines: Vec<OrderLine>,
    pub shipping: ShippingAddress,
    pub payment_method: String,
    pub is_paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub payment: Option<PaymentCapture>,
    pub is_delivered: bool,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn total_cents(&self) -> u64 {
        self.lines.iter().map(OrderLine::subtotal_cents).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> ShippingAddress {
        ShippingAddress {
            address: "1 Pine St".into(),
            city: "Portland".into(),
            postal_code: "97201".into(),
            zip: None,
            country: "US".into(),
        }
    }

    #[test]
    fn zip_alias_populates_postal_code() {
        let input = ShippingAddress {
            postal_code: String::new(),
            zip: Some("97202".into()),
            ..address()
        };
        let normalized = input.normalize().unwrap();
        assert_eq!(normalized.postal_code, "97202");
        assert_eq!(normalized.zip, None);
    }

    #[test]
    fn canonical_postal_code_wins_over_alias() {
        let input = ShippingAddress {
            zip: Some("00000".into()),
            ..address()
        };
        let normalized = input.normalize().unwrap();
        assert_eq!(normalized.postal_code, "97201");
    }

    #[test]
    fn serde_accepts_zip_for_postal_code() {
        let parsed: ShippingAddress = serde_json::from_str(
            r#"{"address":"1 Pine St","city":"Portland","zip":"97203","country":"US"}"#,
        )
        .unwrap();
        let normalized = parsed.normalize().unwrap();
        assert_eq!(normalized.postal_code, "97203");
    }

    #[test]
    fn missing_fields_are_listed_in_the_validation_error() {
        let input = ShippingAddress {
            address: String::new(),
            city: String::new(),
            postal_code: "97201".into(),
            zip: None,
            country: "US".into(),
        };
        let err = input.normalize().unwrap_err();
        match err {
            StoreError::Validation(msg) => {
                assert!(msg.contains("address"));
                assert!(msg.contains("city"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn order_total_sums_line_snapshots() {
        let order = Order {
            id: OrderId::new(),
            owner: Actor::Guest,
            lines: vec![
                OrderLine {
                    product_id: ProductId::new(),
                    name: "Lamp".into(),
                    quantity: 2,
                    unit_price_cents: 1500,
                },
                OrderLine {
                    product_id: ProductId::new(),
                    name: "Desk".into(),
                    quantity: 1,
                    unit_price_cents: 45_000,
                },
            ],
            shipping: address(),
            payment_method: "card".into(),
            is_paid: false,
            paid_at: None,
            payment: None,
            is_delivered: false,
            delivered_at: None,
            created_at: Utc::now(),
        };
        assert_eq!(order.total_cents(), 48_000);
    }
}
