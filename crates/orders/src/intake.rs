//! Order intake: validate a cart, commit stock decrements, trigger the
//! confirmation message.
//!
//! Ordering inside [`OrderIntake::place_order`] is load-bearing: every line
//! is resolved and availability-checked before any decrement is attempted,
//! which is what keeps an invalid line from leaving sibling lines partially
//! committed. The decrements themselves are independent per-product
//! conditional writes with no cross-product rollback.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use shopfront_catalog::{CatalogStore, CommittedDecrement, Product};
use shopfront_core::{Actor, Contact, OrderId, ProductId, StoreError, StoreResult};
use shopfront_delivery::{ChannelChain, DeliveryChannelKind, DeliveryMessage};

use crate::order::{Order, OrderLine, ShippingAddress};
use crate::store::OrderStore;

/// One cart entry as submitted by the caller: a product reference (id, or
/// name when the id is absent) plus a quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    #[serde(default)]
    pub product_id: Option<ProductId>,
    #[serde(default)]
    pub name: Option<String>,
    pub quantity: i64,
}

/// Everything `place_order` needs from the boundary.
#[derive(Debug, Clone)]
pub struct OrderIntakeRequest {
    pub lines: Vec<CartLine>,
    pub shipping: ShippingAddress,
    pub payment_method: String,
    /// Confirmation target. Guests supply it with the cart; for identified
    /// actors the boundary resolves it from the user's profile.
    pub contact: Option<Contact>,
}

/// Caller-visible outcome. Delivery diagnostics ride along but never decide
/// the success of the order itself.
#[derive(Debug, Clone, Serialize)]
pub struct OrderReceipt {
    pub order: Order,
    /// False for guest checkout: the order payload is synthesized and not
    /// recoverable later.
    pub persisted: bool,
    pub email_sent: bool,
    pub delivery_channel: DeliveryChannelKind,
    pub preview_url: Option<String>,
    pub delivery_detail: Option<String>,
}

struct PlannedLine {
    product: Product,
    quantity: i64,
}

/// Order intake service.
pub struct OrderIntake<C, O> {
    catalog: C,
    orders: O,
    chain: Arc<ChannelChain>,
}

impl<C, O> OrderIntake<C, O>
where
    C: CatalogStore,
    O: OrderStore,
{
    pub fn new(catalog: C, orders: O, chain: Arc<ChannelChain>) -> Self {
        Self {
            catalog,
            orders,
            chain,
        }
    }

    /// Place an order for `actor`.
    ///
    /// Guest orders are not persisted; stock is still decremented and the
    /// confirmation is still attempted, and the returned payload carries a
    /// fresh non-durable id.
    pub async fn place_order(
        &self,
        request: OrderIntakeRequest,
        actor: Actor,
    ) -> StoreResult<OrderReceipt> {
        if request.lines.is_empty() {
            return Err(StoreError::validation("cart cannot be empty"));
        }
        let contact = request
            .contact
            .ok_or_else(|| StoreError::validation("contact is required for confirmation"))?;

        // Phase 1: resolve and availability-check every line before touching
        // any stock.
        let mut plan = Vec::with_capacity(request.lines.len());
        for line in &request.lines {
            plan.push(self.plan_line(line).await?);
        }

        let shipping = request.shipping.normalize()?;

        let order = Order {
            id: OrderId::new(),
            owner: actor,
            lines: plan
                .iter()
                .map(|p| OrderLine {
                    product_id: p.product.id,
                    name: p.product.name.clone(),
                    quantity: p.quantity,
                    unit_price_cents: p.product.price_cents,
                })
                .collect(),
            shipping,
            payment_method: request.payment_method,
            is_paid: false,
            paid_at: None,
            payment: None,
            is_delivered: false,
            delivered_at: None,
            created_at: Utc::now(),
        };

        let persisted = !actor.is_guest();
        if persisted {
            self.orders.insert(order.clone()).await?;
        }

        // Phase 2: per-product conditional decrements. No cross-line
        // rollback: a failure here leaves earlier lines committed, which is
        // logged rather than swallowed.
        self.apply_plan(&order, &plan).await?;

        let delivery = self
            .chain
            .send(&confirmation_message(&order, &contact))
            .await;
        info!(
            order_id = %order.id,
            persisted,
            email_sent = delivery.success,
            channel = ?delivery.channel,
            "order placed"
        );

        Ok(OrderReceipt {
            order,
            persisted,
            email_sent: delivery.success,
            delivery_channel: delivery.channel,
            preview_url: delivery.preview_url,
            delivery_detail: delivery.error_detail,
        })
    }

    async fn plan_line(&self, line: &CartLine) -> StoreResult<PlannedLine> {
        if line.quantity <= 0 {
            return Err(StoreError::validation("quantity must be positive"));
        }

        let product = match (line.product_id, line.name.as_deref()) {
            (Some(id), _) => self.catalog.find(id).await?,
            (None, Some(name)) => self.catalog.find_by_name(name).await?,
            (None, None) => {
                return Err(StoreError::validation(
                    "cart line needs a product id or name",
                ))
            }
        };
        let product = product.ok_or_else(|| match (line.product_id, line.name.as_deref()) {
            (Some(id), _) => StoreError::not_found(format!("product {id}")),
            (_, Some(name)) => StoreError::not_found(format!("product \"{name}\"")),
            _ => StoreError::not_found("product"),
        })?;

        if !self.catalog.check_available(product.id, line.quantity).await? {
            return Err(StoreError::insufficient_stock(product.count_in_stock));
        }

        Ok(PlannedLine {
            product,
            quantity: line.quantity,
        })
    }

    async fn apply_plan(&self, order: &Order, plan: &[PlannedLine]) -> StoreResult<()> {
        let mut committed: Vec<CommittedDecrement> = Vec::new();
        for planned in plan {
            match self
                .catalog
                .decrement_stock(planned.product.id, planned.quantity)
                .await
            {
                Ok(receipt) => committed.push(receipt),
                Err(e) => {
                    if !committed.is_empty() {
                        warn!(
                            order_id = %order.id,
                            failed_product = %planned.product.id,
                            committed = ?committed
                                .iter()
                                .map(|c| (c.product_id.to_string(), c.quantity))
                                .collect::<Vec<_>>(),
                            error = %e,
                            "partial stock commit: earlier lines stay decremented"
                        );
                    }
                    return Err(e);
                }
            }
        }
        Ok(())
    }
}

fn confirmation_message(order: &Order, contact: &Contact) -> DeliveryMessage {
    let mut body = format!("Thanks for your order {}.\n\n", order.id);
    for line in &order.lines {
        body.push_str(&format!(
            "  {} x{}: {} cents\n",
            line.name,
            line.quantity,
            line.subtotal_cents()
        ));
    }
    body.push_str(&format!("\nTotal: {} cents\n", order.total_cents()));
    DeliveryMessage::new(
        contact.clone(),
        format!("Order {} confirmed", order.id),
        body,
    )
}
