use serde::Deserialize;

use shopfront_orders::{CartLine, ShippingAddress};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    pub lines: Vec<CartLine>,
    pub shipping: ShippingAddress,
    pub payment_method: String,
    /// Confirmation address. Required for guests; for identified users the
    /// profile contact wins when one exists.
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PayOrderRequest {
    pub capture_id: String,
    pub status: String,
    #[serde(default)]
    pub payer_email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub price_cents: u64,
    #[serde(default)]
    pub count_in_stock: i64,
}

#[derive(Debug, Deserialize)]
pub struct SetStockRequest {
    pub count_in_stock: i64,
}

#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    /// Contact for anonymous subscribers; ignored for identified users.
    #[serde(default)]
    pub email: Option<String>,
}
