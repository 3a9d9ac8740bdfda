use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopfront_core::{ProductId, StoreError, StoreResult};

/// A catalog product.
///
/// Owned by the catalog side of the house; the order/restock core only reads
/// it and conditionally decrements/raises `count_in_stock` via the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    /// Price in smallest currency unit (e.g., cents).
    pub price_cents: u64,
    /// Units on hand. Conceptually >= 0; the ledger's conditional writes are
    /// what keep it there under concurrent checkouts.
    pub count_in_stock: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub price_cents: u64,
    pub count_in_stock: i64,
}

impl NewProduct {
    /// Validate and build the product record.
    pub fn into_product(self, id: ProductId, now: DateTime<Utc>) -> StoreResult<Product> {
        if self.name.trim().is_empty() {
            return Err(StoreError::validation("name cannot be empty"));
        }
        if self.count_in_stock < 0 {
            return Err(StoreError::validation("count_in_stock cannot be negative"));
        }
        Ok(Product {
            id,
            name: self.name,
            description: self.description,
            image_url: self.image_url,
            price_cents: self.price_cents,
            count_in_stock: self.count_in_stock,
            created_at: now,
            updated_at: now,
        })
    }
}

impl Product {
    pub fn is_depleted(&self) -> bool {
        self.count_in_stock <= 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_product(name: &str, stock: i64) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            description: None,
            image_url: None,
            price_cents: 1500,
            count_in_stock: stock,
        }
    }

    #[test]
    fn into_product_rejects_blank_name() {
        let err = new_product("   ", 3)
            .into_product(ProductId::new(), Utc::now())
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[test]
    fn into_product_rejects_negative_stock() {
        let err = new_product("Lamp", -1)
            .into_product(ProductId::new(), Utc::now())
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[test]
    fn zero_stock_is_depleted() {
        let p = new_product("Lamp", 0)
            .into_product(ProductId::new(), Utc::now())
            .unwrap();
        assert!(p.is_depleted());
    }
}
