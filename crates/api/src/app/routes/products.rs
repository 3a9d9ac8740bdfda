use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;

use shopfront_core::{Contact, ProductId, StoreError};
use shopfront_catalog::NewProduct;
use shopfront_restock::Subscriber;

use crate::app::{dto, errors};
use crate::app::services::AppServices;
use crate::context::ActorContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_product).get(list_products))
        .route("/:id", get(get_product))
        .route("/:id/stock", put(set_stock))
        .route("/:id/restock-subscriptions", post(subscribe_to_restock))
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateProductRequest>,
) -> axum::response::Response {
    let id = ProductId::new();
    let product = match (NewProduct {
        name: body.name,
        description: body.description,
        image_url: body.image_url,
        price_cents: body.price_cents,
        count_in_stock: body.count_in_stock,
    })
    .into_product(id, Utc::now())
    {
        Ok(p) => p,
        Err(e) => return errors::store_error_to_response(e),
    };

    if let Err(e) = services.catalog.insert(product.clone()).await {
        return errors::store_error_to_response(e);
    }

    (StatusCode::CREATED, Json(product)).into_response()
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.catalog.list().await {
        Ok(items) => (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ProductId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id")
        }
    };
    match services.catalog.find(id).await {
        Ok(Some(product)) => (StatusCode::OK, Json(product)).into_response(),
        Ok(None) => errors::store_error_to_response(StoreError::not_found(format!("product {id}"))),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// Set the absolute stock count.
///
/// This is the mutation point the replenishment trigger hangs off: the
/// before/after pair comes straight from the conditional write, and a
/// depleted-to-available transition fans out to subscribers before the
/// response returns. The fan-out summary rides along in the response body.
pub async fn set_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::SetStockRequest>,
) -> axum::response::Response {
    let id: ProductId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id")
        }
    };

    let transition = match services.catalog.set_stock(id, body.count_in_stock).await {
        Ok(t) => t,
        Err(e) => return errors::store_error_to_response(e),
    };

    let dispatch = if transition.is_replenishment() {
        match services.dispatcher.on_stock_replenished(id).await {
            Ok(summary) => Some(summary),
            Err(e) => {
                // Fan-out trouble must not fail the stock update itself.
                tracing::warn!(product_id = %id, error = %e, "replenishment fan-out failed");
                None
            }
        }
    } else {
        None
    };

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "product_id": id,
            "previous": transition.previous,
            "current": transition.current,
            "dispatch": dispatch,
        })),
    )
        .into_response()
}

pub async fn subscribe_to_restock(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::SubscribeRequest>,
) -> axum::response::Response {
    let id: ProductId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id")
        }
    };

    let subscriber = match actor.actor().user_id() {
        Some(user_id) => Subscriber::User(user_id),
        None => {
            let raw = match body.email {
                Some(raw) => raw,
                None => {
                    return errors::json_error(
                        StatusCode::BAD_REQUEST,
                        "validation_error",
                        "email is required for anonymous subscriptions",
                    )
                }
            };
            match Contact::parse(raw) {
                Ok(contact) => Subscriber::Anonymous(contact),
                Err(e) => return errors::store_error_to_response(e),
            }
        }
    };

    match services.restock.subscribe(subscriber, id).await {
        Ok(()) => (
            StatusCode::CREATED,
            Json(serde_json::json!({ "status": "subscribed", "product_id": id })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
