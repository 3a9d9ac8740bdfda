use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};

use shopfront_core::{Contact, OrderId, StoreError};
use shopfront_orders::{OrderIntakeRequest, PaymentCapture};

use crate::app::{dto, errors};
use crate::app::services::AppServices;
use crate::context::ActorContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(place_order))
        .route("/:id", get(get_order))
        .route("/:id/pay", put(pay_order))
        .route("/:id/deliver", put(deliver_order))
}

pub async fn place_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
    Json(body): Json<dto::PlaceOrderRequest>,
) -> axum::response::Response {
    let actor = actor.actor();

    // Identified users get their confirmation at the profile contact; the
    // cart-supplied address is the fallback (and the only option for guests).
    let contact = match actor.user_id() {
        Some(user_id) => match services.profiles.find(user_id).await {
            Ok(Some(profile)) => Some(profile.contact),
            Ok(None) => None,
            Err(e) => return errors::store_error_to_response(e),
        },
        None => None,
    };
    let contact = match (contact, body.email) {
        (Some(c), _) => Some(c),
        (None, Some(raw)) => match Contact::parse(raw) {
            Ok(c) => Some(c),
            Err(e) => return errors::store_error_to_response(e),
        },
        (None, None) => None,
    };

    let request = OrderIntakeRequest {
        lines: body.lines,
        shipping: body.shipping,
        payment_method: body.payment_method,
        contact,
    };

    match services.intake.place_order(request, actor).await {
        Ok(receipt) => (StatusCode::CREATED, Json(receipt)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: OrderId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid order id")
        }
    };
    match services.orders.find(id).await {
        Ok(Some(order)) => (StatusCode::OK, Json(order)).into_response(),
        Ok(None) => errors::store_error_to_response(StoreError::not_found(format!("order {id}"))),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn pay_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::PayOrderRequest>,
) -> axum::response::Response {
    let id: OrderId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid order id")
        }
    };

    let payer_contact = match body.payer_email {
        Some(raw) => match Contact::parse(raw) {
            Ok(c) => Some(c),
            Err(e) => return errors::store_error_to_response(e),
        },
        None => None,
    };

    let capture = PaymentCapture {
        capture_id: body.capture_id,
        status: body.status,
        payer_contact,
    };

    match services.orders.mark_paid(id, capture).await {
        Ok(order) => (StatusCode::OK, Json(order)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn deliver_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: OrderId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid order id")
        }
    };
    match services.orders.mark_delivered(id).await {
        Ok(order) => (StatusCode::OK, Json(order)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
