use axum::{
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use shopfront_core::{Actor, UserId};

use crate::context::ActorContext;

/// Resolve the acting identity for a request.
///
/// Session issuance and token verification belong to the identity
/// collaborator in front of this service; by the time a request arrives here
/// its identity is the `x-user-id` header. No header means a guest.
pub async fn actor_middleware(
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let actor = resolve_actor(req.headers())?;
    req.extensions_mut().insert(ActorContext::new(actor));
    Ok(next.run(req).await)
}

fn resolve_actor(headers: &HeaderMap) -> Result<Actor, StatusCode> {
    let Some(header) = headers.get("x-user-id") else {
        return Ok(Actor::Guest);
    };
    let raw = header.to_str().map_err(|_| StatusCode::UNAUTHORIZED)?;
    let user_id: UserId = raw.trim().parse().map_err(|_| StatusCode::UNAUTHORIZED)?;
    Ok(Actor::user(user_id))
}
