pub mod customers;
pub mod health;
pub mod restaurants;
pub mod staff;

use axum::{
    body::Body,
    http::Request,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::Span;

use crate::{
    middleware::auth::{require_customer, require_staff},
    AppState,
};

pub fn router(state: AppState) -> Router {
    let customer_only = Router::new()
        .route(
            "/v1.0/customers/{customer_id}",
            get(customers::get_customer).put(customers::update_customer),
        )
        .route_layer(from_fn_with_state(state.clone(), require_customer));

    let staff_only = Router::new()
        .route("/v1.0/restaurants/{restaurant_id}", get(restaurants::get_restaurant))
        .route_layer(from_fn_with_state(state.clone(), require_staff));

    Router::new()
        .route("/health", get(health::health_check))
        // Customers
        .route("/v1.0/customers", post(customers::register))
        .route("/v1.0/customers/login", post(customers::login))
        .route("/v1.0/customers/refresh", post(customers::refresh))
        // Restaurants and staff
        .route("/v1.0/restaurants", post(restaurants::register))
        .route("/v1.0/staff/login", post(staff::login))
        .route("/v1.0/staff/refresh", post(staff::refresh))
        .merge(customer_only)
        .merge(staff_only)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}

/// Span wrapping every request; `x-request-id` is already set by `SetRequestIdLayer`.
fn request_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");
    tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %request.method(),
        uri = %request.uri(),
    )
}
