//! Planet order status -> STAPI order status.

use stapi_types::{OrderStatus, OrderStatusCode};

/// Fixed lookup table; statuses not listed map to `held`.
const PLANET_ORDER_STATUS: &[(&str, OrderStatusCode)] = &[
    ("RECEIVED", OrderStatusCode::Received),
    ("REQUESTED", OrderStatusCode::Received),
    ("PENDING", OrderStatusCode::Scheduled),
    ("IN_PROGRESS", OrderStatusCode::Scheduled),
    ("FINALIZING", OrderStatusCode::Processing),
    ("FULFILLED", OrderStatusCode::Completed),
    ("CANCELLED", OrderStatusCode::Canceled),
    ("PENDING_CANCELLATION", OrderStatusCode::UserCanceled),
    ("REJECTED", OrderStatusCode::Rejected),
    ("EXPIRED", OrderStatusCode::Expired),
    ("FAILED", OrderStatusCode::Failed),
];

pub fn planet_status_to_code(planet_status: &str) -> OrderStatusCode {
    PLANET_ORDER_STATUS
        .iter()
        .find(|(name, _)| *name == planet_status)
        .map(|(_, code)| *code)
        .unwrap_or(OrderStatusCode::Held)
}

/// Status record stamped with the current time.
pub fn order_status_from_planet(planet_status: &str) -> OrderStatus {
    OrderStatus::now(planet_status_to_code(planet_status))
}
