use axum::Router;

use crate::AppState;

pub mod customer;
pub mod estimation;
pub mod job;
pub mod order;
pub mod tracking;

pub fn func_router() -> Router<AppState> {
    customer::customer_router()
        .merge(order::order_router())
        .merge(tracking::tracking_router())
        .merge(estimation::estimation_router())
        .merge(job::job_router())
}
