use axum::Router;

mod dashboard;
pub mod func;

use crate::AppState;

pub fn pages_router() -> Router<AppState> {
    func::func_router().merge(dashboard::dashboard_router())
}
