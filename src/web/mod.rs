pub(crate) mod error;
pub(crate) mod handlers;
pub(crate) mod templates;
pub(crate) mod view;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;

use crate::models::AppConfig;

pub fn router(config: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/analyze", get(handlers::show_alerts).post(handlers::show_alerts))
        .with_state(config)
}
