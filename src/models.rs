use std::sync::Arc;

use handlebars::Handlebars;

use crate::azure::{AuthClient, QueryClient};
use crate::charts::ChartRenderer;

/// Process-wide state handed to every request. Built once in `main`.
pub struct AppConfig {
    pub auth: Arc<dyn AuthClient>,
    pub query: Arc<dyn QueryClient>,
    pub renderer: Arc<dyn ChartRenderer>,
    pub templates: Handlebars<'static>,
    pub page_size: usize,
}
