use std::sync::Arc;

use axum::extract::rejection::FormRejection;
use axum::extract::State;
use axum::response::Html;
use axum::Form;
use serde::Deserialize;
use serde_json::json;

use crate::alerts::analyze;
use crate::azure::TimeWindow;
use crate::models::AppConfig;
use crate::web::error::ApiError;
use crate::web::templates;
use crate::web::view::report_view;

/// `GET` reads these from the query string, `POST` from the form body.
#[derive(Deserialize, Debug, Default)]
pub struct AnalyzeForm {
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
}

pub async fn index(State(config): State<Arc<AppConfig>>) -> Result<Html<String>, ApiError> {
    Ok(Html(config.templates.render(templates::INDEX, &json!({}))?))
}

pub async fn show_alerts(
    State(config): State<Arc<AppConfig>>,
    form: Result<Form<AnalyzeForm>, FormRejection>,
) -> Result<Html<String>, ApiError> {
    let Form(form) = form?;
    let window = TimeWindow::new(&form.start_time, &form.end_time)?;
    info!("Analyze request {} .. {}", window.start, window.end);

    let analysis = analyze(config.auth.as_ref(), config.query.as_ref(), config.page_size, window).await?;
    let view = report_view(&analysis, config.renderer.as_ref());

    Ok(Html(config.templates.render(templates::REPORT, &view)?))
}
