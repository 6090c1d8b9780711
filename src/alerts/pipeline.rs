use log::{error, info, warn};

use crate::alerts::aggregator::{aggregate, AlertReport};
use crate::alerts::fetcher::PageFetcher;
use crate::alerts::normalizer::normalize;
use crate::azure::{alerts_query, AuthClient, QueryClient, TimeWindow};
use crate::error::{FetchWarning, PipelineError};

#[derive(Debug)]
pub struct Analysis {
    pub window: TimeWindow,
    pub record_count: usize,
    pub report: AlertReport,
    pub warnings: Vec<FetchWarning>,
}

/// One request's run: login, paginate, normalize, aggregate.
pub async fn analyze(
    auth: &dyn AuthClient,
    query: &dyn QueryClient,
    page_size: usize,
    window: TimeWindow,
) -> Result<Analysis, PipelineError> {
    if let Err(e) = auth.login().await {
        error!("Azure login failed: {}", e);
        return Err(PipelineError::Authentication(e));
    }

    let outcome = PageFetcher::new(query, page_size).fetch_all(&alerts_query(&window)).await;
    for w in &outcome.warnings {
        warn!("{}", w);
    }

    let table = normalize(&outcome.records).map_err(|e| {
        error!("Normalization failed: {}", e);
        e
    })?;

    if table.is_empty() {
        info!("No alerts between {} and {}.", window.start, window.end);
    }

    Ok(Analysis {
        record_count: table.len(),
        report: aggregate(&table),
        warnings: outcome.warnings,
        window,
    })
}
