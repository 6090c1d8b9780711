use log::{debug, info, warn};
use serde_json::Value;

use crate::azure::QueryClient;
use crate::error::FetchWarning;

pub const PAGE_SIZE: usize = 100;

#[derive(Debug, Default)]
pub struct FetchOutcome {
    pub records: Vec<Value>,
    pub pages: usize,
    pub warnings: Vec<FetchWarning>,
}

/// Drives offset pagination against a [`QueryClient`].
pub struct PageFetcher<'a> {
    client: &'a dyn QueryClient,
    page_size: usize,
}

impl<'a> PageFetcher<'a> {
    pub fn new(client: &'a dyn QueryClient, page_size: usize) -> Self {
        Self {
            client,
            page_size: page_size.max(1),
        }
    }

    /// Stops on a short page, on a page that reaches `total_records`, or on the
    /// first failed call. Whatever was read before a failure is kept.
    pub async fn fetch_all(&self, query: &str) -> FetchOutcome {
        let mut outcome = FetchOutcome::default();
        let mut offset = 0;

        loop {
            let page = match self.client.page(query, offset, self.page_size).await {
                Ok(page) => page,
                Err(e) => {
                    warn!("Pagination aborted at offset {}: {}", offset, e);
                    outcome.warnings.push(FetchWarning::from_client(offset, e));
                    break;
                }
            };

            outcome.pages += 1;
            let received = page.records.len();
            debug!("Page at offset {}: {} records", offset, received);
            outcome.records.extend(page.records);
            offset += self.page_size;

            if received < self.page_size {
                break;
            }
            if let Some(total) = page.total_records {
                if outcome.records.len() as u64 >= total {
                    break;
                }
            }
        }

        info!("Pagination complete: {} records in {} pages.", outcome.records.len(), outcome.pages);
        outcome
    }
}
