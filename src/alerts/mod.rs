pub mod aggregator;
pub mod fetcher;
pub mod normalizer;
pub mod pipeline;
pub(crate) mod types;

pub use aggregator::{OverallSummary, SubscriptionSummary};
pub use fetcher::PAGE_SIZE;
pub use pipeline::{analyze, Analysis};
pub use types::CountTable;
