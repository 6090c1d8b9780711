pub(crate) mod client;
pub(crate) mod models;
pub(crate) mod query;

pub use client::{AuthClient, AzCliClient, LoginMode, QueryClient};
pub use query::{alerts_query, TimeWindow};

pub fn init(program: String, login_mode: LoginMode, login_timeout_secs: u64, query_timeout_secs: u64) -> AzCliClient {
    AzCliClient::new(program, login_mode, login_timeout_secs, query_timeout_secs)
}
