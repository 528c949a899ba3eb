use serde::Deserialize;

/// Default event server, matching the development server's bind address.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5001";

/// Connection settings for [`HttpEventSource`](crate::source::HttpEventSource).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the event server, without a trailing path.
    pub base_url: String,
    /// Optional per-request timeout. `None` lets a request wait indefinitely.
    pub request_timeout_secs: Option<u64>,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: None,
            user_agent: concat!("hookfeed/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}
