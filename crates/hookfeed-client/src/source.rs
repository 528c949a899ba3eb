use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use serde::Deserialize;

use hookfeed_core::events::{EventRecord, EventsResponse, TestEventKind, TestWebhookRequest};

use crate::config::ClientConfig;
use crate::error::FetchError;

/// Path of the event listing endpoint.
pub const EVENTS_PATH: &str = "/api/events";
/// Path of the test event injection endpoint.
pub const TEST_WEBHOOK_PATH: &str = "/test-webhook";
/// Path of the clear-all endpoint.
pub const CLEAR_EVENTS_PATH: &str = "/api/events/clear";

/// Remote source of webhook events.
pub trait EventSource: Send + Sync {
    /// Fetch the current event list.
    fn fetch_events(&self) -> BoxFuture<'_, Result<EventsResponse, FetchError>>;

    /// Ask the server to synthesize a test event of the given kind.
    fn send_test_event(&self, kind: TestEventKind) -> BoxFuture<'_, Result<(), FetchError>>;

    /// Remove all stored events. Returns the server's confirmation message.
    fn clear_events(&self) -> BoxFuture<'_, Result<String, FetchError>>;
}

/// `GET /api/events` body as it may appear on the wire.
#[derive(Debug, Deserialize)]
struct EventsEnvelope {
    events: Option<Vec<EventRecord>>,
    count: Option<u64>,
    error: Option<String>,
}

/// Any body that may carry an `error` and a `message`.
#[derive(Debug, Default, Deserialize)]
struct StatusBody {
    error: Option<String>,
    message: Option<String>,
}

fn parse_status_body(body: &str) -> StatusBody {
    serde_json::from_str(body).unwrap_or_default()
}

/// Turn a raw `GET /api/events` response into a validated event list.
pub fn interpret_events_response(status: u16, body: &str) -> Result<EventsResponse, FetchError> {
    if !(200..300).contains(&status) {
        let message = parse_status_body(body)
            .error
            .unwrap_or_else(|| "Failed to load events".to_string());
        return Err(FetchError::Server { status, message });
    }

    let envelope: EventsEnvelope =
        serde_json::from_str(body).map_err(|e| FetchError::Payload(e.to_string()))?;

    if let Some(message) = envelope.error {
        return Err(FetchError::Server { status, message });
    }
    let events = envelope
        .events
        .ok_or_else(|| FetchError::Payload("missing `events` field".to_string()))?;
    let count = envelope
        .count
        .ok_or_else(|| FetchError::Payload("missing `count` field".to_string()))?;

    Ok(EventsResponse { events, count })
}

/// Interpret the response of a mutating endpoint (`/test-webhook`, `/api/events/clear`).
fn interpret_action_response(status: u16, body: &str, fallback: &str) -> Result<String, FetchError> {
    let parsed = parse_status_body(body);
    if !(200..300).contains(&status) || parsed.error.is_some() {
        return Err(FetchError::Server {
            status,
            message: parsed.error.unwrap_or_else(|| fallback.to_string()),
        });
    }
    Ok(parsed.message.unwrap_or_default())
}

/// [`EventSource`] talking to the event server over HTTP.
#[derive(Debug, Clone)]
pub struct HttpEventSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpEventSource {
    /// Create a source with default client settings.
    pub fn new(base_url: impl Into<String>) -> Result<Self, FetchError> {
        Self::from_config(&ClientConfig {
            base_url: base_url.into(),
            ..ClientConfig::default()
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, FetchError> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn get_events(&self) -> Result<EventsResponse, FetchError> {
        let resp = self.client.get(self.url(EVENTS_PATH)).send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        interpret_events_response(status, &body)
    }

    async fn post_test_event(&self, kind: TestEventKind) -> Result<(), FetchError> {
        let resp = self
            .client
            .post(self.url(TEST_WEBHOOK_PATH))
            .json(&TestWebhookRequest { kind })
            .send()
            .await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        interpret_action_response(status, &body, "Failed to create test event").map(|_| ())
    }

    async fn post_clear(&self) -> Result<String, FetchError> {
        let resp = self.client.post(self.url(CLEAR_EVENTS_PATH)).send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        interpret_action_response(status, &body, "Failed to clear events")
    }
}

impl EventSource for HttpEventSource {
    fn fetch_events(&self) -> BoxFuture<'_, Result<EventsResponse, FetchError>> {
        self.get_events().boxed()
    }

    fn send_test_event(&self, kind: TestEventKind) -> BoxFuture<'_, Result<(), FetchError>> {
        self.post_test_event(kind).boxed()
    }

    fn clear_events(&self) -> BoxFuture<'_, Result<String, FetchError>> {
        self.post_clear().boxed()
    }
}
