use serde::{Deserialize, Serialize};

/// Kind of webhook event shown in the feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Push,
    PullRequest,
    Merge,
    #[default]
    #[serde(other)]
    Other,
}

impl EventKind {
    /// Wire name, as used by the event server.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Push => "push",
            Self::PullRequest => "pull_request",
            Self::Merge => "merge",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event kinds the server can synthesize through `POST /test-webhook`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestEventKind {
    Push,
    PullRequest,
    Merge,
}

impl TestEventKind {
    pub const ALL: [TestEventKind; 3] = [Self::Push, Self::PullRequest, Self::Merge];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Push => "push",
            Self::PullRequest => "pull_request",
            Self::Merge => "merge",
        }
    }
}

impl std::fmt::Display for TestEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TestEventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "push" => Ok(Self::Push),
            "pull_request" | "pr" => Ok(Self::PullRequest),
            "merge" => Ok(Self::Merge),
            other => Err(format!("unknown test event type: {other}")),
        }
    }
}

impl From<TestEventKind> for EventKind {
    fn from(kind: TestEventKind) -> Self {
        match kind {
            TestEventKind::Push => EventKind::Push,
            TestEventKind::PullRequest => EventKind::PullRequest,
            TestEventKind::Merge => EventKind::Merge,
        }
    }
}

/// A webhook event as returned by `GET /api/events`.
///
/// Records are read-only on the client side. Only `type`, `message`,
/// `repository`, and `timestamp` are guaranteed; the rest depend on the kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub message: String,
    pub repository: String,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_timestamp: Option<String>,
}

/// A validated, successful `GET /api/events` body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventsResponse {
    pub events: Vec<EventRecord>,
    pub count: u64,
}

/// Body sent to `POST /test-webhook`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestWebhookRequest {
    #[serde(rename = "type")]
    pub kind: TestEventKind,
}
