pub mod events;
pub mod notify;
pub mod render;
pub mod status;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use crate::events::{EventKind, EventRecord, EventsResponse};

    /// Create a test event with the given kind and message.
    pub fn make_event(kind: EventKind, message: &str) -> EventRecord {
        EventRecord {
            kind,
            message: message.to_string(),
            repository: "test-repo".to_string(),
            timestamp: "1st January 2026 - 12:00 AM UTC".to_string(),
            id: None,
            author: Some("TestUser".to_string()),
            branch: None,
            from_branch: None,
            to_branch: None,
            raw_timestamp: Some("2026-01-01T00:00:00Z".to_string()),
        }
    }

    /// Create `n` push events with sequential messages.
    pub fn make_events(n: usize) -> Vec<EventRecord> {
        (0..n)
            .map(|i| make_event(EventKind::Push, &format!("\"TestUser\" pushed #{i}")))
            .collect()
    }

    /// Wrap events in a successful response whose count matches the list.
    pub fn make_response(events: Vec<EventRecord>) -> EventsResponse {
        EventsResponse {
            count: events.len() as u64,
            events,
        }
    }
}
