//! HTML and plain-text rendering of the event feed.
//!
//! Every string that originates from the server goes through [`escape_html`]
//! before it is placed into markup, or [`sanitize_text`] before it is written
//! to a terminal.

use std::fmt::Write;

use crate::events::{EventKind, EventRecord};
use crate::notify::Notification;
use crate::status::StatusIndicator;

/// Markup shown when the feed has no events.
pub const EMPTY_FEED_HTML: &str = r#"<div class="empty-state">
    <i class="fab fa-github text-muted"></i>
    <h5>No Events Yet</h5>
    <p class="text-muted">
        Webhook events will appear here when they are received.<br>
        You can test the system using the buttons below.
    </p>
</div>"#;

/// Escape text for inclusion in HTML element content or quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Replace control characters so server text cannot inject terminal escape
/// sequences or extra lines.
pub fn sanitize_text(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_control() { '\u{FFFD}' } else { c })
        .collect()
}

/// Font Awesome icon classes for an event kind.
pub fn event_icon(kind: EventKind) -> &'static str {
    match kind {
        EventKind::Push => "fas fa-upload",
        EventKind::PullRequest => "fas fa-code-branch",
        EventKind::Merge => "fas fa-code-merge",
        EventKind::Other => "fas fa-question",
    }
}

/// Render one event as a feed item.
pub fn render_event(event: &EventRecord) -> String {
    let kind = event.kind.as_str();
    format!(
        r#"<div class="event-item d-flex align-items-start">
    <div class="event-icon event-{kind}">
        <i class="{icon}"></i>
    </div>
    <div class="event-content">
        <p class="event-message">{message}</p>
        <div class="event-meta">
            <span class="badge bg-secondary me-2">{badge}</span>
            <span class="me-2"><i class="fas fa-repository me-1"></i>{repository}</span>
            <span><i class="fas fa-clock me-1"></i>{timestamp}</span>
        </div>
    </div>
</div>"#,
        icon = event_icon(event.kind),
        message = escape_html(&event.message),
        badge = kind.to_uppercase(),
        repository = escape_html(&event.repository),
        timestamp = escape_html(&event.timestamp),
    )
}

/// Render the whole feed, or the empty state when there are no events.
pub fn render_feed(events: &[EventRecord]) -> String {
    if events.is_empty() {
        return EMPTY_FEED_HTML.to_string();
    }
    events
        .iter()
        .map(render_event)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render the feed for a terminal, one line per event.
pub fn render_feed_text(events: &[EventRecord]) -> String {
    if events.is_empty() {
        return "No events yet".to_string();
    }
    let mut out = String::new();
    for event in events {
        let _ = writeln!(
            out,
            "[{:<12}] {}  ({} @ {})",
            event.kind.as_str().to_uppercase(),
            sanitize_text(&event.message),
            sanitize_text(&event.repository),
            sanitize_text(&event.timestamp)
        );
    }
    out
}

/// Render the connection indicator.
pub fn render_status(status: StatusIndicator) -> String {
    format!(
        r#"<i id="status-indicator" class="{}"></i><span id="status-text">{}</span>"#,
        status.icon_class(),
        status.label()
    )
}

/// Render a dismissible alert for a notification.
pub fn render_notification(notification: &Notification) -> String {
    format!(
        r#"<div class="alert {} alert-dismissible fade show position-fixed" data-id="{}">
    {}
    <button type="button" class="btn-close" data-bs-dismiss="alert"></button>
</div>"#,
        notification.level.alert_class(),
        notification.id,
        escape_html(&notification.message)
    )
}
