//! Presentation layer: turns controller notifications into terminal output.

use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};

use hookfeed_client::PollController;
use hookfeed_core::events::EventRecord;
use hookfeed_core::notify::{Notification, NotificationLevel, NotificationQueue};
use hookfeed_core::render::{render_feed, render_feed_text, sanitize_text};
use hookfeed_core::status::StatusIndicator;

use crate::config::RenderMode;

/// Renders feed, status and notifications to stdout.
#[derive(Clone)]
pub struct TerminalView {
    mode: RenderMode,
    notifications: Arc<Mutex<NotificationQueue>>,
}

impl TerminalView {
    pub fn new(mode: RenderMode) -> Self {
        Self {
            mode,
            notifications: Arc::new(Mutex::new(NotificationQueue::new())),
        }
    }

    /// Register this view on every controller channel.
    pub fn attach(&self, controller: &PollController) {
        let view = self.clone();
        controller.on_status_changed(move |status| view.show_status(status));
        let view = self.clone();
        controller.on_feed_updated(move |feed| view.show_feed(feed));
        let view = self.clone();
        controller.on_notification(move |n| view.show_notification(n));
        controller.on_new_events(|growth| {
            tracing::debug!(previous = growth.previous, current = growth.current, "Event count grew");
        });
    }

    pub fn format_feed(&self, feed: &[EventRecord]) -> String {
        match self.mode {
            RenderMode::Text => render_feed_text(feed),
            // Markup keeps its own line breaks; everything else is neutralized.
            RenderMode::Html => render_feed(feed)
                .lines()
                .map(sanitize_text)
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    fn show_feed(&self, feed: &[EventRecord]) {
        print_block(&self.format_feed(feed));
    }

    fn show_status(&self, status: StatusIndicator) {
        print_block(&format!("status: {status}"));
    }

    fn show_notification(&self, notification: &Notification) {
        print_block(&format_notification(notification));
        self.queue().push(notification.clone());
    }

    /// Age notifications so expired ones drop out of `status` output.
    pub fn tick_notifications(&self, delta_secs: f32) {
        self.queue().tick(delta_secs);
    }

    /// Summary printed for the `status` command.
    pub fn status_report(&self, controller: &PollController) -> String {
        let mut lines = vec![format!(
            "status: {} | polling: {:?} | events: {} | last count: {}",
            controller.status(),
            controller.polling_state(),
            controller.feed().len(),
            controller.last_known_count()
        )];
        let queue = self.queue();
        lines.extend(
            queue
                .visible()
                .iter()
                .map(|shown| format_notification(&shown.notification)),
        );
        if !queue.pending().is_empty() {
            lines.push(format!("(+{} more)", queue.pending().len()));
        }
        lines.join("\n")
    }

    fn queue(&self) -> std::sync::MutexGuard<'_, NotificationQueue> {
        self.notifications
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

pub fn format_notification(notification: &Notification) -> String {
    let tag = match notification.level {
        NotificationLevel::Success => "ok",
        NotificationLevel::Error => "error",
        NotificationLevel::Info => "info",
    };
    format!("[{tag}] {}", sanitize_text(&notification.message))
}

pub fn print_block(text: &str) {
    let mut out = std::io::stdout().lock();
    let _ = writeln!(out, "{}", text.trim_end());
    let _ = out.flush();
}
