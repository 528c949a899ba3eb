use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum number of simultaneously visible notifications.
pub const MAX_VISIBLE_NOTIFICATIONS: usize = 3;

/// Auto-dismiss duration for a notification in seconds.
pub const DEFAULT_NOTIFICATION_TTL_SECS: f32 = 5.0;

/// Severity of a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Error,
    Info,
}

impl NotificationLevel {
    /// Bootstrap alert class for this level.
    pub fn alert_class(self) -> &'static str {
        match self {
            Self::Success => "alert-success",
            Self::Error => "alert-danger",
            Self::Info => "alert-info",
        }
    }
}

/// A transient message surfaced to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn new(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            level,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Error, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Info, message)
    }
}

/// A notification currently on screen.
#[derive(Debug, Clone)]
pub struct ShownNotification {
    pub notification: Notification,
    pub age_secs: f32,
}

/// Queue managing notification display and auto-dismissal.
pub struct NotificationQueue {
    visible: Vec<ShownNotification>,
    pending: Vec<Notification>,
    ttl_secs: f32,
}

impl NotificationQueue {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_NOTIFICATION_TTL_SECS)
    }

    pub fn with_ttl(ttl_secs: f32) -> Self {
        Self {
            visible: Vec::new(),
            pending: Vec::new(),
            ttl_secs,
        }
    }

    /// Add a notification; it waits in `pending` while the visible slots are full.
    pub fn push(&mut self, notification: Notification) {
        if self.visible.len() < MAX_VISIBLE_NOTIFICATIONS {
            self.visible.push(ShownNotification {
                notification,
                age_secs: 0.0,
            });
        } else {
            self.pending.push(notification);
        }
    }

    /// Age visible notifications by `delta_secs`, drop expired ones and promote pending.
    pub fn tick(&mut self, delta_secs: f32) {
        for shown in &mut self.visible {
            shown.age_secs += delta_secs;
        }
        self.visible.retain(|n| n.age_secs < self.ttl_secs);
        self.promote();
    }

    /// Dismiss a visible notification early. Returns true if it was visible.
    pub fn dismiss(&mut self, id: Uuid) -> bool {
        let before = self.visible.len();
        self.visible.retain(|n| n.notification.id != id);
        let removed = self.visible.len() != before;
        if removed {
            self.promote();
        }
        removed
    }

    pub fn visible(&self) -> &[ShownNotification] {
        &self.visible
    }

    pub fn pending(&self) -> &[Notification] {
        &self.pending
    }

    pub fn is_empty(&self) -> bool {
        self.visible.is_empty() && self.pending.is_empty()
    }

    fn promote(&mut self) {
        while self.visible.len() < MAX_VISIBLE_NOTIFICATIONS && !self.pending.is_empty() {
            let notification = self.pending.remove(0);
            self.visible.push(ShownNotification {
                notification,
                age_secs: 0.0,
            });
        }
    }
}

impl Default for NotificationQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_caps_visible() {
        let mut queue = NotificationQueue::new();
        for i in 0..5 {
            queue.push(Notification::info(format!("n{i}")));
        }
        assert_eq!(queue.visible().len(), MAX_VISIBLE_NOTIFICATIONS);
        assert_eq!(queue.pending().len(), 2);
    }

    #[test]
    fn tick_expires_and_promotes() {
        let mut queue = NotificationQueue::new();
        for i in 0..4 {
            queue.push(Notification::info(format!("n{i}")));
        }
        queue.tick(DEFAULT_NOTIFICATION_TTL_SECS + 0.1);
        // The three expired; the pending one moves up fresh.
        assert_eq!(queue.visible().len(), 1);
        assert_eq!(queue.visible()[0].notification.message, "n3");
        assert_eq!(queue.visible()[0].age_secs, 0.0);
        assert!(queue.pending().is_empty());
    }

    #[test]
    fn tick_keeps_recent() {
        let mut queue = NotificationQueue::new();
        queue.push(Notification::success("ok"));
        queue.tick(1.0);
        assert_eq!(queue.visible().len(), 1);
    }

    #[test]
    fn dismiss_promotes_pending() {
        let mut queue = NotificationQueue::new();
        let first = Notification::error("first");
        let first_id = first.id;
        queue.push(first);
        queue.push(Notification::error("second"));
        queue.push(Notification::error("third"));
        queue.push(Notification::error("fourth"));

        assert!(queue.dismiss(first_id));
        assert!(!queue.dismiss(first_id));
        let messages: Vec<_> = queue
            .visible()
            .iter()
            .map(|n| n.notification.message.as_str())
            .collect();
        assert_eq!(messages, ["second", "third", "fourth"]);
    }

    #[test]
    fn level_alert_classes() {
        assert_eq!(NotificationLevel::Error.alert_class(), "alert-danger");
        assert_eq!(NotificationLevel::Success.alert_class(), "alert-success");
    }

    #[test]
    fn notification_ids_are_unique() {
        let a = Notification::info("a");
        let b = Notification::info("a");
        assert_ne!(a.id, b.id);
    }
}
