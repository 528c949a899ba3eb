use serde::{Deserialize, Serialize};

/// Whether the controller currently owns a recurring poll schedule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PollingState {
    #[default]
    Stopped,
    Active,
}

/// Connectivity indicator shown next to the feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusIndicator {
    Connected,
    #[default]
    Disconnected,
    Loading,
}

impl StatusIndicator {
    /// Human readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Connected => "Connected",
            Self::Disconnected => "Disconnected",
            Self::Loading => "Loading...",
        }
    }

    /// CSS classes for the indicator icon.
    pub fn icon_class(self) -> &'static str {
        match self {
            Self::Connected => "fas fa-circle text-success me-1",
            Self::Disconnected => "fas fa-circle text-danger me-1",
            Self::Loading => "fas fa-spinner fa-spin text-warning me-1",
        }
    }
}

impl std::fmt::Display for StatusIndicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
