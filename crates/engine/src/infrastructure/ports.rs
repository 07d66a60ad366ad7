//! Port traits for infrastructure boundaries.
//!
//! The engine talks to the outside world through two seams:
//! - Notifications shown to the user (toast, log, test collector)
//! - Spell reference data (the domain's `SpellAccessProvider` and
//!   `SpellCatalog`, implemented by `StaticSpellData`)

use std::path::PathBuf;
use std::time::Duration;

use charforge_domain::DomainError;
use serde::Serialize;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ReferenceDataError {
    #[error("Failed to read reference data from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed reference data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid reference data: {0}")]
    Invalid(#[from] DomainError),
}

// =============================================================================
// Notifications
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A user-facing notification, as collected by `InMemoryNotifier`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    #[serde(rename = "durationMs", serialize_with = "millis")]
    pub duration: Duration,
}

/// Whole milliseconds, saturating at `u64::MAX`.
pub(crate) fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn millis<S: serde::Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration_millis(*duration))
}

/// Fire-and-forget sink for user-facing notifications.
#[cfg_attr(test, mockall::automock)]
pub trait NotificationPort: Send + Sync {
    fn add_notification(
        &self,
        kind: NotificationKind,
        title: &str,
        message: &str,
        duration: Duration,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_saturate_instead_of_wrapping() {
        assert_eq!(duration_millis(Duration::from_millis(1500)), 1500);
        assert_eq!(duration_millis(Duration::MAX), u64::MAX);
    }
}
