//! Notification adapters.

use std::sync::Mutex;
use std::time::Duration;

use crate::infrastructure::ports::{
    duration_millis, Notification, NotificationKind, NotificationPort,
};

/// Writes notifications to the log.
#[derive(Debug, Default)]
pub struct TracingNotifier;

impl TracingNotifier {
    pub fn new() -> Self {
        Self
    }
}

impl NotificationPort for TracingNotifier {
    fn add_notification(
        &self,
        kind: NotificationKind,
        title: &str,
        message: &str,
        duration: Duration,
    ) {
        let duration_ms = duration_millis(duration);
        match kind {
            NotificationKind::Info => {
                tracing::info!(title, duration_ms, "{}", message)
            }
            NotificationKind::Warning => {
                tracing::warn!(title, duration_ms, "{}", message)
            }
            NotificationKind::Error => {
                tracing::error!(title, duration_ms, "{}", message)
            }
        }
    }
}

/// Collects notifications in memory, for the replay binary and tests.
#[derive(Debug, Default)]
pub struct InMemoryNotifier {
    received: Mutex<Vec<Notification>>,
}

impl InMemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything received so far, oldest first.
    pub fn notifications(&self) -> Vec<Notification> {
        self.lock().clone()
    }

    /// Drain everything received so far.
    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Notification>> {
        // A panicking reader cannot leave the list half-written
        self.received
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl NotificationPort for InMemoryNotifier {
    fn add_notification(
        &self,
        kind: NotificationKind,
        title: &str,
        message: &str,
        duration: Duration,
    ) {
        self.lock().push(Notification {
            kind,
            title: title.to_string(),
            message: message.to_string(),
            duration,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_notifier_keeps_order_and_drains() {
        let notifier = InMemoryNotifier::new();
        notifier.add_notification(
            NotificationKind::Warning,
            "Beasts removed",
            "Owl",
            Duration::from_millis(5000),
        );
        notifier.add_notification(
            NotificationKind::Info,
            "Done",
            "",
            Duration::from_millis(10),
        );

        assert_eq!(notifier.len(), 2);
        let drained = notifier.take();
        assert_eq!(drained[0].title, "Beasts removed");
        assert_eq!(drained[1].kind, NotificationKind::Info);
        assert!(notifier.is_empty());
    }

    #[test]
    fn notification_serializes_duration_in_millis() {
        let notification = Notification {
            kind: NotificationKind::Warning,
            title: "t".into(),
            message: "m".into(),
            duration: Duration::from_millis(250),
        };
        let json = serde_json::to_value(&notification).unwrap();
        assert_eq!(json["durationMs"], 250);
        assert_eq!(json["kind"], "warning");
    }
}
