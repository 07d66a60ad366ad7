//! Reactive cleanup services.
//!
//! Each service watches a handful of character attributes and, when one of
//! them changes, retracts dependent selections that are no longer allowed:
//! beasts, spells, equipment. The shell is shared; what counts as "still
//! allowed" is injected as `CleanupRules`.
//!
//! Lifecycle:
//!
//! - Uninitialized until `initialize()`; calling it again is a no-op.
//! - The record current at `initialize()` is the baseline. No cleanup runs
//!   for it.
//! - On every later change the service diffs its tracked attributes against
//!   the baseline. If they differ it asks the rules for a plan, applies the
//!   plan as one store update and sends one notification. The baseline moves
//!   forward either way.
//! - With a debounce, a pass only runs once the tracked attributes have been
//!   quiet for the whole window.
//! - `shutdown()` stops the task and drops any pending debounce.

mod beasts;
mod equipment;
mod spells;

pub use beasts::BeastCleanupRules;
pub use equipment::EquipmentCleanupRules;
pub use spells::SpellCleanupRules;

use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use charforge_domain::{CharacterRecord, Choice, ScopeId};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

use crate::infrastructure::ports::{NotificationKind, NotificationPort};
use crate::stores::CharacterStore;

/// What one cleanup pass will do.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupPlan {
    /// Contributions to re-apply with their invalid entries filtered out
    pub choices: Vec<Choice>,
    /// Contributions to drop entirely
    pub reverts: Vec<ScopeId>,
    /// Names of the removed entries, for the notification
    pub removed: Vec<String>,
    pub reason: String,
}

impl CleanupPlan {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty()
    }
}

/// Per-service business rules plugged into `CleanupService`.
pub trait CleanupRules: Send + Sync + 'static {
    /// The attributes this service reacts to.
    type Snapshot: Clone + PartialEq + Debug + Send + Sync + 'static;

    /// Service name, used in logs.
    fn name(&self) -> &'static str;

    /// Notification title when something was removed.
    fn title(&self) -> &'static str;

    fn snapshot(&self, record: &CharacterRecord) -> Self::Snapshot;

    /// Decide what to retract after the tracked attributes changed.
    fn plan(
        &self,
        previous: &Self::Snapshot,
        current: &Self::Snapshot,
        record: &CharacterRecord,
    ) -> Option<CleanupPlan>;

    /// Quiet period before a pass runs; `None` runs on every change.
    fn debounce(&self) -> Option<Duration> {
        None
    }
}

/// Generic observer shell around one set of `CleanupRules`.
pub struct CleanupService<R: CleanupRules> {
    store: Arc<CharacterStore>,
    notifier: Arc<dyn NotificationPort>,
    rules: Arc<R>,
    notification_duration: Duration,
    initialized: AtomicBool,
    cancel: CancellationToken,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl<R: CleanupRules> CleanupService<R> {
    pub fn new(
        store: Arc<CharacterStore>,
        notifier: Arc<dyn NotificationPort>,
        rules: R,
        notification_duration: Duration,
    ) -> Self {
        Self {
            store,
            notifier,
            rules: Arc::new(rules),
            notification_duration,
            initialized: AtomicBool::new(false),
            cancel: CancellationToken::new(),
            handle: Mutex::new(None),
        }
    }

    pub fn rules(&self) -> &R {
        &self.rules
    }

    pub fn is_armed(&self) -> bool {
        self.initialized.load(Ordering::SeqCst) && !self.cancel.is_cancelled()
    }

    /// Subscribe to the store and start watching.
    ///
    /// Returns `false` if the service was already initialized. Must be called
    /// from inside a tokio runtime.
    pub fn initialize(&self) -> bool {
        if self
            .initialized
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return false;
        }

        let mut rx = self.store.subscribe();
        let baseline = self.rules.snapshot(&rx.borrow_and_update());

        let worker = Worker {
            store: self.store.clone(),
            notifier: self.notifier.clone(),
            rules: self.rules.clone(),
            notification_duration: self.notification_duration,
            baseline,
        };
        let cancel = self.cancel.clone();
        let handle = tokio::spawn(worker.run(rx, cancel));

        *self.lock_handle() = Some(handle);
        tracing::debug!(service = self.rules.name(), "Cleanup service armed");
        true
    }

    /// Stop watching. Any pending debounced pass is dropped.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let handle = self.lock_handle().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::warn!(service = self.rules.name(), error = %e, "Cleanup task ended abnormally");
            }
        }
    }

    fn lock_handle(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.handle
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<R: CleanupRules> Drop for CleanupService<R> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct Worker<R: CleanupRules> {
    store: Arc<CharacterStore>,
    notifier: Arc<dyn NotificationPort>,
    rules: Arc<R>,
    notification_duration: Duration,
    baseline: R::Snapshot,
}

impl<R: CleanupRules> Worker<R> {
    async fn run(mut self, mut rx: watch::Receiver<CharacterRecord>, cancel: CancellationToken) {
        let debounce = self.rules.debounce();
        let mut last_seen = self.baseline.clone();
        let mut deadline: Option<Instant> = None;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!(service = self.rules.name(), "Cleanup service shutting down");
                    break;
                }
                changed = rx.changed() => {
                    if changed.is_err() {
                        // Store dropped
                        break;
                    }
                    let current = self.rules.snapshot(&rx.borrow_and_update());
                    match debounce {
                        None => self.run_pass(),
                        Some(window) if current != last_seen => {
                            deadline = Some(Instant::now() + window);
                        }
                        Some(_) => {}
                    }
                    last_seen = current;
                }
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    deadline = None;
                    self.run_pass();
                }
            }
        }
    }

    /// Diff against the baseline and retract whatever the rules reject.
    ///
    /// Runs against the store's latest record, inside one store update.
    fn run_pass(&mut self) {
        let rules = &self.rules;
        let baseline = &mut self.baseline;
        let mut applied: Option<CleanupPlan> = None;

        self.store.modify_if(|record| {
            let current = rules.snapshot(record);
            if current == *baseline {
                return false;
            }
            let plan = rules.plan(baseline, &current, record);
            *baseline = current;

            let Some(plan) = plan.filter(|p| !p.is_empty()) else {
                return false;
            };
            for scope in &plan.reverts {
                record.smart_revert_scope(scope);
            }
            record.apply_batch(plan.choices.clone());
            applied = Some(plan);
            true
        });

        if let Some(plan) = applied {
            tracing::info!(
                service = self.rules.name(),
                removed = plan.removed.len(),
                reason = %plan.reason,
                "Retracted invalid selections"
            );
            let message = format!("Removed {}: {}", plan.removed.join(", "), plan.reason);
            self.notifier.add_notification(
                NotificationKind::Warning,
                self.rules.title(),
                &message,
                self.notification_duration,
            );
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::settle;
    use super::*;
    use crate::infrastructure::notifications::InMemoryNotifier;
    use crate::infrastructure::ports::MockNotificationPort;
    use charforge_domain::{Field, FieldValue, ScopeMeta, Tab};

    /// Drops every language once the class changes.
    struct ForgetLanguages;

    impl CleanupRules for ForgetLanguages {
        type Snapshot = Option<String>;

        fn name(&self) -> &'static str {
            "languages"
        }

        fn title(&self) -> &'static str {
            "Languages removed"
        }

        fn snapshot(&self, record: &CharacterRecord) -> Self::Snapshot {
            record.sheet().class().map(str::to_string)
        }

        fn plan(
            &self,
            _previous: &Self::Snapshot,
            _current: &Self::Snapshot,
            record: &CharacterRecord,
        ) -> Option<CleanupPlan> {
            let scope = ScopeId::new("languages").ok()?;
            let contribution = record.contribution(&scope)?;
            let removed = contribution
                .changes
                .get(Field::Languages)?
                .as_strings()?
                .to_vec();
            let choice = contribution
                .to_choice_with(Field::Languages, FieldValue::Strings(Vec::new()))
                .ok()?;
            Some(CleanupPlan {
                choices: vec![choice],
                reverts: Vec::new(),
                removed,
                reason: "class changed".into(),
            })
        }
    }

    fn class(name: &str) -> Choice {
        Choice::new(ScopeId::new("class").unwrap(), ScopeMeta::granted(Tab::Class)).class(name)
    }

    fn languages() -> Choice {
        Choice::new(
            ScopeId::new("languages").unwrap(),
            ScopeMeta::selected(Tab::Background),
        )
        .languages(["Elvish", "Orc"])
    }

    #[tokio::test(start_paused = true)]
    async fn baseline_is_not_cleaned() {
        let store = Arc::new(CharacterStore::new());
        store.apply_choice(class("Bard"));
        store.apply_choice(languages());

        let mut notifier = MockNotificationPort::new();
        notifier.expect_add_notification().never();
        let service = CleanupService::new(
            store.clone(),
            Arc::new(notifier),
            ForgetLanguages,
            Duration::from_secs(5),
        );

        assert!(service.initialize());
        assert!(!service.initialize());
        settle().await;

        assert_eq!(store.read(|r| r.sheet().languages().len()), 2);
        service.shutdown().await;
        assert!(!service.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn change_triggers_one_notification() {
        let store = Arc::new(CharacterStore::new());
        store.apply_choice(class("Bard"));
        store.apply_choice(languages());
        let notifier = Arc::new(InMemoryNotifier::new());
        let service = CleanupService::new(
            store.clone(),
            notifier.clone(),
            ForgetLanguages,
            Duration::from_secs(5),
        );
        service.initialize();

        store.apply_choice(class("Wizard"));
        settle().await;

        assert!(store.read(|r| r.sheet().languages().is_empty()));
        let received = notifier.take();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].title, "Languages removed");
        assert_eq!(received[0].message, "Removed Elvish, Orc: class changed");
        assert_eq!(received[0].duration, Duration::from_secs(5));

        // Nothing left to remove on the next change
        store.apply_choice(class("Cleric"));
        settle().await;
        assert!(notifier.is_empty());
        service.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn unrelated_changes_are_ignored() {
        let store = Arc::new(CharacterStore::new());
        store.apply_choice(class("Bard"));
        store.apply_choice(languages());
        let notifier = Arc::new(InMemoryNotifier::new());
        let service = CleanupService::new(
            store.clone(),
            notifier.clone(),
            ForgetLanguages,
            Duration::from_secs(5),
        );
        service.initialize();

        store.apply_choice(
            Choice::new(ScopeId::new("name").unwrap(), ScopeMeta::selected(Tab::Class))
                .name("Vex"),
        );
        settle().await;

        assert_eq!(store.read(|r| r.sheet().languages().len()), 2);
        assert!(notifier.is_empty());
        service.shutdown().await;
    }
}
