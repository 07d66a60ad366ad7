//! Application state and composition.

use std::sync::Arc;

use charforge_domain::{SpellAccessProvider, SpellCatalog};

use crate::config::EngineConfig;
use crate::infrastructure::ports::NotificationPort;
use crate::infrastructure::reference_data::StaticSpellData;
use crate::stores::CharacterStore;
use crate::use_cases::{
    self, BeastCleanupRules, CleanupService, EquipmentCleanupRules, SpellCleanupRules,
};

/// One wizard session.
///
/// Holds the character store, the use cases that read and mutate it, and the
/// cleanup services that keep dependent selections valid.
pub struct App {
    pub store: Arc<CharacterStore>,
    pub notifier: Arc<dyn NotificationPort>,
    pub use_cases: UseCases,
    pub cleanup: CleanupServices,
}

/// Container for all use cases.
pub struct UseCases {
    pub conflicts: use_cases::ConflictUseCases,
}

/// The reactive cleanup services, one per kind of dependent selection.
pub struct CleanupServices {
    pub beasts: CleanupService<BeastCleanupRules>,
    pub spells: CleanupService<SpellCleanupRules>,
    pub equipment: CleanupService<EquipmentCleanupRules>,
}

impl App {
    /// Create a new App with all dependencies wired up.
    ///
    /// The cleanup services are not armed until `initialize()`.
    pub fn new(
        config: &EngineConfig,
        spell_data: Arc<StaticSpellData>,
        notifier: Arc<dyn NotificationPort>,
    ) -> Self {
        let store = Arc::new(CharacterStore::new());
        let access: Arc<dyn SpellAccessProvider> = spell_data.clone();
        let catalog: Arc<dyn SpellCatalog> = spell_data;

        let use_cases = UseCases {
            conflicts: use_cases::ConflictUseCases::new(
                store.clone(),
                access.clone(),
                catalog.clone(),
            ),
        };

        let cleanup = CleanupServices {
            beasts: CleanupService::new(
                store.clone(),
                notifier.clone(),
                BeastCleanupRules::new(),
                config.notification_duration,
            ),
            spells: CleanupService::new(
                store.clone(),
                notifier.clone(),
                SpellCleanupRules::new(access, catalog),
                config.notification_duration,
            ),
            equipment: CleanupService::new(
                store.clone(),
                notifier.clone(),
                EquipmentCleanupRules::new(config.equipment_debounce),
                config.notification_duration,
            ),
        };

        Self {
            store,
            notifier,
            use_cases,
            cleanup,
        }
    }

    /// Arm every cleanup service against the current record.
    ///
    /// Must be called from inside a tokio runtime. Calling it again is a no-op.
    pub fn initialize(&self) {
        let armed = [
            self.cleanup.beasts.initialize(),
            self.cleanup.spells.initialize(),
            self.cleanup.equipment.initialize(),
        ];
        if armed.iter().any(|a| *a) {
            tracing::info!("Cleanup services initialized");
        }
    }

    /// Stop every cleanup service, dropping pending debounced passes.
    pub async fn shutdown(&self) {
        self.cleanup.beasts.shutdown().await;
        self.cleanup.spells.shutdown().await;
        self.cleanup.equipment.shutdown().await;
    }
}
