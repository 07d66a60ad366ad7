//! Engine configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! - `CHARFORGE_EQUIPMENT_DEBOUNCE_MS` - Quiet period before equipment cleanup runs (default: 250)
//! - `CHARFORGE_NOTIFICATION_MS` - Display duration of cleanup notifications (default: 5000)
//! - `CHARFORGE_REFERENCE_DATA` - Path to a JSON spell reference file (default: none)
//! - `CHARFORGE_LOG` - Log filter used when `RUST_LOG` is unset

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

pub const EQUIPMENT_DEBOUNCE_VAR: &str = "CHARFORGE_EQUIPMENT_DEBOUNCE_MS";
pub const NOTIFICATION_VAR: &str = "CHARFORGE_NOTIFICATION_MS";
pub const REFERENCE_DATA_VAR: &str = "CHARFORGE_REFERENCE_DATA";
pub const LOG_VAR: &str = "CHARFORGE_LOG";

const DEFAULT_EQUIPMENT_DEBOUNCE_MS: u64 = 250;
const DEFAULT_NOTIFICATION_MS: u64 = 5000;
pub const DEFAULT_LOG_FILTER: &str = "charforge_engine=debug,charforge_domain=info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub equipment_debounce: Duration,
    pub notification_duration: Duration,
    pub reference_data: Option<PathBuf>,
    pub log_filter: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            equipment_debounce: Duration::from_millis(DEFAULT_EQUIPMENT_DEBOUNCE_MS),
            notification_duration: Duration::from_millis(DEFAULT_NOTIFICATION_MS),
            reference_data: None,
            log_filter: None,
        }
    }
}

impl EngineConfig {
    /// Read the process environment. Missing or unparseable values fall back
    /// to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Self {
            equipment_debounce: Duration::from_millis(env_or(
                &lookup,
                EQUIPMENT_DEBOUNCE_VAR,
                DEFAULT_EQUIPMENT_DEBOUNCE_MS,
            )),
            notification_duration: Duration::from_millis(env_or(
                &lookup,
                NOTIFICATION_VAR,
                DEFAULT_NOTIFICATION_MS,
            )),
            reference_data: non_empty(REFERENCE_DATA_VAR).map(PathBuf::from),
            log_filter: non_empty(LOG_VAR),
        }
    }
}

fn env_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    let Some(raw) = lookup(key) else {
        return default;
    };
    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            tracing::warn!(key, value = %raw, "Unparseable setting, using default");
            default
        }
    }
}

/// Load `.env.local` then `.env` from the workspace root, if present.
///
/// Variables already set in the process environment win.
pub fn load_dotenv_from_repo_root() {
    let repo_root = Path::new(env!("CARGO_MANIFEST_DIR")).join("..").join("..");
    load_dotenv_from(&repo_root);
}

/// Load `.env.local` then `.env` from `dir`, returning how many files loaded.
///
/// A file that fails to parse is logged and skipped.
pub fn load_dotenv_from(dir: &Path) -> usize {
    let mut loaded = 0;
    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = dir.join(filename);
        if !path.exists() {
            continue;
        }
        match dotenvy::from_path(&path) {
            Ok(()) => loaded += 1,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to load env file")
            }
        }
    }
    loaded
}
