//! Charforge Engine library.
//!
//! The reactive session layer around `charforge-domain`.
//!
//! ## Structure
//!
//! - `stores/` - The watch-channel backed character store
//! - `use_cases/` - Conflict handling and the reactive cleanup services
//! - `infrastructure/` - Ports and their adapters (notifications, reference data)
//! - `config` - Environment configuration
//! - `script` - Scripted session replay
//! - `app` - Application composition

pub mod app;
pub mod config;
pub mod infrastructure;
pub mod script;
pub mod stores;
pub mod use_cases;

pub use app::App;
pub use config::EngineConfig;
