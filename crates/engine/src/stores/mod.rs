//! In-memory state storage modules.
//!
//! - `CharacterStore` - The wizard session's character record

pub mod character_store;

pub use character_store::CharacterStore;
