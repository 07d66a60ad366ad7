//! Infrastructure implementations.
//!
//! Contains port trait implementations for external dependencies.

pub mod notifications;
pub mod ports;
pub mod reference_data;
