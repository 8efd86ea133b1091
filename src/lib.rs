//! Circlecall - group voice call sessions for circles
//!
//! Tracks each call's speaking roster, listeners, speaker queue and mute
//! flags, and keeps them consistent under concurrent updates. Audio
//! transport and signaling live elsewhere.

pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interface;

// Re-export commonly used types
pub use domain::shared::error::DomainError;
pub use domain::shared::result::Result;
