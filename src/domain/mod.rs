//! Domain layer - Core business logic and rules
//!
//! This layer contains:
//! - Aggregates: Consistency boundaries
//! - Value Objects: Immutable objects without identity
//! - Domain Services: Operations that coordinate the store and aggregates
//! - Repository Interfaces: Ports for persistence
//! - Domain Events: Things that happened in the domain

pub mod calling;
pub mod shared;

// Re-export commonly used types
pub use shared::{DomainError, Result};
