//! Infrastructure layer - Technical implementations
//!
//! This layer contains the record store adapters behind the
//! `CallStore` port.

pub mod persistence;
