//! Result alias shared by the domain, store and manager layers

use super::error::DomainError;

pub type Result<T> = std::result::Result<T, DomainError>;
