//! Calling bounded context - live group voice calls scoped to a circle

pub mod aggregate;
pub mod event;
pub mod manager;
pub mod repository;
pub mod value_object;

pub use aggregate::Call;
pub use event::CallEvent;
pub use manager::{CallSessionManager, DEFAULT_MAX_UPDATE_ATTEMPTS};
pub use repository::{CallPatch, CallStore, NewCall};
pub use value_object::{NextSpeaker, ParticipantMode};
