//! Calling value objects

use crate::domain::shared::value_objects::UserId;
use serde::{Deserialize, Serialize};

/// Role a user holds inside a call roster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantMode {
    /// Permitted to speak
    Participant,
    /// Present but not permitted to speak
    Listener,
}

/// Outcome of advancing the speaker queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "speaker", rename_all = "snake_case")]
pub enum NextSpeaker {
    /// Head of the queue was popped. The user is not added to the participants.
    Called(UserId),
    /// Nothing was queued; the call was left untouched
    QueueEmpty,
}

impl NextSpeaker {
    pub fn speaker(&self) -> Option<UserId> {
        match self {
            NextSpeaker::Called(user) => Some(*user),
            NextSpeaker::QueueEmpty => None,
        }
    }
}
