//! Calling domain events

use crate::domain::calling::value_object::ParticipantMode;
use crate::domain::shared::events::{DomainEvent, EventMetadata};
use crate::domain::shared::value_objects::{CallId, GroupId, UserId};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Fields shared by every call event
#[derive(Debug, Clone, Serialize)]
pub struct CallEventBase {
    pub metadata: EventMetadata,
    pub call_id: CallId,
}

impl CallEventBase {
    pub fn new(event_type: &'static str, call_id: CallId) -> Self {
        Self {
            metadata: EventMetadata::new(event_type),
            call_id,
        }
    }
}

/// Something that happened to a call
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CallEvent {
    Started {
        base: CallEventBase,
        group: GroupId,
        admin: UserId,
    },
    Joined {
        base: CallEventBase,
        user: UserId,
    },
    ModeSwitched {
        base: CallEventBase,
        user: UserId,
        mode: ParticipantMode,
    },
    SpeakerRequested {
        base: CallEventBase,
        user: UserId,
    },
    SpeakerCalled {
        base: CallEventBase,
        speaker: UserId,
    },
    MuteToggled {
        base: CallEventBase,
        user: UserId,
        muted: bool,
    },
    Left {
        base: CallEventBase,
        user: UserId,
    },
    Ended {
        base: CallEventBase,
        ended_by: UserId,
    },
}

impl CallEvent {
    pub fn started(call_id: CallId, group: GroupId, admin: UserId) -> Self {
        CallEvent::Started {
            base: CallEventBase::new("call.started", call_id),
            group,
            admin,
        }
    }

    pub fn joined(call_id: CallId, user: UserId) -> Self {
        CallEvent::Joined {
            base: CallEventBase::new("call.joined", call_id),
            user,
        }
    }

    pub fn mode_switched(call_id: CallId, user: UserId, mode: ParticipantMode) -> Self {
        CallEvent::ModeSwitched {
            base: CallEventBase::new("call.mode_switched", call_id),
            user,
            mode,
        }
    }

    pub fn speaker_requested(call_id: CallId, user: UserId) -> Self {
        CallEvent::SpeakerRequested {
            base: CallEventBase::new("call.speaker_requested", call_id),
            user,
        }
    }

    pub fn speaker_called(call_id: CallId, speaker: UserId) -> Self {
        CallEvent::SpeakerCalled {
            base: CallEventBase::new("call.speaker_called", call_id),
            speaker,
        }
    }

    pub fn mute_toggled(call_id: CallId, user: UserId, muted: bool) -> Self {
        CallEvent::MuteToggled {
            base: CallEventBase::new("call.mute_toggled", call_id),
            user,
            muted,
        }
    }

    pub fn left(call_id: CallId, user: UserId) -> Self {
        CallEvent::Left {
            base: CallEventBase::new("call.left", call_id),
            user,
        }
    }

    pub fn ended(call_id: CallId, ended_by: UserId) -> Self {
        CallEvent::Ended {
            base: CallEventBase::new("call.ended", call_id),
            ended_by,
        }
    }

    fn base(&self) -> &CallEventBase {
        match self {
            CallEvent::Started { base, .. }
            | CallEvent::Joined { base, .. }
            | CallEvent::ModeSwitched { base, .. }
            | CallEvent::SpeakerRequested { base, .. }
            | CallEvent::SpeakerCalled { base, .. }
            | CallEvent::MuteToggled { base, .. }
            | CallEvent::Left { base, .. }
            | CallEvent::Ended { base, .. } => base,
        }
    }

    pub fn call_id(&self) -> &CallId {
        &self.base().call_id
    }
}

impl DomainEvent for CallEvent {
    fn event_type(&self) -> &'static str {
        self.base().metadata.event_type
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.base().metadata.occurred_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_names() {
        let call_id = CallId::new();
        let user = UserId::new();

        assert_eq!(CallEvent::joined(call_id, user).event_type(), "call.joined");
        assert_eq!(
            CallEvent::mute_toggled(call_id, user, true).event_type(),
            "call.mute_toggled"
        );
        assert_eq!(CallEvent::ended(call_id, user).event_type(), "call.ended");
    }

    #[test]
    fn test_event_carries_call_id() {
        let call_id = CallId::new();
        let event = CallEvent::speaker_called(call_id, UserId::new());
        assert_eq!(event.call_id(), &call_id);
    }

    #[test]
    fn test_event_serializes_with_kind_tag() {
        let event = CallEvent::left(CallId::new(), UserId::new());
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "left");
        assert_eq!(json["base"]["metadata"]["event_type"], "call.left");
    }
}
