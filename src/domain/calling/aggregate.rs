//! Call aggregate root

use crate::domain::calling::event::CallEvent;
use crate::domain::calling::repository::CallPatch;
use crate::domain::calling::value_object::{NextSpeaker, ParticipantMode};
use crate::domain::shared::error::DomainError;
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::{CallId, GroupId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Call aggregate root
///
/// One live group voice session scoped to a circle. Holds the speaking
/// roster, the listener roster, the speaker queue and per-user mute flags.
/// Every transition checks the terminal `is_ongoing` guard first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Call {
    id: CallId,
    group: GroupId,
    admin: UserId,
    participants: BTreeSet<UserId>,
    listeners: BTreeSet<UserId>,
    speaker_queue: VecDeque<UserId>,
    /// Only users who toggled at least once have an entry
    is_muted: BTreeMap<UserId, bool>,
    is_ongoing: bool,
    created_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    /// Document version maintained by the store
    #[serde(skip)]
    version: u64,
    /// Pending domain events
    #[serde(skip)]
    events: Vec<CallEvent>,
}

impl Call {
    /// Create a fresh, ongoing call with empty rosters
    pub fn new(id: CallId, group: GroupId, admin: UserId) -> Self {
        Self {
            id,
            group,
            admin,
            participants: BTreeSet::new(),
            listeners: BTreeSet::new(),
            speaker_queue: VecDeque::new(),
            is_muted: BTreeMap::new(),
            is_ongoing: true,
            created_at: Utc::now(),
            ended_at: None,
            version: 1,
            events: Vec::new(),
        }
    }

    /// Add a user to the speaking roster. Returns false on rejoin.
    pub fn join(&mut self, user: UserId) -> Result<bool> {
        self.ensure_ongoing()?;

        if !self.participants.insert(user) {
            return Ok(false);
        }

        self.record_event(CallEvent::joined(self.id, user));
        Ok(true)
    }

    /// Toggle a user between participants and listeners
    ///
    /// Anyone who is not currently a listener, including a user in neither
    /// roster, ends up as a listener.
    pub fn switch_mode(&mut self, user: UserId) -> Result<ParticipantMode> {
        self.ensure_ongoing()?;

        let mode = match self.mode_of(&user) {
            Some(ParticipantMode::Listener) => {
                self.listeners.remove(&user);
                self.participants.insert(user);
                ParticipantMode::Participant
            }
            Some(ParticipantMode::Participant) | None => {
                self.participants.remove(&user);
                self.listeners.insert(user);
                ParticipantMode::Listener
            }
        };

        self.record_event(CallEvent::mode_switched(self.id, user, mode));
        Ok(mode)
    }

    /// Queue a user for the floor. Returns false if already queued.
    pub fn request_to_speak(&mut self, user: UserId) -> Result<bool> {
        self.ensure_ongoing()?;

        if self.speaker_queue.contains(&user) {
            return Ok(false);
        }

        self.speaker_queue.push_back(user);
        self.record_event(CallEvent::speaker_requested(self.id, user));
        Ok(true)
    }

    /// Pop the head of the speaker queue on behalf of the admin
    pub fn call_next_speaker(&mut self, caller: UserId) -> Result<NextSpeaker> {
        self.ensure_admin(caller, "Only the admin can call the next speaker")?;
        self.ensure_ongoing()?;

        match self.speaker_queue.pop_front() {
            Some(speaker) => {
                self.record_event(CallEvent::speaker_called(self.id, speaker));
                Ok(NextSpeaker::Called(speaker))
            }
            None => Ok(NextSpeaker::QueueEmpty),
        }
    }

    /// Flip a user's mute flag and return the new value
    pub fn toggle_mute(&mut self, user: UserId) -> Result<bool> {
        self.ensure_ongoing()?;

        let muted = !self.is_muted(&user);
        self.is_muted.insert(user, muted);

        self.record_event(CallEvent::mute_toggled(self.id, user, muted));
        Ok(muted)
    }

    /// Drop a user from both rosters. Returns false if they were in neither.
    ///
    /// The speaker queue and mute flags are left as they are.
    pub fn leave(&mut self, user: UserId) -> Result<bool> {
        self.ensure_ongoing()?;

        let was_participant = self.participants.remove(&user);
        let was_listener = self.listeners.remove(&user);
        if !was_participant && !was_listener {
            return Ok(false);
        }

        self.record_event(CallEvent::left(self.id, user));
        Ok(true)
    }

    /// End the call. Returns false if it had already ended.
    pub fn end(&mut self, caller: UserId) -> Result<bool> {
        self.ensure_admin(caller, "Only the admin can end the call")?;

        if !self.is_ongoing {
            return Ok(false);
        }

        self.is_ongoing = false;
        self.ended_at = Some(Utc::now());
        self.record_event(CallEvent::ended(self.id, caller));
        Ok(true)
    }

    fn ensure_ongoing(&self) -> Result<()> {
        if self.is_ongoing {
            Ok(())
        } else {
            Err(DomainError::CallEnded(format!("Call {} is no longer ongoing", self.id)))
        }
    }

    fn ensure_admin(&self, caller: UserId, message: &str) -> Result<()> {
        if caller == self.admin {
            Ok(())
        } else {
            Err(DomainError::NotAllowed(message.to_string()))
        }
    }

    /// Merge a partial update into this record
    pub fn apply_patch(&mut self, patch: CallPatch) {
        if let Some(participants) = patch.participants {
            self.participants = participants;
        }
        if let Some(listeners) = patch.listeners {
            self.listeners = listeners;
        }
        if let Some(speaker_queue) = patch.speaker_queue {
            self.speaker_queue = speaker_queue;
        }
        if let Some(is_muted) = patch.is_muted {
            self.is_muted = is_muted;
        }
        if let Some(is_ongoing) = patch.is_ongoing {
            self.is_ongoing = is_ongoing;
        }
        if let Some(ended_at) = patch.ended_at {
            self.ended_at = Some(ended_at);
        }
    }

    /// Record a domain event
    fn record_event(&mut self, event: CallEvent) {
        self.events.push(event);
    }

    /// Take all pending events
    pub fn take_events(&mut self) -> Vec<CallEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    // Getters
    pub fn id(&self) -> &CallId {
        &self.id
    }

    pub fn group(&self) -> &GroupId {
        &self.group
    }

    pub fn admin(&self) -> &UserId {
        &self.admin
    }

    pub fn participants(&self) -> &BTreeSet<UserId> {
        &self.participants
    }

    pub fn listeners(&self) -> &BTreeSet<UserId> {
        &self.listeners
    }

    pub fn speaker_queue(&self) -> &VecDeque<UserId> {
        &self.speaker_queue
    }

    pub fn mute_flags(&self) -> &BTreeMap<UserId, bool> {
        &self.is_muted
    }

    /// Absent entries read as unmuted
    pub fn is_muted(&self, user: &UserId) -> bool {
        self.is_muted.get(user).copied().unwrap_or(false)
    }

    pub fn is_ongoing(&self) -> bool {
        self.is_ongoing
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Which roster a user is on, if any
    pub fn mode_of(&self, user: &UserId) -> Option<ParticipantMode> {
        if self.participants.contains(user) {
            Some(ParticipantMode::Participant)
        } else if self.listeners.contains(user) {
            Some(ParticipantMode::Listener)
        } else {
            None
        }
    }
}
