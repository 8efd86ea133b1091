//! Call session manager
//!
//! Owns the lifecycle of every call record. Each operation is one bounded
//! read-modify-write against the [`CallStore`], guarded by the document
//! version so concurrent writers on the same call never overwrite each
//! other. Calls are independent; there is no lock shared between them.

use crate::domain::calling::aggregate::Call;
use crate::domain::calling::event::CallEvent;
use crate::domain::calling::repository::{CallPatch, CallStore, NewCall};
use crate::domain::calling::value_object::{NextSpeaker, ParticipantMode};
use crate::domain::shared::error::DomainError;
use crate::domain::shared::events::DomainEvent;
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::{CallId, GroupId, UserId};
use metrics::counter;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Attempts made before a contended update gives up with `Conflict`
pub const DEFAULT_MAX_UPDATE_ATTEMPTS: u32 = 8;

pub struct CallSessionManager {
    store: Arc<dyn CallStore>,
    max_update_attempts: u32,
}

impl CallSessionManager {
    pub fn new(store: Arc<dyn CallStore>) -> Self {
        Self::with_max_update_attempts(store, DEFAULT_MAX_UPDATE_ATTEMPTS)
    }

    pub fn with_max_update_attempts(store: Arc<dyn CallStore>, max_update_attempts: u32) -> Self {
        Self {
            store,
            max_update_attempts: max_update_attempts.max(1),
        }
    }

    /// Start a new call in `group`, administered by `admin`
    pub async fn start_call(&self, admin: UserId, group: GroupId) -> Result<Call> {
        let call = self.store.create_one(NewCall { group, admin }).await?;

        info!("Call {} started by {} in group {}", call.id(), admin, group);
        counter!("calls_started_total").increment(1);
        publish(&[CallEvent::started(*call.id(), group, admin)]);

        Ok(call)
    }

    /// Fetch a call, ongoing or ended
    pub async fn get_call(&self, call_id: &CallId) -> Result<Call> {
        self.load(call_id).await
    }

    /// Add `user` to the participants. Rejoining is a no-op.
    pub async fn join_call(&self, user: UserId, call_id: &CallId) -> Result<Call> {
        let (call, _) = self
            .update(call_id, |call| {
                let changed = call.join(user)?;
                Ok((changed.then(|| CallPatch::participants(call)), ()))
            })
            .await?;
        Ok(call)
    }

    /// Move `user` between participants and listeners
    pub async fn switch_participant_mode(&self, user: UserId, call_id: &CallId) -> Result<Call> {
        let (call, mode) = self
            .update(call_id, |call| {
                let mode = call.switch_mode(user)?;
                Ok((Some(CallPatch::rosters(call)), mode))
            })
            .await?;

        debug!(
            "User {} is now a {} in call {}",
            user,
            match mode {
                ParticipantMode::Participant => "participant",
                ParticipantMode::Listener => "listener",
            },
            call_id
        );
        Ok(call)
    }

    /// Put `user` at the back of the speaker queue unless already queued
    pub async fn request_to_speak(&self, user: UserId, call_id: &CallId) -> Result<Call> {
        let (call, _) = self
            .update(call_id, |call| {
                let changed = call.request_to_speak(user)?;
                Ok((changed.then(|| CallPatch::speaker_queue(call)), ()))
            })
            .await?;
        Ok(call)
    }

    /// Pop the head of the speaker queue. Admin only.
    ///
    /// The popped user is returned but not added to the participants; granting
    /// the floor is left to the caller.
    pub async fn call_next_speaker(&self, admin: UserId, call_id: &CallId) -> Result<NextSpeaker> {
        let (_, next) = self
            .update(call_id, |call| {
                let next = call.call_next_speaker(admin)?;
                let patch = match next {
                    NextSpeaker::Called(_) => Some(CallPatch::speaker_queue(call)),
                    NextSpeaker::QueueEmpty => None,
                };
                Ok((patch, next))
            })
            .await?;

        if next == NextSpeaker::QueueEmpty {
            debug!("Speaker queue of call {} is empty", call_id);
        }
        Ok(next)
    }

    /// Flip the mute flag of `user` and return the new value
    pub async fn mute_switch(&self, user: UserId, call_id: &CallId) -> Result<bool> {
        let (_, muted) = self
            .update(call_id, |call| {
                let muted = call.toggle_mute(user)?;
                Ok((Some(CallPatch::mute_flags(call)), muted))
            })
            .await?;
        Ok(muted)
    }

    /// Remove `user` from both rosters
    ///
    /// A queued speaker stays queued and mute flags are kept.
    pub async fn leave_call(&self, user: UserId, call_id: &CallId) -> Result<Call> {
        let (call, _) = self
            .update(call_id, |call| {
                let changed = call.leave(user)?;
                Ok((changed.then(|| CallPatch::rosters(call)), ()))
            })
            .await?;
        Ok(call)
    }

    /// End the call. Admin only; ending twice is a no-op.
    pub async fn end_call(&self, admin: UserId, call_id: &CallId) -> Result<()> {
        let (_, ended_now) = self
            .update(call_id, |call| {
                let ended_now = call.end(admin)?;
                Ok((ended_now.then(|| CallPatch::ended(call)), ended_now))
            })
            .await?;

        if ended_now {
            info!("Call {} ended by {}", call_id, admin);
            counter!("calls_ended_total").increment(1);
        }
        Ok(())
    }

    async fn load(&self, call_id: &CallId) -> Result<Call> {
        self.store
            .read_one(call_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Call {} does not exist", call_id)))
    }

    /// Read, apply `op`, and write back the patch it returns
    ///
    /// `op` runs against a fresh copy on every attempt. Returning `None` or an
    /// empty patch skips the write.
    async fn update<T, F>(&self, call_id: &CallId, mut op: F) -> Result<(Call, T)>
    where
        F: FnMut(&mut Call) -> Result<(Option<CallPatch>, T)>,
    {
        for attempt in 1..=self.max_update_attempts {
            let mut call = self.load(call_id).await?;
            let (patch, output) = op(&mut call)?;

            let Some(patch) = patch.filter(|p| !p.is_empty()) else {
                return Ok((call, output));
            };

            match self
                .store
                .partial_update_one(call_id, call.version(), patch)
                .await
            {
                Ok(updated) => {
                    publish(&call.take_events());
                    return Ok((updated, output));
                }
                Err(DomainError::Conflict(reason)) => {
                    counter!("call_update_conflicts_total").increment(1);
                    debug!(
                        "Update of call {} lost a race (attempt {}/{}): {}",
                        call_id, attempt, self.max_update_attempts, reason
                    );
                }
                Err(e) => {
                    warn!("Failed to update call {}: {}", call_id, e);
                    return Err(e);
                }
            }
        }

        Err(DomainError::Conflict(format!(
            "Call {} is under heavy contention, giving up after {} attempts",
            call_id, self.max_update_attempts
        )))
    }
}

fn publish(events: &[CallEvent]) {
    for event in events {
        debug!(
            "{} on call {} at {}",
            event.event_type(),
            event.call_id(),
            event.occurred_at()
        );
        counter!("call_events_total", "event" => event.event_type()).increment(1);
    }
}
