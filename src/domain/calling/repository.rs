//! Call record store interface

use crate::domain::calling::aggregate::Call;
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::{CallId, GroupId, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Fields supplied when a call record is created
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewCall {
    pub group: GroupId,
    pub admin: UserId,
}

/// Partial update merged into a stored call. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CallPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participants: Option<BTreeSet<UserId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listeners: Option<BTreeSet<UserId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaker_queue: Option<VecDeque<UserId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_muted: Option<BTreeMap<UserId, bool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_ongoing: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
}

impl CallPatch {
    pub fn participants(call: &Call) -> Self {
        Self {
            participants: Some(call.participants().clone()),
            ..Default::default()
        }
    }

    /// Both rosters, written together so they stay disjoint
    pub fn rosters(call: &Call) -> Self {
        Self {
            participants: Some(call.participants().clone()),
            listeners: Some(call.listeners().clone()),
            ..Default::default()
        }
    }

    pub fn speaker_queue(call: &Call) -> Self {
        Self {
            speaker_queue: Some(call.speaker_queue().clone()),
            ..Default::default()
        }
    }

    pub fn mute_flags(call: &Call) -> Self {
        Self {
            is_muted: Some(call.mute_flags().clone()),
            ..Default::default()
        }
    }

    pub fn ended(call: &Call) -> Self {
        Self {
            is_ongoing: Some(call.is_ongoing()),
            ended_at: call.ended_at(),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Record store interface for call documents
///
/// This is defined in the domain layer as a trait (port),
/// and implemented in the infrastructure layer (adapter).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CallStore: Send + Sync {
    /// Insert a new record, assigning its id and version 1
    async fn create_one(&self, new_call: NewCall) -> Result<Call>;

    /// Fetch a record by id
    async fn read_one(&self, id: &CallId) -> Result<Option<Call>>;

    /// Merge `patch` into the record if its version still equals
    /// `expected_version`, returning the updated record.
    ///
    /// Fails with `NotFound` if the record is gone and `Conflict` if another
    /// writer got there first.
    async fn partial_update_one(
        &self,
        id: &CallId,
        expected_version: u64,
        patch: CallPatch,
    ) -> Result<Call>;
}
