//! In-memory call store

use crate::domain::calling::{Call, CallPatch, CallStore, NewCall};
use crate::domain::shared::error::DomainError;
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::CallId;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Process-local call store
///
/// Records live in a map guarded by one `RwLock`; the version check and the
/// merge happen under the same write guard, so updates are atomic.
#[derive(Clone, Default)]
pub struct InMemoryCallStore {
    calls: Arc<RwLock<HashMap<CallId, Call>>>,
}

impl InMemoryCallStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records, ongoing or ended
    pub async fn len(&self) -> usize {
        self.calls.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.calls.read().await.is_empty()
    }
}

#[async_trait]
impl CallStore for InMemoryCallStore {
    async fn create_one(&self, new_call: NewCall) -> Result<Call> {
        let call = Call::new(CallId::new(), new_call.group, new_call.admin);

        self.calls.write().await.insert(*call.id(), call.clone());
        debug!("Created call record {}", call.id());

        Ok(call)
    }

    async fn read_one(&self, id: &CallId) -> Result<Option<Call>> {
        Ok(self.calls.read().await.get(id).cloned())
    }

    async fn partial_update_one(
        &self,
        id: &CallId,
        expected_version: u64,
        patch: CallPatch,
    ) -> Result<Call> {
        let mut calls = self.calls.write().await;
        let call = calls
            .get_mut(id)
            .ok_or_else(|| DomainError::NotFound(format!("Call {} does not exist", id)))?;

        if call.version() != expected_version {
            return Err(DomainError::Conflict(format!(
                "Call {} is at version {}, expected {}",
                id,
                call.version(),
                expected_version
            )));
        }

        call.apply_patch(patch);
        call.set_version(expected_version + 1);
        debug!("Updated call record {} to version {}", id, call.version());

        Ok(call.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::shared::value_objects::{GroupId, UserId};
    use std::collections::BTreeSet;

    fn new_call() -> NewCall {
        NewCall {
            group: GroupId::new(),
            admin: UserId::new(),
        }
    }

    #[tokio::test]
    async fn test_create_and_read() {
        let store = InMemoryCallStore::new();
        let request = new_call();

        let created = store.create_one(request).await.unwrap();
        assert_eq!(created.version(), 1);
        assert_eq!(created.admin(), &request.admin);
        assert_eq!(created.group(), &request.group);

        let read = store.read_one(created.id()).await.unwrap().unwrap();
        assert_eq!(read.id(), created.id());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_read_missing_returns_none() {
        let store = InMemoryCallStore::new();
        assert!(store.read_one(&CallId::new()).await.unwrap().is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_update_bumps_version() {
        let store = InMemoryCallStore::new();
        let created = store.create_one(new_call()).await.unwrap();
        let user = UserId::new();

        let patch = CallPatch {
            participants: Some(BTreeSet::from([user])),
            ..Default::default()
        };
        let updated = store
            .partial_update_one(created.id(), 1, patch)
            .await
            .unwrap();

        assert_eq!(updated.version(), 2);
        assert!(updated.participants().contains(&user));
        assert!(updated.is_ongoing());
    }

    #[tokio::test]
    async fn test_stale_version_conflicts() {
        let store = InMemoryCallStore::new();
        let created = store.create_one(new_call()).await.unwrap();

        store
            .partial_update_one(created.id(), 1, CallPatch::default())
            .await
            .unwrap();
        let result = store
            .partial_update_one(created.id(), 1, CallPatch::default())
            .await;

        assert!(matches!(result, Err(DomainError::Conflict(_))));
    }

    #[test]
    fn test_clones_share_records() {
        let store = InMemoryCallStore::new();
        let handle = store.clone();

        let created = tokio_test::block_on(store.create_one(new_call())).unwrap();
        let seen = tokio_test::block_on(handle.read_one(created.id())).unwrap();

        assert!(seen.is_some());
        assert_eq!(tokio_test::block_on(handle.len()), 1);
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let store = InMemoryCallStore::new();
        let result = store
            .partial_update_one(&CallId::new(), 1, CallPatch::default())
            .await;

        assert!(matches!(result, Err(DomainError::NotFound(_))));
    }
}
