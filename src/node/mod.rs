//! Node state synchronization with the cluster coordination service.
//!
//! Controller state is persisted as string key/value metadata on a
//! remote node object. Writes are non-destructive merges; a concurrent
//! modification rejected by the coordinator surfaces as
//! [`SyncError::Conflict`] and is never retried here — the next
//! adjustment cycle republishes fresh values anyway.

pub mod keys;

mod http;

pub use http::HttpNodeState;

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::SyncError;

/// Remote node metadata: string keys to string values.
pub type NodeState = BTreeMap<String, String>;

/// Read/merge access to one node's remote metadata.
pub trait NodeStateSync {
    /// Returns the current remote state mapping.
    async fn get(&self) -> Result<NodeState, SyncError>;

    /// Merges `patch` into the remote state without touching other keys.
    async fn set(&self, patch: NodeState) -> Result<(), SyncError>;

    /// Whether the node carries the initialization marker.
    async fn is_initialized(&self) -> Result<bool, SyncError> {
        Ok(self.get().await?.contains_key(keys::INITIALIZED))
    }

    /// Sets the initialization marker. A no-op when already marked, so
    /// re-invocation issues no remote write.
    async fn mark_initialized(&self) -> Result<(), SyncError> {
        if self.is_initialized().await? {
            return Ok(());
        }
        let mut patch = NodeState::new();
        patch.insert(keys::INITIALIZED.to_string(), keys::INITIALIZED_BY.to_string());
        self.set(patch).await
    }
}

impl<T: NodeStateSync + Sync> NodeStateSync for std::sync::Arc<T> {
    async fn get(&self) -> Result<NodeState, SyncError> {
        self.as_ref().get().await
    }

    async fn set(&self, patch: NodeState) -> Result<(), SyncError> {
        self.as_ref().set(patch).await
    }
}

/// In-process node state, used by tests and single-node dry runs.
#[derive(Debug, Default)]
pub struct MemoryNodeState {
    state: Mutex<NodeState>,
    writes: AtomicUsize,
}

impl MemoryNodeState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the state with initial entries.
    pub fn with_state(state: NodeState) -> Self {
        Self {
            state: Mutex::new(state),
            writes: AtomicUsize::new(0),
        }
    }

    /// Number of `set` calls accepted so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }
}

impl NodeStateSync for MemoryNodeState {
    async fn get(&self) -> Result<NodeState, SyncError> {
        Ok(self
            .state
            .lock()
            .map_err(|e| SyncError::Transport(e.to_string()))?
            .clone())
    }

    async fn set(&self, patch: NodeState) -> Result<(), SyncError> {
        let mut state = self
            .state
            .lock()
            .map_err(|e| SyncError::Transport(e.to_string()))?;
        state.extend(patch);
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patch(entries: &[(&str, &str)]) -> NodeState {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn set_merges_without_clearing_other_keys() {
        let sync = MemoryNodeState::new();
        sync.set(patch(&[("a", "1"), ("b", "2")])).await.expect("set");
        sync.set(patch(&[("b", "3"), ("c", "4")])).await.expect("set");

        let state = sync.get().await.expect("get");
        assert_eq!(state.get("a").map(String::as_str), Some("1"));
        assert_eq!(state.get("b").map(String::as_str), Some("3"));
        assert_eq!(state.get("c").map(String::as_str), Some("4"));
    }

    #[tokio::test]
    async fn mark_initialized_is_idempotent() {
        let sync = MemoryNodeState::new();
        assert!(!sync.is_initialized().await.expect("check"));

        sync.mark_initialized().await.expect("first mark");
        assert!(sync.is_initialized().await.expect("check"));
        assert_eq!(sync.write_count(), 1);

        // Second invocation must not issue a remote write.
        sync.mark_initialized().await.expect("second mark");
        assert_eq!(sync.write_count(), 1);
    }

    #[tokio::test]
    async fn marker_value_identifies_the_controller() {
        let sync = MemoryNodeState::new();
        sync.mark_initialized().await.expect("mark");
        let state = sync.get().await.expect("get");
        assert_eq!(
            state.get(keys::INITIALIZED).map(String::as_str),
            Some(keys::INITIALIZED_BY)
        );
    }
}
