use crate::domain_model::*;
use crate::domain_port::{StorageTx, TxManager};
use anyhow::anyhow;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard, OwnedMutexGuard};

#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    pub(super) users: HashMap<UserId, UserProfile>,
    /// username key -> owner
    pub(super) usernames: HashMap<String, UserId>,
    /// Insertion order doubles as the tiebreaker for equal timestamps.
    pub(super) requests: Vec<FriendRequest>,
}

/// Process-local store shared by the memory repos.
///
/// A transaction owns the whole store until it ends, so writers are fully
/// serialized. Reads outside a transaction wait for the current writer.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(super) async fn read(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().await
    }
}

pub struct MemoryTxManager {
    store: MemoryStore,
}

impl MemoryTxManager {
    pub fn new(store: MemoryStore) -> Self {
        MemoryTxManager { store }
    }
}

#[async_trait::async_trait]
impl TxManager for MemoryTxManager {
    async fn begin(&self) -> anyhow::Result<Box<dyn StorageTx>> {
        let guard = self.store.state.clone().lock_owned().await;
        Ok(Box::new(MemoryTx::new(guard)))
    }
}

pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    snapshot: Option<MemoryState>,
}

impl MemoryTx {
    fn new(guard: OwnedMutexGuard<MemoryState>) -> Self {
        let snapshot = Some(guard.clone());
        MemoryTx { guard, snapshot }
    }

    pub fn state(&mut self) -> &mut MemoryState {
        &mut self.guard
    }

    fn restore(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            *self.guard = snapshot;
        }
    }
}

impl Drop for MemoryTx {
    fn drop(&mut self) {
        self.restore();
    }
}

#[async_trait::async_trait]
impl StorageTx for MemoryTx {
    async fn commit(self: Box<Self>) -> anyhow::Result<()> {
        let mut tx = self;
        tx.snapshot = None;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> anyhow::Result<()> {
        let mut tx = self;
        tx.restore();
        Ok(())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

pub(super) fn downcast(tx: &mut dyn StorageTx) -> anyhow::Result<&mut MemoryTx> {
    tx.downcast_mut::<MemoryTx>()
        .ok_or_else(|| anyhow!("transaction does not belong to the memory store"))
}
