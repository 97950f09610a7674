use std::any::Any;

#[async_trait::async_trait]
pub trait TxManager: Send + Sync {
    async fn begin(&self) -> anyhow::Result<Box<dyn StorageTx>>;
}

/// A unit of work against one store. Dropping it without `commit` rolls it back.
#[async_trait::async_trait]
pub trait StorageTx: Send {
    async fn commit(self: Box<Self>) -> anyhow::Result<()>;
    async fn rollback(self: Box<Self>) -> anyhow::Result<()>;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<'a> dyn StorageTx + 'a {
    /// Recovers the adapter's concrete transaction; `None` when a repo is handed
    /// a transaction that belongs to another store.
    pub fn downcast_mut<T: StorageTx + 'static>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}
