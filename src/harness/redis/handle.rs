use futures::lock::Mutex;
use jatsl::TaskResourceHandle;
use lazy_static::lazy_static;
use std::collections::HashSet;
use std::ops::{Deref, DerefMut};
use tokio::task;

lazy_static! {
    /// Handles of every task currently using the shared multiplexed connection
    pub(super) static ref SHARED_TASK_RESOURCE_HANDLES: Mutex<HashSet<TaskResourceHandle>> =
        Mutex::new(HashSet::new());
}

/// Resource handle of a connection which deregisters itself when the connection is dropped
pub(super) struct HandleRegistration {
    pub tx: TaskResourceHandle,
    pub is_shared: bool,
}

impl HandleRegistration {
    pub fn owned(tx: TaskResourceHandle) -> Self {
        Self {
            tx,
            is_shared: false,
        }
    }

    pub async fn shared(tx: TaskResourceHandle) -> Self {
        SHARED_TASK_RESOURCE_HANDLES.lock().await.insert(tx.clone());

        Self {
            tx,
            is_shared: true,
        }
    }
}

impl DerefMut for HandleRegistration {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.tx
    }
}

impl Deref for HandleRegistration {
    type Target = TaskResourceHandle;

    fn deref(&self) -> &Self::Target {
        &self.tx
    }
}

impl Drop for HandleRegistration {
    fn drop(&mut self) {
        if self.is_shared {
            // Lazily remove the handle as drop can not await the lock
            let handle = self.tx.clone();
            task::spawn(async move {
                SHARED_TASK_RESOURCE_HANDLES.lock().await.remove(&handle);
            });
        }
    }
}
