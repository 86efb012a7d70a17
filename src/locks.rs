use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::prelude::*;

/// Per-chat async mutexes serializing read-modify-write sequences.
#[derive(Default)]
pub struct Locks {
  inner: DashMap<i64, Arc<Mutex<()>>>,
}

impl Locks {
  pub fn new() -> Self {
    Self::default()
  }

  pub async fn lock(&self, chat_id: i64) -> OwnedMutexGuard<()> {
    let mutex = self.inner.entry(chat_id).or_default().clone();
    mutex.lock_owned().await
  }

  /// Drops mutexes nobody holds or waits on.
  pub fn gc(&self) {
    self.inner.retain(|_, mutex| Arc::strong_count(mutex) > 1);
  }

  #[cfg(test)]
  pub fn len(&self) -> usize {
    self.inner.len()
  }
}
