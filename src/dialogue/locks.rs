//! Per-conversation serialisation

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Registry of one async mutex per conversation id
///
/// Turns of the same conversation run one at a time; different
/// conversations never wait on each other.
#[derive(Default)]
pub struct ConversationLocks {
    inner: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl ConversationLocks {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `conversation_id`
    pub async fn acquire(&self, conversation_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = match self.inner.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            // Drop entries nobody holds or waits on.
            map.retain(|_, l| Arc::strong_count(l) > 1);
            Arc::clone(map.entry(conversation_id.to_string()).or_default())
        };
        lock.lock_owned().await
    }

    /// Number of conversations currently tracked
    pub fn len(&self) -> usize {
        self.inner.lock().map(|m| m.len()).unwrap_or(0)
    }

    /// True when no conversation is tracked
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
