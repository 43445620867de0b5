//! Process-wide running flag

use std::sync::Arc;
use tokio::sync::watch;

/// Cooperative shutdown signal shared by the interaction loop and the
/// scheduler. Cloning yields another handle to the same flag.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(true);
        Self { tx: Arc::new(tx) }
    }

    /// Whether the session is still running
    pub fn is_running(&self) -> bool {
        *self.tx.borrow()
    }

    /// Clear the running flag. Idempotent.
    pub fn trigger(&self) {
        self.tx.send_replace(false);
    }

    /// Resolve once the running flag has been cleared
    pub async fn triggered(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as self, so the channel cannot close here
        let _ = rx.wait_for(|running| !running).await;
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
