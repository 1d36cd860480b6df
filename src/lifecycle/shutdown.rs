//! Shutdown coordination for the apps.

use tokio::sync::watch;

/// Coordinator for graceful shutdown.
///
/// Provides a watch channel that all long-running tasks can subscribe to. A
/// receiver subscribed after the trigger still sees it.
pub struct Shutdown {
    tx: watch::Sender<bool>,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Get the number of active subscribers (tasks still running).
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_late_subscriber_sees_trigger() {
        let shutdown = Shutdown::new();
        let mut early = shutdown.subscribe();
        assert!(!shutdown.is_triggered());

        shutdown.trigger();
        let mut late = shutdown.subscribe();

        assert!(early.wait_for(|stop| *stop).await.is_ok());
        assert!(late.wait_for(|stop| *stop).await.is_ok());
        assert_eq!(shutdown.receiver_count(), 2);
    }
}
