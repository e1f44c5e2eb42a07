//! Stop signal shared by the listener and the reload task.

use std::future::Future;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Fans one stop signal out to the HTTP listener and the route reload task.
///
/// Clones share the same channel, so any clone can fire it.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Receiver for `http::serve` or `http::server::apply_reloads`.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Fire the signal. Returns how many receivers were notified.
    pub fn trigger(&self) -> usize {
        let notified = self.tx.send(()).unwrap_or(0);
        tracing::info!(tasks = notified, "Stopping listener and route reloads");
        notified
    }

    /// Fire the signal once `signal` resolves, e.g. `signals::shutdown_signal()`.
    pub fn trigger_on<F>(&self, signal: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let this = self.clone();
        tokio::spawn(async move {
            signal.await;
            this.trigger();
        })
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
    async fn test_trigger_reaches_listener_and_reloads() {
        let shutdown = Shutdown::new();
        let mut listener = shutdown.subscribe();
        let mut reloads = shutdown.clone().subscribe();

        assert_eq!(shutdown.trigger(), 2);
        assert!(listener.recv().await.is_ok());
        assert!(reloads.recv().await.is_ok());
    }

    #[tokio::test]
    async fn test_trigger_without_receivers() {
        assert_eq!(Shutdown::new().trigger(), 0);
    }

    #[tokio::test]
    async fn test_trigger_on_waits_for_signal() {
        let shutdown = Shutdown::new();
        let mut rx = shutdown.subscribe();
        let (fire, fired) = tokio::sync::oneshot::channel::<()>();

        let task = shutdown.trigger_on(async move {
            let _ = fired.await;
        });
        assert!(rx.try_recv().is_err());

        fire.send(()).unwrap();
        task.await.unwrap();
        assert!(rx.recv().await.is_ok());
    }
}
