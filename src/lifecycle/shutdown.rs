//! Programmatic shutdown trigger.

use tokio::sync::broadcast;

/// Broadcasts a single "stop now" to every subscribed server.
///
/// Dropping the coordinator also closes the channel, which subscribers
/// treat the same as a trigger, so keep it alive for as long as the
/// servers should run.
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Receiver to hand to [`HttpServer::run`](crate::http::HttpServer::run).
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Ask every subscriber to stop.
    pub fn trigger(&self) {
        // No subscribers left means nothing is running; that's fine.
        let _ = self.tx.send(());
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
