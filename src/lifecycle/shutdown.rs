//! Process-wide stop signal for the server and its helpers.

use tokio::sync::broadcast;

use crate::lifecycle::signals::wait_for_signal;

/// Fan-out stop flag. Clones share the channel; each receiver from
/// [`Shutdown::subscribe`] sees one `()` once stop is requested.
#[derive(Clone)]
pub struct Shutdown {
    stop: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (stop, _) = broadcast::channel(1);
        Self { stop }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.stop.subscribe()
    }

    /// Request stop. A no-op when nobody is listening.
    pub fn trigger(&self) {
        let _ = self.stop.send(());
    }

    /// Spawn a task that requests stop on the first SIGINT/SIGTERM.
    pub fn trigger_on_signal(&self) -> tokio::task::JoinHandle<()> {
        let shutdown = self.clone();
        tokio::spawn(async move {
            wait_for_signal().await;
            shutdown.trigger();
        })
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
