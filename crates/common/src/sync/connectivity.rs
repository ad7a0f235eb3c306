//! Connectivity signal
//!
//! The host application owns the notion of "is the network reachable" and
//! pushes it in through [`NetworkMonitor::set_online`]. Interested parties
//! (the offline queue, UI badges) subscribe to transitions through a
//! `tokio::sync::watch` channel, which always carries the latest value and
//! coalesces bursts of flapping.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

/// Shared, cloneable connectivity flag
#[derive(Debug, Clone)]
pub struct NetworkMonitor {
    sender: Arc<watch::Sender<bool>>,
}

impl NetworkMonitor {
    /// Create a monitor with the given initial reachability
    pub fn new(initially_online: bool) -> Self {
        let (sender, _) = watch::channel(initially_online);
        Self { sender: Arc::new(sender) }
    }

    /// Monitor that starts online
    pub fn online() -> Self {
        Self::new(true)
    }

    /// Monitor that starts offline
    pub fn offline() -> Self {
        Self::new(false)
    }

    pub fn is_online(&self) -> bool {
        *self.sender.borrow()
    }

    /// Report reachability. Subscribers are only woken when the value
    /// actually changes.
    pub fn set_online(&self, online: bool) {
        let changed = self.sender.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });

        if changed {
            if online {
                info!("Network connectivity restored");
            } else {
                info!("Network connectivity lost");
            }
        }
    }

    /// Receiver that observes every subsequent change
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.sender.subscribe()
    }
}

impl Default for NetworkMonitor {
    fn default() -> Self {
        Self::online()
    }
}
