//! Network reachability tracking.
//!
//! [`Connectivity`] is the shared online flag. It is written by the
//! [`ConnectivityMonitor`] (or by tests) and read by the chat dispatcher
//! before every send. Changes are observable through a `watch` receiver.

pub mod monitor;

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;

pub use monitor::ConnectivityMonitor;

/// Checks whether the remote endpoint is reachable right now.
///
/// Implemented in the infrastructure layer (TCP connect) and by scripted
/// fakes in tests.
pub trait ReachabilityProbe: Send + Sync + 'static {
    fn probe(&self) -> impl Future<Output = bool> + Send;
}

/// Shared, observable online/offline flag.
#[derive(Debug, Clone)]
pub struct Connectivity {
    state: Arc<watch::Sender<bool>>,
}

impl Connectivity {
    pub fn new(online: bool) -> Self {
        let (tx, _rx) = watch::channel(online);
        Self {
            state: Arc::new(tx),
        }
    }

    /// Record the latest reachability result.
    ///
    /// Returns `true` if this changed the flag. Reporting the current value
    /// again does not wake subscribers.
    pub fn report(&self, online: bool) -> bool {
        self.state.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        })
    }

    pub fn is_online(&self) -> bool {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.state.subscribe()
    }
}

impl Default for Connectivity {
    /// Assume online until the first probe says otherwise.
    fn default() -> Self {
        Self::new(true)
    }
}
