//! Background reachability polling.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{Connectivity, ReachabilityProbe};

/// Polls a [`ReachabilityProbe`] on a fixed interval and reports each
/// result to a [`Connectivity`] flag.
pub struct ConnectivityMonitor;

impl ConnectivityMonitor {
    /// Spawn the polling task.
    ///
    /// The first probe runs immediately. The task exits when `cancel`
    /// fires.
    pub fn spawn<P: ReachabilityProbe>(
        probe: P,
        connectivity: Connectivity,
        interval: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                let online = tokio::select! {
                    _ = cancel.cancelled() => break,
                    online = probe.probe() => online,
                };

                if connectivity.report(online) {
                    if online {
                        info!("network reachable");
                    } else {
                        warn!("network unreachable");
                    }
                }

                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
            }
            debug!("connectivity monitor stopped");
        })
    }
}
