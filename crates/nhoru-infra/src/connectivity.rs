//! TCP reachability probe.
//!
//! Reachability is a TCP connect to the completion host within a timeout.
//! Nothing is sent over the connection.

use std::time::Duration;

use tokio::net::TcpStream;

use nhoru_core::connectivity::ReachabilityProbe;
use nhoru_types::config::ConnectivityConfig;

/// [`ReachabilityProbe`] that opens (and immediately drops) a TCP
/// connection.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    host: String,
    port: u16,
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            timeout,
        }
    }

    pub fn target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl From<&ConnectivityConfig> for TcpProbe {
    fn from(config: &ConnectivityConfig) -> Self {
        Self::new(config.probe_host.clone(), config.probe_port, config.probe_timeout())
    }
}

impl ReachabilityProbe for TcpProbe {
    async fn probe(&self) -> bool {
        let connect = TcpStream::connect((self.host.as_str(), self.port));
        match tokio::time::timeout(self.timeout, connect).await {
            Ok(Ok(_stream)) => true,
            Ok(Err(err)) => {
                tracing::debug!(target = %self.target(), error = %err, "reachability probe failed");
                false
            }
            Err(_) => {
                tracing::debug!(target = %self.target(), "reachability probe timed out");
                false
            }
        }
    }
}
