//! Reachability probing for hosts without a native network-state API.

use async_trait::async_trait;
use log::debug;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

use super::ConnectivityMonitor;

/// Something that can tell whether the remote side is reachable right now.
#[async_trait]
pub trait ReachabilityProbe: Send + Sync {
    async fn is_reachable(&self) -> bool;
}

/// Considers the network up when a TCP connection to `address` succeeds.
#[derive(Clone, Debug)]
pub struct TcpProbe {
    address: SocketAddr,
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(address: SocketAddr, timeout: Duration) -> Self {
        Self { address, timeout }
    }

    pub fn address(&self) -> SocketAddr {
        self.address
    }
}

#[async_trait]
impl ReachabilityProbe for TcpProbe {
    async fn is_reachable(&self) -> bool {
        match tokio::time::timeout(self.timeout, TcpStream::connect(self.address)).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                debug!("Probe {} failed: {e}", self.address);
                false
            }
            Err(_) => {
                debug!("Probe {} timed out after {:?}", self.address, self.timeout);
                false
            }
        }
    }
}

/// Polls `probe` every `interval` and feeds the result into `monitor`.
pub fn spawn_polling<P>(monitor: Arc<ConnectivityMonitor>, probe: P, interval: Duration) -> JoinHandle<()>
where
    P: ReachabilityProbe + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let reachable = probe.is_reachable().await;
            monitor.set_online(reachable);
        }
    })
}
