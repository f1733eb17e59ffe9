//! Multicast publisher: periodically emits CoT datagrams for the current
//! engine snapshot to an IP multicast group.
//!
//! Grounded on the teacher's `UdpTransmitter` (`uwb-simulator/udp_tx.rs`):
//! one connected socket, best-effort sends, failures logged and counted but
//! never propagated back into the tick.

use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use traffic_sim::Engine;

pub const DEFAULT_MULTICAST_ADDR: &str = "239.2.3.1";
pub const DEFAULT_MULTICAST_PORT: u16 = 6969;
pub const DEFAULT_PUBLISH_PERIOD: Duration = Duration::from_secs(5);

#[derive(Debug, Default)]
pub struct MulticastCounters {
    pub sent_frames: AtomicU64,
    pub errors: AtomicU64,
}

pub struct MulticastPublisher {
    socket: UdpSocket,
    group: SocketAddr,
    period: Duration,
    pub counters: Arc<MulticastCounters>,
}

impl MulticastPublisher {
    pub fn bind(group_addr: &str, group_port: u16, period: Duration) -> std::io::Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.set_nonblocking(false)?;
        let group: SocketAddr = format!("{group_addr}:{group_port}").parse().map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, format!("bad multicast address: {e}"))
        })?;
        Ok(Self { socket, group, period, counters: Arc::new(MulticastCounters::default()) })
    }

    /// Run until `cancel` fires. On each tick, snapshot the engine,
    /// translate every platform through the CoT serializer, and write one
    /// datagram per platform.
    pub async fn run(self, engine: Arc<Engine>, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.period);
        info!(group = %self.group, "multicast publisher started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let snapshots = engine.snapshot().await;
            let now = chrono::Utc::now();
            for snapshot in &snapshots {
                let datagram = traffic_sim::cot::serialize(snapshot, now);
                match self.socket.send_to(&datagram, self.group) {
                    Ok(_) => {
                        self.counters.sent_frames.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(err) => {
                        self.counters.errors.fetch_add(1, Ordering::Relaxed);
                        warn!(error = %err, "multicast send failed");
                    }
                }
            }
        }

        info!("multicast publisher stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration as StdDuration;
    use traffic_sim::clock::FixedClock;
    use traffic_types::{Platform, PlatformTypeDefinition, PlatformVariant, Position};

    /// Drives one publish tick against a loopback receiver and checks the
    /// datagram that lands on the wire is a well-formed CoT event carrying
    /// the snapshot's own identity and position. Loopback unicast stands in
    /// for a real multicast group, since this sandbox has no
    /// multicast-capable interface.
    #[tokio::test]
    async fn publishes_a_well_formed_cot_datagram_per_tick() {
        let receiver = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
        receiver.set_read_timeout(Some(StdDuration::from_secs(2))).unwrap();
        let receiver_addr = receiver.local_addr().unwrap();

        let engine = Engine::new(Arc::new(FixedClock::at(chrono::Utc::now())), StdDuration::from_millis(10));
        engine
            .insert_platform(Platform::new(
                "AA1234".into(),
                "AA1234".into(),
                "AAL1234".into(),
                Arc::new(PlatformTypeDefinition::default()),
                PlatformVariant::Airborne,
                Position::new(40.7128, -74.006, 10000.0),
                chrono::Utc::now(),
            ))
            .await;

        let publisher = MulticastPublisher::bind(
            &receiver_addr.ip().to_string(),
            receiver_addr.port(),
            StdDuration::from_millis(20),
        )
        .unwrap();
        let cancel = CancellationToken::new();
        let run_cancel = cancel.clone();
        let handle = tokio::spawn(publisher.run(Arc::clone(&engine), run_cancel));

        let datagram = tokio::task::spawn_blocking(move || {
            let mut buf = [0u8; 2048];
            let n = receiver.recv(&mut buf).expect("expected a CoT datagram within the read timeout");
            String::from_utf8(buf[..n].to_vec()).unwrap()
        })
        .await
        .unwrap();

        assert!(datagram.starts_with("<?xml"));
        assert!(datagram.contains("uid=\"TRAFFICSIM-AA1234\""));
        assert!(datagram.contains("lat=\"40.7128\""));
        assert!(datagram.contains("callsign=\"AAL1234\""));

        cancel.cancel();
        let _ = handle.await;
    }
}
