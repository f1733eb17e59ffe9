//! The tick loop: owns the platform registry and drives C3's `advance` at a
//! configurable interval and time-scale.
//!
//! The registry sits behind one `tokio::sync::RwLock`, exactly as the
//! teacher guards its shared race/procedure state behind `Arc<RwLock<_>>` —
//! the tick worker takes it exclusively for the advance phase, the control
//! surface takes it exclusively for mutation, and snapshots take it shared.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use traffic_types::{Platform, PlatformId, PlatformSnapshot, Position, SimError, SimResult};

use crate::behaviour;
use crate::clock::SimClock;
use crate::scenario::ScenarioDocument;

/// Upper bound on a single tick's simulated `Δt`, seconds. Bounds the step
/// size under scheduler jitter or a missed tick.
pub const MAX_TICK_DT_SECS: f64 = 5.0;

/// Default wall-clock tick period (unscaled).
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(1);

/// Timeout for a cooperative `stop()` to observe the in-flight tick finish.
const STOP_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineStatus {
    pub running: bool,
    pub sim_time: f64,
    pub platform_count: usize,
    pub time_scale: f64,
}

struct RunState {
    running: bool,
    time_scale: f64,
    sim_time: f64,
    last_tick: Instant,
    handle: Option<JoinHandle<()>>,
    cancel: Option<CancellationToken>,
}

impl RunState {
    fn new() -> Self {
        Self {
            running: false,
            time_scale: 1.0,
            sim_time: 0.0,
            last_tick: Instant::now(),
            handle: None,
            cancel: None,
        }
    }
}

pub struct Engine {
    registry: Arc<RwLock<HashMap<PlatformId, Platform>>>,
    scenario: Arc<RwLock<Option<ScenarioDocument>>>,
    clock: Arc<dyn SimClock>,
    tick_period: Duration,
    state: RwLock<RunState>,
    tick_tx: broadcast::Sender<Vec<PlatformSnapshot>>,
}

impl Engine {
    pub fn new(clock: Arc<dyn SimClock>, tick_period: Duration) -> Arc<Self> {
        let (tick_tx, _) = broadcast::channel(4);
        Arc::new(Self {
            registry: Arc::new(RwLock::new(HashMap::new())),
            scenario: Arc::new(RwLock::new(None)),
            clock,
            tick_period,
            state: RwLock::new(RunState::new()),
            tick_tx,
        })
    }

    /// A fresh receiver fed one `Vec<PlatformSnapshot>` per completed tick.
    pub fn subscribe_ticks(&self) -> broadcast::Receiver<Vec<PlatformSnapshot>> {
        self.tick_tx.subscribe()
    }

    /// Begin the tick loop in the background. Idempotent while running.
    pub async fn start(self: &Arc<Self>) {
        let mut state = self.state.write().await;
        if state.running {
            return;
        }

        let cancel = CancellationToken::new();
        state.last_tick = Instant::now();
        state.running = true;
        state.cancel = Some(cancel.clone());

        let engine = Arc::clone(self);
        state.handle = Some(tokio::spawn(async move {
            engine.run_tick_loop(cancel).await;
        }));

        info!("engine started (tick period {:?})", self.tick_period);
    }

    /// Request graceful termination and wait (bounded) for the in-flight
    /// tick to complete.
    pub async fn stop(self: &Arc<Self>) {
        let (cancel, handle) = {
            let mut state = self.state.write().await;
            if !state.running {
                return;
            }
            state.running = false;
            (state.cancel.take(), state.handle.take())
        };

        if let Some(cancel) = cancel {
            cancel.cancel();
        }
        if let Some(handle) = handle {
            if tokio::time::timeout(STOP_DRAIN_TIMEOUT, handle).await.is_err() {
                warn!("engine stop: tick worker did not drain within {:?}", STOP_DRAIN_TIMEOUT);
            }
        }
        info!("engine stopped");
    }

    /// Stop, clear the registry, and reload the scenario last passed to
    /// `load_scenario`.
    pub async fn reset(self: &Arc<Self>) {
        self.stop().await;

        let doc = self.scenario.read().await.clone();
        let mut registry = self.registry.write().await;
        registry.clear();
        if let Some(doc) = doc {
            for platform in crate::scenario::instantiate(&doc, self.clock.now()) {
                registry.insert(platform.id.clone(), platform);
            }
        }
        drop(registry);

        let mut state = self.state.write().await;
        state.sim_time = 0.0;
        state.last_tick = Instant::now();
    }

    /// Replace the registry's contents atomically with a freshly
    /// instantiated population, remembering the document for `reset()`.
    pub async fn load_scenario(&self, doc: ScenarioDocument) {
        let platforms = crate::scenario::instantiate(&doc, self.clock.now());
        let mut registry = self.registry.write().await;
        registry.clear();
        for platform in platforms {
            registry.insert(platform.id.clone(), platform);
        }
        drop(registry);
        *self.scenario.write().await = Some(doc);
    }

    /// Point-in-time deep copy of every platform's state.
    pub async fn snapshot(&self) -> Vec<PlatformSnapshot> {
        let registry = self.registry.read().await;
        registry.values().map(Platform::snapshot).collect()
    }

    pub async fn get_snapshot(&self, id: &str) -> Option<PlatformSnapshot> {
        self.registry.read().await.get(id).map(Platform::snapshot)
    }

    pub async fn insert_platform(&self, platform: Platform) {
        self.registry.write().await.insert(platform.id.clone(), platform);
    }

    pub async fn remove_platform(&self, id: &str) -> Option<Platform> {
        self.registry.write().await.remove(id)
    }

    pub async fn contains_platform(&self, id: &str) -> bool {
        self.registry.read().await.contains_key(id)
    }

    /// Apply an arbitrary mutation to one platform under the registry's
    /// exclusive lock — the same lock the tick worker uses, so control
    /// mutations and tick advances never interleave.
    pub async fn mutate_platform<F>(&self, id: &str, f: F) -> SimResult<()>
    where
        F: FnOnce(&mut Platform),
    {
        let mut registry = self.registry.write().await;
        let platform = registry
            .get_mut(id)
            .ok_or_else(|| SimError::RegistryNotFound { id: id.to_string() })?;
        f(platform);
        Ok(())
    }

    pub async fn set_destination(&self, id: &str, destination: Option<Position>) -> SimResult<()> {
        let mut registry = self.registry.write().await;
        let platform = registry
            .get_mut(id)
            .ok_or_else(|| SimError::RegistryNotFound { id: id.to_string() })?;
        platform.set_destination(destination)
    }

    /// `k ∈ (0, 10]` scales wall-to-sim time.
    pub async fn set_time_scale(&self, k: f64) -> SimResult<()> {
        if !(k.is_finite() && k > 0.0 && k <= 10.0) {
            return Err(SimError::OutOfRange {
                message: format!("time scale {k} outside (0, 10]"),
            });
        }
        self.state.write().await.time_scale = k;
        Ok(())
    }

    pub async fn simulation_time(&self) -> f64 {
        self.state.read().await.sim_time
    }

    pub async fn status(&self) -> EngineStatus {
        let state = self.state.read().await;
        let platform_count = self.registry.read().await.len();
        EngineStatus {
            running: state.running,
            sim_time: state.sim_time,
            platform_count,
            time_scale: state.time_scale,
        }
    }

    async fn run_tick_loop(self: Arc<Self>, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.tick_period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let now_instant = Instant::now();
            let now_utc = self.clock.now();

            let dt_sim = {
                let mut state = self.state.write().await;
                let elapsed = now_instant.duration_since(state.last_tick).as_secs_f64();
                let dt = (elapsed * state.time_scale).min(MAX_TICK_DT_SECS).max(0.0);
                state.last_tick = now_instant;
                state.sim_time += dt;
                dt
            };

            let snapshots = {
                let mut registry = self.registry.write().await;
                for platform in registry.values_mut() {
                    if let Err(err) = behaviour::advance(platform, dt_sim, now_utc) {
                        warn!(platform_id = %platform.id, error = %err, "advance failed");
                    }
                }
                registry.values().map(Platform::snapshot).collect::<Vec<_>>()
            };

            let _ = self.tick_tx.send(snapshots);
        }
    }
}
