//! Axum HTTP/WebSocket surface (C8, C9): the pull endpoint, the duplex
//! stream, the one-shot server-push fallback, and the control endpoints.
//!
//! The duplex handler mirrors the teacher's `uwb-simulator::main::ws_handler`
//! / `handle_ws` pair — a `tokio::select!` loop relaying a channel-fed
//! receiver alongside inbound client frames — rather than `socketioxide`,
//! since the wire contract (spec §6) is bare JSON documents, one per frame.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::broadcast;
use tracing::{info, warn};

use traffic_sim::Engine;
use traffic_types::SimError;

use crate::control::{self, CreatePlatformSpec, PlatformPatch};
use crate::fanout::Fanout;
use crate::multicast::MulticastCounters;

#[derive(Clone)]
pub struct MulticastConfig {
    pub enabled: bool,
    pub group: String,
    pub port: u16,
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub fanout: Fanout,
    pub multicast_counters: Option<Arc<MulticastCounters>>,
    pub multicast_config: MulticastConfig,
}

/// Maps a [`SimError`] onto an HTTP status and the `{error:{code,message}}`
/// envelope (spec §6). Local newtype: `SimError` lives in `traffic-types`,
/// `IntoResponse` in `axum` — the orphan rule forbids implementing one for
/// the other directly.
pub struct ApiError(SimError);

impl From<SimError> for ApiError {
    fn from(err: SimError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self.0 {
            SimError::ConfigInvalid { .. } => (StatusCode::BAD_REQUEST, "CONFIG_INVALID"),
            SimError::UnknownVariant { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "UNKNOWN_VARIANT"),
            SimError::InvalidDestination { .. } => (StatusCode::BAD_REQUEST, "INVALID_DESTINATION"),
            SimError::RegistryNotFound { .. } => (StatusCode::NOT_FOUND, "REGISTRY_NOT_FOUND"),
            SimError::OutOfRange { .. } => (StatusCode::BAD_REQUEST, "OUT_OF_RANGE"),
            SimError::TransportTransient(_) => (StatusCode::SERVICE_UNAVAILABLE, "TRANSPORT_TRANSIENT"),
            SimError::TransportFatal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "TRANSPORT_FATAL"),
            SimError::ShutdownRequested => (StatusCode::SERVICE_UNAVAILABLE, "SHUTDOWN_REQUESTED"),
        };
        let body = Json(json!({ "error": { "code": code, "message": self.0.to_string() } }));
        (status, body).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/platforms", get(list_platforms).post(create_platform))
        .route(
            "/platforms/:id",
            get(get_platform).patch(update_platform).delete(delete_platform),
        )
        .route("/simulation/status", get(simulation_status))
        .route("/simulation/start", post(start_simulation))
        .route("/simulation/stop", post(stop_simulation))
        .route("/simulation/reset", post(reset_simulation))
        .route("/simulation/speed", post(set_speed))
        .route("/multicast/status", get(multicast_status))
        .route("/stream", get(stream_handler))
        .route("/events", get(events_fallback))
        .with_state(state)
}

async fn health() -> &'static str {
    "trafficsim ok"
}

async fn list_platforms(State(state): State<AppState>) -> impl IntoResponse {
    Json(control::list_platforms(&state.engine).await)
}

async fn get_platform(State(state): State<AppState>, Path(id): Path<String>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(control::get_platform(&state.engine, &id).await?))
}

async fn create_platform(
    State(state): State<AppState>,
    Json(spec): Json<CreatePlatformSpec>,
) -> Result<impl IntoResponse, ApiError> {
    let id = control::create_platform(&state.engine, spec).await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

async fn update_platform(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<PlatformPatch>,
) -> Result<impl IntoResponse, ApiError> {
    control::update_platform(&state.engine, &id, patch).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_platform(State(state): State<AppState>, Path(id): Path<String>) -> Result<impl IntoResponse, ApiError> {
    control::delete_platform(&state.engine, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn simulation_status(State(state): State<AppState>) -> impl IntoResponse {
    Json(control::simulation_status(&state.engine).await)
}

async fn start_simulation(State(state): State<AppState>) -> impl IntoResponse {
    control::start_simulation(&state.engine).await;
    StatusCode::NO_CONTENT
}

async fn stop_simulation(State(state): State<AppState>) -> impl IntoResponse {
    control::stop_simulation(&state.engine).await;
    StatusCode::NO_CONTENT
}

async fn reset_simulation(State(state): State<AppState>) -> impl IntoResponse {
    control::reset_simulation(&state.engine).await;
    StatusCode::NO_CONTENT
}

#[derive(Debug, Deserialize)]
struct SpeedBody {
    k: f64,
}

async fn set_speed(State(state): State<AppState>, Json(body): Json<SpeedBody>) -> Result<impl IntoResponse, ApiError> {
    control::set_speed(&state.engine, body.k).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn multicast_status(State(state): State<AppState>) -> impl IntoResponse {
    let status = control::multicast_status(
        state.multicast_config.enabled,
        &state.multicast_config.group,
        state.multicast_config.port,
        state.multicast_counters.as_deref(),
    )
    .await;
    Json(status)
}

/// One-shot server-push fallback (spec §4.8, §9 Design Notes). Negotiating a
/// genuinely progressive `text/event-stream` response needs a streaming body
/// type this deployment's dependency stack doesn't carry; per the spec this
/// degrades to a single JSON array of the current snapshot with an
/// event-stream-flavoured content type. This is a documented fallback, not a
/// guarantee of progressive delivery.
async fn events_fallback(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.engine.snapshot().await;
    (
        [(header::CONTENT_TYPE, "application/json")],
        Json(snapshot),
    )
}

async fn stream_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_stream(socket, state))
}

async fn handle_stream(mut socket: WebSocket, state: AppState) {
    let mut subscription = state.fanout.register().await;
    info!(subscriber_id = subscription.id, "visualisation subscriber connected");

    let initial = state.engine.snapshot().await;
    let frame = json!({ "type": "platform_update", "platforms": initial });
    if socket.send(Message::Text(frame.to_string())).await.is_err() {
        state.fanout.unregister(subscription.id).await;
        return;
    }

    loop {
        tokio::select! {
            frame = subscription.rx.recv() => {
                match frame {
                    Some(value) => {
                        if socket.send(Message::Text(value.to_string())).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        warn!(subscriber_id = subscription.id, error = %err, "stream recv error");
                        break;
                    }
                }
            }
        }
    }

    state.fanout.unregister(subscription.id).await;
    info!(subscriber_id = subscription.id, "visualisation subscriber disconnected");
}

/// Forwards each completed engine tick to every duplex subscriber as a
/// `platform_update` frame. The engine tick itself only ever enqueues
/// (non-blocking); this task is the drain side for the broadcast fan-in.
pub async fn run_tick_pump(engine: Arc<Engine>, fanout: Fanout, tick_counter: Arc<AtomicU64>) {
    let mut rx = engine.subscribe_ticks();
    loop {
        match rx.recv().await {
            Ok(platforms) => {
                tick_counter.fetch_add(1, Ordering::Relaxed);
                let frame = json!({ "type": "platform_update", "platforms": platforms });
                fanout.broadcast(frame).await;
            }
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Emits a `simulation_metrics` frame every second: ticks observed in the
/// last second stand in for `fps`, alongside live platform count and sim
/// time (spec §4.8, §6 wire format).
pub async fn run_metrics_pump(engine: Arc<Engine>, fanout: Fanout, tick_counter: Arc<AtomicU64>) {
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    loop {
        ticker.tick().await;
        let fps = tick_counter.swap(0, Ordering::Relaxed);
        let status = engine.status().await;
        let frame = json!({
            "type": "simulation_metrics",
            "metrics": {
                "fps": fps,
                "platforms": status.platform_count,
                "sim_time": status.sim_time,
            }
        });
        fanout.broadcast(frame).await;
    }
}
