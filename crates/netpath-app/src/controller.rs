//! Application controller: state machine over the backend workflow.
//!
//! ```text
//! Uninitialized -> Initializing -> Ready <-> QueryingPath
//!        ^              |
//!        +--- failure --+
//! ```
//!
//! State changes are published on a `watch` channel; views subscribe instead
//! of being poked directly. Each operation kind carries a generation counter so
//! a reply that arrives after a newer request of the same kind is dropped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use netpath_client::PathQueryClient;
use netpath_core::{
    Error, GraphModel, NodeId, PathResult, Result, Viewport, VisualizationFrame, WeightVector,
};
use netpath_view::{DisplaySurface, VisualizationSync};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Uninitialized,
    Initializing,
    Ready,
    QueryingPath,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::Initializing => write!(f, "initializing"),
            Self::Ready => write!(f, "ready"),
            Self::QueryingPath => write!(f, "querying path"),
        }
    }
}

/// Whether a finished request was applied or lost to a newer one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Committed,
    Superseded,
}

/// Read-only view of the controller, as published to subscribers.
#[derive(Debug, Clone)]
pub struct StateSnapshot {
    pub phase: Phase,
    pub network_initialized: bool,
    pub model: Arc<GraphModel>,
    pub start: Option<NodeId>,
    pub end: Option<NodeId>,
    pub weights: WeightVector,
    pub current_path: Option<PathResult>,
    pub last_error: Option<String>,
}

impl StateSnapshot {
    pub fn current_cost(&self) -> Option<f64> {
        self.current_path.as_ref().map(|p| p.cost)
    }
}

struct AppState {
    phase: Phase,
    network_initialized: bool,
    model: Arc<GraphModel>,
    start: Option<NodeId>,
    end: Option<NodeId>,
    weights: WeightVector,
    current_path: Option<PathResult>,
    last_error: Option<String>,
}

impl AppState {
    fn new(weights: WeightVector) -> Self {
        Self {
            phase: Phase::Uninitialized,
            network_initialized: false,
            model: Arc::new(GraphModel::new()),
            start: None,
            end: None,
            weights,
            current_path: None,
            last_error: None,
        }
    }

    fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            phase: self.phase,
            network_initialized: self.network_initialized,
            model: self.model.clone(),
            start: self.start,
            end: self.end,
            weights: self.weights,
            current_path: self.current_path.clone(),
            last_error: self.last_error.clone(),
        }
    }
}

/// Top-level state holder wiring user commands to the backend client.
///
/// Lock order is always `state` then `sync`; neither is held across `.await`.
pub struct AppController {
    client: PathQueryClient,
    state: RwLock<AppState>,
    sync: Mutex<VisualizationSync>,
    init_generation: AtomicU64,
    path_generation: AtomicU64,
    notify: watch::Sender<StateSnapshot>,
}

impl AppController {
    pub fn new(client: PathQueryClient, surface: Box<dyn DisplaySurface>) -> Self {
        let config = client.config();
        let viewport: Viewport = config.viewport;
        let state = AppState::new(config.default_weights);
        let (notify, _) = watch::channel(state.snapshot());

        Self {
            sync: Mutex::new(VisualizationSync::new(surface, viewport)),
            state: RwLock::new(state),
            client,
            init_generation: AtomicU64::new(0),
            path_generation: AtomicU64::new(0),
            notify,
        }
    }

    // ---------------------------------------------------------------
    // State access
    // ---------------------------------------------------------------

    pub fn snapshot(&self) -> StateSnapshot {
        self.state.read().snapshot()
    }

    /// Receive a fresh snapshot after every state change.
    pub fn subscribe(&self) -> watch::Receiver<StateSnapshot> {
        self.notify.subscribe()
    }

    pub fn model(&self) -> Arc<GraphModel> {
        self.state.read().model.clone()
    }

    /// The frame currently shown on the display surface.
    pub fn frame(&self) -> Option<VisualizationFrame> {
        self.sync.lock().frame().cloned()
    }

    pub fn viewport(&self) -> Viewport {
        self.sync.lock().layout().viewport
    }

    // ---------------------------------------------------------------
    // Commands
    // ---------------------------------------------------------------

    /// Initialize the backend network and load its topology and frame.
    ///
    /// On failure the controller returns to `Uninitialized` with an empty model.
    pub async fn init_network(&self) -> Result<Outcome> {
        let generation = self.init_generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.update(|s| {
            // Any path query still in flight targets the network being replaced,
            // whether or not this init succeeds.
            self.path_generation.fetch_add(1, Ordering::SeqCst);
            s.phase = Phase::Initializing;
            s.last_error = None;
        });

        let reply = self.client.init_network().await;

        let mut state = self.state.write();
        if self.init_generation.load(Ordering::SeqCst) != generation {
            debug!("Discarding init reply from superseded request #{}", generation);
            return Ok(Outcome::Superseded);
        }

        let committed = reply.and_then(|snapshot| {
            self.sync.lock().render(snapshot.frame)?;
            Ok(snapshot.model)
        });

        match committed {
            Ok(model) => {
                let (start, end) = model.default_selection();
                state.model = Arc::new(model);
                state.start = start;
                state.end = end;
                state.current_path = None;
                state.network_initialized = true;
                state.phase = Phase::Ready;
                state.last_error = None;
                info!(
                    "Ready: {} nodes, default selection {:?} -> {:?}",
                    state.model.node_count(),
                    start,
                    end
                );
                self.publish(&state);
                Ok(Outcome::Committed)
            }
            Err(e) => {
                warn!("Network initialization failed: {}", e);
                state.model = Arc::new(GraphModel::new());
                state.start = None;
                state.end = None;
                state.current_path = None;
                state.network_initialized = false;
                state.phase = Phase::Uninitialized;
                state.last_error = Some(format!("Network initialization failed: {}", e));
                self.publish(&state);
                Err(e)
            }
        }
    }

    /// Query a path between the selected nodes with the current weights.
    ///
    /// Selection, initialization and weights are checked before any request;
    /// on failure the previous path and frame stay in place.
    pub async fn find_path(&self) -> Result<Outcome> {
        let (start, end, weights, generation) = {
            let mut state = self.state.write();
            match state.phase {
                Phase::Ready | Phase::QueryingPath => {}
                Phase::Initializing => {
                    return Err(Error::Validation(
                        "network initialization is in progress".into(),
                    ))
                }
                Phase::Uninitialized => {
                    return Err(Error::Validation("network is not initialized".into()))
                }
            }
            if !state.network_initialized {
                return Err(Error::Validation("network is not initialized".into()));
            }
            let (Some(start), Some(end)) = (state.start, state.end) else {
                return Err(Error::Validation("select a start and an end node".into()));
            };
            for id in [start, end] {
                if !state.model.contains(id) {
                    return Err(Error::Validation(format!("node {} is not in the network", id)));
                }
            }
            state.weights.check()?;

            let generation = self.path_generation.fetch_add(1, Ordering::SeqCst) + 1;
            state.phase = Phase::QueryingPath;
            self.publish(&state);
            (start, end, state.weights, generation)
        };

        let reply = self.client.find_path(start, end, weights).await;

        let mut state = self.state.write();
        if self.path_generation.load(Ordering::SeqCst) != generation {
            debug!("Discarding find_path reply from superseded request #{}", generation);
            return Ok(Outcome::Superseded);
        }

        let committed = reply.and_then(|reply| {
            self.sync.lock().render(reply.frame)?;
            Ok(reply.result)
        });

        if state.phase == Phase::QueryingPath {
            state.phase = Phase::Ready;
        }
        match committed {
            Ok(result) => {
                info!("Path {} -> {}: {} (cost {})", start, end, result.describe(), result.cost);
                state.current_path = Some(result);
                state.last_error = None;
                self.publish(&state);
                Ok(Outcome::Committed)
            }
            Err(e) => {
                warn!("Path query failed: {}", e);
                state.last_error = Some(format!("Path query failed: {}", e));
                self.publish(&state);
                Err(e)
            }
        }
    }

    /// Pick start and end nodes. Both must exist in the loaded model.
    pub fn select(&self, start: NodeId, end: NodeId) -> Result<()> {
        let mut state = self.state.write();
        for id in [start, end] {
            if !state.model.contains(id) {
                return Err(Error::Validation(format!("node {} is not in the network", id)));
            }
        }
        state.start = Some(start);
        state.end = Some(end);
        self.publish(&state);
        Ok(())
    }

    /// Store user-entered weights as-is; they are checked when a path is queried.
    pub fn set_weights(&self, weights: WeightVector) {
        self.update(|s| s.weights = weights);
    }

    /// Re-lay-out the shown frame for a new surface size. Never hits the network.
    pub fn resize(&self, width: u32, height: u32) -> Result<()> {
        self.sync.lock().resize(width, height)
    }

    fn update(&self, f: impl FnOnce(&mut AppState)) {
        let mut state = self.state.write();
        f(&mut state);
        self.publish(&state);
    }

    fn publish(&self, state: &AppState) {
        self.notify.send_replace(state.snapshot());
    }
}
