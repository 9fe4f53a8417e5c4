//! Line-oriented command interface over [`AppController`].

use std::fmt::Write as _;

use netpath_core::graph::{
    ATTR_BANDWIDTH, ATTR_CURRENT_LOAD, ATTR_LATENCY, ATTR_LOAD_RATIO, ATTR_MAX_CAPACITY,
    ATTR_SECURITY, ATTR_SECURITY_LEVEL,
};
use netpath_core::{Error, GraphModel, HopMatch, NodeId, PathResult, Result, WeightVector};
use serde_json::Value;

use crate::controller::{AppController, Outcome, StateSnapshot};

pub const HELP: &str = "\
Commands:
  init                          Initialize the network and show its topology
  nodes                         List nodes with load and security
  edges                         List edges with latency, bandwidth, security
  select <start> <end>          Choose the path endpoints
  weights <latency> <load> <security>
                                Set the scoring weights
  path                          Find a path with the current selection and weights
  resize <width> <height>       Resize the display surface
  state                         Show the current selection, weights and path
  help                          Show this help message
  quit                          Exit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Init,
    Nodes,
    Edges,
    Select(NodeId, NodeId),
    Weights(WeightVector),
    Path,
    Resize(u32, u32),
    State,
    Help,
    Quit,
}

impl Command {
    /// Parse one input line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some((&name, args)) = tokens.split_first() else {
            return Ok(None);
        };

        let command = match (name.to_lowercase().as_str(), args) {
            ("init", []) => Self::Init,
            ("nodes", []) => Self::Nodes,
            ("edges", []) => Self::Edges,
            ("select", [start, end]) => Self::Select(number(start)?, number(end)?),
            ("weights", args) => Self::Weights(WeightVector::parse(args)?),
            ("path" | "find", []) => Self::Path,
            ("resize", [w, h]) => Self::Resize(number(w)?, number(h)?),
            ("state" | "status", []) => Self::State,
            ("help" | "?", _) => Self::Help,
            ("quit" | "exit", _) => Self::Quit,
            (other, _) => {
                return Err(Error::Validation(format!(
                    "unknown command or wrong arguments: '{}' (try 'help')",
                    other
                )))
            }
        };
        Ok(Some(command))
    }
}

fn number<T: std::str::FromStr>(token: &str) -> Result<T> {
    token
        .parse()
        .map_err(|_| Error::Validation(format!("'{}' is not a valid number", token)))
}

/// Run one command and render its textual result.
pub async fn execute(ctrl: &AppController, command: Command) -> Result<String> {
    match command {
        Command::Init => {
            let outcome = ctrl.init_network().await?;
            let snap = ctrl.snapshot();
            Ok(match outcome {
                Outcome::Committed => format!(
                    "Network initialized: {} nodes, {} edges; selected {} -> {}",
                    snap.model.node_count(),
                    snap.model.edge_count(),
                    show_id(snap.start),
                    show_id(snap.end)
                ),
                Outcome::Superseded => "Init superseded by a newer request".into(),
            })
        }
        Command::Nodes => Ok(format_nodes(&ctrl.model())),
        Command::Edges => Ok(format_edges(&ctrl.model())),
        Command::Select(start, end) => {
            ctrl.select(start, end)?;
            Ok(format!("Selected {} -> {}", start, end))
        }
        Command::Weights(weights) => {
            ctrl.set_weights(weights);
            let mut out = format!(
                "Weights: latency={} load={} security={}",
                weights.latency, weights.load, weights.security
            );
            if !weights.validate() {
                out.push_str(" (invalid: weights must be non-negative numbers)");
            }
            Ok(out)
        }
        Command::Path => match ctrl.find_path().await? {
            Outcome::Committed => {
                let snap = ctrl.snapshot();
                Ok(snap
                    .current_path
                    .as_ref()
                    .map(|result| format_path(&snap.model, result))
                    .unwrap_or_default())
            }
            Outcome::Superseded => Ok("Path query superseded by a newer request".into()),
        },
        Command::Resize(width, height) => {
            ctrl.resize(width, height)?;
            Ok(format!("Viewport {}x{}", width, height))
        }
        Command::State => Ok(format_state(&ctrl.snapshot())),
        Command::Help | Command::Quit => Ok(HELP.into()),
    }
}

fn show_id(id: Option<NodeId>) -> String {
    id.map(|i| i.to_string()).unwrap_or_else(|| "-".into())
}

fn show_value(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => "-".into(),
        Some(v) => v.to_string(),
    }
}

/// Node status table: id, load against capacity, security level, load rate.
pub fn format_nodes(model: &GraphModel) -> String {
    if model.is_empty() {
        return "No nodes loaded (run 'init')".into();
    }
    let mut out = format!(
        "{:<8} {:>12} {:>9} {:>8}  {}\n",
        "NodeID", "Load/MaxCap", "Security", "LoadRate", "Level"
    );
    for node in model.nodes() {
        let load = format!(
            "{}/{}",
            show_value(node.attr(ATTR_CURRENT_LOAD)),
            show_value(node.attr(ATTR_MAX_CAPACITY))
        );
        let rate = node
            .attr_f64(ATTR_LOAD_RATIO)
            .map(|r| format!("{:.1}%", r * 100.0))
            .unwrap_or_else(|| "-".into());
        let level = node
            .load_level()
            .map(|l| l.to_string())
            .unwrap_or_else(|| "-".into());
        let _ = writeln!(
            out,
            "{:<8} {:>12} {:>9} {:>8}  {}",
            node.id,
            load,
            show_value(node.attr(ATTR_SECURITY_LEVEL)),
            rate,
            level
        );
    }
    out.trim_end().to_string()
}

pub fn format_edges(model: &GraphModel) -> String {
    if model.edges().is_empty() {
        return "No edges loaded".into();
    }
    let mut out = format!(
        "{:<12} {:>8} {:>10} {:>9}\n",
        "Edge", "Latency", "Bandwidth", "Security"
    );
    for edge in model.edges() {
        let _ = writeln!(
            out,
            "{:<12} {:>8} {:>10} {:>9}",
            format!("{}-{}", edge.u, edge.v),
            show_value(edge.attr(ATTR_LATENCY)),
            show_value(edge.attr(ATTR_BANDWIDTH)),
            show_value(edge.attr(ATTR_SECURITY))
        );
    }
    out.trim_end().to_string()
}

/// Path line plus one row per hop with the edge data the model holds.
pub fn format_path(model: &GraphModel, result: &PathResult) -> String {
    if result.is_empty() {
        return "No path found".into();
    }
    let mut out = format!("Path: {}\nCost: {:.3}", result.describe(), result.cost);
    for hop in model.hops(result) {
        let detail = match (hop.matched, hop.edge) {
            (HopMatch::Missing, _) | (_, None) => "no edge data".to_string(),
            (matched, Some(edge)) => {
                let note = if matched == HopMatch::Reverse {
                    format!(" (reported as {}-{})", edge.u, edge.v)
                } else {
                    String::new()
                };
                format!(
                    "latency={} security={}{}",
                    show_value(edge.attr(ATTR_LATENCY)),
                    show_value(edge.attr(ATTR_SECURITY)),
                    note
                )
            }
        };
        let _ = write!(out, "\n  {} -> {}: {}", hop.from, hop.to, detail);
    }
    out
}

pub fn format_state(snap: &StateSnapshot) -> String {
    let mut out = format!(
        "Phase: {}\nInitialized: {}\nNodes: {}  Edges: {}\nSelection: {} -> {}\nWeights: latency={} load={} security={}",
        snap.phase,
        snap.network_initialized,
        snap.model.node_count(),
        snap.model.edge_count(),
        show_id(snap.start),
        show_id(snap.end),
        snap.weights.latency,
        snap.weights.load,
        snap.weights.security
    );
    match &snap.current_path {
        Some(result) => {
            let _ = write!(out, "\nPath: {} (cost {})", result.describe(), result.cost);
        }
        None => out.push_str("\nPath: -"),
    }
    if let Some(err) = &snap.last_error {
        let _ = write!(out, "\nLast error: {}", err);
    }
    out
}
