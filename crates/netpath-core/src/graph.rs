//! Normalized node/edge model of the backend's network.
//!
//! The backend reports nodes keyed by stringified id and edges keyed by a
//! composite `"<u>-<v>"` string. [`GraphModel::load`] parses both into typed
//! records in one pass and commits only if every key is well formed.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::types::PathResult;

/// Backend-assigned node identifier.
pub type NodeId = u32;

/// Opaque key/value payload attached to nodes and edges.
pub type Attributes = Map<String, Value>;

pub const ATTR_SECURITY_LEVEL: &str = "security_level";
pub const ATTR_MAX_CAPACITY: &str = "max_capacity";
pub const ATTR_CURRENT_LOAD: &str = "current_load";
pub const ATTR_LOAD_RATIO: &str = "load_ratio";
pub const ATTR_LATENCY: &str = "latency";
pub const ATTR_BANDWIDTH: &str = "bandwidth";
pub const ATTR_SECURITY: &str = "security";

/// A vertex of the network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub attrs: Attributes,
}

impl Node {
    pub fn attr(&self, key: &str) -> Option<&Value> {
        self.attrs.get(key)
    }

    pub fn attr_f64(&self, key: &str) -> Option<f64> {
        self.attrs.get(key).and_then(Value::as_f64)
    }

    /// Load bucket from `load_ratio`, if the backend reported one.
    pub fn load_level(&self) -> Option<LoadLevel> {
        self.attr_f64(ATTR_LOAD_RATIO).map(LoadLevel::from_ratio)
    }
}

/// A directed relation `u -> v`, exactly as the backend keyed it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub u: NodeId,
    pub v: NodeId,
    pub attrs: Attributes,
}

impl Edge {
    pub fn attr(&self, key: &str) -> Option<&Value> {
        self.attrs.get(key)
    }

    pub fn attr_f64(&self, key: &str) -> Option<f64> {
        self.attrs.get(key).and_then(Value::as_f64)
    }
}

/// Node load bucket, mirroring the backend legend (green/yellow/red).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadLevel {
    Low,
    Medium,
    High,
}

impl LoadLevel {
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio < 0.4 {
            Self::Low
        } else if ratio < 0.7 {
            Self::Medium
        } else {
            Self::High
        }
    }
}

impl std::fmt::Display for LoadLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// How a path hop lines up with the loaded edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HopMatch {
    /// An edge keyed `"<from>-<to>"` exists.
    Forward,
    /// Only the opposite edge `"<to>-<from>"` exists.
    Reverse,
    /// Neither direction was reported.
    Missing,
}

/// One step of a path, with whatever edge data the model holds for it.
#[derive(Debug, Clone, PartialEq)]
pub struct Hop<'a> {
    pub from: NodeId,
    pub to: NodeId,
    pub matched: HopMatch,
    pub edge: Option<&'a Edge>,
}

/// Current network topology as last reported by the backend.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphModel {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    node_index: HashMap<NodeId, usize>,
    edge_index: HashMap<(NodeId, NodeId), usize>,
}

impl GraphModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a model from raw status maps.
    pub fn from_status(nodes: &Map<String, Value>, edges: &Map<String, Value>) -> Result<Self> {
        let mut model = Self::new();
        model.load(nodes, edges)?;
        Ok(model)
    }

    /// Replace the whole model with the given node and edge maps.
    ///
    /// Nothing is committed unless every node id and edge key parses; on error
    /// the previous contents are left as they were.
    pub fn load(&mut self, nodes: &Map<String, Value>, edges: &Map<String, Value>) -> Result<()> {
        let mut new_nodes = Vec::with_capacity(nodes.len());
        let mut node_index = HashMap::with_capacity(nodes.len());
        for (key, value) in nodes {
            let id = parse_id(key)
                .ok_or_else(|| Error::Protocol(format!("invalid node id '{}'", key)))?;
            let attrs = attributes(value, || format!("node '{}'", key))?;
            if node_index.insert(id, new_nodes.len()).is_some() {
                return Err(Error::Protocol(format!("duplicate node id {}", id)));
            }
            new_nodes.push(Node { id, attrs });
        }

        let mut new_edges = Vec::with_capacity(edges.len());
        let mut edge_index = HashMap::with_capacity(edges.len());
        for (key, value) in edges {
            let (u, v) = parse_edge_key(key)?;
            let attrs = attributes(value, || format!("edge '{}'", key))?;
            if edge_index.insert((u, v), new_edges.len()).is_some() {
                return Err(Error::Protocol(format!("duplicate edge {}-{}", u, v)));
            }
            new_edges.push(Edge { u, v, attrs });
        }

        self.nodes = new_nodes;
        self.edges = new_edges;
        self.node_index = node_index;
        self.edge_index = edge_index;
        Ok(())
    }

    /// Nodes in load order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Edges in load order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.node_index.get(&id).map(|&i| &self.nodes[i])
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node_index.contains_key(&id)
    }

    /// The edge keyed exactly `"<u>-<v>"`; no symmetry is assumed.
    pub fn edge(&self, u: NodeId, v: NodeId) -> Option<&Edge> {
        self.edge_index.get(&(u, v)).map(|&i| &self.edges[i])
    }

    /// Default start/end picks: the first two nodes in load order.
    pub fn default_selection(&self) -> (Option<NodeId>, Option<NodeId>) {
        (
            self.nodes.first().map(|n| n.id),
            self.nodes.get(1).map(|n| n.id),
        )
    }

    /// Pair up consecutive path ids with the edges the model knows about.
    pub fn hops<'a>(&'a self, result: &PathResult) -> Vec<Hop<'a>> {
        result
            .path
            .windows(2)
            .map(|pair| {
                let (from, to) = (pair[0], pair[1]);
                let (matched, edge) = match self.edge(from, to) {
                    Some(e) => (HopMatch::Forward, Some(e)),
                    None => match self.edge(to, from) {
                        Some(e) => (HopMatch::Reverse, Some(e)),
                        None => (HopMatch::Missing, None),
                    },
                };
                Hop {
                    from,
                    to,
                    matched,
                    edge,
                }
            })
            .collect()
    }
}

/// Identifiers are plain non-negative decimal integers; signs are rejected.
fn parse_id(s: &str) -> Option<NodeId> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Split `"<u>-<v>"` on its first `-` into two identifiers.
pub fn parse_edge_key(key: &str) -> Result<(NodeId, NodeId)> {
    let malformed = || Error::Protocol(format!("malformed edge key '{}'", key));
    let (u, v) = key.split_once('-').ok_or_else(malformed)?;
    match (parse_id(u), parse_id(v)) {
        (Some(u), Some(v)) => Ok((u, v)),
        _ => Err(malformed()),
    }
}

fn attributes(value: &Value, what: impl FnOnce() -> String) -> Result<Attributes> {
    match value {
        Value::Object(map) => Ok(map.clone()),
        Value::Null => Ok(Attributes::new()),
        other => Err(Error::Protocol(format!(
            "{} attributes must be an object, got {}",
            what(),
            other
        ))),
    }
}
