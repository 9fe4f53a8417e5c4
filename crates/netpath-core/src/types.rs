//! Path results and the JSON bodies exchanged with the backend.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::graph::NodeId;
use crate::weights::WeightVector;

/// Outcome of a path query. An empty path means "no route".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathResult {
    pub path: Vec<NodeId>,
    pub cost: f64,
}

impl PathResult {
    pub fn new(path: Vec<NodeId>, cost: f64) -> Self {
        Self { path, cost }
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    /// `0 → 4 → 7` style rendering for status lines.
    pub fn describe(&self) -> String {
        if self.path.is_empty() {
            return "(no path)".into();
        }
        self.path
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(" → ")
    }
}

/// `GET /api/network/status`
#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    pub nodes: Map<String, Value>,
    pub edges: Map<String, Value>,
}

/// `GET /api/network/visualization`
#[derive(Debug, Clone, Deserialize)]
pub struct VisualizationResponse {
    pub image: String,
}

/// `POST /api/network/find_path` request body.
#[derive(Debug, Clone, Serialize)]
pub struct FindPathRequest {
    pub start: NodeId,
    pub end: NodeId,
    pub weights: WeightVector,
}

/// `POST /api/network/find_path` response body.
///
/// The backend sends `path: null` when the target is unreachable.
#[derive(Debug, Clone, Deserialize)]
pub struct FindPathResponse {
    #[serde(default)]
    pub path: Option<Vec<NodeId>>,
    #[serde(default)]
    pub cost: Option<f64>,
    pub image: String,
}

impl FindPathResponse {
    /// Parse a reply body.
    ///
    /// The backend writes an unreachable target's cost as a bare `Infinity`,
    /// which strict JSON rejects. Non-finite literals outside strings are read
    /// as `null` on a second attempt.
    pub fn from_slice(body: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(body).or_else(|err| match std::str::from_utf8(body) {
            Ok(text) => serde_json::from_str(&null_non_finite(text)).map_err(|_| err),
            Err(_) => Err(err),
        })
    }

    /// Split into the path result and the still-encoded image.
    pub fn into_parts(self) -> Result<(PathResult, String)> {
        let path = self.path.unwrap_or_default();
        let cost = match self.cost {
            Some(c) => c,
            None if path.is_empty() => f64::INFINITY,
            None => {
                return Err(Error::Protocol(
                    "find_path response has a path but no cost".into(),
                ))
            }
        };
        Ok((PathResult::new(path, cost), self.image))
    }
}

const NON_FINITE: [&str; 3] = ["-Infinity", "Infinity", "NaN"];

fn null_non_finite(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut i = 0;
    while i < text.len() {
        let rest = &text[i..];
        if !in_string {
            if let Some(token) = NON_FINITE.iter().find(|t| rest.starts_with(**t)) {
                out.push_str("null");
                i += token.len();
                continue;
            }
        }
        let Some(c) = rest.chars().next() else {
            break;
        };
        if escaped {
            escaped = false;
        } else if in_string && c == '\\' {
            escaped = true;
        } else if c == '"' {
            in_string = !in_string;
        }
        out.push(c);
        i += c.len_utf8();
    }
    out
}

/// Body of a non-2xx backend reply.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
