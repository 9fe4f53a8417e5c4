//! Netpath Core — graph model, weight vector, path results, configuration.

pub mod config;
pub mod error;
pub mod frame;
pub mod graph;
pub mod types;
pub mod weights;

pub use config::{ClientConfig, Viewport};
pub use error::{Error, ErrorKind, Result};
pub use frame::VisualizationFrame;
pub use graph::{Attributes, Edge, GraphModel, Hop, HopMatch, LoadLevel, Node, NodeId};
pub use types::{ErrorResponse, FindPathRequest, FindPathResponse, PathResult, StatusResponse, VisualizationResponse};
pub use weights::WeightVector;
