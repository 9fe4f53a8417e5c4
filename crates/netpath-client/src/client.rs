//! Backend API client: init, status, visualization, find-path.

use netpath_core::{
    ClientConfig, Error, ErrorResponse, FindPathRequest, FindPathResponse, GraphModel, NodeId,
    PathResult, Result, StatusResponse, VisualizationFrame, VisualizationResponse, WeightVector,
};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

pub const INIT_PATH: &str = "/api/network/init";
pub const STATUS_PATH: &str = "/api/network/status";
pub const VISUALIZATION_PATH: &str = "/api/network/visualization";
pub const FIND_PATH_PATH: &str = "/api/network/find_path";

/// Everything a successful init sequence produces.
#[derive(Debug, Clone)]
pub struct NetworkSnapshot {
    pub model: GraphModel,
    pub frame: VisualizationFrame,
}

/// A path result together with the frame that highlights it.
#[derive(Debug, Clone)]
pub struct PathReply {
    pub result: PathResult,
    pub frame: VisualizationFrame,
}

/// Thin typed wrapper over the backend's four endpoints.
#[derive(Debug, Clone)]
pub struct PathQueryClient {
    http: Client,
    config: ClientConfig,
}

impl PathQueryClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Run the full init sequence: init, then status, then visualization.
    ///
    /// Any failure aborts the sequence; nothing partial is returned.
    pub async fn init_network(&self) -> Result<NetworkSnapshot> {
        self.send_init().await?;
        let model = self.fetch_status().await?;
        let frame = self.fetch_visualization().await?;
        info!(
            "Network initialized: {} nodes, {} edges",
            model.node_count(),
            model.edge_count()
        );
        Ok(NetworkSnapshot { model, frame })
    }

    /// `POST /api/network/init`. The body is only used as a success signal.
    pub async fn send_init(&self) -> Result<()> {
        let url = self.config.endpoint(INIT_PATH);
        debug!("POST {}", url);
        let response = self
            .http
            .post(&url)
            .send()
            .await
            .map_err(|e| transport(INIT_PATH, e))?;
        check_status(INIT_PATH, response).await?;
        Ok(())
    }

    /// `GET /api/network/status`, normalized into a [`GraphModel`].
    pub async fn fetch_status(&self) -> Result<GraphModel> {
        let status: StatusResponse = self.get_json(STATUS_PATH).await?;
        GraphModel::from_status(&status.nodes, &status.edges)
    }

    /// `GET /api/network/visualization`: the plain topology frame.
    pub async fn fetch_visualization(&self) -> Result<VisualizationFrame> {
        let viz: VisualizationResponse = self.get_json(VISUALIZATION_PATH).await?;
        VisualizationFrame::from_base64(&viz.image)
    }

    /// `POST /api/network/find_path`.
    ///
    /// Invalid weights are rejected before any request is made. `start == end`
    /// is left to the backend.
    pub async fn find_path(
        &self,
        start: NodeId,
        end: NodeId,
        weights: WeightVector,
    ) -> Result<PathReply> {
        weights.check()?;
        let request = FindPathRequest {
            start,
            end,
            weights,
        };
        let body = self.post_body(FIND_PATH_PATH, &request).await?;
        let response =
            FindPathResponse::from_slice(&body).map_err(|e| unexpected(FIND_PATH_PATH, e))?;
        let (result, image) = response.into_parts()?;
        let frame = VisualizationFrame::from_base64(&image)?;
        debug!("Path {} -> {}: {}", start, end, result.describe());
        Ok(PathReply { result, frame })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.config.endpoint(path);
        debug!("GET {}", url);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| transport(path, e))?;
        decode(path, response).await
    }

    async fn post_body<B: Serialize>(&self, path: &str, body: &B) -> Result<Vec<u8>> {
        let url = self.config.endpoint(path);
        debug!("POST {}", url);
        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| transport(path, e))?;
        read_body(path, response).await
    }
}

fn transport(endpoint: &str, e: reqwest::Error) -> Error {
    let message = if e.is_timeout() {
        format!("request timed out: {}", e)
    } else if e.is_connect() {
        format!("backend unreachable: {}", e)
    } else {
        e.to_string()
    };
    Error::transport(endpoint, message)
}

/// Turn non-2xx replies into transport errors, keeping the backend's message.
async fn check_status(endpoint: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorResponse>(&body)
        .map(|e| e.error)
        .unwrap_or(body);
    let message = if detail.trim().is_empty() {
        format!("HTTP {}", status)
    } else {
        format!("HTTP {}: {}", status, detail.trim())
    };
    Err(Error::transport(endpoint, message))
}

async fn read_body(endpoint: &str, response: Response) -> Result<Vec<u8>> {
    let response = check_status(endpoint, response).await?;
    let bytes = response
        .bytes()
        .await
        .map_err(|e| transport(endpoint, e))?;
    Ok(bytes.to_vec())
}

async fn decode<T: DeserializeOwned>(endpoint: &str, response: Response) -> Result<T> {
    let body = read_body(endpoint, response).await?;
    serde_json::from_slice(&body).map_err(|e| unexpected(endpoint, e))
}

fn unexpected(endpoint: &str, e: serde_json::Error) -> Error {
    Error::Protocol(format!("{}: unexpected response body: {}", endpoint, e))
}
