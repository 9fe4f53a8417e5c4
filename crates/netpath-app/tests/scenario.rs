//! End-to-end controller scenarios against a mocked backend.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{DynamicImage, ImageFormat, RgbImage};
use netpath_app::{AppController, Outcome, Phase};
use netpath_client::PathQueryClient;
use netpath_core::{ClientConfig, ErrorKind, PathResult, WeightVector};
use netpath_view::{FileSurface, MemorySurface};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const INIT: &str = "/api/network/init";
const STATUS: &str = "/api/network/status";
const VISUALIZATION: &str = "/api/network/visualization";
const FIND_PATH: &str = "/api/network/find_path";

fn png(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::new(width, height));
    let mut buf = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

fn png_base64(width: u32, height: u32) -> String {
    STANDARD.encode(png(width, height))
}

fn controller(server: &MockServer) -> (AppController, MemorySurface) {
    let client =
        PathQueryClient::new(ClientConfig::default().with_base_url(server.uri())).unwrap();
    let surface = MemorySurface::new();
    (AppController::new(client, Box::new(surface.clone())), surface)
}

fn init_ok() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"message": "Network initialized successfully"}))
}

async fn mount_network(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(INIT))
        .respond_with(init_ok())
        .mount(server)
        .await;
    mount_topology(server).await;
}

/// Status and visualization endpoints, without the init endpoint.
async fn mount_topology(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(STATUS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "nodes": {
                "0": {"security_level": 1, "max_capacity": 100, "current_load": 0, "load_ratio": 0.0},
                "1": {"security_level": 3, "max_capacity": 150, "current_load": 0, "load_ratio": 0.0}
            },
            "edges": {
                "0-1": {"latency": 8, "bandwidth": 500, "security": 1}
            }
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(VISUALIZATION))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"image": png_base64(32, 18)})))
        .mount(server)
        .await;
}

async fn requests_to(server: &MockServer, endpoint: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == endpoint)
        .count()
}

#[tokio::test]
async fn test_init_then_find_path() {
    let server = MockServer::start().await;
    mount_network(&server).await;
    Mock::given(method("POST"))
        .and(path(FIND_PATH))
        .and(body_partial_json(json!({
            "start": 0,
            "end": 1,
            "weights": {"latency": 0.4, "load": 0.4, "security": 0.2}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "path": [0, 1],
            "cost": 3.2,
            "image": png_base64(64, 36)
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (ctrl, surface) = controller(&server);
    let mut updates = ctrl.subscribe();

    assert_eq!(ctrl.init_network().await.unwrap(), Outcome::Committed);
    let snap = ctrl.snapshot();
    assert!(snap.network_initialized);
    assert_eq!(snap.phase, Phase::Ready);
    assert_eq!((snap.start, snap.end), (Some(0), Some(1)));
    assert_eq!(snap.model.node_count(), 2);
    assert_eq!(snap.model.edge_count(), 1);
    assert_eq!(surface.bind_count(), 1);
    assert_eq!(surface.frame().unwrap().width(), 32);
    assert!(updates.has_changed().unwrap());
    assert_eq!(updates.borrow_and_update().phase, Phase::Ready);

    assert_eq!(ctrl.find_path().await.unwrap(), Outcome::Committed);
    let snap = ctrl.snapshot();
    assert_eq!(snap.current_path, Some(PathResult::new(vec![0, 1], 3.2)));
    assert_eq!(snap.current_cost(), Some(3.2));
    assert_eq!(snap.phase, Phase::Ready);
    assert_eq!(surface.bind_count(), 2);
    assert_eq!(surface.frame().unwrap().width(), 64);
    assert!(ctrl.frame().unwrap().same_content(&surface.frame().unwrap()));
}

#[tokio::test]
async fn test_invalid_weights_never_reach_backend() {
    let server = MockServer::start().await;
    mount_network(&server).await;
    Mock::given(method("POST"))
        .and(path(FIND_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (ctrl, _) = controller(&server);
    ctrl.init_network().await.unwrap();
    ctrl.set_weights(WeightVector::new(-1.0, 0.5, 0.5));

    let err = ctrl.find_path().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(requests_to(&server, FIND_PATH).await, 0);
    assert_eq!(ctrl.snapshot().phase, Phase::Ready);
}

#[tokio::test]
async fn test_empty_path_replaces_previous_result() {
    let server = MockServer::start().await;
    mount_network(&server).await;
    Mock::given(method("POST"))
        .and(path(FIND_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "path": [0, 1],
            "cost": 3.2,
            "image": png_base64(4, 4)
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(FIND_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "path": [],
            "cost": 0,
            "image": png_base64(6, 6)
        })))
        .mount(&server)
        .await;

    let (ctrl, surface) = controller(&server);
    ctrl.init_network().await.unwrap();
    ctrl.find_path().await.unwrap();
    assert_eq!(ctrl.snapshot().current_path.unwrap().path, vec![0, 1]);

    ctrl.find_path().await.unwrap();
    assert_eq!(ctrl.snapshot().current_path, Some(PathResult::new(vec![], 0.0)));
    assert_eq!(surface.frame().unwrap().width(), 6);
}

#[tokio::test]
async fn test_failed_find_path_keeps_previous_state() {
    let server = MockServer::start().await;
    mount_network(&server).await;
    Mock::given(method("POST"))
        .and(path(FIND_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "path": [0, 1],
            "cost": 3.2,
            "image": png_base64(4, 4)
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(FIND_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "no route"})))
        .mount(&server)
        .await;

    let (ctrl, surface) = controller(&server);
    ctrl.init_network().await.unwrap();
    ctrl.find_path().await.unwrap();
    let before = surface.frame().unwrap();

    let err = ctrl.find_path().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);

    let snap = ctrl.snapshot();
    assert!(snap.network_initialized);
    assert_eq!(snap.phase, Phase::Ready);
    assert_eq!(snap.current_path, Some(PathResult::new(vec![0, 1], 3.2)));
    assert!(snap.last_error.unwrap().contains("no route"));
    assert!(surface.frame().unwrap().same_content(&before));
    assert_eq!(surface.bind_count(), 2);
}

#[tokio::test]
async fn test_malformed_status_aborts_init() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(INIT))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(STATUS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "nodes": {"0": {}, "1": {}},
            "edges": {"abc": {}}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(VISUALIZATION))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"image": png_base64(2, 2)})))
        .expect(0)
        .mount(&server)
        .await;

    let (ctrl, surface) = controller(&server);
    let err = ctrl.init_network().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Protocol);

    let snap = ctrl.snapshot();
    assert!(!snap.network_initialized);
    assert_eq!(snap.phase, Phase::Uninitialized);
    assert!(snap.model.is_empty());
    assert_eq!((snap.start, snap.end), (None, None));
    assert_eq!(surface.bind_count(), 0);
}

#[tokio::test]
async fn test_resize_makes_no_requests() {
    let server = MockServer::start().await;
    mount_network(&server).await;

    let (ctrl, surface) = controller(&server);
    ctrl.init_network().await.unwrap();
    let before = server.received_requests().await.unwrap().len();

    ctrl.resize(1024, 768).unwrap();
    ctrl.resize(640, 480).unwrap();

    assert_eq!(server.received_requests().await.unwrap().len(), before);
    assert_eq!(surface.relayout_count(), 2);
    assert_eq!(surface.bind_count(), 1);
}

#[tokio::test]
async fn test_newer_path_query_wins() {
    let server = MockServer::start().await;
    mount_network(&server).await;
    Mock::given(method("POST"))
        .and(path(FIND_PATH))
        .and(body_partial_json(json!({"start": 0, "end": 1})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"path": [0, 1], "cost": 3.2, "image": png_base64(4, 4)}))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(FIND_PATH))
        .and(body_partial_json(json!({"start": 1, "end": 0})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"path": [1, 0], "cost": 1.5, "image": png_base64(8, 8)})),
        )
        .mount(&server)
        .await;

    let (ctrl, surface) = controller(&server);
    ctrl.init_network().await.unwrap();

    let slow = ctrl.find_path();
    let fast = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        ctrl.select(1, 0).unwrap();
        ctrl.find_path().await
    };
    let (slow, fast) = tokio::join!(slow, fast);

    assert_eq!(slow.unwrap(), Outcome::Superseded);
    assert_eq!(fast.unwrap(), Outcome::Committed);
    assert_eq!(ctrl.snapshot().current_path, Some(PathResult::new(vec![1, 0], 1.5)));
    assert_eq!(surface.frame().unwrap().width(), 8);
}

#[tokio::test]
async fn test_reinit_clears_previous_path() {
    let server = MockServer::start().await;
    mount_network(&server).await;
    Mock::given(method("POST"))
        .and(path(FIND_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "path": [0, 1],
            "cost": 3.2,
            "image": png_base64(4, 4)
        })))
        .mount(&server)
        .await;

    let (ctrl, _) = controller(&server);
    ctrl.init_network().await.unwrap();
    ctrl.select(1, 0).unwrap();
    ctrl.find_path().await.unwrap();

    ctrl.init_network().await.unwrap();
    let snap = ctrl.snapshot();
    assert!(snap.current_path.is_none());
    assert_eq!((snap.start, snap.end), (Some(0), Some(1)));
}

#[tokio::test]
async fn test_file_surface_receives_frames() {
    let server = MockServer::start().await;
    mount_network(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("net.png");
    let client =
        PathQueryClient::new(ClientConfig::default().with_base_url(server.uri())).unwrap();
    let ctrl = AppController::new(client, Box::new(FileSurface::new(&out)));

    ctrl.init_network().await.unwrap();
    assert_eq!(std::fs::read(&out).unwrap(), png(32, 18));
}

#[tokio::test]
async fn test_newer_init_wins() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(INIT))
        .respond_with(init_ok().set_delay(Duration::from_millis(300)))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(INIT))
        .respond_with(init_ok())
        .mount(&server)
        .await;
    mount_topology(&server).await;

    let (ctrl, surface) = controller(&server);
    let slow = ctrl.init_network();
    let fast = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        ctrl.init_network().await
    };
    let (slow, fast) = tokio::join!(slow, fast);

    assert_eq!(slow.unwrap(), Outcome::Superseded);
    assert_eq!(fast.unwrap(), Outcome::Committed);
    let snap = ctrl.snapshot();
    assert_eq!(snap.phase, Phase::Ready);
    assert!(snap.network_initialized);
    assert_eq!(snap.model.node_count(), 2);
    // Only the newer init rendered its frame.
    assert_eq!(surface.bind_count(), 1);
}

#[tokio::test]
async fn test_failed_reinit_drops_in_flight_path_query() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(INIT))
        .respond_with(init_ok())
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(INIT))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"error": "simulation crashed"})),
        )
        .mount(&server)
        .await;
    mount_topology(&server).await;
    Mock::given(method("POST"))
        .and(path(FIND_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"path": [0, 1], "cost": 3.2, "image": png_base64(4, 4)}))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let (ctrl, surface) = controller(&server);
    ctrl.init_network().await.unwrap();

    let query = ctrl.find_path();
    let reinit = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        ctrl.init_network().await
    };
    let (query, reinit) = tokio::join!(query, reinit);

    assert_eq!(query.unwrap(), Outcome::Superseded);
    assert_eq!(reinit.unwrap_err().kind(), ErrorKind::Transport);
    let snap = ctrl.snapshot();
    assert_eq!(snap.phase, Phase::Uninitialized);
    assert!(!snap.network_initialized);
    assert!(snap.model.is_empty());
    assert!(snap.current_path.is_none());
    assert_eq!(surface.bind_count(), 1);
    assert_eq!(surface.frame().unwrap().width(), 32);
}

#[tokio::test]
async fn test_find_path_refused_while_initializing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(INIT))
        .respond_with(init_ok())
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(INIT))
        .respond_with(init_ok().set_delay(Duration::from_millis(300)))
        .mount(&server)
        .await;
    mount_topology(&server).await;
    Mock::given(method("POST"))
        .and(path(FIND_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (ctrl, _) = controller(&server);
    ctrl.init_network().await.unwrap();

    let reinit = ctrl.init_network();
    let query = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        let err = ctrl.find_path().await.unwrap_err();
        (err.kind(), ctrl.snapshot().phase)
    };
    let (reinit, (kind, phase)) = tokio::join!(reinit, query);

    assert_eq!(kind, ErrorKind::Validation);
    assert_eq!(phase, Phase::Initializing);
    assert_eq!(reinit.unwrap(), Outcome::Committed);
    assert_eq!(ctrl.snapshot().phase, Phase::Ready);
}
