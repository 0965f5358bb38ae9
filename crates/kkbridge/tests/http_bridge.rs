#![cfg(feature = "server")]

use std::net::{Ipv4Addr, SocketAddr, UdpSocket};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use kkbridge::frame::{build_message, DEBUG_LINK_DECISION, FRAME_SIZE, PING};
use kkbridge::link::{Bridge, LinkConfig};
use kkbridge::server::{self, AppState};
use reqwest::StatusCode;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Running bridge; dropping it shuts the server down.
struct TestBridge {
    base: String,
    _shutdown: oneshot::Sender<()>,
}

impl TestBridge {
    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }
}

async fn start_bridge(device: SocketAddr, debug: SocketAddr, read_timeout: Duration) -> TestBridge {
    let config = LinkConfig {
        device_addr: device,
        debug_addr: debug,
        read_timeout,
        ..LinkConfig::default()
    };
    let bridge = Bridge::connect(&config).expect("bridge should connect");
    let state = Arc::new(AppState::new(bridge, config.max_payload_size));

    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
        .await
        .expect("listener should bind");
    let base = format!("http://{}", listener.local_addr().unwrap());

    let (tx, rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        let _ = server::serve(listener, state, async {
            let _ = rx.await;
        })
        .await;
    });

    TestBridge {
        base,
        _shutdown: tx,
    }
}

fn emulator_socket(timeout: Duration) -> UdpSocket {
    let socket = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).expect("emulator should bind");
    socket
        .set_read_timeout(Some(timeout))
        .expect("timeout should apply");
    socket
}

/// Emulator stand-in that echoes every report back to its sender.
fn spawn_echo_emulator() -> SocketAddr {
    let socket = emulator_socket(Duration::from_secs(10));
    let addr = socket.local_addr().unwrap();
    thread::spawn(move || {
        let mut buf = [0u8; 256];
        while let Ok((n, from)) = socket.recv_from(&mut buf) {
            let _ = socket.send_to(&buf[..n], from);
        }
    });
    addr
}

#[tokio::test(flavor = "multi_thread")]
async fn health_reports_version() {
    let idle = emulator_socket(Duration::from_millis(100));
    let addr = idle.local_addr().unwrap();
    let bridge = start_bridge(addr, addr, Duration::from_secs(1)).await;

    let body: serde_json::Value = reqwest::get(bridge.url("/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test(flavor = "multi_thread")]
async fn raw_exchange_returns_reassembled_response() {
    let emulator = spawn_echo_emulator();
    let bridge = start_bridge(emulator, emulator, Duration::from_secs(2)).await;
    let message = build_message(PING, &[7u8; 200]).unwrap();

    let response = reqwest::Client::new()
        .post(bridge.url("/raw/device"))
        .body(message.to_vec())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        "application/octet-stream"
    );
    assert_eq!(response.bytes().await.unwrap(), message);
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_raw_exchanges_each_get_their_own_response() {
    let emulator = spawn_echo_emulator();
    let bridge = start_bridge(emulator, emulator, Duration::from_secs(2)).await;
    let client = reqwest::Client::new();

    let requests = (0..8u8).map(|id| {
        let client = client.clone();
        let url = bridge.url("/raw/device");
        let message = build_message(PING, &vec![id; 300]).unwrap();
        async move {
            let body = client
                .post(url)
                .body(message.to_vec())
                .send()
                .await
                .unwrap()
                .bytes()
                .await
                .unwrap();
            assert_eq!(body, message);
        }
    });

    let handles: Vec<_> = requests.map(tokio::spawn).collect();
    for handle in handles {
        handle.await.unwrap();
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn no_response_type_returns_empty_body() {
    let debug = emulator_socket(Duration::from_secs(2));
    let addr = debug.local_addr().unwrap();
    let bridge = start_bridge(addr, addr, Duration::from_secs(5)).await;
    let message = build_message(DEBUG_LINK_DECISION, &[0x08, 0x01]).unwrap();

    let response = reqwest::Client::new()
        .post(bridge.url("/raw/debug"))
        .body(message.to_vec())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.bytes().await.unwrap().is_empty());

    let mut buf = [0u8; 128];
    let (n, _) = debug.recv_from(&mut buf).unwrap();
    assert_eq!(n, FRAME_SIZE);
    assert_eq!(&buf[1..1 + message.len()], message.as_ref());
}

#[tokio::test(flavor = "multi_thread")]
async fn unknown_channel_is_not_found_without_io() {
    let emulator = emulator_socket(Duration::from_millis(200));
    let addr = emulator.local_addr().unwrap();
    let bridge = start_bridge(addr, addr, Duration::from_secs(1)).await;
    let message = build_message(PING, b"hello").unwrap();

    let response = reqwest::Client::new()
        .post(bridge.url("/raw/other"))
        .body(message.to_vec())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["code"], 404);

    let mut buf = [0u8; 128];
    assert!(emulator.recv_from(&mut buf).is_err());
}

#[tokio::test(flavor = "multi_thread")]
async fn malformed_message_is_bad_request_without_io() {
    let emulator = emulator_socket(Duration::from_millis(200));
    let addr = emulator.local_addr().unwrap();
    let bridge = start_bridge(addr, addr, Duration::from_secs(1)).await;

    // Declares 5 payload bytes but carries 3.
    let short = [0x23, 0x23, 0x00, 0x01, 0x00, 0x00, 0x00, 0x05, b'a', b'b', b'c'];
    let response = reqwest::Client::new()
        .post(bridge.url("/raw/device"))
        .body(short.to_vec())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["code"], 400);
    assert!(body["error"].as_str().unwrap().contains("malformed"));

    let mut buf = [0u8; 128];
    assert!(emulator.recv_from(&mut buf).is_err());
}

#[tokio::test(flavor = "multi_thread")]
async fn bad_response_preamble_is_server_error() {
    let emulator = emulator_socket(Duration::from_secs(5));
    let addr = emulator.local_addr().unwrap();
    thread::spawn(move || {
        let mut buf = [0u8; 128];
        if let Ok((_, from)) = emulator.recv_from(&mut buf) {
            let mut bad = [0u8; FRAME_SIZE];
            bad[0] = 0x3f;
            bad[1] = b'X';
            bad[2] = b'X';
            let _ = emulator.send_to(&bad, from);
        }
    });
    let bridge = start_bridge(addr, addr, Duration::from_secs(2)).await;
    let message = build_message(PING, &[]).unwrap();

    let response = reqwest::Client::new()
        .post(bridge.url("/raw/device"))
        .body(message.to_vec())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("protocol violation"));
}

#[tokio::test(flavor = "multi_thread")]
async fn silent_emulator_times_out() {
    let silent = emulator_socket(Duration::from_secs(2));
    let addr = silent.local_addr().unwrap();
    let bridge = start_bridge(addr, addr, Duration::from_millis(200)).await;
    let message = build_message(PING, &[]).unwrap();

    let response = reqwest::Client::new()
        .post(bridge.url("/raw/device"))
        .body(message.to_vec())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    drop(silent);
}

#[tokio::test(flavor = "multi_thread")]
async fn legacy_surface_passes_datagrams_through_unframed() {
    let device = emulator_socket(Duration::from_millis(200));
    let debug = emulator_socket(Duration::from_secs(2));
    let bridge = start_bridge(
        device.local_addr().unwrap(),
        debug.local_addr().unwrap(),
        Duration::from_secs(2),
    )
    .await;
    let client = reqwest::Client::new();

    let response = client
        .post(bridge.url("/exchange/debug"))
        .json(&json!({ "data": "3f2323" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, json!({}));

    let mut buf = [0u8; 128];
    let (n, from) = debug.recv_from(&mut buf).unwrap();
    assert_eq!(&buf[..n], &[0x3f, 0x23, 0x23]);
    assert!(device.recv_from(&mut buf).is_err());

    debug.send_to(&[0xab; FRAME_SIZE], from).unwrap();
    let body: serde_json::Value = client
        .get(bridge.url("/exchange/debug"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"], "ab".repeat(FRAME_SIZE));
}

#[tokio::test(flavor = "multi_thread")]
async fn legacy_surface_routes_unknown_kind_to_device() {
    let device = emulator_socket(Duration::from_secs(2));
    let debug = emulator_socket(Duration::from_millis(100));
    let bridge = start_bridge(
        device.local_addr().unwrap(),
        debug.local_addr().unwrap(),
        Duration::from_secs(1),
    )
    .await;

    let response = reqwest::Client::new()
        .post(bridge.url("/exchange/whatever"))
        .json(&json!({ "data": "00ff" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let mut buf = [0u8; 16];
    let (n, _) = device.recv_from(&mut buf).unwrap();
    assert_eq!(&buf[..n], &[0x00, 0xff]);
    assert!(debug.recv_from(&mut buf).is_err());
}

#[tokio::test(flavor = "multi_thread")]
async fn legacy_surface_rejects_invalid_hex() {
    let emulator = emulator_socket(Duration::from_millis(100));
    let addr = emulator.local_addr().unwrap();
    let bridge = start_bridge(addr, addr, Duration::from_secs(1)).await;

    let response = reqwest::Client::new()
        .post(bridge.url("/exchange/device"))
        .json(&json!({ "data": "zz" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["code"], 400);
}
