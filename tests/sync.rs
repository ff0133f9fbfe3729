//! Full-server synchronization tests: control API, catch-up push,
//! broadcast fan-out, status accuracy.

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::net::TcpListener;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

use caption_bridge::config::BridgeConfig;
use caption_bridge::http::{AppState, BridgeServer};

mod common;

type WsClient = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Start a full bridge server (no poller) on the given port.
async fn start_server(tag: &str, port: u16) -> AppState {
    let store_path = common::temp_store_path(tag).to_string_lossy().into_owned();
    start_server_with_store(store_path, port).await
}

/// Same, but with an explicit display-config store path.
async fn start_server_with_store(store_path: String, port: u16) -> AppState {
    let mut config = BridgeConfig::default();
    config.listener.bind_address = format!("127.0.0.1:{port}");
    config.store.path = store_path;

    let state = AppState::from_config(&config);
    let listener = TcpListener::bind(&config.listener.bind_address)
        .await
        .unwrap();
    let server = BridgeServer::new(&config, state.clone());
    tokio::spawn(server.run(listener));

    // Give axum a beat to start accepting.
    tokio::time::sleep(Duration::from_millis(50)).await;
    state
}

async fn connect_ws(port: u16) -> WsClient {
    let (ws, _) = connect_async(format!("ws://127.0.0.1:{port}/ws"))
        .await
        .unwrap();
    ws
}

async fn next_json(ws: &mut WsClient) -> serde_json::Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("timed out waiting for push")
            .expect("socket closed")
            .unwrap();
        match msg {
            Message::Text(text) => return serde_json::from_str(text.as_str()).unwrap(),
            // Skip control frames.
            _ => continue,
        }
    }
}

#[tokio::test]
async fn late_joiner_receives_catch_up_sequence() {
    let port = 28401;
    let _state = start_server("catchup", port).await;

    let mut ws = connect_ws(port).await;

    let first = next_json(&mut ws).await;
    assert_eq!(first["type"], "config");
    assert_eq!(first["config"]["color"], "#802B36");
    assert_eq!(first["config"]["position"], "bas");

    let second = next_json(&mut ws).await;
    assert_eq!(second["type"], "text_update");
    assert_eq!(second["text"], "");
    assert!(second["timestamp"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn write_config_merges_persists_and_fans_out() {
    let port = 28402;
    let _state = start_server("write", port).await;
    let base = format!("http://127.0.0.1:{port}");
    let client = reqwest::Client::new();

    // Two live subscribers, both past catch-up.
    let mut ws1 = connect_ws(port).await;
    let mut ws2 = connect_ws(port).await;
    for ws in [&mut ws1, &mut ws2] {
        next_json(ws).await;
        next_json(ws).await;
    }

    let response: serde_json::Value = client
        .post(format!("{base}/api/config"))
        .json(&serde_json::json!({"color": "#000000"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(response["success"], true);
    assert_eq!(response["config"]["color"], "#000000");
    // Untouched fields report their prior values.
    assert_eq!(response["config"]["font"], "Montserrat");

    // Both connections receive the identical merged document.
    for ws in [&mut ws1, &mut ws2] {
        let event = next_json(ws).await;
        assert_eq!(event["type"], "config");
        assert_eq!(event["config"]["color"], "#000000");
        assert_eq!(event["config"]["font"], "Montserrat");
    }

    // Subsequent reads see the merged snapshot verbatim.
    let read: serde_json::Value = client
        .get(format!("{base}/api/config"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(read["color"], "#000000");
    assert_eq!(read["position"], "bas");

    // A client joining after the write catches up to the merged state.
    let mut late = connect_ws(port).await;
    let catch_up = next_json(&mut late).await;
    assert_eq!(catch_up["type"], "config");
    assert_eq!(catch_up["config"]["color"], "#000000");
}

#[tokio::test]
async fn reset_restores_defaults_and_broadcasts() {
    let port = 28403;
    let _state = start_server("reset", port).await;
    let base = format!("http://127.0.0.1:{port}");
    let client = reqwest::Client::new();

    client
        .post(format!("{base}/api/config"))
        .json(&serde_json::json!({"color": "#123456", "is_hidden": true}))
        .send()
        .await
        .unwrap();

    let mut ws = connect_ws(port).await;
    next_json(&mut ws).await;
    next_json(&mut ws).await;

    let response: serde_json::Value = client
        .get(format!("{base}/api/config/reset"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(response["success"], true);
    assert_eq!(response["config"]["color"], "#802B36");
    assert_eq!(response["config"]["is_hidden"], false);

    let event = next_json(&mut ws).await;
    assert_eq!(event["type"], "config");
    assert_eq!(event["config"]["color"], "#802B36");

    // Reset twice yields the identical document.
    let again: serde_json::Value = client
        .get(format!("{base}/api/config/reset"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(again["config"], response["config"]);
}

#[tokio::test]
async fn status_reports_live_connection_count() {
    let port = 28404;
    let _state = start_server("status", port).await;
    let base = format!("http://127.0.0.1:{port}");
    let client = reqwest::Client::new();

    let status: serde_json::Value = client
        .get(format!("{base}/api/status"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["server"], "running");
    assert_eq!(status["propresenter_connected"], false);
    assert_eq!(status["clients_connected"], 0);
    assert_eq!(status["last_text"], "");
    assert!(status["propresenter_api"].as_str().unwrap().starts_with("http://"));

    let mut ws1 = connect_ws(port).await;
    let mut ws2 = connect_ws(port).await;
    for ws in [&mut ws1, &mut ws2] {
        next_json(ws).await;
        next_json(ws).await;
    }

    let status: serde_json::Value = client
        .get(format!("{base}/api/status"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["clients_connected"], 2);

    // Closing a socket shrinks the live set once the server notices.
    drop(ws2);
    let mut count = 2;
    for _ in 0..40 {
        tokio::time::sleep(Duration::from_millis(50)).await;
        let status: serde_json::Value = client
            .get(format!("{base}/api/status"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        count = status["clients_connected"].as_u64().unwrap();
        if count == 1 {
            break;
        }
    }
    assert_eq!(count, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_writes_notify_subscribers_in_commit_order() {
    let port = 28406;
    let _state = start_server("concurrent", port).await;
    let base = format!("http://127.0.0.1:{port}");

    let mut ws = connect_ws(port).await;
    next_json(&mut ws).await;
    next_json(&mut ws).await;

    // Race a batch of writes; every one must broadcast, and the last
    // broadcast a subscriber sees must match the final snapshot.
    let mut handles = Vec::new();
    for i in 0..16u32 {
        let url = format!("{base}/api/config");
        handles.push(tokio::spawn(async move {
            let response: serde_json::Value = reqwest::Client::new()
                .post(url)
                .json(&serde_json::json!({ "color": format!("#{:06X}", i) }))
                .send()
                .await
                .unwrap()
                .json()
                .await
                .unwrap();
            assert_eq!(response["success"], true);
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let mut last_color = None;
    let mut events = 0;
    while let Ok(Some(Ok(Message::Text(text)))) =
        tokio::time::timeout(Duration::from_millis(500), ws.next()).await
    {
        let event: serde_json::Value = serde_json::from_str(text.as_str()).unwrap();
        assert_eq!(event["type"], "config");
        last_color = Some(event["config"]["color"].as_str().unwrap().to_string());
        events += 1;
        if events == 16 {
            break;
        }
    }
    assert_eq!(events, 16);

    let read: serde_json::Value = reqwest::Client::new()
        .get(format!("{base}/api/config"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(last_color.unwrap(), read["color"].as_str().unwrap());
}

#[tokio::test]
async fn failed_persist_reports_error_and_broadcasts_nothing() {
    let port = 28407;
    // Unwritable store: parent directory does not exist.
    let _state = start_server_with_store(
        "/nonexistent-dir-for-sure/display-config.json".to_string(),
        port,
    )
    .await;
    let base = format!("http://127.0.0.1:{port}");
    let client = reqwest::Client::new();

    let mut ws = connect_ws(port).await;
    next_json(&mut ws).await;
    next_json(&mut ws).await;

    let response = client
        .post(format!("{base}/api/config"))
        .json(&serde_json::json!({"color": "#FF0000"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 500);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert!(!body["error"].as_str().unwrap().is_empty());

    // No broadcast reaches subscribers on a failed persist.
    let quiet = tokio::time::timeout(Duration::from_millis(300), ws.next()).await;
    assert!(quiet.is_err());

    // And the snapshot kept its pre-write value.
    let read: serde_json::Value = client
        .get(format!("{base}/api/config"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(read["color"], "#802B36");
}

#[tokio::test]
async fn unknown_keys_are_not_echoed_back() {
    let port = 28405;
    let _state = start_server("unknown", port).await;
    let base = format!("http://127.0.0.1:{port}");
    let client = reqwest::Client::new();

    let response: serde_json::Value = client
        .post(format!("{base}/api/config"))
        .json(&serde_json::json!({"color": "#FFFFFF", "injected": "nope"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(response["success"], true);
    assert_eq!(response["config"]["color"], "#FFFFFF");
    assert!(response["config"].get("injected").is_none());
}
