//! End-to-end tests over real TCP sessions.

mod common;

use serde_json::Value;
use sqlgate_client::Client;
use sqlgate_core::{Error, Scalar};
use sqlgate_server::{DriverRegistry, Gateway, Server, ServerConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

async fn spawn_server(secret: &str) -> SocketAddr {
    let gateway = Gateway::new(secret, Arc::new(DriverRegistry::with_defaults()));
    let config = ServerConfig {
        port: 0,
        ..Default::default()
    };
    let server = Server::bind(&config, gateway).await.unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = server.serve().await;
    });
    addr
}

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

async fn spawn_tls_server(secret: &str) -> SocketAddr {
    let gateway = Gateway::new(secret, Arc::new(DriverRegistry::with_defaults()));
    let config = ServerConfig {
        port: 0,
        cert: Some(fixture("server.crt")),
        key: Some(fixture("server.key")),
        ..Default::default()
    };
    let server = Server::bind(&config, gateway).await.unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = server.serve().await;
    });
    addr
}

#[tokio::test]
async fn query_over_tcp() {
    let dsn = common::seeded_database().await;
    let addr = spawn_server("pw").await;

    let mut client = Client::connect(&addr.to_string(), "pw").await.unwrap();
    let rowset = client
        .query("sqlite", &dsn, "select * from foo", vec![])
        .await
        .unwrap();

    assert_eq!(rowset.len(), 2);
    assert_eq!(rowset[0].get("bar"), Some(&Scalar::Text("hello".into())));
    assert_eq!(rowset[1].get("foot"), Some(&Scalar::Float(2.0)));
}

#[tokio::test]
async fn query_over_tls() {
    let dsn = common::seeded_database().await;
    let addr = spawn_tls_server("pw").await;

    // Self-signed certificate, so the client must skip verification.
    let mut client = Client::connect_tls(&addr.to_string(), "pw", true)
        .await
        .unwrap();
    let rowset = client
        .query("sqlite", &dsn, "select * from foo", vec![])
        .await
        .unwrap();

    assert_eq!(rowset.len(), 2);
    assert_eq!(rowset[0].get("bar"), Some(&Scalar::Text("hello".into())));
}

#[tokio::test]
async fn plaintext_client_cannot_talk_to_tls_server() {
    let dsn = common::seeded_database().await;
    let addr = spawn_tls_server("pw").await;

    let mut client = Client::connect(&addr.to_string(), "pw").await.unwrap();
    // The server drops the session at the failed handshake.
    let err = client
        .query("sqlite", &dsn, "select * from foo", vec![])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
}

#[tokio::test]
async fn wrong_password_over_tcp() {
    let dsn = common::seeded_database().await;
    let addr = spawn_server("pw").await;

    let mut client = Client::connect(&addr.to_string(), "nope").await.unwrap();
    let err = client
        .query("sqlite", &dsn, "select * from foo", vec![])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Auth));
}

#[tokio::test]
async fn failed_call_leaves_the_session_usable() {
    let dsn = common::seeded_database().await;
    let addr = spawn_server("").await;
    let mut client = Client::connect(&addr.to_string(), "").await.unwrap();

    let err = client
        .query("oracle", &dsn, "select * from foo", vec![])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Connection(_)));

    // Same connection, next call succeeds.
    let rowset = client
        .query(
            "sqlite",
            &dsn,
            "select foot from foo where bar = ?",
            vec![Scalar::Text("hello".into())],
        )
        .await
        .unwrap();
    assert_eq!(rowset.len(), 1);
    assert_eq!(rowset[0].get("foot"), Some(&Scalar::Float(1.2)));
}

#[tokio::test]
async fn concurrent_sessions_are_independent() {
    let dsn = common::seeded_database().await;
    let addr = spawn_server("").await;

    let mut tasks = Vec::new();
    for _ in 0..4 {
        let dsn = dsn.clone();
        tasks.push(tokio::spawn(async move {
            let mut client = Client::connect(&addr.to_string(), "").await.unwrap();
            client
                .query("sqlite", &dsn, "select * from foo", vec![])
                .await
                .unwrap()
        }));
    }
    for task in tasks {
        let rowset = task.await.unwrap();
        assert_eq!(rowset.len(), 2);
    }
}

async fn raw_call(addr: SocketAddr, frame: &str) -> Value {
    let stream = TcpStream::connect(addr).await.unwrap();
    let (read, mut write) = stream.into_split();
    let mut lines = BufReader::new(read).lines();

    write.write_all(frame.as_bytes()).await.unwrap();
    write.write_all(b"\n").await.unwrap();

    let line = lines.next_line().await.unwrap().unwrap();
    serde_json::from_str(&line).unwrap()
}

#[tokio::test]
async fn unknown_method_is_rejected() {
    let addr = spawn_server("").await;
    let response = raw_call(addr, r#"{"method":"JSQL.Drop","id":1}"#).await;
    assert_eq!(response["error"]["code"], -32601);
}

#[tokio::test]
async fn absent_params_reply_empty_result() {
    let addr = spawn_server("").await;
    let response = raw_call(addr, r#"{"method":"JSQL.Select","id":2}"#).await;
    assert_eq!(response["result"], Value::Array(vec![]));
    assert!(response.get("error").is_none());
}

#[tokio::test]
async fn malformed_params_get_invalid_params_error() {
    let addr = spawn_server("").await;
    let response = raw_call(addr, r#"{"method":"JSQL.Select","params":[42],"id":3}"#).await;
    assert_eq!(response["error"]["code"], -32602);
}

#[tokio::test]
async fn unparseable_line_gets_parse_error() {
    let addr = spawn_server("").await;
    let response = raw_call(addr, "this is not json").await;
    assert_eq!(response["error"]["code"], -32700);
}

#[tokio::test]
async fn go_style_capitalized_fields_are_accepted() {
    let dsn = common::seeded_database().await;
    let addr = spawn_server("").await;
    let frame = format!(
        r#"{{"method":"JSQL.Select","params":[{{"Auth":"","Driver":"sqlite3","DataSourceName":"{dsn}","Statement":"select id from foo"}}],"id":4}}"#
    );
    let response = raw_call(addr, &frame).await;
    assert_eq!(response["result"][0]["id"], 1);
    assert_eq!(response["result"][1]["id"], 2);
}
