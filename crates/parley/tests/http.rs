// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! End-to-end over a real socket.

use parley::{App, AppOptions, HttpMethod, Model, Optional, RpcError, RpcOptions, StreamController};
use serde_json::{json, Value as Json};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

#[derive(Model)]
struct SayHelloParams {
    name: String,
}

#[derive(Model)]
struct SayHelloResponse {
    message: String,
}

#[derive(Model)]
struct CountParams {
    to: u32,
    hold_open: Optional<bool>,
}

#[derive(Model)]
struct Count {
    value: u32,
}

async fn serve(app: App<()>) -> SocketAddr {
    let router = app.into_router().expect("router");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve");
    });
    addr
}

fn app(closed: mpsc::UnboundedSender<()>) -> App<()> {
    let options = AppOptions {
        route_prefix: "/rpc".into(),
        ..AppOptions::default()
    };
    let mut app = App::new(options);
    app.procedure(
        "utils.sayHello",
        RpcOptions::new()
            .method(HttpMethod::Get)
            .description("Greets someone"),
        |params: SayHelloParams, _ctx: ()| async move {
            Ok(SayHelloResponse {
                message: format!("Hello {}", params.name),
            })
        },
    )
    .expect("sayHello");
    app.event_stream(
        "utils.count",
        RpcOptions::new(),
        move |params: CountParams, stream: StreamController<Count>, _ctx: ()| {
            let closed = closed.clone();
            async move {
                if params.to == 0 {
                    return Err(RpcError::bad_request("nothing to count"));
                }
                stream.set_ping_interval(Duration::from_millis(20));
                for value in 1..=params.to {
                    stream.push(&Count { value }).await?;
                }
                if params.hold_open.into_option() == Some(true) {
                    stream.done().await;
                    let _ = closed.send(());
                    return Ok(());
                }
                stream.close(true).await;
                Ok(())
            }
        },
    )
    .expect("count");
    app
}

#[tokio::test]
async fn test_unary_get_over_http() {
    let (tx, _rx) = mpsc::unbounded_channel();
    let addr = serve(app(tx)).await;
    let response = reqwest::get(format!("http://{addr}/rpc/utils/say-hello?name=Ada"))
        .await
        .expect("request");
    assert_eq!(response.status(), 200);
    let body: Json = response.json().await.expect("json");
    assert_eq!(body, json!({"message": "Hello Ada"}));
}

#[tokio::test]
async fn test_schema_route() {
    let (tx, _rx) = mpsc::unbounded_channel();
    let addr = serve(app(tx)).await;
    let schema: Json = reqwest::get(format!("http://{addr}/rpc/__definition"))
        .await
        .expect("request")
        .json()
        .await
        .expect("json");
    assert_eq!(schema["schemaVersion"], "0.0.1");
    assert_eq!(schema["info"]["title"], "parley");
    assert_eq!(
        schema["procedures"]["utils.sayHello"],
        json!({
            "transport": "http",
            "path": "/rpc/utils/say-hello",
            "method": "get",
            "params": "SayHelloParams",
            "response": "SayHelloResponse",
            "isEventStream": false,
            "isDeprecated": false,
            "description": "Greets someone",
        })
    );
    assert_eq!(schema["procedures"]["utils.count"]["isEventStream"], true);
    assert_eq!(
        schema["definitions"]["CountParams"]["optionalProperties"]["holdOpen"],
        json!({"type": "boolean"})
    );
}

#[tokio::test]
async fn test_wrong_method_is_not_found() {
    let (tx, _rx) = mpsc::unbounded_channel();
    let addr = serve(app(tx)).await;
    let response = reqwest::Client::new()
        .post(format!("http://{addr}/rpc/utils/say-hello"))
        .json(&json!({"name": "Ada"}))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 404);
    let body: Json = response.json().await.expect("json");
    assert_eq!(body, json!({"code": 404, "message": "Not found"}));
}

#[tokio::test]
async fn test_event_stream_over_http() {
    let (tx, _rx) = mpsc::unbounded_channel();
    let addr = serve(app(tx)).await;
    let response = reqwest::Client::new()
        .post(format!("http://{addr}/rpc/utils/count"))
        .json(&json!({"to": 3}))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers()["content-type"],
        "text/event-stream"
    );
    assert_eq!(response.headers()["x-accel-buffering"], "no");

    let body = timeout(WAIT, response.text())
        .await
        .expect("stream ends")
        .expect("body");
    let messages: Vec<&str> = body
        .split("\n\n")
        .filter(|frame| frame.starts_with("event: message"))
        .collect();
    assert_eq!(
        messages,
        vec![
            "event: message\ndata: {\"value\":1}",
            "event: message\ndata: {\"value\":2}",
            "event: message\ndata: {\"value\":3}",
        ]
    );
    assert!(body.ends_with("event: done\ndata: done\n\n"));
}

#[tokio::test]
async fn test_stream_error_before_first_event() {
    let (tx, _rx) = mpsc::unbounded_channel();
    let addr = serve(app(tx)).await;
    let response = reqwest::Client::new()
        .post(format!("http://{addr}/rpc/utils/count"))
        .json(&json!({"to": 0}))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 400);
    let body: Json = response.json().await.expect("json");
    assert_eq!(body["message"], "nothing to count");
}

#[tokio::test]
async fn test_client_disconnect_completes_done() {
    let (tx, mut closed) = mpsc::unbounded_channel();
    let addr = serve(app(tx)).await;
    let mut response = reqwest::Client::new()
        .post(format!("http://{addr}/rpc/utils/count"))
        .json(&json!({"to": 1, "holdOpen": true}))
        .send()
        .await
        .expect("request");
    let first = timeout(WAIT, response.chunk())
        .await
        .expect("first chunk")
        .expect("read")
        .expect("some bytes");
    assert!(String::from_utf8_lossy(&first).starts_with("event: message"));

    drop(response);
    timeout(WAIT, closed.recv())
        .await
        .expect("handler saw the disconnect")
        .expect("signal");
}
