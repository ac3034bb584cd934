// MIT License
// Copyright 2023--present zrpc developers

//! End-to-end tests: a real server on an ephemeral port and a client built
//! from a router describing the same wire contract.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tonic::Code;
use zrpc_core::status::INTERNAL_MESSAGE;
use zrpc_core::{Config, Error, IssueCode, Router, Schema, Service, ZrpcClient, ZrpcServer};

#[derive(Debug, Serialize)]
struct GetUserRequest {
    id: String,
}

#[derive(Debug, Deserialize, PartialEq)]
struct GetUserReply {
    id: String,
    name: String,
    email: String,
}

fn schemas(router: Router, name: Schema) -> Router {
    router
        .schema("SayHelloRequest", Schema::object([("name", name)]))
        .schema("SayHelloReply", Schema::object([("message", Schema::string())]))
        .schema("GetUserRequest", Schema::object([("id", Schema::string())]))
        .schema(
            "GetUserReply",
            Schema::object([
                ("id", Schema::string()),
                ("name", Schema::string()),
                ("email", Schema::string().email()),
            ]),
        )
        .schema("ExplodeRequest", Schema::object([("reason", Schema::string())]))
        .schema("ExplodeReply", Schema::object([("ok", Schema::boolean())]))
        .schema("PingRequest", Schema::object([("seq", Schema::number())]))
        .schema("PingReply", Schema::object([("seq", Schema::number())]))
}

fn server_router(calls: Arc<AtomicUsize>) -> Router {
    schemas(Router::new(), Schema::string().min_len(1))
        .service(
            "greeter",
            Service::new().method("sayHello", move |input| {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    let name = input["name"].as_str().unwrap_or_default();
                    Ok(json!({ "message": format!("Hello, {name}!") }))
                }
            }),
        )
        .service(
            "userService",
            Service::new()
                .method("getUser", |input| async move {
                    Ok(json!({
                        "id": input["id"],
                        "name": "Puja Bhowmik",
                        "email": "puja@example.com",
                    }))
                })
                .method("explode", |input| async move {
                    Err::<serde_json::Value, _>(anyhow::anyhow!("secret detail: {}", input["reason"]))
                })
                .declare("ping"),
        )
}

/// Same wire contract, but a looser `name` rule so that the server's own
/// validation is what rejects an empty name.
fn lax_client_router() -> Router {
    schemas(Router::new(), Schema::string())
        .service("greeter", Service::new().declare("sayHello"))
        .service(
            "userService",
            Service::new()
                .declare("getUser")
                .declare("explode")
                .declare("ping"),
        )
}

struct Harness {
    client: ZrpcClient,
    lax: ZrpcClient,
    calls: Arc<AtomicUsize>,
    _scratch: tempfile::TempDir,
}

async fn harness() -> Harness {
    let scratch = tempfile::tempdir().unwrap();
    let config = Config::default().with_scratch_dir(scratch.path());
    let calls = Arc::new(AtomicUsize::new(0));

    let server =
        ZrpcServer::bind_with_config(server_router(Arc::clone(&calls)), "127.0.0.1:0", config.clone())
            .unwrap();
    let addr = server.start().await.expect("server should bind").to_string();

    let client =
        ZrpcClient::connect_with_config(server_router(Arc::new(AtomicUsize::new(0))), &addr, config.clone())
            .unwrap();
    let lax = ZrpcClient::connect_with_config(lax_client_router(), &addr, config).unwrap();

    Harness {
        client,
        lax,
        calls,
        _scratch: scratch,
    }
}

#[tokio::test]
async fn say_hello_round_trip() {
    let h = harness().await;
    let reply = h
        .client
        .call("greeter", "sayHello", json!({ "name": "Barrackpore" }))
        .await
        .unwrap();
    assert_eq!(reply, json!({ "message": "Hello, Barrackpore!" }));
    assert_eq!(h.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn typed_call_round_trip() {
    let h = harness().await;
    let reply: GetUserReply = h
        .client
        .call_typed("userService", "getUser", &GetUserRequest { id: "u-7".into() })
        .await
        .unwrap();
    assert_eq!(
        reply,
        GetUserReply {
            id: "u-7".into(),
            name: "Puja Bhowmik".into(),
            email: "puja@example.com".into(),
        }
    );
}

#[tokio::test]
async fn client_rejects_invalid_input_locally() {
    let h = harness().await;
    let err = h
        .client
        .call("greeter", "sayHello", json!({ "name": 12345 }))
        .await
        .unwrap_err();

    let Error::Validation(validation) = err else {
        panic!("expected a local validation error, got {err}");
    };
    assert_eq!(validation.issues()[0].code, IssueCode::InvalidType);
    assert_eq!(validation.issues()[0].path, ["name"]);
    assert_eq!(h.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn server_rejects_schema_invalid_payload() {
    let h = harness().await;
    let err = h
        .lax
        .call("greeter", "sayHello", json!({ "name": "" }))
        .await
        .unwrap_err();

    let status = err.status().expect("status from the server");
    assert_eq!(status.code(), Code::InvalidArgument);
    assert_eq!(
        status.message(),
        "Invalid request: String must contain at least 1 character(s)"
    );
    assert_eq!(h.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn handler_failure_is_internal_without_details() {
    let h = harness().await;
    let err = h
        .client
        .call("userService", "explode", json!({ "reason": "disk on fire" }))
        .await
        .unwrap_err();

    let status = err.status().expect("status from the server");
    assert_eq!(status.code(), Code::Internal);
    assert_eq!(status.message(), INTERNAL_MESSAGE);
    assert!(!status.message().contains("disk on fire"));
    assert!(!status.message().contains("secret"));
}

#[tokio::test]
async fn declared_only_method_is_unimplemented() {
    let h = harness().await;
    let err = h
        .client
        .call("userService", "ping", json!({ "seq": 1 }))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::Unimplemented);
}

#[tokio::test]
async fn concurrent_calls_share_one_client() {
    let h = harness().await;
    let calls = (0..16).map(|i| {
        let client = h.client.clone();
        async move {
            client
                .call("greeter", "sayHello", json!({ "name": format!("n{i}") }))
                .await
        }
    });
    let replies = futures::future::join_all(calls).await;
    for (i, reply) in replies.into_iter().enumerate() {
        assert_eq!(reply.unwrap()["message"], format!("Hello, n{i}!"));
    }
    assert_eq!(h.calls.load(Ordering::SeqCst), 16);
}

#[tokio::test]
async fn unreachable_server_surfaces_transport_error() {
    let scratch = tempfile::tempdir().unwrap();
    let config = Config::default().with_scratch_dir(scratch.path());
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    drop(listener);

    let client = ZrpcClient::connect_with_config(lax_client_router(), &addr, config).unwrap();
    let err = client
        .call("greeter", "sayHello", json!({ "name": "x" }))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Transport(_)), "{err}");
}
