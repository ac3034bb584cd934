// MIT License
// Copyright 2023--present zrpc developers

//! The application router shared by `greeter-server` and `greeter-client`.

use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::EnvFilter;
use zrpc_core::{Router, Schema, Service};

/// Address the server listens on and the client dials.
pub const DEFAULT_ADDRESS: &str = "0.0.0.0:50051";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SayHelloRequest {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SayHelloReply {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetUserRequest {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetUserReply {
    pub id: String,
    pub name: String,
    pub email: String,
}

/// Schemas plus the `greeter` and `userService` implementations.
pub fn app_router() -> Router {
    Router::new()
        .schema("SayHelloRequest", Schema::object([("name", Schema::string())]))
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
        .service(
            "greeter",
            Service::new().typed_method("sayHello", |req: SayHelloRequest| async move {
                info!(name = %req.name, "handling sayHello");
                Ok::<_, anyhow::Error>(SayHelloReply {
                    message: format!("Hello, {}!", req.name),
                })
            }),
        )
        .service(
            "userService",
            Service::new().typed_method("getUser", |req: GetUserRequest| async move {
                info!(id = %req.id, "fetching user");
                // Fixed record; there is no user store behind this demo.
                Ok::<_, anyhow::Error>(GetUserReply {
                    id: req.id,
                    name: "Puja Bhowmik".into(),
                    email: "puja@example.com".into(),
                })
            }),
        )
}

/// `RUST_LOG`-driven subscriber, `info` by default.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
