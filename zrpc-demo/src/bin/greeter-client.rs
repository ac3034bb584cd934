// MIT License
// Copyright 2023--present zrpc developers

use serde_json::json;
use tracing::{error, info};
use zrpc_core::{Error, ZrpcClient};
use zrpc_demo::{app_router, init_tracing, SayHelloReply, SayHelloRequest};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let address = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "localhost:50051".to_string());
    info!(%address, "creating zrpc client");
    let client = ZrpcClient::connect(app_router(), &address)?;

    match client
        .call_typed::<_, SayHelloReply>(
            "greeter",
            "sayHello",
            &SayHelloRequest {
                name: "Barrackpore".into(),
            },
        )
        .await
    {
        Ok(reply) => info!(message = %reply.message, "greeter replied"),
        Err(err) => error!(error = %err, "call failed"),
    }

    info!("calling sayHello with an invalid request");
    match client
        .call("greeter", "sayHello", json!({ "name": 12345 }))
        .await
    {
        Err(Error::Validation(err)) => {
            info!("caught expected validation error");
            for issue in err.issues() {
                info!(path = %issue.path.join("."), code = ?issue.code, "{}", issue.message);
            }
        }
        Err(other) => error!(error = %other, "unexpected error"),
        Ok(reply) => error!(%reply, "invalid request was accepted"),
    }

    Ok(())
}
