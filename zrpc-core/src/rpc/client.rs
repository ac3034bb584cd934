// MIT License
// Copyright 2023--present zrpc developers

//! Validating client proxy.
//!
//! [`ZrpcClient::connect`] loads the same IDL the server generates from the
//! same router and opens a lazily connected channel per service. The channel
//! is only dialled by the first call that passes local validation.
//!
//! ```no_run
//! # async fn demo(router: zrpc_core::Router) -> zrpc_core::Result<()> {
//! use serde_json::json;
//! use zrpc_core::ZrpcClient;
//!
//! let client = ZrpcClient::connect(router, "localhost:50051")?;
//! let reply = client
//!     .service("greeter")
//!     .expect("declared in the router")
//!     .call("sayHello", json!({ "name": "Barrackpore" }))
//!     .await?;
//! assert_eq!(reply["message"], "Hello, Barrackpore!");
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use http::uri::PathAndQuery;
use indexmap::IndexMap;
use prost_reflect::ServiceDescriptor;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tonic::transport::{Channel, Endpoint};
use tonic::Status;
use tracing::debug;

use crate::config::Config;
use crate::idl;
use crate::naming::{reply_type_name, request_type_name, wire_method_name};
use crate::router::Router;
use crate::rpc::codec::{self, DynamicCodec};
use crate::rpc::loader;
use crate::status::{Error, Result};

/// Proxy over every service of a router.
#[derive(Clone)]
pub struct ZrpcClient {
    services: IndexMap<String, ServiceClient>,
}

impl ZrpcClient {
    /// Connect to `address` using [`Config::from_env`].
    ///
    /// Must be called from within a tokio runtime.
    pub fn connect(router: Router, address: &str) -> Result<Self> {
        Self::connect_with_config(router, address, Config::from_env())
    }

    /// Generate and load the IDL for `router` and prepare one lazily connected
    /// channel per service. `address` may omit the `http://` scheme.
    pub fn connect_with_config(router: Router, address: &str, config: Config) -> Result<Self> {
        let router = Arc::new(router);
        let document = idl::generate(&router);
        debug!(%document, "generated client IDL");
        let pool = loader::load(&document, &config, "zrpc_client_")?;
        let endpoint = endpoint(address)?.tcp_nodelay(config.nodelay);

        let mut services = IndexMap::new();
        for (name, _) in router.services() {
            let descriptor = pool
                .get_service_by_name(&idl::qualified_name(name))
                .ok_or_else(|| Error::MissingService(name.to_string()))?;
            services.insert(
                name.to_string(),
                ServiceClient {
                    name: name.to_string(),
                    router: Arc::clone(&router),
                    descriptor,
                    channel: endpoint.connect_lazy(),
                },
            );
        }

        Ok(Self { services })
    }

    /// Proxy for one service.
    pub fn service(&self, name: &str) -> Option<&ServiceClient> {
        self.services.get(name)
    }

    /// Service names in router order.
    pub fn services(&self) -> impl Iterator<Item = &str> {
        self.services.keys().map(String::as_str)
    }

    /// Call `service.method` with a JSON input.
    pub async fn call(&self, service: &str, method: &str, input: Value) -> Result<Value> {
        self.lookup(service)?.call(method, input).await
    }

    /// Call `service.method` with typed input and output.
    pub async fn call_typed<I, O>(&self, service: &str, method: &str, input: &I) -> Result<O>
    where
        I: Serialize,
        O: DeserializeOwned,
    {
        self.lookup(service)?.call_typed(method, input).await
    }

    fn lookup(&self, service: &str) -> Result<&ServiceClient> {
        self.service(service)
            .ok_or_else(|| Error::UnknownService(service.to_string()))
    }
}

/// Proxy for the methods of one service.
#[derive(Clone)]
pub struct ServiceClient {
    name: String,
    router: Arc<Router>,
    descriptor: ServiceDescriptor,
    channel: Channel,
}

impl ServiceClient {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Validate `input` against the method's request schema, then call it.
    ///
    /// Schema lookup and validation failures are returned before any network
    /// activity. A non-OK status from the server is returned unmodified as
    /// [`Error::Transport`]. The reply is not validated.
    pub async fn call(&self, method: &str, input: Value) -> Result<Value> {
        let declared = self
            .router
            .get_service(&self.name)
            .is_some_and(|service| service.contains(method));
        if !declared {
            return Err(Error::UnknownMethod {
                service: self.name.clone(),
                method: method.to_string(),
            });
        }

        let request_type = request_type_name(method);
        let schema = self
            .router
            .get_schema(&request_type)
            .ok_or_else(|| Error::MissingSchema {
                schema: request_type.clone(),
                method: method.to_string(),
            })?;
        let validated = schema.parse(&input)?;

        let wire_name = wire_method_name(method);
        let rpc = self
            .descriptor
            .methods()
            .find(|m| wire_method_name(m.name()) == wire_name)
            .ok_or_else(|| Error::MissingMethod {
                service: self.name.clone(),
                method: method.to_string(),
            })?;
        let request = codec::from_json(&rpc.input(), validated).map_err(|err| Error::Encode {
            message: rpc.input().full_name().to_string(),
            reason: err.to_string(),
        })?;
        let path = format!("/{}/{}", self.descriptor.full_name(), rpc.name());
        let path = PathAndQuery::try_from(path).map_err(|err| Error::Encode {
            message: rpc.full_name().to_string(),
            reason: err.to_string(),
        })?;

        let mut grpc = tonic::client::Grpc::new(self.channel.clone());
        grpc.ready().await.map_err(not_ready)?;
        let response = grpc
            .unary(
                tonic::Request::new(request),
                path,
                DynamicCodec::new(rpc.output()),
            )
            .await?;

        codec::to_json(response.get_ref()).map_err(|err| Error::Decode {
            message: rpc.output().full_name().to_string(),
            reason: err.to_string(),
        })
    }

    /// [`call`](Self::call) with serde conversion on both sides.
    pub async fn call_typed<I, O>(&self, method: &str, input: &I) -> Result<O>
    where
        I: Serialize,
        O: DeserializeOwned,
    {
        let input = serde_json::to_value(input).map_err(|err| Error::Encode {
            message: request_type_name(method),
            reason: err.to_string(),
        })?;
        let reply = self.call(method, input).await?;
        serde_json::from_value(reply).map_err(|err| Error::Decode {
            message: reply_type_name(method),
            reason: err.to_string(),
        })
    }
}

/// Readiness failures go through tonic's own error-to-status conversion, so a
/// status carried in the error chain comes out as sent.
fn not_ready(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Status {
    Status::from_error(err.into())
}

fn endpoint(address: &str) -> Result<Endpoint> {
    let uri = if address.contains("://") {
        address.to_string()
    } else {
        format!("http://{address}")
    };
    Endpoint::from_shared(uri).map_err(|err| Error::InvalidAddress {
        address: address.to_string(),
        reason: err.to_string(),
    })
}
