// MIT License
// Copyright 2023--present zrpc developers

//! gRPC server dispatching validated requests to router handlers.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use futures::future::BoxFuture;
use prost_reflect::{DynamicMessage, MethodDescriptor};
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tokio_stream::StreamExt;
use tonic::server::{Grpc, UnaryService};
use tonic::service::Routes;
use tonic::transport::Server;
use tonic::Status;
use tower::Service;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::idl;
use crate::naming::request_type_name;
use crate::router::{Handler, Router};
use crate::rpc::codec::{self, DynamicCodec};
use crate::rpc::loader;
use crate::status::{internal_failure, invalid_request, Error, Result};

/// A router bound to an address, ready to [`start`](ZrpcServer::start).
pub struct ZrpcServer {
    address: String,
    config: Config,
    routes: axum::Router,
}

impl ZrpcServer {
    /// Bind `router` to `address` using [`Config::from_env`].
    pub fn bind(router: Router, address: impl Into<String>) -> Result<Self> {
        Self::bind_with_config(router, address, Config::from_env())
    }

    /// Generate and load the IDL for `router`, then wrap every implemented
    /// method in a validating route.
    ///
    /// Fails if the IDL does not load, if a service of the router is missing
    /// from the loaded descriptors, or if an implemented method has no request
    /// schema.
    pub fn bind_with_config(
        router: Router,
        address: impl Into<String>,
        config: Config,
    ) -> Result<Self> {
        let router = Arc::new(router);
        let document = idl::generate(&router);
        debug!(%document, "generated server IDL");
        let pool = loader::load(&document, &config, "zrpc_")?;

        let mut routes = axum::Router::new();
        for (service_name, service) in router.services() {
            let descriptor = pool
                .get_service_by_name(&idl::qualified_name(service_name))
                .ok_or_else(|| Error::MissingService(service_name.to_string()))?;

            for (method_name, handler) in service.handlers() {
                let Some(handler) = handler else {
                    debug!(service = service_name, method = method_name, "declared without handler");
                    continue;
                };
                let Some(method) = descriptor.methods().find(|m| m.name() == method_name) else {
                    continue;
                };
                let request_type = request_type_name(method_name);
                if router.get_schema(&request_type).is_none() {
                    return Err(Error::MissingSchema {
                        schema: request_type,
                        method: method_name.to_string(),
                    });
                }

                let path = format!("/{}/{}", descriptor.full_name(), method.name());
                debug!(%path, "installing handler");
                routes = routes.route_service(
                    &path,
                    MethodRoute(Arc::new(Dispatch {
                        router: Arc::clone(&router),
                        method,
                        request_type,
                        handler: Arc::clone(handler),
                    })),
                );
            }
        }

        Ok(Self {
            address: address.into(),
            config,
            routes: routes.fallback(unimplemented),
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// The assembled route table, for serving alongside other tonic services.
    pub fn routes(&self) -> Routes {
        Routes::from(self.routes.clone())
    }

    /// Listen on the bound address (plaintext HTTP/2) and serve in the
    /// background.
    ///
    /// A bind failure is logged and reported as `None`; it is not returned as
    /// an error. On success the local address is returned, which resolves
    /// port `0` to the port actually chosen.
    pub async fn start(&self) -> Option<SocketAddr> {
        let listener = match TcpListener::bind(&self.address).await {
            Ok(listener) => listener,
            Err(err) => {
                error!(address = %self.address, error = %err, "server failed to bind");
                return None;
            }
        };
        let local = match listener.local_addr() {
            Ok(addr) => addr,
            Err(err) => {
                error!(address = %self.address, error = %err, "server failed to bind");
                return None;
            }
        };

        let nodelay = self.config.nodelay;
        let incoming = TcpListenerStream::new(listener).map(move |stream| {
            stream.inspect(|s| {
                let _ = s.set_nodelay(nodelay);
            })
        });
        let routes = self.routes();
        tokio::spawn(async move {
            if let Err(err) = Server::builder()
                .add_routes(routes)
                .serve_with_incoming(incoming)
                .await
            {
                error!(address = %local, error = %err, "server stopped");
            }
        });

        info!("zrpc server running at http://{local}");
        Some(local)
    }
}

/// Everything one route needs to serve one method.
struct Dispatch {
    router: Arc<Router>,
    method: MethodDescriptor,
    request_type: String,
    handler: Handler,
}

impl Dispatch {
    async fn handle(&self, request: DynamicMessage) -> Result<DynamicMessage, Status> {
        let method = self.method.full_name();
        let Some(schema) = self.router.get_schema(&self.request_type) else {
            error!(method, schema = %self.request_type, "request schema not found");
            return Err(internal_failure());
        };

        let raw = codec::to_json(&request).map_err(|err| {
            error!(method, error = %err, "failed to convert request");
            internal_failure()
        })?;
        let validated = schema.parse(&raw).map_err(|err| {
            warn!(method, %err, "rejected invalid request");
            invalid_request(&err)
        })?;

        let reply = (self.handler)(validated).await.map_err(|err| {
            error!(method, error = %format!("{err:#}"), "handler failed");
            internal_failure()
        })?;

        codec::from_json(&self.method.output(), reply).map_err(|err| {
            error!(method, error = %err, "handler reply does not match its message");
            internal_failure()
        })
    }
}

/// Route serving one method through tonic's unary machinery.
#[derive(Clone)]
struct MethodRoute(Arc<Dispatch>);

impl Service<http::Request<Body>> for MethodRoute {
    type Response = http::Response<tonic::body::BoxBody>;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: http::Request<Body>) -> Self::Future {
        let dispatch = Arc::clone(&self.0);
        Box::pin(async move {
            let codec = DynamicCodec::new(dispatch.method.input());
            let mut grpc = Grpc::new(codec);
            Ok(grpc.unary(Unary(dispatch), req).await)
        })
    }
}

struct Unary(Arc<Dispatch>);

impl UnaryService<DynamicMessage> for Unary {
    type Response = DynamicMessage;
    type Future = BoxFuture<'static, Result<tonic::Response<DynamicMessage>, Status>>;

    fn call(&mut self, request: tonic::Request<DynamicMessage>) -> Self::Future {
        let dispatch = Arc::clone(&self.0);
        Box::pin(async move {
            dispatch
                .handle(request.into_inner())
                .await
                .map(tonic::Response::new)
        })
    }
}

/// Trailers-only `UNIMPLEMENTED` answer for unknown paths and declared-only
/// methods.
async fn unimplemented() -> impl axum::response::IntoResponse {
    (
        http::StatusCode::OK,
        [("grpc-status", "12"), ("content-type", "application/grpc")],
    )
}
