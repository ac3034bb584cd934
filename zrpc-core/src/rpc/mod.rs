// MIT License
// Copyright 2023--present zrpc developers

//! gRPC plumbing for routers.
//!
//! Both ends follow the same setup: [`idl::generate`](crate::idl::generate)
//! renders the router, the [`loader`] writes the document to a scratch file and
//! compiles it into a `prost_reflect::DescriptorPool`, and the services of the
//! `zrpc` package are looked up by name. Messages travel as
//! `prost_reflect::DynamicMessage` through the [`codec`]; handlers and callers
//! see them as JSON.
//!
//! ## Server
//!
//! [`server::ZrpcServer::bind`] installs one route per implemented method.
//! Each route decodes the request, validates it against the method's request
//! schema, runs the handler and encodes the reply. Validation failures become
//! `INVALID_ARGUMENT`; handler failures become `INTERNAL`.
//!
//! ## Client
//!
//! [`client::ZrpcClient::connect`] returns a proxy with one
//! [`client::ServiceClient`] per service. A call validates its input locally
//! and only then touches the network; the reply is returned as received.

pub mod client;
pub mod codec;
pub mod loader;
pub mod server;
