// MIT License
// Copyright 2023--present zrpc developers

//! Describe RPC services once, derive both ends from the description.
//!
//! A [`Router`] names a set of validation [`Schema`]s and a set of services,
//! each a table of methods. From that single value the crate derives:
//!
//! - a proto3 interface definition ([`idl::generate`]),
//! - a gRPC server that validates every request before it reaches a handler
//!   ([`ZrpcServer`]),
//! - a client proxy that validates every request before it leaves the process
//!   ([`ZrpcClient`]).
//!
//! Method `sayHello` is backed by schemas `SayHelloRequest` and
//! `SayHelloReply` (see [`naming`]).
//!
//! ## Modules
//!
//! - [`schema`]: schema nodes, classification and parsing.
//! - [`naming`]: the method ↔ message-type naming convention.
//! - [`idl`]: the router → proto3 generator and its scalar mapping table.
//! - [`router`]: [`Router`] and [`Service`].
//! - [`config`]: scratch directory and socket options.
//! - [`status`]: [`Error`] and the wire statuses produced by the server.
//! - [`rpc`]: IDL loading, the dynamic codec, server and client.
//!
//! ## Limitations
//!
//! Message fields are flat scalars. Array, enum, optional, union and nested
//! object fields are declared on the wire as `string`.

pub mod config;
pub mod idl;
pub mod naming;
pub mod router;
pub mod rpc;
pub mod schema;
pub mod status;

pub use config::Config;
pub use router::{Handler, Router, Service};
pub use rpc::client::{ServiceClient, ZrpcClient};
pub use rpc::server::ZrpcServer;
pub use schema::{Issue, IssueCode, Schema, SchemaKind, ValidationError};
pub use status::{Error, Result};
