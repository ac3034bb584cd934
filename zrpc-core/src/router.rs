// MIT License
// Copyright 2023--present zrpc developers

//! The single description both ends are derived from.
//!
//! A [`Router`] pairs named [`Schema`]s with named [`Service`]s. Each service
//! maps method names to a [`Handler`] (server side) or to nothing (client
//! side, see [`Service::declare`]). Maps keep insertion order so that the
//! generated IDL is a deterministic function of how the router was built.
//!
//! For every method `m` of every service, the router is expected to hold the
//! object schemas named by [`request_type_name`](crate::naming::request_type_name)
//! and [`reply_type_name`](crate::naming::reply_type_name). Nothing here
//! enforces that; a broken router fails when its IDL is loaded.
//!
//! ```
//! use serde_json::json;
//! use zrpc_core::{Router, Schema, Service};
//!
//! let router = Router::new()
//!     .schema("SayHelloRequest", Schema::object([("name", Schema::string())]))
//!     .schema("SayHelloReply", Schema::object([("message", Schema::string())]))
//!     .service(
//!         "greeter",
//!         Service::new().method("sayHello", |input| async move {
//!             Ok(json!({ "message": format!("Hello, {}!", input["name"].as_str().unwrap_or_default()) }))
//!         }),
//!     );
//! assert!(router.request_schema("sayHello").is_some());
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::naming::{reply_type_name, request_type_name};
use crate::schema::Schema;

/// Future returned by a [`Handler`].
pub type HandlerFuture = BoxFuture<'static, anyhow::Result<Value>>;

/// Type-erased asynchronous method implementation.
///
/// The handler receives the request after validation and returns the reply
/// as JSON. Any error it returns is logged and reported to the caller as an
/// internal failure.
pub type Handler = Arc<dyn Fn(Value) -> HandlerFuture + Send + Sync>;

/// Method table of one service.
#[derive(Clone, Default)]
pub struct Service {
    methods: IndexMap<String, Option<Handler>>,
}

impl Service {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name` with an untyped JSON handler.
    pub fn method<F, Fut>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        let handler: Handler = Arc::new(move |input| f(input).boxed());
        self.methods.insert(name.into(), Some(handler));
        self
    }

    /// Register `name` with a handler over concrete types.
    ///
    /// The validated request is deserialised into `I`; the returned `O` is
    /// serialised back to JSON. Conversion failures count as handler errors.
    pub fn typed_method<I, O, F, Fut>(self, name: impl Into<String>, f: F) -> Self
    where
        I: DeserializeOwned + Send + 'static,
        O: Serialize + 'static,
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<O>> + Send + 'static,
    {
        let f = Arc::new(f);
        self.method(name, move |input| {
            let f = Arc::clone(&f);
            async move {
                let input: I = serde_json::from_value(input)?;
                let output = f(input).await?;
                Ok(serde_json::to_value(output)?)
            }
        })
    }

    /// Declare `name` without an implementation.
    ///
    /// Clients only need the method names; a server answers declared but
    /// unimplemented methods with `UNIMPLEMENTED`.
    pub fn declare(mut self, name: impl Into<String>) -> Self {
        self.methods.insert(name.into(), None);
        self
    }

    /// Method names in declaration order.
    pub fn methods(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    pub fn contains(&self, method: &str) -> bool {
        self.methods.contains_key(method)
    }

    pub fn handler(&self, method: &str) -> Option<&Handler> {
        self.methods.get(method).and_then(Option::as_ref)
    }

    /// `(method, handler)` pairs in declaration order.
    pub fn handlers(&self) -> impl Iterator<Item = (&str, Option<&Handler>)> {
        self.methods
            .iter()
            .map(|(name, handler)| (name.as_str(), handler.as_ref()))
    }
}

impl fmt::Debug for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.methods
                    .iter()
                    .map(|(name, handler)| (name, if handler.is_some() { "handler" } else { "declared" })),
            )
            .finish()
    }
}

/// Named schemas plus named services.
#[derive(Clone, Default, Debug)]
pub struct Router {
    schemas: IndexMap<String, Schema>,
    services: IndexMap<String, Service>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a named schema.
    pub fn schema(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.schemas.insert(name.into(), schema);
        self
    }

    /// Add (or replace) a named service.
    pub fn service(mut self, name: impl Into<String>, service: Service) -> Self {
        self.services.insert(name.into(), service);
        self
    }

    /// Schemas in insertion order.
    pub fn schemas(&self) -> impl Iterator<Item = (&str, &Schema)> {
        self.schemas.iter().map(|(name, schema)| (name.as_str(), schema))
    }

    /// Services in insertion order.
    pub fn services(&self) -> impl Iterator<Item = (&str, &Service)> {
        self.services
            .iter()
            .map(|(name, service)| (name.as_str(), service))
    }

    pub fn get_schema(&self, name: &str) -> Option<&Schema> {
        self.schemas.get(name)
    }

    pub fn get_service(&self, name: &str) -> Option<&Service> {
        self.services.get(name)
    }

    /// Schema validating the arguments of `method`.
    pub fn request_schema(&self, method: &str) -> Option<&Schema> {
        self.get_schema(&request_type_name(method))
    }

    /// Schema describing the result of `method`.
    pub fn reply_schema(&self, method: &str) -> Option<&Schema> {
        self.get_schema(&reply_type_name(method))
    }
}
