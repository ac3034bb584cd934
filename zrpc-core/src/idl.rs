// MIT License
// Copyright 2023--present zrpc developers

//! Router → proto3 interface definition.
//!
//! [`generate`] is a pure function of the [`Router`]: the same router always
//! yields the same document, byte for byte. Server and client each call it on
//! their own copy of the router and must end up with the same wire contract.
//!
//! ## Layout
//!
//! ```text
//! syntax = "proto3";
//!
//! package zrpc;
//!
//! message SayHelloRequest {
//!   string name = 1;
//! }
//!
//! service greeter {
//!   rpc sayHello (SayHelloRequest) returns (SayHelloReply);
//! }
//! ```
//!
//! Only object schemas become messages. Fields are numbered by position, so
//! reordering the fields of a schema changes the wire layout. Field types come
//! from [`WireScalar::for_schema`]; composite field schemas are written as
//! `string`.
//!
//! RPC declarations reference `<Method>Request` / `<Method>Reply` whether or
//! not the router defines them. Dangling references are reported by the
//! loader, not here.

use crate::naming::{reply_type_name, request_type_name};
use crate::router::Router;
use crate::schema::{Schema, SchemaKind};

/// Package every generated document declares.
pub const PACKAGE: &str = "zrpc";

/// Scalar field types the generator emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireScalar {
    String,
    Double,
    Bool,
}

impl WireScalar {
    /// Mapping table from schema classification to wire type.
    pub fn for_kind(kind: SchemaKind) -> Self {
        match kind {
            SchemaKind::String => WireScalar::String,
            SchemaKind::Number => WireScalar::Double,
            SchemaKind::Boolean => WireScalar::Bool,
            SchemaKind::Object | SchemaKind::Other => WireScalar::String,
        }
    }

    pub fn for_schema(schema: &Schema) -> Self {
        Self::for_kind(schema.kind())
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WireScalar::String => "string",
            WireScalar::Double => "double",
            WireScalar::Bool => "bool",
        }
    }
}

/// Fully qualified name of a generated service, e.g. `zrpc.greeter`.
pub fn qualified_name(service: &str) -> String {
    format!("{PACKAGE}.{service}")
}

/// Render the proto3 document describing `router`.
pub fn generate(router: &Router) -> String {
    let mut out = String::new();
    out.push_str("syntax = \"proto3\";\n\n");
    out.push_str(&format!("package {PACKAGE};\n\n"));

    for (name, schema) in router.schemas() {
        let Some(fields) = schema.fields() else {
            continue;
        };
        out.push_str(&format!("message {name} {{\n"));
        for (number, (field, field_schema)) in (1..).zip(fields) {
            out.push_str(&format!(
                "  {} {field} = {number};\n",
                WireScalar::for_schema(field_schema).as_str()
            ));
        }
        out.push_str("}\n\n");
    }

    for (name, service) in router.services() {
        out.push_str(&format!("service {name} {{\n"));
        for method in service.methods() {
            out.push_str(&format!(
                "  rpc {method} ({}) returns ({});\n",
                request_type_name(method),
                reply_type_name(method)
            ));
        }
        out.push_str("}\n\n");
    }

    out
}
