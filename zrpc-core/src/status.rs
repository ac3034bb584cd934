// MIT License
// Copyright 2023--present zrpc developers

//! Error handling.
//!
//! Two error domains meet here:
//!
//! 1. **[`Error`]**: what the library returns to Rust callers. Configuration
//!    problems (`bind`/`connect`), local validation failures (client), codec
//!    failures and transport failures (client) each have their own variant.
//!    [`Error::code`] places every variant on the gRPC status scale.
//!
//! 2. **[`tonic::Status`]**: what the server sends back over the wire. Only
//!    two outcomes are produced by the dispatch layer itself:
//!    [`invalid_request`] (`INVALID_ARGUMENT`, with a readable summary of the
//!    validation issues) and [`internal_failure`] (`INTERNAL`, with a fixed
//!    message so that handler internals never leak to callers).
//!
//! ## Usage
//!
//! ```no_run
//! # async fn demo(client: zrpc_core::ZrpcClient) {
//! use serde_json::json;
//! use zrpc_core::Error;
//!
//! match client.call("greeter", "sayHello", json!({ "name": 12345 })).await {
//!     Err(Error::Validation(err)) => eprintln!("rejected locally: {:?}", err.issues()),
//!     Err(Error::Transport(status)) => eprintln!("server said {}", status.code()),
//!     Err(other) => eprintln!("{other}"),
//!     Ok(reply) => println!("{reply}"),
//! }
//! # }
//! ```

use thiserror::Error;
use tonic::{Code, Status};

use crate::schema::ValidationError;

/// Message sent with every `INTERNAL` status produced by the server.
pub const INTERNAL_MESSAGE: &str = "An internal server error occurred.";

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// The generated IDL could not be compiled.
    #[error("failed to load generated IDL: {0}")]
    Load(#[from] protox::Error),

    /// Writing or removing the scratch IDL file failed.
    #[error("scratch IDL file: {0}")]
    Io(#[from] std::io::Error),

    #[error("service '{0}' could not be found in the loaded descriptors")]
    MissingService(String),

    #[error("schema '{schema}' not found for method '{method}'")]
    MissingSchema { schema: String, method: String },

    #[error("method '{method}' could not be found in loaded service '{service}'")]
    MissingMethod { service: String, method: String },

    #[error("unknown service '{0}'")]
    UnknownService(String),

    #[error("unknown method '{method}' on service '{service}'")]
    UnknownMethod { service: String, method: String },

    #[error("invalid address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    /// Input rejected before any network activity.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("failed to encode '{message}': {reason}")]
    Encode { message: String, reason: String },

    #[error("failed to decode '{message}': {reason}")]
    Decode { message: String, reason: String },

    /// Status returned by the remote end, unmodified.
    #[error("transport error: {0}")]
    Transport(#[from] Status),
}

impl Error {
    /// gRPC status code describing this error.
    pub fn code(&self) -> Code {
        match self {
            Error::Validation(_) => Code::InvalidArgument,
            Error::Load(_)
            | Error::MissingService(_)
            | Error::MissingSchema { .. }
            | Error::MissingMethod { .. }
            | Error::InvalidAddress { .. } => Code::FailedPrecondition,
            Error::UnknownService(_) | Error::UnknownMethod { .. } => Code::NotFound,
            Error::Io(_) | Error::Encode { .. } | Error::Decode { .. } => Code::Internal,
            Error::Transport(status) => status.code(),
        }
    }

    /// Validation issues, when this is a local validation failure.
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            Error::Validation(err) => Some(err),
            _ => None,
        }
    }

    /// The remote status, when this is a transport failure.
    pub fn status(&self) -> Option<&Status> {
        match self {
            Error::Transport(status) => Some(status),
            _ => None,
        }
    }
}

/// `INVALID_ARGUMENT` carrying `Invalid request: <issue messages>`.
pub fn invalid_request(err: &ValidationError) -> Status {
    Status::invalid_argument(format!("Invalid request: {}", err.summary()))
}

/// `INTERNAL` with the generic [`INTERNAL_MESSAGE`].
pub fn internal_failure() -> Status {
    Status::internal(INTERNAL_MESSAGE)
}
