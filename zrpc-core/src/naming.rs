// MIT License
// Copyright 2023--present zrpc developers

//! Naming convention linking method names to message types.
//!
//! A method `sayHello` is backed by the schemas `SayHelloRequest` and
//! `SayHelloReply`, and is called on the wire as `sayHello`. The generator,
//! the server binder and the client all go through these functions; none of
//! them spell the convention out themselves.

/// Uppercase the first character, leaving the rest untouched.
///
/// Characters without a case mapping pass through unchanged.
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Lowercase the first character, leaving the rest untouched.
pub fn lower_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Message type carrying the arguments of `method`.
pub fn request_type_name(method: &str) -> String {
    format!("{}Request", capitalize(method))
}

/// Message type carrying the result of `method`.
pub fn reply_type_name(method: &str) -> String {
    format!("{}Reply", capitalize(method))
}

/// Name under which the client resolves `method` among the loaded RPCs.
pub fn wire_method_name(method: &str) -> String {
    lower_first(method)
}
