// MIT License
// Copyright 2023--present zrpc developers

//! Hand the generated IDL to the compiler.
//!
//! `protox` resolves files through include paths, so the document is written
//! to a uniquely named scratch file first. The file is a
//! [`tempfile::NamedTempFile`]: it is removed when it goes out of scope,
//! whether compilation succeeded or not.

use std::io::Write;

use prost_reflect::DescriptorPool;
use tracing::debug;

use crate::config::Config;
use crate::status::Result;

/// Compile `idl` into a descriptor pool via a scratch file named
/// `<prefix><random>.proto` inside `config.scratch_dir`.
pub fn load(idl: &str, config: &Config, prefix: &str) -> Result<DescriptorPool> {
    // protox matches opened files against include paths literally, so a
    // relative scratch dir must be made absolute on both sides.
    let dir = std::fs::canonicalize(&config.scratch_dir)?;
    let mut scratch = tempfile::Builder::new()
        .prefix(prefix)
        .suffix(".proto")
        .tempfile_in(&dir)?;
    scratch.write_all(idl.as_bytes())?;
    scratch.flush()?;
    debug!(path = %scratch.path().display(), "wrote scratch IDL");

    let mut compiler = protox::Compiler::new([&dir])?;
    compiler.include_imports(true);
    compiler.open_file(scratch.path())?;
    Ok(compiler.descriptor_pool())
}
