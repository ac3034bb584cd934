// MIT License
// Copyright 2023--present zrpc developers

//! Runtime configuration shared by the server binder and the client factory.
//!
//! | Setting | Default | Environment |
//! |---------|---------|-------------|
//! | `scratch_dir` | `std::env::temp_dir()` | `ZRPC_SCRATCH_DIR` |
//! | `nodelay` | `true` | |

use std::ffi::OsString;
use std::path::PathBuf;

/// Environment variable overriding [`Config::scratch_dir`].
pub const SCRATCH_DIR_ENV: &str = "ZRPC_SCRATCH_DIR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory receiving the transient IDL files handed to the loader.
    pub scratch_dir: PathBuf,
    /// Set `TCP_NODELAY` on accepted and outbound connections.
    pub nodelay: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scratch_dir: std::env::temp_dir(),
            nodelay: true,
        }
    }
}

impl Config {
    /// Defaults, overridden by `ZRPC_SCRATCH_DIR` when it is set and non-empty.
    pub fn from_env() -> Self {
        Self::default().with_overrides(std::env::var_os(SCRATCH_DIR_ENV))
    }

    fn with_overrides(mut self, scratch_dir: Option<OsString>) -> Self {
        if let Some(dir) = scratch_dir.filter(|dir| !dir.is_empty()) {
            self.scratch_dir = PathBuf::from(dir);
        }
        self
    }

    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = dir.into();
        self
    }

    pub fn with_nodelay(mut self, nodelay: bool) -> Self {
        self.nodelay = nodelay;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.scratch_dir, std::env::temp_dir());
        assert!(config.nodelay);
    }

    #[test]
    fn env_override_applies_when_non_empty() {
        let config = Config::default().with_overrides(Some("/var/zrpc".into()));
        assert_eq!(config.scratch_dir, PathBuf::from("/var/zrpc"));

        let config = Config::default().with_overrides(Some(OsString::new()));
        assert_eq!(config.scratch_dir, std::env::temp_dir());

        let config = Config::default().with_overrides(None);
        assert_eq!(config, Config::default());
    }

    #[test]
    fn builders() {
        let config = Config::default()
            .with_scratch_dir("/scratch")
            .with_nodelay(false);
        assert_eq!(config.scratch_dir, PathBuf::from("/scratch"));
        assert!(!config.nodelay);
    }
}
