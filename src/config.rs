//! Centralized configuration for pointfile.
//!
//! Goals:
//! - Single place to collect tunables instead of scattering env lookups.
//! - PtConfig::from_env() reads PT_* variables; with_* setters override them.
//!
//! Defaults:
//! - fsync = true (catalog writes are synced before flush/close returns)
//! - lock_wait = false (a held file lock fails fast with Locked)
//! - max_name_len = 255 bytes

use std::fmt;

use crate::consts::{DEFAULT_MAX_NAME_LEN, HARD_MAX_NAME_LEN};

fn env_flag(v: &str) -> bool {
    let s = v.trim().to_ascii_lowercase();
    s == "1" || s == "true" || s == "on" || s == "yes"
}

/// Top-level configuration for a [`crate::PointLib`].
#[derive(Clone, Debug)]
pub struct PtConfig {
    /// fsync the container after every catalog write.
    /// Env: PT_FSYNC (default true; "1|true|on|yes" => true)
    pub fsync: bool,

    /// Block until a conflicting advisory lock is released instead of failing.
    /// Env: PT_LOCK_WAIT (default false)
    pub lock_wait: bool,

    /// Maximum point name length in bytes (clamped to u16::MAX).
    /// Env: PT_MAX_NAME_LEN (default 255)
    pub max_name_len: usize,
}

impl Default for PtConfig {
    fn default() -> Self {
        Self {
            fsync: true,
            lock_wait: false,
            max_name_len: DEFAULT_MAX_NAME_LEN,
        }
    }
}

impl PtConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("PT_FSYNC") {
            cfg.fsync = env_flag(&v);
        }

        if let Ok(v) = std::env::var("PT_LOCK_WAIT") {
            cfg.lock_wait = env_flag(&v);
        }

        if let Ok(v) = std::env::var("PT_MAX_NAME_LEN") {
            if let Ok(n) = v.trim().parse::<usize>() {
                cfg.max_name_len = n.clamp(1, HARD_MAX_NAME_LEN);
            }
        }

        cfg
    }

    pub fn with_fsync(mut self, on: bool) -> Self {
        self.fsync = on;
        self
    }

    pub fn with_lock_wait(mut self, on: bool) -> Self {
        self.lock_wait = on;
        self
    }

    pub fn with_max_name_len(mut self, n: usize) -> Self {
        self.max_name_len = n.clamp(1, HARD_MAX_NAME_LEN);
        self
    }

    /// Finish the builder and obtain the configuration.
    pub fn build(self) -> Self {
        self
    }
}

impl fmt::Display for PtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PtConfig {{ fsync: {}, lock_wait: {}, max_name_len: {} }}",
            self.fsync, self.lock_wait, self.max_name_len,
        )
    }
}
