// SPDX-License-Identifier: MPL-2.0

//! Tunables for the stream I/O core.
//!
//! The teacher hard-codes these as bare `const`s (`DEFAULT_PIPE_BUF_SIZE` and
//! friends). This crate threads them through a `Limits` value instead, so an
//! embedder can size the subsystem per instance rather than at compile time —
//! the standalone-crate stand-in for the teacher's boot-cmdline-configured
//! components.

use std::time::Duration;

/// Default pipe capacity, matching the teacher's `PAGE_SIZE`-class default.
pub const DEFAULT_PIPE_CAPACITY: usize = 4096;

/// Default highest bindable port number.
pub const DEFAULT_MAX_PORT: u16 = 1024;

/// Default per-listener backlog depth.
pub const DEFAULT_BACKLOG: usize = 16;

/// Default `connect` timeout when the caller doesn't specify one.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Default cap on simultaneously open descriptors per [`crate::process::Process`].
pub const DEFAULT_MAX_FILES: usize = 256;

/// Sizing and timing knobs for a stream I/O subsystem instance.
///
/// Construct with [`Limits::default`] and adjust with the `with_*` builder
/// methods; every field has a sensible default so partially-configured
/// instances remain valid.
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    pub(crate) pipe_capacity: usize,
    pub(crate) max_port: u16,
    pub(crate) backlog: usize,
    pub(crate) default_connect_timeout: Duration,
    pub(crate) max_files: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            pipe_capacity: DEFAULT_PIPE_CAPACITY,
            max_port: DEFAULT_MAX_PORT,
            backlog: DEFAULT_BACKLOG,
            default_connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            max_files: DEFAULT_MAX_FILES,
        }
    }
}

impl Limits {
    pub fn with_pipe_capacity(mut self, capacity: usize) -> Self {
        self.pipe_capacity = capacity;
        self
    }

    pub fn with_max_port(mut self, max_port: u16) -> Self {
        self.max_port = max_port;
        self
    }

    pub fn with_backlog(mut self, backlog: usize) -> Self {
        self.backlog = backlog;
        self
    }

    pub fn with_default_connect_timeout(mut self, timeout: Duration) -> Self {
        self.default_connect_timeout = timeout;
        self
    }

    pub fn with_max_files(mut self, max_files: usize) -> Self {
        self.max_files = max_files;
        self
    }

    pub fn pipe_capacity(&self) -> usize {
        self.pipe_capacity
    }

    pub fn max_port(&self) -> u16 {
        self.max_port
    }

    pub fn backlog(&self) -> usize {
        self.backlog
    }

    pub fn default_connect_timeout(&self) -> Duration {
        self.default_connect_timeout
    }

    pub fn max_files(&self) -> usize {
        self.max_files
    }
}
