// SPDX-License-Identifier: MPL-2.0

//! Error kinds surfaced by the stream I/O core.
//!
//! Mirrors the `Errno`/`Error` split used throughout the teaching kernel this
//! crate grew out of: a closed set of POSIX-flavored error numbers plus an
//! optional static message for diagnostics. The external syscall-style
//! surface in [`crate::syscall`] narrows this down further, to the bare
//! sentinel integers (`-1`, `NOFILE`, `NOPROC`) that a kernel ABI expects.

use core::fmt;

/// Error numbers relevant to pipes and stream sockets.
///
/// This is a subset of the usual POSIX `errno` space — only the values this
/// subsystem can actually produce.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Errno {
    /// Resource temporarily unavailable (would block with no progress possible).
    EAGAIN = 11,
    /// Out of memory / FCB or SCB allocation failed.
    ENOMEM = 12,
    /// Bad file descriptor.
    EBADF = 9,
    /// No such device or address (bad port).
    ENXIO = 6,
    /// Invalid argument.
    EINVAL = 22,
    /// Broken pipe: write attempted with no reader present.
    EPIPE = 32,
    /// Operation not supported on this socket kind / endpoint.
    EOPNOTSUPP = 95,
    /// Socket is already connected / already listening.
    EISCONN = 106,
    /// Socket is not connected.
    ENOTCONN = 107,
    /// No one is listening on the requested port.
    ECONNREFUSED = 111,
    /// `connect` exceeded its timeout.
    ETIMEDOUT = 110,
    /// Too many open file descriptors.
    EMFILE = 24,
}

impl Errno {
    pub const fn as_str(self) -> &'static str {
        match self {
            Errno::EAGAIN => "resource temporarily unavailable",
            Errno::ENOMEM => "out of memory",
            Errno::EBADF => "bad file descriptor",
            Errno::ENXIO => "no such device or address",
            Errno::EINVAL => "invalid argument",
            Errno::EPIPE => "broken pipe",
            Errno::EOPNOTSUPP => "operation not supported",
            Errno::EISCONN => "socket is already connected",
            Errno::ENOTCONN => "socket is not connected",
            Errno::ECONNREFUSED => "connection refused",
            Errno::ETIMEDOUT => "connection timed out",
            Errno::EMFILE => "too many open files",
        }
    }
}

/// The error type used throughout this crate.
#[derive(Debug, Clone, Copy)]
pub struct Error {
    errno: Errno,
    msg: Option<&'static str>,
}

impl Error {
    pub const fn new(errno: Errno) -> Self {
        Error { errno, msg: None }
    }

    pub const fn with_message(errno: Errno, msg: &'static str) -> Self {
        Error {
            errno,
            msg: Some(msg),
        }
    }

    pub const fn errno(&self) -> Errno {
        self.errno
    }
}

impl From<Errno> for Error {
    fn from(errno: Errno) -> Self {
        Error::new(errno)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.msg {
            Some(msg) => write!(f, "{} ({})", msg, self.errno.as_str()),
            None => write!(f, "{}", self.errno.as_str()),
        }
    }
}

impl std::error::Error for Error {}

/// Crate-local result alias, matching the teacher's `Result<T>` convention.
pub type Result<T> = core::result::Result<T, Error>;

/// Build and return an [`Error`] in one shot, with or without a message.
///
/// ```ignore
/// return_errno_with_message!(Errno::EPIPE, "the reader end is gone");
/// ```
macro_rules! return_errno_with_message {
    ($errno:expr, $msg:expr) => {
        return Err($crate::error::Error::with_message($errno, $msg))
    };
}

macro_rules! return_errno {
    ($errno:expr) => {
        return Err($crate::error::Error::new($errno))
    };
}

pub(crate) use return_errno;
pub(crate) use return_errno_with_message;
