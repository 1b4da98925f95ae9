// SPDX-License-Identifier: MPL-2.0

//! The stream-operations contract every stream kind satisfies.
//!
//! Grounded on the teacher's `FileLike` trait (`fs/pipe.rs`,
//! `net/socket/unix/stream/socket.rs`): a single polymorphic interface that
//! the FCB table dispatches through, so pipes and sockets are otherwise
//! indistinguishable to generic `read`/`write`/`close` callers. `open` is
//! deliberately not part of this trait — it exists in the source only for
//! device-table streams, and pipes/sockets are always built by direct
//! constructors (`Pipe::create`, `Scb::new_unbound`), never via `open`.
//!
//! Asymmetric endpoints (a pipe reader has no meaningful `write`) are
//! rejecting slots implemented as default trait methods rather than function
//! pointers that could be mismatched — the sum-type alternative the design
//! favors over the source's type-punned vtables.

use std::sync::Arc;

use crate::error::{return_errno_with_message, Errno, Result};
use crate::socket::Scb;

/// Polymorphic stream object installed behind an FCB slot.
pub trait StreamOps: Send + Sync {
    /// Reads up to `buf.len()` bytes. Returns the number of bytes copied
    /// (`≥1` on progress), `0` on end-of-data, or an error. May block.
    fn read(&self, buf: &mut [u8]) -> Result<usize> {
        let _ = buf;
        return_errno_with_message!(Errno::EOPNOTSUPP, "stream does not support read");
    }

    /// Writes up to `buf.len()` bytes. Returns the number of bytes copied
    /// (`≥1` on progress) or an error. May block.
    fn write(&self, buf: &[u8]) -> Result<usize> {
        let _ = buf;
        return_errno_with_message!(Errno::EOPNOTSUPP, "stream does not support write");
    }

    /// Closes the stream. The stream object must be considered destroyed
    /// once this returns, even if it returns an error.
    fn close(&self) -> Result<()>;

    /// Downcasts to the socket-specific control block, for the handful of
    /// operations (`listen`, `connect`, `accept`, `shutdown`) that aren't
    /// part of the generic read/write/close contract. Mirrors the teacher's
    /// `FileLike::as_socket`.
    fn as_socket(self: Arc<Self>) -> Option<Arc<Scb>> {
        None
    }
}
