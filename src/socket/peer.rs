// SPDX-License-Identifier: MPL-2.0

//! The Peer payload: the two pipes and the weak back-reference to the paired
//! socket.
//!
//! Grounded on the teacher's `net/socket/unix/stream/{connected,endpoint}.rs`
//! (`Connected { endpoint: Endpoint }`, `Endpoint { reader, writer }`). The
//! back-reference to the paired Peer is a `Weak<Scb>` rather than a raw
//! pointer or index, matching §9's "never a naked owning pointer" guidance.
//! Spec §4.4.7 additionally requires a Peer's close to actively "clear
//! paired peer's back-reference to this SCB" — `take_for_close`/`ClosedPeer`
//! below is that clear, not just the `Weak` failing to upgrade once the
//! paired socket happens to be freed for unrelated reasons.
//!
//! Unlike an anonymous pipe's FCB, which owns a [`crate::pipe::PipeReader`]/
//! [`crate::pipe::PipeWriter`] whose `Drop` closes the endpoint, a Peer's
//! pipe halves are held as the bare shared buffer (`Arc<PipeShared>`) so that
//! `Scb::read`/`Scb::write` can clone the reference, release the SCB lock,
//! and only then block on the pipe — the SCB lock must never be held across
//! a blocking pipe wait, or a concurrent `shutdown`/`close` on the same
//! socket would deadlock against it.

use std::sync::{Arc, Weak};

use crate::pipe::PipeShared;
use crate::socket::Scb;

pub(crate) struct PeerPayload {
    pub(crate) peer: Option<Weak<Scb>>,
    pub(crate) read_pipe: Option<Arc<PipeShared>>,
    pub(crate) write_pipe: Option<Arc<PipeShared>>,
}

impl PeerPayload {
    pub(crate) fn new(
        peer: Weak<Scb>,
        read_pipe: Arc<PipeShared>,
        write_pipe: Arc<PipeShared>,
    ) -> Self {
        PeerPayload {
            peer: Some(peer),
            read_pipe: Some(read_pipe),
            write_pipe: Some(write_pipe),
        }
    }

    /// Takes both pipe halves and the back-reference to the paired socket,
    /// leaving the payload empty. Returning them rather than acting on them
    /// directly lets the caller (`Scb::close`) release its own state lock
    /// before reaching into the paired `Scb` to clear its back-reference
    /// (spec §4.4.7) — doing that reach-in while still holding this socket's
    /// lock would deadlock against a concurrent close of the paired socket
    /// doing the same thing in the other direction.
    pub(crate) fn take_for_close(&mut self) -> ClosedPeer {
        ClosedPeer {
            peer: self.peer.take(),
            read_pipe: self.read_pipe.take(),
            write_pipe: self.write_pipe.take(),
        }
    }
}

/// The pieces of a [`PeerPayload`] pulled out by `take_for_close`, ready for
/// the caller to tear down once it no longer holds this socket's state lock.
pub(crate) struct ClosedPeer {
    pub(crate) peer: Option<Weak<Scb>>,
    pub(crate) read_pipe: Option<Arc<PipeShared>>,
    pub(crate) write_pipe: Option<Arc<PipeShared>>,
}

impl ClosedPeer {
    /// Closes whichever pipe halves were present and clears the paired
    /// socket's back-reference to us, if the pair is still alive.
    pub(crate) fn finish(self) {
        if let Some(weak) = self.peer {
            if let Some(paired) = weak.upgrade() {
                paired.clear_peer();
            }
        }
        if let Some(read_pipe) = self.read_pipe {
            read_pipe.close_reader();
        }
        if let Some(write_pipe) = self.write_pipe {
            write_pipe.close_writer();
        }
    }
}
