// SPDX-License-Identifier: MPL-2.0

//! The port map: a fixed-size table indexing Listener sockets by port.
//!
//! Grounded on the teacher's `net/socket/unix/stream/listener.rs`
//! `BacklogTable`/`BACKLOG_TABLE` (a global table keyed by bound address),
//! re-keyed here by small integer port instead of filesystem address, per
//! spec §4.3. One departure from the teacher: `BACKLOG_TABLE` is a lazily
//! initialized global `static`; this crate instead has the embedder
//! construct a [`PortMap`] explicitly and share it (as an `Arc`) among
//! however many [`crate::process::Process`] instances exist, which avoids a
//! process-wide mutable global in a library that may be embedded more than
//! once (e.g. once per test).

use std::sync::{Mutex, Weak};

use crate::error::{return_errno, Errno, Result};
use crate::socket::Scb;

/// A port number. `0` ([`NOPORT`]) is reserved and never bindable.
pub type Port = u16;

/// The reserved, unbindable port value — legal only on an Unbound socket.
pub const NOPORT: Port = 0;

/// Process-wide table mapping `[1, max_port]` to a Listener socket.
///
/// Holds only a [`Weak`] reference to each Listener: the map does not own the
/// socket's lifetime, matching I-3/§3.3 ("referenced by the PortMap entry,
/// non-owning"). Once a Listener's strong references are all gone the weak
/// reference simply stops upgrading — there is no separate "clear on free"
/// bookkeeping to get wrong.
pub struct PortMap {
    max_port: Port,
    slots: Mutex<Vec<Option<Weak<Scb>>>>,
}

impl PortMap {
    pub fn new(max_port: Port) -> Self {
        let mut slots = Vec::with_capacity(max_port as usize + 1);
        slots.resize_with(max_port as usize + 1, || None);
        PortMap {
            max_port,
            slots: Mutex::new(slots),
        }
    }

    pub(crate) fn max_port(&self) -> Port {
        self.max_port
    }

    pub(crate) fn in_range(&self, port: Port) -> bool {
        port >= 1 && port <= self.max_port
    }

    /// Whether `port` already has a live Listener bound to it. Used by
    /// `listen()` to check slot occupancy ahead of the range/kind checks,
    /// without yet committing to a bind. Out-of-range ports are never
    /// occupied.
    pub(crate) fn is_occupied(&self, port: Port) -> bool {
        if !self.in_range(port) {
            return false;
        }
        let slots = self.slots.lock().unwrap();
        slots[port as usize]
            .as_ref()
            .map(|weak| weak.upgrade().is_some())
            .unwrap_or(false)
    }

    /// Publishes `listener` at `port`. Fails if the slot is already taken.
    pub(crate) fn bind(&self, port: Port, listener: &std::sync::Arc<Scb>) -> Result<()> {
        if !self.in_range(port) {
            return_errno!(Errno::EINVAL);
        }
        let mut slots = self.slots.lock().unwrap();
        let slot = &mut slots[port as usize];
        if slot.as_ref().map(|w| w.upgrade().is_some()).unwrap_or(false) {
            return_errno!(Errno::EINVAL);
        }
        *slot = Some(std::sync::Arc::downgrade(listener));
        Ok(())
    }

    /// Looks up the live Listener bound to `port`, if any.
    pub(crate) fn lookup(&self, port: Port) -> Option<std::sync::Arc<Scb>> {
        if !self.in_range(port) {
            return None;
        }
        let slots = self.slots.lock().unwrap();
        slots[port as usize].as_ref().and_then(Weak::upgrade)
    }

    /// Clears the slot at `port`, but only if it still refers to `listener` —
    /// guards against a stale close racing a fresh `listen()` on the same
    /// port.
    pub(crate) fn clear_if(&self, port: Port, listener: &std::sync::Arc<Scb>) {
        if port == NOPORT {
            return;
        }
        let mut slots = self.slots.lock().unwrap();
        if let Some(idx) = slots.get_mut(port as usize) {
            let matches = idx
                .as_ref()
                .map(|weak| std::ptr::eq(weak.as_ptr(), std::sync::Arc::as_ptr(listener)))
                .unwrap_or(false);
            if matches {
                *idx = None;
            }
        }
    }
}
