// SPDX-License-Identifier: MPL-2.0

//! The Listener payload: a FIFO of pending [`ConnectionRequest`]s plus the
//! `req_available` condition variable accepters wait on.
//!
//! Grounded on the teacher's `net/socket/unix/stream/listener.rs` `Backlog`
//! (`incoming_conns: Mutex<VecDeque<Connected>>` + `Pollee`); this crate
//! replaces the event-poll wakeup with a direct condition variable since
//! `accept` blocks synchronously rather than registering for a pollable
//! event.

use std::collections::VecDeque;
use std::sync::Arc;

use log::trace;

use crate::port::Port;
use crate::sched::CondVar;
use crate::socket::request::ConnectionRequest;

pub(crate) struct ListenerPayload {
    pub(crate) port: Port,
    pub(crate) queue: std::sync::Mutex<VecDeque<Arc<ConnectionRequest>>>,
    pub(crate) req_available: CondVar,
}

impl ListenerPayload {
    pub(crate) fn new(port: Port, backlog_hint: usize) -> Arc<Self> {
        Arc::new(ListenerPayload {
            port,
            queue: std::sync::Mutex::new(VecDeque::with_capacity(backlog_hint)),
            req_available: CondVar::new(),
        })
    }

    pub(crate) fn enqueue(&self, request: Arc<ConnectionRequest>) {
        self.queue.lock().unwrap().push_back(request);
        self.req_available.broadcast();
    }

    /// Removes `request` from the queue by identity, if it's still there —
    /// used by `connect`'s timeout path.
    pub(crate) fn remove(&self, request: &Arc<ConnectionRequest>) {
        let mut queue = self.queue.lock().unwrap();
        queue.retain(|queued| !Arc::ptr_eq(queued, request));
    }

    /// Drains the queue, marking every still-pending request abandoned, and
    /// wakes any blocked accepters. Called from the Listener's close path.
    pub(crate) fn close(&self) {
        let drained: Vec<_> = self.queue.lock().unwrap().drain(..).collect();
        trace!("listener on port {}: abandoning {} queued request(s)", self.port, drained.len());
        for request in drained {
            request.abandon();
        }
        self.req_available.broadcast();
    }
}
