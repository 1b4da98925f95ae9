// SPDX-License-Identifier: MPL-2.0

//! A pending connection request: one per in-flight `connect`, queued on the
//! target Listener until an `accept` admits it, the requester's timeout
//! expires, or the Listener closes out from under it.

use std::sync::{Arc, Mutex};

use crate::sched::CondVar;
use crate::socket::Scb;

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub(crate) enum ReqState {
    Pending,
    Admitted,
    /// The Listener closed while this request was still queued.
    Abandoned,
}

pub(crate) struct ConnectionRequest {
    /// The Unbound socket that will become a Peer once admitted.
    pub(crate) requester: Arc<Scb>,
    pub(crate) state: Mutex<ReqState>,
    pub(crate) connected_cv: CondVar,
}

impl ConnectionRequest {
    pub(crate) fn new(requester: Arc<Scb>) -> Arc<Self> {
        Arc::new(ConnectionRequest {
            requester,
            state: Mutex::new(ReqState::Pending),
            connected_cv: CondVar::new(),
        })
    }

    /// Marks this request admitted and wakes the waiting connector.
    pub(crate) fn admit(&self) {
        let mut state = self.state.lock().unwrap();
        *state = ReqState::Admitted;
        drop(state);
        self.connected_cv.broadcast();
    }

    /// Marks this request abandoned (its Listener closed) and wakes the
    /// waiting connector.
    pub(crate) fn abandon(&self) {
        let mut state = self.state.lock().unwrap();
        if *state == ReqState::Pending {
            *state = ReqState::Abandoned;
        }
        drop(state);
        self.connected_cv.broadcast();
    }
}
