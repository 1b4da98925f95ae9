// SPDX-License-Identifier: MPL-2.0

//! The socket core: a tagged-union Socket Control Block (SCB) layering
//! connection-oriented stream sockets on top of [`crate::pipe`].
//!
//! Grounded on the teacher's `net/socket/unix/stream/{socket,init,listener,
//! connected,endpoint}.rs`: `UnixStreamSocket` holding `state: RwLock<State>`
//! where `State` is `Init(Arc<Init>) | Listen(Arc<Listener>) |
//! Connected(Arc<Connected>)`. This crate's [`ScbState`] is the same shape
//! (`Unbound | Listener | Peer`), renamed to match spec vocabulary, with
//! `kernel_socket.c` (`examples/original_source/`) used to resolve the exact
//! gate-check ordering and refcount bookkeeping spec.md leaves informal.
//!
//! SCB lifetime is `Arc<Scb>` strong-count, not a hand-rolled integer: every
//! "increment the refcount" step in spec.md §4.5 corresponds to holding an
//! `Arc` clone (the owning FCB's `SocketHandle`, a blocked `accept`'s local
//! variable, a queued `ConnectionRequest`'s `requester` field), and "free at
//! zero" is simply the last `Arc` dropping. This sidesteps the exact bug
//! class §9 calls out in the source (ad-hoc refcount bumps that are easy to
//! double-decrement on an error path).

mod listener;
mod peer;
mod request;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, trace, warn};

use crate::error::{return_errno, return_errno_with_message, Errno, Error, Result};
use crate::fcb::{FcbTable, Fid};
use crate::limits::DEFAULT_PIPE_CAPACITY;
use crate::pipe::PipeShared;
use crate::port::{Port, PortMap, NOPORT};
use crate::sched::Deadline;
use crate::stream::StreamOps;

use listener::ListenerPayload;
use peer::PeerPayload;
use request::{ConnectionRequest, ReqState};

/// Which half(s) of a Peer connection to shut down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownHow {
    Read = 1,
    Write = 2,
    Both = 3,
}

enum ScbState {
    Unbound,
    Listener(Arc<ListenerPayload>),
    Peer(PeerPayload),
}

/// The Socket Control Block. Opaque to callers outside this crate — all
/// socket operations are reached through [`crate::process::Process`]'s
/// fid-based API, matching the external syscall surface in spec.md §6.
pub struct Scb {
    port: Port,
    state: Mutex<ScbState>,
    ports: Arc<PortMap>,
}

impl Scb {
    pub(crate) fn new_unbound(port: Port, ports: Arc<PortMap>) -> Result<Arc<Self>> {
        if port != NOPORT && !ports.in_range(port) {
            return_errno!(Errno::EINVAL);
        }
        Ok(Arc::new(Scb {
            port,
            state: Mutex::new(ScbState::Unbound),
            ports,
        }))
    }

    pub(crate) fn port(&self) -> Port {
        self.port
    }

    /// `listen(fid)` — spec §4.4.2. Check order matches `kernel_socket.c`'s
    /// `sys_Listen`: port-slot-occupied, then port-range, then kind.
    pub(crate) fn listen(self: &Arc<Self>, backlog: usize) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if self.ports.is_occupied(self.port) {
            return_errno_with_message!(Errno::EINVAL, "port already has a listener");
        }
        if !self.ports.in_range(self.port) {
            return_errno_with_message!(Errno::EINVAL, "port is not listenable");
        }
        if !matches!(*state, ScbState::Unbound) {
            return_errno_with_message!(Errno::EINVAL, "socket is not Unbound");
        }
        let payload = ListenerPayload::new(self.port, backlog);
        self.ports.bind(self.port, self)?;
        *state = ScbState::Listener(payload);
        debug!("socket on port {} transitioned Unbound -> Listener", self.port);
        Ok(())
    }

    /// `connect(fid, port, timeout)` — spec §4.4.3.
    pub(crate) fn connect(self: &Arc<Self>, port: Port, timeout: Duration) -> Result<()> {
        {
            let state = self.state.lock().unwrap();
            if !matches!(*state, ScbState::Unbound) {
                return_errno!(Errno::EISCONN);
            }
        }
        if !self.ports.in_range(port) {
            return_errno!(Errno::EINVAL);
        }
        let listener_scb = self
            .ports
            .lookup(port)
            .ok_or_else(|| Error::new(Errno::ECONNREFUSED))?;
        let listener_payload = {
            let state = listener_scb.state.lock().unwrap();
            match &*state {
                ScbState::Listener(payload) => payload.clone(),
                _ => return_errno!(Errno::ECONNREFUSED),
            }
        };

        let request = ConnectionRequest::new(self.clone());
        listener_payload.enqueue(request.clone());
        trace!("connect: request queued on port {port}");

        let deadline = Deadline::after(timeout);
        let mut guard = request.state.lock().unwrap();
        let outcome = loop {
            match *guard {
                ReqState::Admitted => break Ok(()),
                ReqState::Abandoned => break Err(Error::new(Errno::ECONNREFUSED)),
                ReqState::Pending => match deadline.remaining() {
                    Some(remaining) => {
                        let (next_guard, timed_out) =
                            request.connected_cv.timed_wait(guard, remaining);
                        guard = next_guard;
                        if timed_out && *guard == ReqState::Pending {
                            break Err(Error::new(Errno::ETIMEDOUT));
                        }
                    }
                    None => break Err(Error::new(Errno::ETIMEDOUT)),
                },
            }
        };
        drop(guard);

        if outcome.is_err() {
            listener_payload.remove(&request);
        }
        outcome
    }

    /// `accept(lsock)` — spec §4.4.4.
    pub(crate) fn accept(self: &Arc<Self>, owner_files: &FcbTable) -> Result<Fid> {
        let listener_payload = {
            let state = self.state.lock().unwrap();
            match &*state {
                ScbState::Listener(payload) => payload.clone(),
                _ => return_errno!(Errno::EINVAL),
            }
        };
        if self.ports.lookup(self.port).is_none() {
            return_errno!(Errno::ENXIO);
        }
        if !owner_files.has_free_slot() {
            return_errno!(Errno::EMFILE);
        }

        let request = loop {
            let mut queue_guard = listener_payload.queue.lock().unwrap();
            if let Some(request) = queue_guard.pop_front() {
                break request;
            }
            if self.ports.lookup(self.port).is_none() {
                return_errno!(Errno::ENXIO);
            }
            drop(listener_payload.req_available.wait(queue_guard));
        };

        let requester = request.requester.clone();

        let local = match Scb::new_unbound(requester.port(), self.ports.clone()) {
            Ok(scb) => scb,
            Err(err) => {
                warn!("accept: failed to allocate the accepting side's socket: {err}");
                return Err(err);
            }
        };
        let local_handle: Arc<dyn StreamOps> = SocketHandle::new(local.clone());
        let new_fid = match owner_files.reserve_one(local_handle) {
            Ok(fid) => fid,
            Err(err) => {
                warn!("accept: no free descriptor for the new peer: {err}");
                return Err(err);
            }
        };

        // P1 carries a -> b traffic, P2 carries b -> a traffic.
        let p1 = PipeShared::with_capacity(DEFAULT_PIPE_CAPACITY);
        let p2 = PipeShared::with_capacity(DEFAULT_PIPE_CAPACITY);

        {
            let mut requester_state = requester.state.lock().unwrap();
            *requester_state =
                ScbState::Peer(PeerPayload::new(Arc::downgrade(&local), p2.clone(), p1.clone()));
        }
        {
            let mut local_state = local.state.lock().unwrap();
            *local_state =
                ScbState::Peer(PeerPayload::new(Arc::downgrade(&requester), p1, p2));
        }

        request.admit();
        debug!("accept: admitted connection on port {}", self.port);
        Ok(new_fid)
    }

    /// Peer-only read (spec §4.4.5). The SCB lock is held only long enough
    /// to clone the read pipe's `Arc`, never across the blocking pipe read.
    pub(crate) fn read(&self, buf: &mut [u8]) -> Result<usize> {
        let pipe = {
            let state = self.state.lock().unwrap();
            match &*state {
                ScbState::Peer(payload) => payload.read_pipe.clone(),
                _ => return_errno!(Errno::ENOTCONN),
            }
        };
        match pipe {
            Some(pipe) => pipe.read(buf),
            None => return_errno_with_message!(Errno::ENOTCONN, "read half is shut down"),
        }
    }

    /// Peer-only write (spec §4.4.5), same locking discipline as `read`.
    pub(crate) fn write(&self, buf: &[u8]) -> Result<usize> {
        let pipe = {
            let state = self.state.lock().unwrap();
            match &*state {
                ScbState::Peer(payload) => payload.write_pipe.clone(),
                _ => return_errno!(Errno::ENOTCONN),
            }
        };
        match pipe {
            Some(pipe) => pipe.write(buf),
            None => return_errno!(Errno::EPIPE),
        }
    }

    /// `shutdown(fid, how)` — spec §4.4.6.
    pub(crate) fn shutdown(&self, how: ShutdownHow) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let payload = match &mut *state {
            ScbState::Peer(payload) => payload,
            _ => return_errno!(Errno::ENOTCONN),
        };
        if matches!(how, ShutdownHow::Read | ShutdownHow::Both) {
            if let Some(read_pipe) = payload.read_pipe.take() {
                read_pipe.close_reader();
            }
        }
        if matches!(how, ShutdownHow::Write | ShutdownHow::Both) {
            if let Some(write_pipe) = payload.write_pipe.take() {
                write_pipe.close_writer();
            }
        }
        Ok(())
    }

    /// `close` — spec §4.4.7, dispatched from [`SocketHandle::close`], which
    /// holds the owning `Arc<Scb>` this needs to identify itself to the
    /// PortMap on a Listener close.
    ///
    /// The Peer branch only *extracts* the pipes and the back-reference
    /// while `state` is held; tearing them down (in particular, reaching
    /// into the paired `Scb` to clear its back-reference to us) happens
    /// after `state` is dropped, so a concurrent close of the paired socket
    /// can't deadlock against us over the two sockets' locks.
    fn close(self: &Arc<Self>) {
        let mut state = self.state.lock().unwrap();
        let closed_peer = match &mut *state {
            ScbState::Peer(payload) => Some(payload.take_for_close()),
            ScbState::Listener(payload) => {
                self.ports.clear_if(self.port, self);
                payload.close();
                debug!("listener on port {} closed", self.port);
                None
            }
            ScbState::Unbound => None,
        };
        drop(state);
        if let Some(closed_peer) = closed_peer {
            closed_peer.finish();
            trace!("peer socket closed");
        }
    }

    /// Clears this socket's back-reference to its paired Peer, if it's still
    /// one. Called by the paired socket's `close` (spec §4.4.7) after that
    /// socket has released its own state lock.
    fn clear_peer(&self) {
        let mut state = self.state.lock().unwrap();
        if let ScbState::Peer(payload) = &mut *state {
            payload.peer = None;
        }
    }
}

/// The stream object a socket's FCB slot points at: a thin `Arc<Scb>`
/// wrapper implementing [`StreamOps`], plus the downcast back to `Scb` for
/// the socket-only syscalls.
pub(crate) struct SocketHandle(Arc<Scb>);

impl SocketHandle {
    pub(crate) fn new(scb: Arc<Scb>) -> Arc<Self> {
        Arc::new(SocketHandle(scb))
    }
}

impl StreamOps for SocketHandle {
    fn read(&self, buf: &mut [u8]) -> Result<usize> {
        self.0.read(buf)
    }

    fn write(&self, buf: &[u8]) -> Result<usize> {
        self.0.write(buf)
    }

    fn close(&self) -> Result<()> {
        self.0.close();
        Ok(())
    }

    fn as_socket(self: Arc<Self>) -> Option<Arc<Scb>> {
        Some(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ports() -> Arc<PortMap> {
        Arc::new(PortMap::new(64))
    }

    #[test]
    fn listen_on_already_listening_socket_is_rejected() {
        let scb = Scb::new_unbound(1, ports()).unwrap();
        scb.listen(8).unwrap();
        assert_eq!(scb.listen(8).unwrap_err().errno(), Errno::EINVAL);
    }

    #[test]
    fn listen_on_out_of_range_port_is_rejected() {
        let scb = Scb::new_unbound(1000, ports()).unwrap();
        assert_eq!(scb.listen(8).unwrap_err().errno(), Errno::EINVAL);
    }

    #[test]
    fn connect_to_an_unbound_port_is_refused() {
        let scb = Scb::new_unbound(0, ports()).unwrap();
        assert_eq!(
            scb.connect(5, Duration::from_millis(10)).unwrap_err().errno(),
            Errno::ECONNREFUSED
        );
    }

    #[test]
    fn read_and_write_on_an_unbound_socket_are_not_connected() {
        let scb = Scb::new_unbound(0, ports()).unwrap();
        assert_eq!(scb.read(&mut [0u8; 1]).unwrap_err().errno(), Errno::ENOTCONN);
        assert_eq!(scb.write(&[0u8]).unwrap_err().errno(), Errno::ENOTCONN);
    }

    #[test]
    fn shutdown_on_a_listener_is_rejected() {
        let scb = Scb::new_unbound(2, ports()).unwrap();
        scb.listen(8).unwrap();
        assert_eq!(
            scb.shutdown(ShutdownHow::Both).unwrap_err().errno(),
            Errno::ENOTCONN
        );
    }

    #[test]
    fn closing_a_listener_frees_its_port_for_reuse() {
        let ports = ports();
        let scb = Scb::new_unbound(3, ports.clone()).unwrap();
        scb.listen(8).unwrap();
        assert!(ports.is_occupied(3));
        scb.close();
        assert!(!ports.is_occupied(3));

        let second = Scb::new_unbound(3, ports).unwrap();
        assert!(second.listen(8).is_ok());
    }
}
