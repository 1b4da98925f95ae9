// SPDX-License-Identifier: MPL-2.0

//! The rich, `Result`-returning API a stream I/O subsystem instance exposes.
//!
//! [`Process`] bundles exactly the two external collaborators spec.md §6
//! asks for — a file-control-block table and a shared port namespace — into
//! the minimal stand-in needed to call `pipe`/`socket`/`listen`/`accept`/
//! `connect`/`shutdown`/`read`/`write`/`close` as plain method calls. It is
//! *not* a model of process lifecycle (creation, `Exec`, `WaitChild`,
//! `ThreadExit`) — that subsystem remains out of scope per spec.md §1; this
//! is only the part of "a process" that owns a descriptor table, which is
//! what those operations need to exist at all.
//!
//! Mirrors the split between the teacher's `fs/pipe.rs` (rich API) and
//! `syscall/pipe.rs` (sentinel-returning wrapper): [`crate::syscall`] is the
//! thin layer on top of this one that narrows everything down to spec.md's
//! external sentinel-int interface.

use std::sync::Arc;
use std::time::Duration;

use crate::error::{Errno, Error, Result};
use crate::fcb::{FcbTable, Fid};
use crate::limits::Limits;
use crate::pipe::pipe_pair;
use crate::port::{Port, PortMap};
use crate::socket::{Scb, ShutdownHow, SocketHandle};
use crate::stream::StreamOps;

/// Owns one descriptor table and shares a port namespace with whatever other
/// `Process` instances the embedder creates (real connect/accept pairs need
/// to resolve the same port, whether or not they're "the same process").
pub struct Process {
    files: FcbTable,
    ports: Arc<PortMap>,
    limits: Limits,
}

impl Process {
    pub fn new(ports: Arc<PortMap>, limits: Limits) -> Self {
        Process {
            files: FcbTable::new(limits.max_files()),
            ports,
            limits,
        }
    }

    fn scb_for(&self, fid: Fid) -> Result<Arc<Scb>> {
        self.files
            .get(fid)?
            .as_socket()
            .ok_or_else(|| Error::with_message(Errno::EINVAL, "fid is not a socket"))
    }

    /// `pipe(out pair)` — spec §6. Both fids come from one reservation.
    pub fn pipe(&self) -> Result<(Fid, Fid)> {
        let (reader, writer) = pipe_pair(self.limits.pipe_capacity());
        let streams: [Arc<dyn StreamOps>; 2] = [Arc::new(reader), Arc::new(writer)];
        let [read_fid, write_fid] = self.files.reserve_many(streams)?;
        Ok((read_fid, write_fid))
    }

    /// `socket(port)` — spec §4.4.1 / §6.
    pub fn socket(&self, port: Port) -> Result<Fid> {
        let scb = Scb::new_unbound(port, self.ports.clone())?;
        self.files.reserve_one(SocketHandle::new(scb))
    }

    /// `listen(fid)` — spec §4.4.2.
    pub fn listen(&self, fid: Fid) -> Result<()> {
        self.scb_for(fid)?.listen(self.limits.backlog())
    }

    /// `connect(fid, port, timeout)` — spec §4.4.3.
    pub fn connect(&self, fid: Fid, port: Port, timeout: Duration) -> Result<()> {
        self.scb_for(fid)?.connect(port, timeout)
    }

    /// `accept(lsock)` — spec §4.4.4.
    pub fn accept(&self, lsock: Fid) -> Result<Fid> {
        self.scb_for(lsock)?.accept(&self.files)
    }

    /// `shutdown(fid, how)` — spec §4.4.6.
    pub fn shutdown(&self, fid: Fid, how: ShutdownHow) -> Result<()> {
        self.scb_for(fid)?.shutdown(how)
    }

    /// Generic `read` — spec §4.1, dispatched through the FCB's stream ops.
    pub fn read(&self, fid: Fid, buf: &mut [u8]) -> Result<usize> {
        self.files.get(fid)?.read(buf)
    }

    /// Generic `write` — spec §4.1.
    pub fn write(&self, fid: Fid, buf: &[u8]) -> Result<usize> {
        self.files.get(fid)?.write(buf)
    }

    /// Generic `close` — spec §4.1. The slot is freed even if the
    /// underlying stream's close reports an error.
    pub fn close(&self, fid: Fid) -> Result<()> {
        self.files.close(fid)
    }

    /// The connect timeout this instance applies when the caller doesn't
    /// specify one (the syscall layer's `connect` always specifies one, but
    /// embedders calling this API directly may want the configured default).
    pub fn default_connect_timeout(&self) -> Duration {
        self.limits.default_connect_timeout()
    }
}
