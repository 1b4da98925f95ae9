// SPDX-License-Identifier: MPL-2.0

//! The pipe core: a fixed-capacity circular byte buffer shared by one reader
//! endpoint and one writer endpoint.
//!
//! Grounded on the teacher's `fs/pipe.rs` + `fs/utils/channel.rs`
//! (`Channel`/`Producer`/`Consumer`), with one structural departure: the
//! teacher's `Channel` is built on the `ringbuf` crate and blocks by polling
//! `Pollee`/`Poller` event masks (`wait_events`), because `aster-nix` is an
//! async-capable, event-driven kernel. This crate's design calls for true
//! blocking condition-variable coordination (`has_space`/`has_data`), so
//! [`PipeShared`] is a hand-rolled circular buffer behind `std::sync::Mutex`
//! plus the [`crate::sched::CondVar`] collaborator, rather than a `ringbuf`
//! wrapper — the same shape as the teacher's `Channel`, re-expressed for
//! synchronous blocking semantics.

use std::sync::Arc;
use std::sync::Mutex;

use log::{debug, trace};

use crate::error::{return_errno, return_errno_with_message, Errno, Result};
use crate::sched::CondVar;
use crate::stream::StreamOps;

struct PipeState {
    buf: Box<[u8]>,
    w_pos: usize,
    r_pos: usize,
    avail_space: usize,
    reader_present: bool,
    writer_present: bool,
}

impl PipeState {
    fn capacity(&self) -> usize {
        self.buf.len()
    }
}

/// The shared circular buffer backing one pipe's two endpoints.
pub(crate) struct PipeShared {
    state: Mutex<PipeState>,
    has_space: CondVar,
    has_data: CondVar,
}

impl PipeShared {
    pub(crate) fn with_capacity(capacity: usize) -> Arc<Self> {
        Arc::new(PipeShared {
            state: Mutex::new(PipeState {
                buf: vec![0u8; capacity].into_boxed_slice(),
                w_pos: 0,
                r_pos: 0,
                avail_space: capacity,
                reader_present: true,
                writer_present: true,
            }),
            has_space: CondVar::new(),
            has_data: CondVar::new(),
        })
    }

    /// Write algorithm (spec §4.2). Blocks while the buffer is full and the
    /// reader is still present; fails with `EPIPE` if the reader disappears
    /// while blocked, or was already gone on entry.
    pub(crate) fn write(&self, buf: &[u8]) -> Result<usize> {
        let mut state = self.state.lock().unwrap();
        if !state.writer_present {
            return_errno!(Errno::EPIPE);
        }
        if !state.reader_present {
            return_errno_with_message!(Errno::EPIPE, "write to pipe with no reader");
        }
        while state.avail_space == 0 && state.reader_present {
            state = self.has_space.wait(state);
        }
        if !state.reader_present {
            return_errno_with_message!(Errno::EPIPE, "reader closed while writer was blocked");
        }
        let cap = state.capacity();
        let k = buf.len().min(state.avail_space);
        let w_pos = state.w_pos;
        for (i, &byte) in buf[..k].iter().enumerate() {
            state.buf[(w_pos + i) % cap] = byte;
        }
        state.w_pos = (w_pos + k) % cap;
        state.avail_space -= k;
        drop(state);
        self.has_data.broadcast();
        Ok(k)
    }

    /// Read algorithm (spec §4.2). Blocks while the buffer is empty and the
    /// writer is still present; returns `0` (EOF) once the writer is gone and
    /// the buffer has drained.
    pub(crate) fn read(&self, buf: &mut [u8]) -> Result<usize> {
        let mut state = self.state.lock().unwrap();
        if !state.reader_present {
            return_errno!(Errno::EPIPE);
        }
        loop {
            let have = state.capacity() - state.avail_space;
            if have > 0 {
                let cap = state.capacity();
                let r_pos = state.r_pos;
                let k = buf.len().min(have);
                for i in 0..k {
                    buf[i] = state.buf[(r_pos + i) % cap];
                }
                state.r_pos = (r_pos + k) % cap;
                state.avail_space += k;
                drop(state);
                self.has_space.broadcast();
                return Ok(k);
            }
            if !state.writer_present {
                return Ok(0);
            }
            state = self.has_data.wait(state);
        }
    }

    /// Marks the reader endpoint absent, wakes blocked writers, and frees the
    /// buffer once both endpoints are gone.
    pub(crate) fn close_reader(&self) {
        let mut state = self.state.lock().unwrap();
        if !state.reader_present {
            return;
        }
        state.reader_present = false;
        let both_gone = !state.writer_present;
        drop(state);
        self.has_space.broadcast();
        if both_gone {
            trace!("pipe destroyed: reader closed last");
        }
    }

    /// Marks the writer endpoint absent and wakes blocked readers so they
    /// observe EOF once the buffer drains.
    pub(crate) fn close_writer(&self) {
        let mut state = self.state.lock().unwrap();
        if !state.writer_present {
            return;
        }
        state.writer_present = false;
        let both_gone = !state.reader_present;
        drop(state);
        self.has_data.broadcast();
        if both_gone {
            trace!("pipe destroyed: writer closed last");
        }
    }
}

/// The reader endpoint's stream object: rejects writes.
pub struct PipeReader {
    shared: Arc<PipeShared>,
}

/// The writer endpoint's stream object: rejects reads.
pub struct PipeWriter {
    shared: Arc<PipeShared>,
}

impl StreamOps for PipeReader {
    fn read(&self, buf: &mut [u8]) -> Result<usize> {
        self.shared.read(buf)
    }

    fn close(&self) -> Result<()> {
        self.shared.close_reader();
        Ok(())
    }
}

impl Drop for PipeReader {
    fn drop(&mut self) {
        self.shared.close_reader();
    }
}

impl StreamOps for PipeWriter {
    fn write(&self, buf: &[u8]) -> Result<usize> {
        self.shared.write(buf)
    }

    fn close(&self) -> Result<()> {
        self.shared.close_writer();
        Ok(())
    }
}

impl Drop for PipeWriter {
    fn drop(&mut self) {
        self.shared.close_writer();
    }
}

/// Creates a fresh pipe and returns its reader/writer stream objects.
pub(crate) fn pipe_pair(capacity: usize) -> (PipeReader, PipeWriter) {
    let shared = PipeShared::with_capacity(capacity);
    debug!("pipe created with capacity {capacity}");
    (
        PipeReader {
            shared: shared.clone(),
        },
        PipeWriter { shared },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let (reader, writer) = pipe_pair(64);
        assert_eq!(writer.write(b"hello").unwrap(), 5);
        let mut out = [0u8; 16];
        assert_eq!(reader.read(&mut out).unwrap(), 5);
        assert_eq!(&out[..5], b"hello");
        writer.close().unwrap();
        assert_eq!(reader.read(&mut out).unwrap(), 0);
    }

    #[test]
    fn broken_pipe_after_reader_close() {
        let (reader, writer) = pipe_pair(64);
        reader.close().unwrap();
        assert_eq!(writer.write(b"x").unwrap_err().errno(), Errno::EPIPE);
    }

    #[test]
    fn writer_rejects_reads_and_reader_rejects_writes() {
        let (reader, writer) = pipe_pair(64);
        assert_eq!(
            writer.read(&mut [0u8; 1]).unwrap_err().errno(),
            Errno::EOPNOTSUPP
        );
        assert_eq!(
            reader.write(b"x").unwrap_err().errno(),
            Errno::EOPNOTSUPP
        );
    }

    #[test]
    fn backpressure_unblocks_on_drain() {
        use std::thread;
        use std::time::Duration;

        let (reader, writer) = pipe_pair(4096);
        assert_eq!(writer.write(&[0xAAu8; 4096]).unwrap(), 4096);

        let shared = writer.shared.clone();
        let handle = thread::spawn(move || shared.write(&[0xBB]).unwrap());

        thread::sleep(Duration::from_millis(50));
        let mut out = [0u8; 100];
        assert_eq!(reader.read(&mut out).unwrap(), 100);

        assert_eq!(handle.join().unwrap(), 1);
    }
}
