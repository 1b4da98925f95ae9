// SPDX-License-Identifier: MPL-2.0

//! The file-control-block table: reservation, lookup, and close dispatch.
//!
//! Modeled as the concrete, in-process default for the "generic FCB table"
//! collaborator this crate's design treats as external: `reserve`, `get`,
//! `close`. A slot holds a trait object (`Arc<dyn StreamOps>`), which is
//! already the `(stream_obj, ops)` pair the FCB conceptually stores — no
//! separate ops-vtable field is needed once the stream object is behind a
//! trait object.

use std::sync::{Arc, Mutex};

use crate::error::{return_errno, Errno, Error, Result};
use crate::stream::StreamOps;

/// A file descriptor / stream identifier. Negative values (by convention
/// [`NOFILE`]) signal failure at the syscall boundary.
pub type Fid = i32;

/// Sentinel returned in place of a [`Fid`] on failure.
pub const NOFILE: Fid = -1;

/// Per-owner table of open streams.
pub struct FcbTable {
    slots: Mutex<Vec<Option<Arc<dyn StreamOps>>>>,
}

impl FcbTable {
    pub fn new(max_files: usize) -> Self {
        let mut slots = Vec::with_capacity(max_files);
        slots.resize_with(max_files, || None);
        FcbTable {
            slots: Mutex::new(slots),
        }
    }

    /// Whether at least one slot is free — the gate `accept` checks before
    /// blocking on a listener's queue.
    pub fn has_free_slot(&self) -> bool {
        self.slots.lock().unwrap().iter().any(|s| s.is_none())
    }

    /// Reserves a single free slot and installs `stream` in it.
    pub fn reserve_one(&self, stream: Arc<dyn StreamOps>) -> Result<Fid> {
        let mut slots = self.slots.lock().unwrap();
        match slots.iter().position(|s| s.is_none()) {
            Some(idx) => {
                slots[idx] = Some(stream);
                Ok(idx as Fid)
            }
            None => return_errno!(Errno::EMFILE),
        }
    }

    /// Reserves all of `streams` in one transaction, rolling back if there
    /// aren't enough free slots for all of them — the pipe-pair contract
    /// ("both fids must come from a single reservation transaction").
    pub fn reserve_many(&self, streams: [Arc<dyn StreamOps>; 2]) -> Result<[Fid; 2]> {
        let mut slots = self.slots.lock().unwrap();
        let free: Vec<usize> = slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| if s.is_none() { Some(i) } else { None })
            .take(2)
            .collect();
        if free.len() < 2 {
            return_errno!(Errno::EMFILE);
        }
        let [a, b] = [free[0], free[1]];
        let [s0, s1] = streams;
        slots[a] = Some(s0);
        slots[b] = Some(s1);
        Ok([a as Fid, b as Fid])
    }

    /// Looks up the stream object installed at `fid`.
    pub fn get(&self, fid: Fid) -> Result<Arc<dyn StreamOps>> {
        let slots = self.slots.lock().unwrap();
        usize::try_from(fid)
            .ok()
            .and_then(|idx| slots.get(idx))
            .and_then(|slot| slot.clone())
            .ok_or_else(|| Error::new(Errno::EBADF))
    }

    /// Clears the slot at `fid` and closes the stream it held. The slot is
    /// freed even if the underlying `close` fails.
    pub fn close(&self, fid: Fid) -> Result<()> {
        let stream = {
            let mut slots = self.slots.lock().unwrap();
            let idx = usize::try_from(fid).map_err(|_| Error::new(Errno::EBADF))?;
            let slot = slots.get_mut(idx).ok_or_else(|| Error::new(Errno::EBADF))?;
            slot.take().ok_or_else(|| Error::new(Errno::EBADF))?
        };
        stream.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Dummy;
    impl StreamOps for Dummy {
        fn close(&self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn reserve_and_get_roundtrip() {
        let table = FcbTable::new(4);
        let fid = table.reserve_one(Arc::new(Dummy)).unwrap();
        assert!(table.get(fid).is_ok());
    }

    #[test]
    fn exhausted_table_rejects_reservation() {
        let table = FcbTable::new(1);
        table.reserve_one(Arc::new(Dummy)).unwrap();
        assert_eq!(
            table.reserve_one(Arc::new(Dummy)).unwrap_err().errno(),
            Errno::EMFILE
        );
    }

    #[test]
    fn close_frees_the_slot() {
        let table = FcbTable::new(1);
        let fid = table.reserve_one(Arc::new(Dummy)).unwrap();
        table.close(fid).unwrap();
        assert_eq!(table.get(fid).unwrap_err().errno(), Errno::EBADF);
        // the freed slot can be reused
        assert!(table.reserve_one(Arc::new(Dummy)).is_ok());
    }

    #[test]
    fn reserve_many_rolls_back_when_table_is_nearly_full() {
        let table = FcbTable::new(1);
        let err = table
            .reserve_many([Arc::new(Dummy), Arc::new(Dummy)])
            .unwrap_err();
        assert_eq!(err.errno(), Errno::EMFILE);
        // no slot was consumed by the failed transaction
        assert!(table.reserve_one(Arc::new(Dummy)).is_ok());
    }
}
