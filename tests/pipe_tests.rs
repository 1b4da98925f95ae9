// SPDX-License-Identifier: MPL-2.0

//! End-to-end pipe scenarios from spec.md §8, driven through the public
//! `Process` API the way a real caller would use fids.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use aster_streamio::port::PortMap;
use aster_streamio::{Limits, Process};

fn process() -> Process {
    Process::new(Arc::new(PortMap::new(1024)), Limits::default())
}

#[test]
fn pipe_roundtrip() {
    let proc = process();
    let (read_fid, write_fid) = proc.pipe().unwrap();

    assert_eq!(proc.write(write_fid, b"hello").unwrap(), 5);

    let mut buf = [0u8; 16];
    let n = proc.read(read_fid, &mut buf).unwrap();
    assert_eq!(n, 5);
    assert_eq!(&buf[..5], b"hello");

    proc.close(write_fid).unwrap();
    assert_eq!(proc.read(read_fid, &mut buf).unwrap(), 0);
}

#[test]
fn broken_pipe_after_reader_close() {
    let proc = process();
    let (read_fid, write_fid) = proc.pipe().unwrap();

    proc.close(read_fid).unwrap();
    assert!(proc.write(write_fid, b"x").is_err());
}

#[test]
fn writer_blocks_until_reader_reads_and_then_unblocks() {
    let proc = Arc::new(process());
    let (read_fid, write_fid) = proc.pipe().unwrap();
    assert_eq!(proc.write(write_fid, &[0xAAu8; 4096]).unwrap(), 4096);

    let writer_proc = proc.clone();
    let handle = thread::spawn(move || writer_proc.write(write_fid, &[0xBB]).unwrap());

    thread::sleep(Duration::from_millis(50));
    let mut buf = [0u8; 100];
    assert_eq!(proc.read(read_fid, &mut buf).unwrap(), 100);

    assert_eq!(handle.join().unwrap(), 1);
}
