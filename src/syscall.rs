// SPDX-License-Identifier: MPL-2.0

//! The external system-call surface (spec.md §6): sentinel-returning
//! wrappers over [`crate::process::Process`]'s rich `Result`-returning API.
//!
//! Mirrors the teacher's `syscall/pipe.rs`, which converts `fs::pipe`'s
//! `Result`-returning core into the raw ints a syscall ABI expects. Every
//! function here does exactly that conversion and nothing else — no new
//! behavior lives in this module.

use std::time::Duration;

use crate::fcb::{Fid, NOFILE};
use crate::port::Port;
use crate::process::Process;
use crate::socket::ShutdownHow;

/// Generic failure sentinel for calls whose success value is `0`.
pub const FAIL: i32 = -1;
/// Generic success sentinel for calls whose success value is `0`.
pub const OK: i32 = 0;

/// `pipe(out pair) -> 0/-1`.
pub fn sys_pipe(process: &Process, out: &mut (Fid, Fid)) -> i32 {
    match process.pipe() {
        Ok(pair) => {
            *out = pair;
            OK
        }
        Err(_) => FAIL,
    }
}

/// `socket(port) -> fid or NOFILE`.
pub fn sys_socket(process: &Process, port: Port) -> Fid {
    process.socket(port).unwrap_or(NOFILE)
}

/// `listen(fid) -> 0/-1`.
pub fn sys_listen(process: &Process, fid: Fid) -> i32 {
    match process.listen(fid) {
        Ok(()) => OK,
        Err(_) => FAIL,
    }
}

/// `accept(lsock) -> fid or NOFILE`. Blocks.
pub fn sys_accept(process: &Process, lsock: Fid) -> Fid {
    process.accept(lsock).unwrap_or(NOFILE)
}

/// `connect(fid, port, timeout_ms) -> 0/-1`. Blocks up to the timeout.
pub fn sys_connect(process: &Process, fid: Fid, port: Port, timeout_ms: u64) -> i32 {
    match process.connect(fid, port, Duration::from_millis(timeout_ms)) {
        Ok(()) => OK,
        Err(_) => FAIL,
    }
}

/// `shutdown(fid, how) -> 0/-1`; `how` in `{1=READ, 2=WRITE, 3=BOTH}`.
pub fn sys_shutdown(process: &Process, fid: Fid, how: i32) -> i32 {
    let how = match how {
        1 => ShutdownHow::Read,
        2 => ShutdownHow::Write,
        3 => ShutdownHow::Both,
        _ => return FAIL,
    };
    match process.shutdown(fid, how) {
        Ok(()) => OK,
        Err(_) => FAIL,
    }
}

/// Generic `read`: `≥1` bytes copied, `0` on EOF, `-1` on error.
pub fn sys_read(process: &Process, fid: Fid, buf: &mut [u8]) -> isize {
    match process.read(fid, buf) {
        Ok(n) => n as isize,
        Err(_) => -1,
    }
}

/// Generic `write`: `≥1` bytes copied, `-1` on error.
pub fn sys_write(process: &Process, fid: Fid, buf: &[u8]) -> isize {
    match process.write(fid, buf) {
        Ok(n) => n as isize,
        Err(_) => -1,
    }
}

/// Generic `close`: `0` on success, `-1` on error. The descriptor is freed
/// either way.
pub fn sys_close(process: &Process, fid: Fid) -> i32 {
    match process.close(fid) {
        Ok(()) => OK,
        Err(_) => FAIL,
    }
}
