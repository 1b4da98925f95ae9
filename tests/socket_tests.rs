// SPDX-License-Identifier: MPL-2.0

//! End-to-end socket scenarios from spec.md §8: connect/accept/echo, connect
//! timeout, and listener revocation, all driven through the public
//! `Process`/fid API.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use aster_streamio::port::PortMap;
use aster_streamio::{Errno, Limits, Process, ShutdownHow};

fn shared_ports() -> Arc<PortMap> {
    Arc::new(PortMap::new(1024))
}

#[test]
fn connect_accept_echo_roundtrip() {
    let ports = shared_ports();
    let server = Arc::new(Process::new(ports.clone(), Limits::default()));
    let client = Process::new(ports, Limits::default());

    let lsock = server.socket(42).unwrap();
    server.listen(lsock).unwrap();

    let accepting = server.clone();
    let accepted = thread::spawn(move || accepting.accept(lsock).unwrap());

    let csock = client.socket(0).unwrap();
    client
        .connect(csock, 42, Duration::from_millis(500))
        .unwrap();

    let ssock = accepted.join().unwrap();

    assert_eq!(client.write(csock, b"ping").unwrap(), 4);
    let mut buf = [0u8; 16];
    let n = server.read(ssock, &mut buf).unwrap();
    assert_eq!(&buf[..n], b"ping");

    assert_eq!(server.write(ssock, b"pong").unwrap(), 4);
    let n = client.read(csock, &mut buf).unwrap();
    assert_eq!(&buf[..n], b"pong");
}

#[test]
fn connect_times_out_when_nobody_accepts() {
    let ports = shared_ports();
    let server = Process::new(ports.clone(), Limits::default());
    let client = Process::new(ports, Limits::default());

    let lsock = server.socket(7).unwrap();
    server.listen(lsock).unwrap();
    // Nobody ever calls accept() on lsock.

    let csock = client.socket(0).unwrap();
    let err = client
        .connect(csock, 7, Duration::from_millis(50))
        .unwrap_err();
    assert_eq!(err.errno(), Errno::ETIMEDOUT);
}

#[test]
fn connect_refused_with_no_listener_on_port() {
    let ports = shared_ports();
    let client = Process::new(ports, Limits::default());
    let csock = client.socket(0).unwrap();
    let err = client
        .connect(csock, 99, Duration::from_millis(50))
        .unwrap_err();
    assert_eq!(err.errno(), Errno::ECONNREFUSED);
}

#[test]
fn closing_listener_revokes_blocked_accepters_and_future_connects() {
    let ports = shared_ports();
    let server = Arc::new(Process::new(ports.clone(), Limits::default()));
    let client = Process::new(ports, Limits::default());

    let lsock = server.socket(13).unwrap();
    server.listen(lsock).unwrap();

    let accepting_1 = server.clone();
    let accepting_2 = server.clone();
    let accepter_1 = thread::spawn(move || accepting_1.accept(lsock));
    let accepter_2 = thread::spawn(move || accepting_2.accept(lsock));

    // Give both accepters a chance to block on the listener's queue.
    thread::sleep(Duration::from_millis(50));
    server.close(lsock).unwrap();

    assert_eq!(
        accepter_1.join().unwrap().unwrap_err().errno(),
        Errno::ENXIO
    );
    assert_eq!(
        accepter_2.join().unwrap().unwrap_err().errno(),
        Errno::ENXIO
    );

    // The port map slot is clear; a fresh connect fails immediately rather
    // than queuing against a dead listener.
    let csock = client.socket(0).unwrap();
    let err = client
        .connect(csock, 13, Duration::from_millis(50))
        .unwrap_err();
    assert_eq!(err.errno(), Errno::ECONNREFUSED);
}

#[test]
fn shutdown_write_then_read_observes_eof() {
    let ports = shared_ports();
    let server = Arc::new(Process::new(ports.clone(), Limits::default()));
    let client = Process::new(ports, Limits::default());

    let lsock = server.socket(21).unwrap();
    server.listen(lsock).unwrap();
    let accepting = server.clone();
    let accepted = thread::spawn(move || accepting.accept(lsock).unwrap());

    let csock = client.socket(0).unwrap();
    client
        .connect(csock, 21, Duration::from_millis(500))
        .unwrap();
    let ssock = accepted.join().unwrap();

    client.shutdown(csock, ShutdownHow::Write).unwrap();
    let mut buf = [0u8; 16];
    assert_eq!(server.read(ssock, &mut buf).unwrap(), 0);
}

#[test]
fn shutdown_read_then_peer_write_is_broken_pipe() {
    let ports = shared_ports();
    let server = Arc::new(Process::new(ports.clone(), Limits::default()));
    let client = Process::new(ports, Limits::default());

    let lsock = server.socket(22).unwrap();
    server.listen(lsock).unwrap();
    let accepting = server.clone();
    let accepted = thread::spawn(move || accepting.accept(lsock).unwrap());

    let csock = client.socket(0).unwrap();
    client
        .connect(csock, 22, Duration::from_millis(500))
        .unwrap();
    let ssock = accepted.join().unwrap();

    // A shuts down its read half; B's next write must observe a broken pipe.
    client.shutdown(csock, ShutdownHow::Read).unwrap();
    let err = server.write(ssock, b"x").unwrap_err();
    assert_eq!(err.errno(), Errno::EPIPE);
}

#[test]
fn illegal_state_transitions_are_rejected_without_mutating_state() {
    let ports = shared_ports();
    let process = Process::new(ports, Limits::default());

    // listen() twice on the same socket: the second call must fail.
    let lsock = process.socket(55).unwrap();
    process.listen(lsock).unwrap();
    assert_eq!(process.listen(lsock).unwrap_err().errno(), Errno::EINVAL);

    // connect() on a socket that is itself a listener.
    assert_eq!(
        process
            .connect(lsock, 55, Duration::from_millis(10))
            .unwrap_err()
            .errno(),
        Errno::EISCONN
    );

    // shutdown() on a socket that never connected.
    let unbound = process.socket(0).unwrap();
    assert_eq!(
        process.shutdown(unbound, ShutdownHow::Both).unwrap_err().errno(),
        Errno::ENOTCONN
    );

    // accept() on a socket that was never listen()'d.
    assert_eq!(process.accept(unbound).unwrap_err().errno(), Errno::EINVAL);
}
