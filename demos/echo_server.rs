// SPDX-License-Identifier: MPL-2.0

//! A tiny in-process echo server, driven entirely through the public fid API
//! (`Process::{socket,listen,accept,connect,read,write,close}`), to exercise
//! the socket core the way a real embedder would: one thread plays the
//! listener, another plays a client, and they rendezvous over a port number
//! rather than a network address.
//!
//! Run with `RUST_LOG=debug cargo run --example echo_server` to see the
//! lifecycle logging (`listen`/`accept`/`connect` transitions) the crate
//! emits via `log`.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use aster_streamio::port::PortMap;
use aster_streamio::{Limits, Process};

const ECHO_PORT: u16 = 7;

fn main() {
    env_logger::init();

    let ports = Arc::new(PortMap::new(Limits::default().max_port()));
    let server = Arc::new(Process::new(ports.clone(), Limits::default()));
    let client = Process::new(ports, Limits::default());

    let listener = server.socket(ECHO_PORT).expect("socket");
    server.listen(listener).expect("listen");

    let echo_server = server.clone();
    let handle = thread::spawn(move || {
        let conn = echo_server.accept(listener).expect("accept");
        let mut buf = [0u8; 256];
        loop {
            let n = echo_server.read(conn, &mut buf).expect("read");
            if n == 0 {
                break;
            }
            echo_server.write(conn, &buf[..n]).expect("write");
        }
        echo_server.close(conn).expect("close");
    });

    let csock = client.socket(0).expect("socket");
    client
        .connect(csock, ECHO_PORT, Duration::from_millis(500))
        .expect("connect");

    for line in ["hello", "from", "the", "echo", "client"] {
        client.write(csock, line.as_bytes()).expect("write");
        let mut buf = [0u8; 256];
        let n = client.read(csock, &mut buf).expect("read");
        println!("server echoed: {}", String::from_utf8_lossy(&buf[..n]));
    }

    client.shutdown(csock, aster_streamio::ShutdownHow::Write).expect("shutdown");
    client.close(csock).expect("close");
    server.close(listener).expect("close");
    handle.join().expect("server thread panicked");
}
