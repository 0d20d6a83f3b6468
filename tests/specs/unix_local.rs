// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Unix local stream transport: delimited echo and socket-file cleanup.

use std::sync::mpsc;
use std::sync::Arc;

use parking_lot::Mutex;

use berth_net::{Client, Server};
use berth_wire::DelimitedBuilder;

use super::prelude::*;

#[test]
fn delimited_echo_over_a_unix_socket() {
    let dir = tempfile::tempdir().expect("tempdir failed");
    let socket_path = dir.path().join("echo.sock");

    let server = Server::new();
    server.on_new_connection(|connection| {
        connection.on_receive(|connection, unit| {
            let payload = unit.as_bytes().unwrap_or_default().to_vec();
            if let Ok(posted) = connection.post_bytes(&payload) {
                posted.commit();
            }
        });
    });

    let (bound_tx, bound_rx) = mpsc::channel();
    server.on_start(move || {
        let _ = bound_tx.send(());
    });
    server
        .start(
            Server::configurate_unix_local()
                .set_socket_file(&socket_path)
                .set_protocol(DelimitedBuilder::new(&b"\n"[..]))
                .set_worker_name("uds-srv"),
        )
        .expect("server start failed");
    bound_rx.recv_timeout(SPEC_WAIT).expect("server never bound");
    assert!(socket_path.exists());

    let client = Client::new();
    let echoed: Arc<Mutex<Vec<Vec<u8>>>> = Arc::new(Mutex::new(Vec::new()));
    {
        let echoed = Arc::clone(&echoed);
        client.on_connect(move |connection| {
            let echoed = Arc::clone(&echoed);
            connection.on_receive(move |_, unit| {
                echoed.lock().push(unit.as_bytes().map(<[u8]>::to_vec).unwrap_or_default());
            });
            connection.post_bytes(b"unix ping").expect("post failed");
            connection.commit();
        });
    }
    client
        .connect(
            Client::configurate_unix_local()
                .set_socket_file(&socket_path)
                .set_protocol(DelimitedBuilder::new(&b"\n"[..])),
        )
        .expect("client connect failed");

    assert!(
        wait_for(SPEC_WAIT, || *echoed.lock() == vec![b"unix ping".to_vec()]),
        "echo never arrived"
    );

    client.disconnect();
    server.stop(true);
    assert!(!socket_path.exists(), "socket file survived the stop");
}
