// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Re-dialing after aborted attempts: only the attempt that completes fires
//! callbacks; nothing dangles from the aborted ones.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::Arc;

use berth_net::{Client, Server};
use berth_wire::MsgBuilder;

use super::prelude::*;

#[test]
fn only_the_completed_attempt_fires_receive_callbacks() {
    let server_port = free_port();
    let dead_port = free_port();

    let server = Server::new();
    server.on_new_connection(|connection| {
        connection.post_bytes(b"welcome").expect("post failed");
        connection.commit();
    });
    let (bound_tx, bound_rx) = mpsc::channel();
    server.on_start(move || {
        let _ = bound_tx.send(());
    });
    server
        .start(
            Server::configurate_tcp()
                .set_address("127.0.0.1")
                .set_port(server_port)
                .set_protocol(MsgBuilder::new())
                .set_worker_name("reconnect-srv"),
        )
        .expect("server start failed");
    bound_rx.recv_timeout(SPEC_WAIT).expect("server never bound");

    let client = Client::new();
    let received = Arc::new(AtomicUsize::new(0));
    {
        let received = Arc::clone(&received);
        client.on_connect(move |connection| {
            let received = Arc::clone(&received);
            connection.on_receive(move |_, _| {
                received.fetch_add(1, Ordering::SeqCst);
            });
        });
    }

    // Two dials aborted by the caller while in flight.
    for _ in 0..2 {
        client
            .connect(
                Client::configurate_tcp()
                    .set_address("127.0.0.1")
                    .set_port(dead_port)
                    .set_protocol(MsgBuilder::new()),
            )
            .expect("connect failed to start");
        client.disconnect();
    }

    // The third dial targets the live server and completes.
    client
        .connect(
            Client::configurate_tcp()
                .set_address("127.0.0.1")
                .set_port(server_port)
                .set_protocol(MsgBuilder::new()),
        )
        .expect("connect failed to start");

    assert!(
        wait_for(SPEC_WAIT, || received.load(Ordering::SeqCst) == 1),
        "the completed attempt never delivered"
    );
    assert!(client.is_connected());

    // Nothing trickles in late from the aborted attempts.
    std::thread::sleep(std::time::Duration::from_millis(200));
    assert_eq!(received.load(Ordering::SeqCst), 1);

    client.disconnect();
    server.stop(true);
}
