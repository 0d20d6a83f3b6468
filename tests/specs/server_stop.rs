// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Server stop disconnects every client.
//!
//! Ten clients exchange one ping/pong each through a five-thread pool, then
//! the server stops with `wait_for_removal`. Every client observes exactly
//! one disconnect and no partial unit.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::Arc;

use parking_lot::Mutex;

use berth_net::{Client, Server};
use berth_wire::MsgBuilder;

use super::prelude::*;

const CLIENT_COUNT: usize = 10;

#[test]
fn stopping_the_server_disconnects_every_client_exactly_once() {
    let port = free_port();

    let server = Server::new();
    server.on_new_connection(|connection| {
        connection.on_receive(|connection, unit| {
            if unit.as_bytes() == Some(b"ping") {
                connection.post_bytes(b"pong").expect("post failed");
                connection.commit();
            }
        });
    });

    let (bound_tx, bound_rx) = mpsc::channel();
    server.on_start(move || {
        let _ = bound_tx.send(());
    });
    server
        .start(
            Server::configurate_tcp()
                .set_address("127.0.0.1")
                .set_port(port)
                .set_protocol(MsgBuilder::new())
                .set_worker_threads(5)
                .set_worker_name("pool-srv"),
        )
        .expect("server start failed");
    bound_rx.recv_timeout(SPEC_WAIT).expect("server never bound");
    assert!(server.wait(false));

    // Work injected from the outside runs on the pool.
    let (posted_tx, posted_rx) = mpsc::channel();
    server.post(move || {
        let _ = posted_tx.send(());
    });
    posted_rx.recv_timeout(SPEC_WAIT).expect("posted task never ran");

    let mut clients = Vec::new();
    let mut pongs = Vec::new();
    let mut disconnects = Vec::new();
    for _ in 0..CLIENT_COUNT {
        let client = Client::new();
        let pong_log: Arc<Mutex<Vec<Vec<u8>>>> = Arc::new(Mutex::new(Vec::new()));
        let disconnected = Arc::new(AtomicUsize::new(0));
        {
            let pong_log = Arc::clone(&pong_log);
            let disconnected = Arc::clone(&disconnected);
            client.on_connect(move |connection| {
                let pong_log = Arc::clone(&pong_log);
                connection.on_receive(move |_, unit| {
                    pong_log.lock().push(unit.as_bytes().map(<[u8]>::to_vec).unwrap_or_default());
                });
                let disconnected = Arc::clone(&disconnected);
                connection.on_disconnect(move || {
                    disconnected.fetch_add(1, Ordering::SeqCst);
                });
                connection.post_bytes(b"ping").expect("post failed");
                connection.commit();
            });
        }
        client
            .connect(
                Client::configurate_tcp()
                    .set_address("127.0.0.1")
                    .set_port(port)
                    .set_protocol(MsgBuilder::new()),
            )
            .expect("client connect failed");
        clients.push(client);
        pongs.push(pong_log);
        disconnects.push(disconnected);
    }

    assert!(
        wait_for(SPEC_WAIT, || {
            pongs.iter().all(|log| log.lock().len() == 1)
                && server.connection_count() == CLIENT_COUNT
        }),
        "not every client completed its exchange"
    );

    server.stop(true);
    assert_eq!(server.connection_count(), 0);

    assert!(
        wait_for(SPEC_WAIT, || {
            disconnects.iter().all(|count| count.load(Ordering::SeqCst) == 1)
        }),
        "not every client observed its disconnect exactly once"
    );
    for log in &pongs {
        assert_eq!(*log.lock(), vec![b"pong".to_vec()], "client observed a partial unit");
    }
}
