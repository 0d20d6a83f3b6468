// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TCP ping/pong with a client-initiated close.
//!
//! Flow: server sends "ping" → client answers "pong test" → server sends
//! "exit" → client disconnects → the server's table empties.

use std::sync::mpsc;
use std::sync::Arc;

use parking_lot::Mutex;

use berth_net::{Client, Server};
use berth_wire::MsgBuilder;

use super::prelude::*;

#[test]
fn ping_pong_round_trip_and_client_close() {
    let port = free_port();

    let server = Server::new();
    let server_saw: Arc<Mutex<Vec<Vec<u8>>>> = Arc::new(Mutex::new(Vec::new()));
    {
        let server_saw = Arc::clone(&server_saw);
        server.on_new_connection(move |connection| {
            let server_saw = Arc::clone(&server_saw);
            connection.on_receive(move |connection, unit| {
                let payload = unit.as_bytes().map(<[u8]>::to_vec).unwrap_or_default();
                server_saw.lock().push(payload.clone());
                if payload == b"pong test" {
                    connection.post_bytes(b"exit").expect("post failed");
                    connection.commit();
                }
            });
            connection.post_bytes(b"ping").expect("post failed");
            connection.commit();
        });
    }

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
                .set_worker_name("pingpong-srv"),
        )
        .expect("server start failed");
    bound_rx.recv_timeout(SPEC_WAIT).expect("server never bound");

    let client = Client::new();
    let client_saw: Arc<Mutex<Vec<Vec<u8>>>> = Arc::new(Mutex::new(Vec::new()));
    {
        let client_saw = Arc::clone(&client_saw);
        client.on_connect(move |connection| {
            let client_saw = Arc::clone(&client_saw);
            connection.on_receive(move |connection, unit| {
                let payload = unit.as_bytes().map(<[u8]>::to_vec).unwrap_or_default();
                client_saw.lock().push(payload.clone());
                match payload.as_slice() {
                    b"ping" => {
                        connection.post_bytes(b"pong test").expect("post failed");
                        connection.commit();
                    }
                    b"exit" => connection.disconnect(),
                    _ => {}
                }
            });
        });
    }
    client
        .connect(
            Client::configurate_tcp()
                .set_address("127.0.0.1")
                .set_port(port)
                .set_protocol(MsgBuilder::new())
                .set_worker_name("pingpong-cli"),
        )
        .expect("client connect failed");

    assert!(
        wait_for(SPEC_WAIT, || {
            *client_saw.lock() == vec![b"ping".to_vec(), b"exit".to_vec()]
                && *server_saw.lock() == vec![b"pong test".to_vec()]
                && server.connection_count() == 0
        }),
        "exchange did not complete: client={:?} server={:?} tracked={}",
        client_saw.lock(),
        server_saw.lock(),
        server.connection_count(),
    );

    server.stop(true);
    assert_eq!(server.connection_count(), 0);
}
