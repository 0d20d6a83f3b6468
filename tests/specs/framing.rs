// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A framing violation disconnects the offending connection and nobody else.

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::Arc;

use parking_lot::Mutex;

use berth_net::{Client, Server};
use berth_wire::MsgBuilder;

use super::prelude::*;

const MAX_PAYLOAD: usize = 64;

#[test]
fn overlength_frame_disconnects_one_client_and_the_other_survives() {
    let port = free_port();

    let server = Server::new();
    let server_disconnects = Arc::new(AtomicUsize::new(0));
    {
        let server_disconnects = Arc::clone(&server_disconnects);
        server.on_new_connection(move |connection| {
            connection.on_receive(|connection, unit| {
                if unit.as_bytes() == Some(b"ping") {
                    connection.post_bytes(b"pong").expect("post failed");
                    connection.commit();
                }
            });
            let server_disconnects = Arc::clone(&server_disconnects);
            connection.on_disconnect(move || {
                server_disconnects.fetch_add(1, Ordering::SeqCst);
            });
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
                .set_protocol(MsgBuilder::with_max_payload(MAX_PAYLOAD))
                .set_worker_threads(2)
                .set_worker_name("framing-srv"),
        )
        .expect("server start failed");
    bound_rx.recv_timeout(SPEC_WAIT).expect("server never bound");

    // Client B speaks the protocol properly.
    let well_behaved = Client::new();
    let pongs: Arc<Mutex<Vec<Vec<u8>>>> = Arc::new(Mutex::new(Vec::new()));
    {
        let pongs = Arc::clone(&pongs);
        well_behaved.on_connect(move |connection| {
            let pongs = Arc::clone(&pongs);
            connection.on_receive(move |_, unit| {
                pongs.lock().push(unit.as_bytes().map(<[u8]>::to_vec).unwrap_or_default());
            });
        });
    }
    well_behaved
        .connect(
            Client::configurate_tcp()
                .set_address("127.0.0.1")
                .set_port(port)
                .set_protocol(MsgBuilder::with_max_payload(MAX_PAYLOAD)),
        )
        .expect("client connect failed");
    assert!(wait_for(SPEC_WAIT, || server.connection_count() == 1));

    // Client A writes a length prefix far beyond the maximum, raw.
    let mut offender =
        std::net::TcpStream::connect(("127.0.0.1", port)).expect("raw connect failed");
    assert!(wait_for(SPEC_WAIT, || server.connection_count() == 2));
    offender
        .write_all(&(MAX_PAYLOAD as u32 + 1).to_be_bytes())
        .expect("raw write failed");

    // The server drops the offender and keeps serving B.
    assert!(
        wait_for(SPEC_WAIT, || {
            server_disconnects.load(Ordering::SeqCst) == 1 && server.connection_count() == 1
        }),
        "offender was not dropped exactly once"
    );

    let connection = well_behaved.connection().expect("client lost its connection");
    connection.post_bytes(b"ping").expect("post failed");
    connection.commit();
    assert!(
        wait_for(SPEC_WAIT, || *pongs.lock() == vec![b"pong".to_vec()]),
        "the surviving client stopped being served"
    );

    server.stop(true);
}
