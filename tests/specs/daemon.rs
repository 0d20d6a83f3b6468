// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A composed daemon: supervisor main loop, server on its own pool, client
//! exchange, then a signal-driven shutdown that tears everything down.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::Arc;

use berth_app::{AppConfig, Application, FakeSignalSource};
use berth_net::{Client, Server};
use berth_wire::MsgBuilder;

use super::prelude::*;

const SIGTERM: i32 = 15;

#[test]
fn supervised_server_shuts_down_on_terminate() {
    let port = free_port();

    let source = FakeSignalSource::new();
    let signals = source.handle();
    let app = Application::init_with_source(
        AppConfig::new().set_enforce_main_thread(false),
        source,
    )
    .expect("init failed");

    let server = Arc::new(Server::new());
    server.on_new_connection(|connection| {
        connection.on_receive(|connection, unit| {
            if unit.as_bytes() == Some(b"status") {
                connection.post_bytes(b"alive").expect("post failed");
                connection.commit();
            }
        });
    });
    let (bound_tx, bound_rx) = mpsc::channel();
    server.on_start(move || {
        let _ = bound_tx.send(());
    });

    {
        let server = Arc::clone(&server);
        app.on_start(move || {
            server
                .start(
                    Server::configurate_tcp()
                        .set_address("127.0.0.1")
                        .set_port(port)
                        .set_protocol(MsgBuilder::new())
                        .set_worker_threads(2)
                        .set_worker_name("daemon-srv"),
                )
                .expect("server start failed");
        });
    }
    {
        // The exit callback runs on the main loop; the server stops on its
        // own pool, so stopping it here is safe.
        let server = Arc::clone(&server);
        app.on_exit(move |_| {
            server.stop(true);
        });
    }

    let runner = std::thread::spawn(move || app.run());
    app.wait();
    bound_rx.recv_timeout(SPEC_WAIT).expect("server never bound");

    let client = Client::new();
    let replies = Arc::new(AtomicUsize::new(0));
    let dropped = Arc::new(AtomicUsize::new(0));
    {
        let replies = Arc::clone(&replies);
        let dropped = Arc::clone(&dropped);
        client.on_connect(move |connection| {
            let replies = Arc::clone(&replies);
            connection.on_receive(move |_, unit| {
                if unit.as_bytes() == Some(b"alive") {
                    replies.fetch_add(1, Ordering::SeqCst);
                }
            });
            let dropped = Arc::clone(&dropped);
            connection.on_disconnect(move || {
                dropped.fetch_add(1, Ordering::SeqCst);
            });
            connection.post_bytes(b"status").expect("post failed");
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

    assert!(wait_for(SPEC_WAIT, || replies.load(Ordering::SeqCst) == 1));

    signals.raise_signo(SIGTERM);
    let code = runner.join().expect("run thread panicked");
    assert_eq!(code, 128 + SIGTERM);

    assert!(!server.is_running());
    assert_eq!(server.connection_count(), 0);
    assert!(
        wait_for(SPEC_WAIT, || dropped.load(Ordering::SeqCst) == 1),
        "client never observed the shutdown"
    );

    client.disconnect();
}
