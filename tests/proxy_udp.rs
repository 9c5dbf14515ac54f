//! End-to-end tests of the proxy against a fake far end on localhost UDP.

use cil_proxy::protocol::{MessageClass, WireMessage, decode, encode};
use cil_proxy::{Command, CommandResult, Config, ProxyServer, RequestContext, Session, codes};
use std::net::{SocketAddr, UdpSocket};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// Fake TCS: replies to each received command with a scripted list of datagrams
struct FakeTcs {
    socket: UdpSocket,
}

impl FakeTcs {
    fn bind() -> Self {
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        socket
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        Self { socket }
    }

    fn port(&self) -> u16 {
        self.socket.local_addr().unwrap().port()
    }

    fn recv_command(&self) -> (WireMessage, SocketAddr) {
        let mut buf = [0u8; 2048];
        let (len, from) = self.socket.recv_from(&mut buf).unwrap();
        (decode(&buf[..len]).unwrap(), from)
    }

    fn reply(&self, to: SocketAddr, class: MessageClass, seq: i32, text: &str) {
        self.socket
            .send_to(&encode(1, 17, class, 1, seq, text), to)
            .unwrap();
    }
}

#[derive(Default)]
struct RecordingSession {
    acks: Mutex<Vec<(i32, Duration)>>,
    dones: Mutex<Vec<(i32, CommandResult)>>,
}

impl Session for RecordingSession {
    fn deliver_ack(&self, ctx: &RequestContext, time_to_complete: Duration) {
        self.acks.lock().unwrap().push((ctx.sequence, time_to_complete));
    }

    fn deliver_done(&self, ctx: &RequestContext, result: CommandResult) {
        self.dones.lock().unwrap().push((ctx.sequence, result));
    }
}

fn config_for(far_end: &FakeTcs, dialect: &str, start_sequence: i32) -> Config {
    let mut config = Config::default();
    config.network.remote_host = "127.0.0.1".to_string();
    config.network.remote_port = far_end.port();
    config.network.read_timeout_ms = 50;
    config.proxy.dialect = dialect.to_string();
    config.proxy.start_sequence = start_sequence;
    config.proxy.dispatch_poll_ms = 20;
    config
}

fn wait_for<F: Fn() -> bool>(condition: F) {
    let deadline = Instant::now() + Duration::from_secs(3);
    while !condition() {
        assert!(Instant::now() < deadline, "condition not reached in time");
        thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn test_ack_then_done_over_udp() {
    let far_end = FakeTcs::bind();
    let mut server = ProxyServer::start(&config_for(&far_end, "tcs", 40)).unwrap();
    let session = Arc::new(RecordingSession::default());

    let handler = server.submit(
        Command::Slew {
            ra_deg: 83.6,
            dec_deg: 22.0,
        },
        session.clone(),
    );
    assert_eq!(handler.sequence(), 41);

    let (cmd, proxy_addr) = far_end.recv_command();
    assert_eq!(cmd.class(), Some(MessageClass::Command));
    assert_eq!(cmd.sequence, 41);
    assert_eq!(cmd.text, "SLEW 83.600000 22.000000");

    far_end.reply(proxy_addr, MessageClass::Ack, 41, "");
    wait_for(|| session.acks.lock().unwrap().len() == 1);
    let (seq, ttc) = session.acks.lock().unwrap()[0];
    assert_eq!(seq, 41);
    assert!((ttc.as_secs_f64() - 11.0).abs() < 1e-6);

    far_end.reply(proxy_addr, MessageClass::Done, 41, "OK 1.0 2.0");
    wait_for(|| session.dones.lock().unwrap().len() == 1);
    let result = session.dones.lock().unwrap()[0].1.clone();
    assert!(result.success);
    assert_eq!(result.numeric_values(), vec![1.0, 2.0]);
    assert!(!server.registry().contains(41));

    // Late ACK after completion is dropped quietly
    far_end.reply(proxy_addr, MessageClass::Ack, 41, "");
    thread::sleep(Duration::from_millis(100));
    assert_eq!(session.acks.lock().unwrap().len(), 1);

    server.shutdown().unwrap();
}

#[test]
fn test_far_end_timeout_marker() {
    let far_end = FakeTcs::bind();
    let server = ProxyServer::start(&config_for(&far_end, "tcs", 0)).unwrap();

    let responder = thread::spawn(move || {
        let (cmd, from) = far_end.recv_command();
        far_end.reply(from, MessageClass::Error, cmd.sequence, "<<090000>> expired");
    });

    let result = server.execute(Command::Focus { position_mm: 0.2 });
    responder.join().unwrap();

    assert!(!result.success);
    assert_eq!(result.code, codes::FAR_END_TIMEOUT);
    assert_eq!(server.outstanding(), 0);
}

#[test]
fn test_foreign_sequence_does_not_stall_dispatch() {
    let far_end = FakeTcs::bind();
    let server = ProxyServer::start(&config_for(&far_end, "tcs", 100)).unwrap();

    let responder = thread::spawn(move || {
        let (cmd, from) = far_end.recv_command();
        far_end.reply(from, MessageClass::Done, 5_000, "OK stray");
        far_end.reply(from, MessageClass::Action, cmd.sequence, "");
        far_end.reply(from, MessageClass::Response, cmd.sequence, "OK 42");
    });

    let result = server.execute(Command::Show {
        key: "AZIMUTH".into(),
    });
    responder.join().unwrap();
    assert!(result.success);
    assert_eq!(result.values, vec!["42".to_string()]);
}

#[test]
fn test_concurrent_callers_get_their_own_replies() {
    let far_end = FakeTcs::bind();
    let server = Arc::new(ProxyServer::start(&config_for(&far_end, "tcs", 0)).unwrap());
    let callers = 8;

    let responder = thread::spawn(move || {
        let mut pending = Vec::new();
        for _ in 0..callers {
            pending.push(far_end.recv_command());
        }
        // Reply in reverse order to exercise correlation
        for (cmd, from) in pending.into_iter().rev() {
            let reply = format!("OK {}", cmd.text.trim_start_matches("FOCUS "));
            far_end.reply(from, MessageClass::Done, cmd.sequence, &reply);
        }
    });

    let handles: Vec<_> = (0..callers)
        .map(|i| {
            let server = Arc::clone(&server);
            thread::spawn(move || {
                let position = i as f64 + 0.5;
                let result = server.execute(Command::Focus {
                    position_mm: position,
                });
                (position, result)
            })
        })
        .collect();

    for handle in handles {
        let (position, result) = handle.join().unwrap();
        assert!(result.success, "{:?}", result);
        assert_eq!(result.numeric_values(), vec![position]);
    }
    responder.join().unwrap();
    assert_eq!(server.outstanding(), 0);
}

#[test]
fn test_simulator_dialect_noop_sends_nothing() {
    let far_end = FakeTcs::bind();
    far_end
        .socket
        .set_read_timeout(Some(Duration::from_millis(200)))
        .unwrap();
    let server = ProxyServer::start(&config_for(&far_end, "simulator", 0)).unwrap();
    assert_eq!(server.translator_name(), "simulator");

    let result = server.execute(Command::Autoguide { enable: true });
    assert!(result.success);
    assert_eq!(server.outstanding(), 0);

    let mut buf = [0u8; 256];
    assert!(far_end.socket.recv_from(&mut buf).is_err());
}
