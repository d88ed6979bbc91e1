//! RADIUS client integration tests
//!
//! Each test runs the client against an in-process RADIUS server on a
//! loopback UDP port, or against injected sockets where the network cannot
//! produce the condition on demand.

mod common;

use async_trait::async_trait;
use common::{Reply, SECRET};
use radius_portal::{DatagramSocket, RadiusClient, RadiusConfig, SocketBinder, Verdict};
use radius_proto::{Code, Packet};
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::task::JoinSet;

#[tokio::test]
async fn test_access_accept() {
    let server = common::start(Reply::Verify(common::users(&[("alice", "password")]))).await;
    let client = RadiusClient::new(&server.config(2000));

    let outcome = client.authenticate("alice", "password").await;
    assert!(outcome.success);
    assert_eq!(outcome.message.as_deref(), Some("Authentication successful"));
    assert!(outcome.error.is_none());
    assert_eq!(server.received(), 1);
}

#[tokio::test]
async fn test_access_reject() {
    let server = common::start(Reply::Verify(common::users(&[("alice", "password")]))).await;
    let client = RadiusClient::new(&server.config(2000));

    let outcome = client.authenticate("alice", "wrong").await;
    assert!(!outcome.success);
    assert_eq!(outcome.error.as_deref(), Some("Authentication failed"));
    assert_eq!(client.stats().rejects, 1);
}

#[tokio::test]
async fn test_reply_message_is_kept_on_reject() {
    let server = common::start(Reply::Reject).await;
    let client = RadiusClient::new(&server.config(2000));

    let verdict = client.attempt("alice", "password").await;
    assert_eq!(
        verdict,
        Verdict::Rejected {
            code: Code::AccessReject,
            reply_message: Some("Denied".to_string()),
        }
    );
}

#[tokio::test]
async fn test_access_challenge_is_a_failure() {
    let server = common::start(Reply::Challenge).await;
    let client = RadiusClient::new(&server.config(2000));

    let verdict = client.attempt("alice", "password").await;
    assert!(matches!(
        verdict,
        Verdict::Rejected {
            code: Code::AccessChallenge,
            ..
        }
    ));
    assert_eq!(verdict.outcome().error.as_deref(), Some("Authentication failed"));
}

#[tokio::test]
async fn test_silent_server_times_out() {
    let server = common::start(Reply::Silent).await;
    let client = RadiusClient::new(&server.config(3000));

    let started = Instant::now();
    let outcome = client.authenticate("alice", "password").await;
    let elapsed = started.elapsed();

    assert!(!outcome.success);
    assert_eq!(outcome.error.as_deref(), Some("RADIUS timeout"));
    assert!(elapsed >= Duration::from_millis(3000));
    assert!(elapsed < Duration::from_millis(4000), "took {:?}", elapsed);
    assert_eq!(server.received(), 1);
}

#[tokio::test]
async fn test_corrupted_authenticator() {
    let server = common::start(Reply::CorruptAuthenticator).await;
    let client = RadiusClient::new(&server.config(2000));

    let outcome = client.authenticate("alice", "password").await;
    assert!(!outcome.success);
    assert_eq!(outcome.error.as_deref(), Some("Invalid RADIUS response"));
    assert_eq!(client.stats().invalid_responses, 1);
}

#[tokio::test]
async fn test_wrong_shared_secret_is_invalid_response() {
    let server = common::start(Reply::Accept).await;
    let config = RadiusConfig {
        secret: "not-the-secret".to_string(),
        ..server.config(2000)
    };
    let client = RadiusClient::new(&config);

    let outcome = client.authenticate("alice", "password").await;
    assert_eq!(outcome.error.as_deref(), Some("Invalid RADIUS response"));
}

#[tokio::test]
async fn test_accept_sent_from_another_port() {
    // Listens on one port and answers from another, like a multi-homed server
    let listener = tokio::net::UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let replier = tokio::net::UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        let mut buf = vec![0u8; Packet::MAX_PACKET_SIZE];
        let (len, peer) = listener.recv_from(&mut buf).await.unwrap();
        let request = Packet::decode(&buf[..len]).unwrap();
        let reply = common::signed_reply(&request, Code::AccessAccept, SECRET.as_bytes(), None);
        replier.send_to(&reply, peer).await.unwrap();
    });

    let config = RadiusConfig {
        server: "127.0.0.1".to_string(),
        port,
        timeout_ms: 2000,
        ..Default::default()
    };
    let client = RadiusClient::new(&config);

    let outcome = client.authenticate("alice", "password").await;
    assert!(outcome.success, "{:?}", outcome);
    assert_eq!(outcome.message.as_deref(), Some("Authentication successful"));
}

#[tokio::test]
async fn test_connection_counts_reject_as_reachable() {
    let server = common::start(Reply::Verify(common::users(&[]))).await;
    let client = RadiusClient::new(&server.config(2000));

    let outcome = client.test_connection().await;
    assert!(outcome.success);
    assert_eq!(outcome.message.as_deref(), Some("RADIUS server is reachable"));
}

#[tokio::test]
async fn test_connection_to_silent_server() {
    let server = common::start(Reply::Silent).await;
    let client = RadiusClient::new(&server.config(200));

    let outcome = client.test_connection().await;
    assert!(!outcome.success);
    assert_eq!(outcome.error.as_deref(), Some("RADIUS server not reachable"));
}

#[tokio::test]
async fn test_sequential_attempts_use_fresh_sockets() {
    let server = common::start(Reply::Accept).await;
    let client = RadiusClient::new(&server.config(2000));

    for _ in 0..5 {
        assert!(client.authenticate("alice", "password").await.success);
    }

    let stats = client.stats();
    assert_eq!(stats.attempts, 5);
    assert_eq!(stats.accepts, 5);
    assert_eq!(server.received(), 5);
}

/// What an injected socket does with the request it is given
#[derive(Debug, Clone, Copy)]
enum Script {
    Accept,
    Reject,
    Silent,
    Unreachable,
}

/// Hands out scripted sockets and records every release
#[derive(Clone, Default)]
struct ScriptedBinder {
    opened: Arc<AtomicUsize>,
    released: Arc<Mutex<Vec<usize>>>,
}

#[async_trait]
impl SocketBinder for ScriptedBinder {
    type Socket = ScriptedSocket;

    async fn open(&self, _host: &str, _port: u16) -> io::Result<ScriptedSocket> {
        let id = self.opened.fetch_add(1, Ordering::SeqCst);
        let script = match id % 4 {
            0 => Script::Accept,
            1 => Script::Reject,
            2 => Script::Silent,
            _ => Script::Unreachable,
        };
        Ok(ScriptedSocket {
            id,
            script,
            pending: None,
            released: self.released.clone(),
        })
    }
}

struct ScriptedSocket {
    id: usize,
    script: Script,
    pending: Option<Vec<u8>>,
    released: Arc<Mutex<Vec<usize>>>,
}

impl Drop for ScriptedSocket {
    fn drop(&mut self) {
        self.released.lock().unwrap().push(self.id);
    }
}

#[async_trait]
impl DatagramSocket for ScriptedSocket {
    async fn send(&mut self, buf: &[u8]) -> io::Result<usize> {
        let request = Packet::decode(buf).map_err(|e| io::Error::other(e.to_string()))?;
        let secret = SECRET.as_bytes();
        self.pending = match self.script {
            Script::Accept => Some(common::signed_reply(&request, Code::AccessAccept, secret, None)),
            Script::Reject => Some(common::signed_reply(&request, Code::AccessReject, secret, None)),
            Script::Silent => None,
            Script::Unreachable => return Err(io::ErrorKind::NetworkUnreachable.into()),
        };
        Ok(buf.len())
    }

    async fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.pending.take() {
            Some(response) => {
                buf[..response.len()].copy_from_slice(&response);
                Ok(response.len())
            }
            None => std::future::pending().await,
        }
    }
}

#[tokio::test]
async fn test_unreachable_destination() {
    let binder = ScriptedBinder::default();
    // Skip to the first Unreachable socket
    binder.opened.store(3, Ordering::SeqCst);

    let config = RadiusConfig {
        timeout_ms: 2000,
        ..Default::default()
    };
    let client = RadiusClient::with_binder(&config, binder.clone());

    let outcome = client.authenticate("alice", "password").await;
    assert!(!outcome.success);
    assert_eq!(outcome.error.as_deref(), Some("RADIUS communication error"));
    assert_eq!(*binder.released.lock().unwrap(), vec![3]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_every_socket_released_once() {
    const CALLS: usize = 100;

    let binder = ScriptedBinder::default();
    let config = RadiusConfig {
        timeout_ms: 200,
        ..Default::default()
    };
    let client = Arc::new(RadiusClient::with_binder(&config, binder.clone()));

    let mut calls = JoinSet::new();
    for i in 0..CALLS {
        let client = client.clone();
        calls.spawn(async move { client.attempt(&format!("user{}", i), "password").await });
    }

    let mut accepted = 0;
    let mut rejected = 0;
    let mut timed_out = 0;
    let mut failed = 0;
    while let Some(result) = calls.join_next().await {
        match result.expect("Attempt panicked") {
            Verdict::Accepted { .. } => accepted += 1,
            Verdict::Rejected { .. } => rejected += 1,
            Verdict::TimedOut => timed_out += 1,
            Verdict::TransportFailed(_) => failed += 1,
            other => panic!("Unexpected verdict: {:?}", other),
        }
    }

    assert_eq!((accepted, rejected, timed_out, failed), (25, 25, 25, 25));
    assert_eq!(binder.opened.load(Ordering::SeqCst), CALLS);

    let mut released = binder.released.lock().unwrap().clone();
    released.sort_unstable();
    assert_eq!(released, (0..CALLS).collect::<Vec<_>>());

    let stats = client.stats();
    assert_eq!(stats.attempts, CALLS as u64);
    assert_eq!(stats.completed(), CALLS as u64);
}
