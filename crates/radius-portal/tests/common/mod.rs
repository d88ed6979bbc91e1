//! In-process RADIUS server for integration tests

#![allow(dead_code)]

use radius_portal::RadiusConfig;
use radius_proto::auth::{decrypt_user_password, response_authenticator};
use radius_proto::{Attribute, AttributeType, Code, Packet};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::net::UdpSocket;

pub const SECRET: &str = "testing123";

/// How the fake server answers each request
#[derive(Debug, Clone)]
pub enum Reply {
    /// Accept when the hidden password matches, reject otherwise
    Verify(HashMap<String, String>),
    Accept,
    Reject,
    Challenge,
    /// Never answer
    Silent,
    /// Answer Access-Accept with a broken Response Authenticator
    CorruptAuthenticator,
}

pub struct FakeServer {
    pub addr: SocketAddr,
    received: Arc<AtomicUsize>,
}

impl FakeServer {
    /// Number of datagrams the server has received
    pub fn received(&self) -> usize {
        self.received.load(Ordering::SeqCst)
    }

    /// Client configuration pointing at this server
    pub fn config(&self, timeout_ms: u32) -> RadiusConfig {
        RadiusConfig {
            secret: SECRET.to_string(),
            server: self.addr.ip().to_string(),
            port: self.addr.port(),
            timeout_ms,
            ..Default::default()
        }
    }
}

pub fn users(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(user, pass)| (user.to_string(), pass.to_string()))
        .collect()
}

/// Start a fake server on an ephemeral loopback port
pub async fn start(reply: Reply) -> FakeServer {
    let socket = UdpSocket::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind fake server");
    let addr = socket.local_addr().expect("Failed to read local address");
    let received = Arc::new(AtomicUsize::new(0));

    let counter = received.clone();
    tokio::spawn(async move {
        let mut buf = vec![0u8; Packet::MAX_PACKET_SIZE];
        loop {
            let Ok((len, peer)) = socket.recv_from(&mut buf).await else {
                continue;
            };
            counter.fetch_add(1, Ordering::SeqCst);

            let Ok(request) = Packet::decode(&buf[..len]) else {
                continue;
            };
            if let Some(response) = answer(&request, &reply, SECRET.as_bytes()) {
                let _ = socket.send_to(&response, peer).await;
            }
        }
    });

    FakeServer { addr, received }
}

/// Build the bytes the server sends back for `request`, if any
pub fn answer(request: &Packet, reply: &Reply, secret: &[u8]) -> Option<Vec<u8>> {
    match reply {
        Reply::Verify(users) => {
            let code = if password_matches(request, users, secret) {
                Code::AccessAccept
            } else {
                Code::AccessReject
            };
            Some(signed_reply(request, code, secret, None))
        }
        Reply::Accept => Some(signed_reply(request, Code::AccessAccept, secret, Some("Welcome"))),
        Reply::Reject => Some(signed_reply(request, Code::AccessReject, secret, Some("Denied"))),
        Reply::Challenge => Some(signed_reply(request, Code::AccessChallenge, secret, None)),
        Reply::Silent => None,
        Reply::CorruptAuthenticator => {
            let mut response = signed_reply(request, Code::AccessAccept, secret, None);
            response[4] ^= 0xff;
            Some(response)
        }
    }
}

/// A response signed with the Response Authenticator the client expects
pub fn signed_reply(
    request: &Packet,
    code: Code,
    secret: &[u8],
    reply_message: Option<&str>,
) -> Vec<u8> {
    let mut response = Packet::new(code, request.identifier, request.authenticator);
    if let Some(message) = reply_message {
        response.add_attribute(
            Attribute::string(AttributeType::ReplyMessage.as_u8(), message)
                .expect("Failed to create Reply-Message"),
        );
    }

    let mut bytes = response.encode().expect("Failed to encode response");
    let authenticator = response_authenticator(&bytes, &request.authenticator, secret);
    bytes[4..20].copy_from_slice(&authenticator);
    bytes
}

fn password_matches(request: &Packet, users: &HashMap<String, String>, secret: &[u8]) -> bool {
    let username = request
        .find_attribute(AttributeType::UserName.as_u8())
        .and_then(|attr| attr.as_string().ok());
    let password = request
        .find_attribute(AttributeType::UserPassword.as_u8())
        .and_then(|attr| decrypt_user_password(&attr.value, secret, &request.authenticator).ok());

    match (username, password) {
        (Some(username), Some(password)) => users.get(&username) == Some(&password),
        _ => false,
    }
}
