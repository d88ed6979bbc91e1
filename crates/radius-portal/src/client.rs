//! RADIUS authentication client
//!
//! One call to [`RadiusClient::authenticate`] is one attempt: build an
//! Access-Request, exchange it once over UDP, and verify and classify the
//! reply. Every path ends in an [`AuthOutcome`]; nothing is returned as an
//! error. The specific reason is logged and counted so that timeouts,
//! rejects and bad replies can be told apart operationally.

use crate::config::RadiusConfig;
use crate::stats::{ClientStats, StatsSnapshot};
use crate::transport::{SocketBinder, TransportError, UdpBinder, UdpTransport};
use radius_proto::{AccessRequest, AccessResponse, AttributeType, Code};
use serde::Serialize;
use tracing::{debug, error, info, warn};

pub const MSG_AUTH_SUCCESS: &str = "Authentication successful";
pub const MSG_AUTH_FAILED: &str = "Authentication failed";
pub const MSG_TIMEOUT: &str = "RADIUS timeout";
pub const MSG_COMMUNICATION_ERROR: &str = "RADIUS communication error";
pub const MSG_INVALID_RESPONSE: &str = "Invalid RADIUS response";
pub const MSG_INVALID_REQUEST: &str = "Invalid RADIUS request";
pub const MSG_REACHABLE: &str = "RADIUS server is reachable";
pub const MSG_UNREACHABLE: &str = "RADIUS server not reachable";

/// Credentials used by [`RadiusClient::test_connection`]
const PROBE_USERNAME: &str = "test";
const PROBE_PASSWORD: &str = "test";

/// The result handed back to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuthOutcome {
    pub fn success(message: impl Into<String>) -> Self {
        AuthOutcome {
            success: true,
            message: Some(message.into()),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        AuthOutcome {
            success: false,
            message: None,
            error: Some(error.into()),
        }
    }
}

/// How a single attempt ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Verified Access-Accept
    Accepted { reply_message: Option<String> },
    /// Verified reply with any other code, Access-Challenge included
    Rejected {
        code: Code,
        reply_message: Option<String>,
    },
    /// No datagram before the deadline
    TimedOut,
    /// Socket-level failure
    TransportFailed(String),
    /// Reply was malformed or failed authentication
    DecodeFailed(String),
    /// The request could not be built; nothing was sent
    EncodeFailed(String),
}

impl Verdict {
    pub fn outcome(&self) -> AuthOutcome {
        match self {
            Verdict::Accepted { .. } => AuthOutcome::success(MSG_AUTH_SUCCESS),
            Verdict::Rejected { .. } => AuthOutcome::failure(MSG_AUTH_FAILED),
            Verdict::TimedOut => AuthOutcome::failure(MSG_TIMEOUT),
            Verdict::TransportFailed(_) => AuthOutcome::failure(MSG_COMMUNICATION_ERROR),
            Verdict::DecodeFailed(_) => AuthOutcome::failure(MSG_INVALID_RESPONSE),
            Verdict::EncodeFailed(_) => AuthOutcome::failure(MSG_INVALID_REQUEST),
        }
    }

    /// True when a correctly signed reply came back, whatever its code
    pub fn server_answered(&self) -> bool {
        matches!(self, Verdict::Accepted { .. } | Verdict::Rejected { .. })
    }
}

/// RADIUS client bound to one server
pub struct RadiusClient<B = UdpBinder> {
    config: RadiusConfig,
    transport: UdpTransport<B>,
    stats: ClientStats,
}

impl RadiusClient<UdpBinder> {
    pub fn new(config: &RadiusConfig) -> Self {
        Self::with_binder(config, UdpBinder)
    }
}

impl<B: SocketBinder> RadiusClient<B> {
    /// Create a client that opens its sockets through `binder`
    pub fn with_binder(config: &RadiusConfig, binder: B) -> Self {
        let transport =
            UdpTransport::with_binder(binder, config.server.clone(), config.port, config.timeout());
        RadiusClient {
            config: config.clone(),
            transport,
            stats: ClientStats::default(),
        }
    }

    pub fn config(&self) -> &RadiusConfig {
        &self.config
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Authenticate a user with the RADIUS server
    pub async fn authenticate(&self, username: &str, password: &str) -> AuthOutcome {
        self.attempt(username, password).await.outcome()
    }

    /// Probe the server with throwaway credentials
    ///
    /// Any correctly signed reply, accept or reject, proves reachability.
    pub async fn test_connection(&self) -> AuthOutcome {
        let verdict = self.attempt(PROBE_USERNAME, PROBE_PASSWORD).await;
        if verdict.server_answered() {
            AuthOutcome::success(MSG_REACHABLE)
        } else {
            AuthOutcome::failure(MSG_UNREACHABLE)
        }
    }

    /// Run one attempt and report exactly how it ended
    pub async fn attempt(&self, username: &str, password: &str) -> Verdict {
        self.stats.record_attempt();

        let request = AccessRequest::with_random_identifier()
            .attribute(AttributeType::UserName.name(), username)
            .attribute(AttributeType::UserPassword.name(), password)
            .attribute(AttributeType::NasIpAddress.name(), self.config.nas_ip_address.as_str())
            .attribute(AttributeType::NasIdentifier.name(), self.config.nas_identifier.as_str());

        let encoded = match request.encode(self.config.secret()) {
            Ok(encoded) => encoded,
            Err(e) => {
                error!(username = %username, error = %e, "Failed to encode Access-Request");
                self.stats.record_encode_error();
                return Verdict::EncodeFailed(e.to_string());
            }
        };

        debug!(
            username = %username,
            identifier = encoded.identifier,
            server = %self.config.server,
            port = self.config.port,
            "Sending Access-Request"
        );

        let data = match self.transport.exchange(&encoded.bytes).await {
            Ok(data) => data,
            Err(TransportError::Timeout) => {
                warn!(
                    username = %username,
                    server = %self.config.server,
                    timeout_ms = self.config.timeout_ms,
                    "RADIUS server did not answer in time"
                );
                self.stats.record_timeout();
                return Verdict::TimedOut;
            }
            Err(TransportError::Communication(e)) => {
                warn!(
                    username = %username,
                    server = %self.config.server,
                    error = %e,
                    "RADIUS communication error"
                );
                self.stats.record_transport_error();
                return Verdict::TransportFailed(e.to_string());
            }
        };

        let response = match AccessResponse::decode(&data, &encoded, self.config.secret()) {
            Ok(response) => response,
            Err(e) => {
                warn!(
                    username = %username,
                    server = %self.config.server,
                    error = %e,
                    "Discarding invalid RADIUS response"
                );
                self.stats.record_invalid_response();
                return Verdict::DecodeFailed(e.to_string());
            }
        };

        let reply_message = response.reply_message();
        match response.code {
            Code::AccessAccept => {
                info!(
                    username = %username,
                    session_timeout = ?response.session_timeout(),
                    "RADIUS authentication successful"
                );
                self.stats.record_accept();
                Verdict::Accepted { reply_message }
            }
            Code::AccessReject => {
                info!(username = %username, reply = ?reply_message, "RADIUS authentication rejected");
                self.stats.record_reject();
                Verdict::Rejected {
                    code: response.code,
                    reply_message,
                }
            }
            other => {
                // Access-Challenge would need a second round trip; not supported
                warn!(
                    username = %username,
                    code = %other,
                    "Unexpected RADIUS response code, treating as reject"
                );
                self.stats.record_reject();
                Verdict::Rejected {
                    code: other,
                    reply_message,
                }
            }
        }
    }
}
