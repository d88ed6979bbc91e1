//! Access-Request / Access-Response codec
//!
//! This is the client side of an RFC 2865 authentication exchange. An
//! [`AccessRequest`] is a logical list of named attributes. Encoding it
//! produces an [`EncodedRequest`] that keeps the Request Authenticator
//! needed to verify the reply. [`AccessResponse::decode`] only trusts a
//! reply whose Response Authenticator checks out against that request and
//! the shared secret.

use crate::attributes::{Attribute, AttributeType, ValueKind};
use crate::auth::{encrypt_user_password, generate_request_authenticator, verify_response_authenticator};
use crate::packet::{Code, Packet, PacketError};
use std::net::Ipv4Addr;
use thiserror::Error;

/// Errors building an outbound Access-Request
#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("Unknown attribute: {0}")]
    UnknownAttribute(String),
    #[error("Invalid value for {attribute}: {reason}")]
    InvalidValue {
        attribute: &'static str,
        reason: String,
    },
    #[error("Packet error: {0}")]
    Packet(#[from] PacketError),
}

/// Errors turning received bytes into a trusted response
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Response too short: {0} bytes")]
    TooShort(usize),
    #[error("Length field says {declared} bytes, datagram has {actual}")]
    LengthMismatch { declared: usize, actual: usize },
    #[error("Identifier mismatch: sent {expected}, received {actual}")]
    IdentifierMismatch { expected: u8, actual: u8 },
    #[error("Response authenticator mismatch")]
    AuthenticatorMismatch,
    #[error("Malformed packet: {0}")]
    Malformed(#[from] PacketError),
}

/// A logical Access-Request: an identifier plus ordered, named attributes
#[derive(Debug, Clone)]
pub struct AccessRequest {
    pub identifier: u8,
    pub attributes: Vec<(String, String)>,
}

/// Wire bytes of an Access-Request together with what is needed to
/// verify its reply
#[derive(Debug, Clone)]
pub struct EncodedRequest {
    pub identifier: u8,
    pub authenticator: [u8; 16],
    pub bytes: Vec<u8>,
}

impl AccessRequest {
    pub fn new(identifier: u8) -> Self {
        AccessRequest {
            identifier,
            attributes: Vec::new(),
        }
    }

    /// Create a request with an identifier drawn uniformly from 0..=255
    pub fn with_random_identifier() -> Self {
        Self::new(rand::random())
    }

    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    /// Encode with a fresh random Request Authenticator
    pub fn encode(&self, secret: &[u8]) -> Result<EncodedRequest, EncodeError> {
        self.encode_with_authenticator(secret, generate_request_authenticator())
    }

    /// Encode with a caller-chosen Request Authenticator
    ///
    /// The output is a pure function of the identifier, the authenticator,
    /// the attribute order and the secret.
    pub fn encode_with_authenticator(
        &self,
        secret: &[u8],
        authenticator: [u8; 16],
    ) -> Result<EncodedRequest, EncodeError> {
        let mut packet = Packet::new(Code::AccessRequest, self.identifier, authenticator);

        for (name, value) in &self.attributes {
            let attr_type = AttributeType::from_name(name)
                .ok_or_else(|| EncodeError::UnknownAttribute(name.clone()))?;
            packet.add_attribute(encode_value(attr_type, value, secret, &authenticator)?);
        }

        Ok(EncodedRequest {
            identifier: self.identifier,
            authenticator,
            bytes: packet.encode()?,
        })
    }
}

fn encode_value(
    attr_type: AttributeType,
    value: &str,
    secret: &[u8],
    authenticator: &[u8; 16],
) -> Result<Attribute, EncodeError> {
    let invalid = |reason: String| EncodeError::InvalidValue {
        attribute: attr_type.name(),
        reason,
    };

    let bytes = match attr_type.kind() {
        ValueKind::Text | ValueKind::Octets => value.as_bytes().to_vec(),
        ValueKind::HiddenPassword => encrypt_user_password(value, secret, authenticator)
            .map_err(|e| invalid(e.to_string()))?,
        ValueKind::Address => value
            .parse::<Ipv4Addr>()
            .map_err(|e| invalid(format!("{}: {:?}", e, value)))?
            .octets()
            .to_vec(),
        ValueKind::Integer => value
            .parse::<u32>()
            .map_err(|e| invalid(format!("{}: {:?}", e, value)))?
            .to_be_bytes()
            .to_vec(),
    };

    Attribute::new(attr_type.as_u8(), bytes).map_err(|e| invalid(e.to_string()))
}

/// A verified reply to an Access-Request
#[derive(Debug, Clone)]
pub struct AccessResponse {
    pub code: Code,
    pub identifier: u8,
    pub attributes: Vec<Attribute>,
}

impl AccessResponse {
    /// Decode and authenticate a reply to `request`
    pub fn decode(
        data: &[u8],
        request: &EncodedRequest,
        secret: &[u8],
    ) -> Result<Self, DecodeError> {
        if data.len() < Packet::MIN_PACKET_SIZE {
            return Err(DecodeError::TooShort(data.len()));
        }

        let declared = Packet::declared_length(data);
        if declared != data.len() {
            return Err(DecodeError::LengthMismatch {
                declared,
                actual: data.len(),
            });
        }

        let packet = Packet::decode(data)?;

        if packet.identifier != request.identifier {
            return Err(DecodeError::IdentifierMismatch {
                expected: request.identifier,
                actual: packet.identifier,
            });
        }

        if !verify_response_authenticator(data, &request.authenticator, secret) {
            return Err(DecodeError::AuthenticatorMismatch);
        }

        Ok(AccessResponse {
            code: packet.code,
            identifier: packet.identifier,
            attributes: packet.attributes,
        })
    }

    pub fn is_accept(&self) -> bool {
        self.code == Code::AccessAccept
    }

    /// First Reply-Message, if the server sent a readable one
    pub fn reply_message(&self) -> Option<String> {
        self.find(AttributeType::ReplyMessage)
            .and_then(|attr| attr.as_string().ok())
    }

    /// Session-Timeout in seconds, if present
    pub fn session_timeout(&self) -> Option<u32> {
        self.find(AttributeType::SessionTimeout)
            .and_then(|attr| attr.as_integer().ok())
    }

    fn find(&self, attr_type: AttributeType) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find(|a| a.attr_type == attr_type.as_u8())
    }
}
