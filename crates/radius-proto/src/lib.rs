//! RADIUS Protocol Implementation
//!
//! The client-side subset of RFC 2865 needed to authenticate a user
//! against a RADIUS server.
//!
//! # Features
//!
//! - Packet framing and attribute TLVs
//! - A small attribute dictionary (User-Name, User-Password, NAS-IP-Address,
//!   NAS-Identifier and the common reply attributes)
//! - MD5-based User-Password hiding
//! - Request/Response Authenticator calculation and constant-time verification
//!
//! # Example
//!
//! ```rust
//! use radius_proto::{AccessRequest, AccessResponse};
//!
//! let request = AccessRequest::with_random_identifier()
//!     .attribute("User-Name", "alice")
//!     .attribute("User-Password", "password")
//!     .attribute("NAS-IP-Address", "127.0.0.1")
//!     .attribute("NAS-Identifier", "radius-app");
//!
//! let encoded = request.encode(b"secret").unwrap();
//! assert_eq!(encoded.bytes[0], 1); // Access-Request
//!
//! // A datagram that is not a valid, signed reply is never trusted
//! assert!(AccessResponse::decode(&[0u8; 4], &encoded, b"secret").is_err());
//! ```

pub mod access;
pub mod attributes;
pub mod auth;
pub mod packet;

pub use access::{AccessRequest, AccessResponse, DecodeError, EncodeError, EncodedRequest};
pub use attributes::{Attribute, AttributeType, ValueKind};
pub use auth::{
    calculate_response_authenticator, decrypt_user_password, encrypt_user_password,
    generate_request_authenticator, verify_response_authenticator,
};
pub use packet::{Code, Packet, PacketError};
