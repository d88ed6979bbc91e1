use crate::packet::{Packet, PacketError};
use rand::Rng;
use subtle::ConstantTimeEq;

/// Longest password RFC 2865 Section 5.2 allows in User-Password
pub const MAX_PASSWORD_LENGTH: usize = 128;

const BLOCK: usize = 16;

/// Generate a random Request Authenticator (16 bytes) per RFC 2865 Section 3
pub fn generate_request_authenticator() -> [u8; 16] {
    let mut authenticator = [0u8; 16];
    rand::rng().fill(&mut authenticator);
    authenticator
}

/// Response Authenticator over raw response bytes
///
/// MD5(Code + ID + Length + Request Authenticator + Attributes + Secret).
/// `response` must hold at least the 20-byte header; its own authenticator
/// field is ignored and replaced by `request_authenticator` in the hash.
pub fn response_authenticator(
    response: &[u8],
    request_authenticator: &[u8; 16],
    secret: &[u8],
) -> [u8; 16] {
    let mut ctx = md5::Context::new();
    ctx.consume(&response[..4]);
    ctx.consume(request_authenticator);
    ctx.consume(&response[Packet::MIN_PACKET_SIZE..]);
    ctx.consume(secret);
    ctx.compute().0
}

/// Calculate the Response Authenticator for a response packet
///
/// Used to sign Access-Accept, Access-Reject and Access-Challenge packets.
pub fn calculate_response_authenticator(
    packet: &Packet,
    request_authenticator: &[u8; 16],
    secret: &[u8],
) -> Result<[u8; 16], PacketError> {
    let encoded = packet.encode()?;
    Ok(response_authenticator(&encoded, request_authenticator, secret))
}

/// Check a received response against the authenticator we expect
///
/// The comparison is constant time.
pub fn verify_response_authenticator(
    response: &[u8],
    request_authenticator: &[u8; 16],
    secret: &[u8],
) -> bool {
    if response.len() < Packet::MIN_PACKET_SIZE {
        return false;
    }
    let expected = response_authenticator(response, request_authenticator, secret);
    response[4..Packet::MIN_PACKET_SIZE].ct_eq(&expected).into()
}

/// Hide a User-Password value per RFC 2865 Section 5.2
///
/// The password is zero-padded to a multiple of 16 bytes (at least one
/// block). Each block is XORed with MD5(secret + previous), where
/// `previous` is the Request Authenticator for the first block and the
/// previous ciphertext block afterwards.
pub fn encrypt_user_password(
    password: &str,
    secret: &[u8],
    authenticator: &[u8; 16],
) -> Result<Vec<u8>, PacketError> {
    let password = password.as_bytes();
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(PacketError::AttributeError(format!(
            "User-Password too long: {} bytes (max {})",
            password.len(),
            MAX_PASSWORD_LENGTH
        )));
    }

    let padded_len = password.len().div_ceil(BLOCK).max(1) * BLOCK;
    let mut result = password.to_vec();
    result.resize(padded_len, 0);

    let mut previous = *authenticator;
    for chunk in result.chunks_mut(BLOCK) {
        let hash = keyed_block(secret, &previous);
        for (byte, key) in chunk.iter_mut().zip(hash) {
            *byte ^= key;
        }
        previous.copy_from_slice(chunk);
    }

    Ok(result)
}

/// Recover a hidden User-Password (the server side of RFC 2865 Section 5.2)
pub fn decrypt_user_password(
    hidden: &[u8],
    secret: &[u8],
    authenticator: &[u8; 16],
) -> Result<String, PacketError> {
    if hidden.is_empty() || hidden.len() % BLOCK != 0 {
        return Err(PacketError::AttributeError(format!(
            "Invalid hidden password length: {}",
            hidden.len()
        )));
    }

    let mut result = Vec::with_capacity(hidden.len());
    let mut previous = *authenticator;
    for chunk in hidden.chunks(BLOCK) {
        let hash = keyed_block(secret, &previous);
        result.extend(chunk.iter().zip(hash).map(|(byte, key)| byte ^ key));
        previous.copy_from_slice(chunk);
    }

    while result.last() == Some(&0) {
        result.pop();
    }

    String::from_utf8(result)
        .map_err(|e| PacketError::AttributeError(format!("Invalid UTF-8 in password: {}", e)))
}

fn keyed_block(secret: &[u8], previous: &[u8; 16]) -> [u8; 16] {
    let mut ctx = md5::Context::new();
    ctx.consume(secret);
    ctx.consume(previous);
    ctx.compute().0
}
