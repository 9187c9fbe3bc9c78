//! The Airplay challenge/response handshake, reusing
//! `protocol::raop::auth`'s blob-construction-and-signing pipeline directly:
//! this is the same 32-byte `{challenge, server IP, MAC, zero pad}` message,
//! PKCS#1-signed and base64-encoded without padding.

use std::net::IpAddr;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::protocol::crypto::RaopRsaPrivateKey;
use crate::protocol::raop::generate_response;

use super::RtspError;

/// Decode an `Apple-Challenge` header value, padding with up to two `=`
/// characters first since senders typically omit it.
///
/// # Errors
/// Returns `RtspError::InvalidChallenge` if the result is not valid base64.
pub fn decode_challenge(header: &str) -> Result<Vec<u8>, RtspError> {
    let mut padded = header.trim().to_string();
    while padded.len() % 4 != 0 {
        padded.push('=');
    }
    BASE64
        .decode(&padded)
        .map_err(|e| RtspError::InvalidChallenge(e.to_string()))
}

/// Produce the `Apple-Response` header value for a decoded challenge.
///
/// # Errors
/// Returns `RtspError::Crypto` if signing fails.
pub fn respond(
    private_key: &RaopRsaPrivateKey,
    header: &str,
    server_ip: IpAddr,
    mac_address: [u8; 6],
) -> Result<String, RtspError> {
    let challenge = decode_challenge(header)?;
    generate_response(private_key, &challenge, &server_ip, &mac_address)
        .map_err(RtspError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn challenge_without_padding_decodes() {
        let decoded = decode_challenge("SdX9kFJVxgKVMFof3DBzZw").unwrap();
        assert_eq!(decoded.len(), 16);
    }

    #[test]
    fn respond_produces_nonempty_response() {
        let key = RaopRsaPrivateKey::generate().unwrap();
        let response = respond(
            &key,
            "SdX9kFJVxgKVMFof3DBzZw",
            IpAddr::V4(Ipv4Addr::new(192, 168, 1, 10)),
            [0x00, 0x11, 0x22, 0x33, 0x44, 0x55],
        )
        .unwrap();
        assert!(!response.is_empty());
        assert!(!response.contains('='));
    }
}
