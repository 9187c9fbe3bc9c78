//! Basic and Digest authentication for the RTSP engine, per the system's
//! authentication paragraph. `HA1`/`HA2`/`response` are all MD5 hex digests
//! uppercased, matching the digest-correctness invariant exactly.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use md5::{Digest, Md5};
use rand::RngCore;
use std::collections::HashMap;

use super::Method;
use crate::rtsp::context::Credentials;

/// Outcome of checking a request's credentials against `Credentials`.
#[derive(Debug, PartialEq, Eq)]
pub enum AuthOutcome {
    /// No credentials configured, or the request authenticated.
    Authenticated,
    /// Missing or incorrect credentials; caller should challenge.
    Required,
}

/// Generate a fresh per-session nonce: 128 random bits, hex-encoded.
#[must_use]
pub fn generate_nonce() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex_lower(&bytes)
}

/// Check `Authorization` against `credentials`. With no configured
/// credentials every request passes. Understands both `Basic` and
/// `Digest` schemes.
#[must_use]
pub fn check(
    credentials: &Credentials,
    header: Option<&str>,
    method: Method,
    url: &str,
    nonce: &str,
) -> AuthOutcome {
    let Some(header) = header else { return AuthOutcome::Required };

    if let Some(encoded) = header.strip_prefix("Basic ") {
        return check_basic(credentials, encoded.trim());
    }

    if let Some(rest) = header.strip_prefix("Digest ") {
        return check_digest(credentials, rest, method, url, nonce);
    }

    AuthOutcome::Required
}

fn check_basic(credentials: &Credentials, encoded: &str) -> AuthOutcome {
    let Ok(decoded) = BASE64.decode(encoded) else { return AuthOutcome::Required };
    let Ok(text) = String::from_utf8(decoded) else { return AuthOutcome::Required };
    let Some((user, password)) = text.split_once(':') else { return AuthOutcome::Required };

    let expected_user = credentials.username.as_deref().unwrap_or(user);
    if user == expected_user && password == credentials.password {
        AuthOutcome::Authenticated
    } else {
        AuthOutcome::Required
    }
}

fn check_digest(
    credentials: &Credentials,
    rest: &str,
    method: Method,
    url: &str,
    nonce: &str,
) -> AuthOutcome {
    let fields = parse_digest_fields(rest);

    let user = fields
        .get("username")
        .map(String::as_str)
        .or(credentials.username.as_deref());
    let Some(user) = user else { return AuthOutcome::Required };
    let Some(realm) = fields.get("realm") else { return AuthOutcome::Required };
    let Some(req_nonce) = fields.get("nonce") else { return AuthOutcome::Required };
    let Some(response) = fields.get("response") else { return AuthOutcome::Required };
    let req_uri = fields.get("uri").map(String::as_str).unwrap_or(url);

    if req_nonce != nonce {
        return AuthOutcome::Required;
    }

    let expected = digest_response(user, realm, &credentials.password, method, req_uri, nonce);
    if &expected == response {
        AuthOutcome::Authenticated
    } else {
        AuthOutcome::Required
    }
}

/// `response = MD5_hex_upper(HA1 : nonce : HA2)` with
/// `HA1 = MD5_hex_upper(user:realm:password)`,
/// `HA2 = MD5_hex_upper(method:url)`.
#[must_use]
pub fn digest_response(user: &str, realm: &str, password: &str, method: Method, url: &str, nonce: &str) -> String {
    let ha1 = md5_hex_upper(format!("{user}:{realm}:{password}").as_bytes());
    let ha2 = md5_hex_upper(format!("{}:{url}", method.as_str()).as_bytes());
    md5_hex_upper(format!("{ha1}:{nonce}:{ha2}").as_bytes())
}

/// `WWW-Authenticate` challenge for a `401` response.
#[must_use]
pub fn challenge_header(realm: &str, nonce: &str) -> String {
    format!("Digest realm=\"{realm}\", nonce=\"{nonce}\", opaque=\"\"")
}

fn md5_hex_upper(data: &[u8]) -> String {
    let digest = Md5::digest(data);
    let mut out = String::with_capacity(32);
    for byte in digest {
        out.push_str(&format!("{byte:02X}"));
    }
    out
}

fn hex_lower(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

fn parse_digest_fields(rest: &str) -> HashMap<String, String> {
    let mut fields = HashMap::new();
    for part in rest.split(',') {
        let part = part.trim();
        let Some((key, value)) = part.split_once('=') else { continue };
        let value = value.trim().trim_matches('"');
        fields.insert(key.trim().to_string(), value.to_string());
    }
    fields
}
