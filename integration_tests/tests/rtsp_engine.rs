//! Drives the RTSP request engine the way a real client connection would:
//! feed raw bytes into a session, let it frame a request, dispatch it
//! against a shared context, and inspect the composed response.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use melo::protocol::crypto::RaopRsaPrivateKey;
use melo::rtsp::context::Credentials;
use melo::rtsp::session::{RtspSession, SessionPhase};
use melo::rtsp::{handler, RtspContext};

fn addr(port: u16) -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port)
}

fn unauthenticated_context() -> RtspContext {
    RtspContext::new(
        "melo",
        None,
        8,
        RaopRsaPrivateKey::generate().expect("key generation"),
        IpAddr::V4(Ipv4Addr::LOCALHOST),
        [0xAA; 6],
    )
}

fn run_request(ctx: &RtspContext, session: &mut RtspSession, raw: &[u8]) -> String {
    session.feed(raw);
    assert!(session.try_parse_head().expect("well-formed request"));
    session.absorb_body();
    assert!(session.body_complete());

    handler::dispatch(ctx, session);
    session.begin_send();
    assert_eq!(session.phase, SessionPhase::SendHeader);
    String::from_utf8_lossy(session.header_block()).into_owned()
}

#[test]
fn options_round_trip_advertises_public_methods() {
    let ctx = unauthenticated_context();
    let mut session = RtspSession::new(1, addr(7000), addr(54321), "client.local".to_string());

    let head = run_request(&ctx, &mut session, b"OPTIONS * RTSP/1.0\r\nCSeq: 1\r\n\r\n");

    assert!(head.starts_with("RTSP/1.0 200 OK\r\n"));
    assert!(head.contains("CSeq: 1\r\n"));
    assert!(head.contains("Public:"));
    assert!(head.contains("SETUP"));
}

#[test]
fn apple_challenge_header_gets_a_signed_response() {
    let ctx = unauthenticated_context();
    let mut session = RtspSession::new(2, addr(7000), addr(54322), "client.local".to_string());

    let challenge = "AAAAAAAAAAAAAAAAAAAAAA==";
    let head = run_request(
        &ctx,
        &mut session,
        format!("OPTIONS * RTSP/1.0\r\nCSeq: 2\r\nApple-Challenge: {challenge}\r\n\r\n").as_bytes(),
    );

    assert!(head.contains("Apple-Response:"));
}

#[test]
fn missing_credentials_are_rejected_with_a_challenge() {
    let ctx = RtspContext::new(
        "melo",
        Some(Credentials { username: Some("admin".to_string()), password: "secret".to_string() }),
        8,
        RaopRsaPrivateKey::generate().expect("key generation"),
        IpAddr::V4(Ipv4Addr::LOCALHOST),
        [0xBB; 6],
    );
    let mut session = RtspSession::new(3, addr(7000), addr(54323), "client.local".to_string());

    let head = run_request(&ctx, &mut session, b"OPTIONS * RTSP/1.0\r\nCSeq: 3\r\n\r\n");

    assert!(head.starts_with("RTSP/1.0 401 Unauthorized\r\n"));
    assert!(head.contains("WWW-Authenticate:"));
}

#[test]
fn a_request_larger_than_one_chunk_is_absorbed_across_feeds() {
    let ctx = unauthenticated_context();
    let mut session = RtspSession::new(4, addr(7000), addr(54324), "client.local".to_string());

    let sdp_len = 40;
    let body: String = std::iter::repeat('a').take(sdp_len).collect();
    session.feed(format!("ANNOUNCE / RTSP/1.0\r\nCSeq: 4\r\nContent-Length: {sdp_len}\r\n\r\n").as_bytes());
    assert!(session.try_parse_head().expect("well-formed request"));
    session.absorb_body();
    assert!(!session.body_complete());
    assert!(session.body().is_empty());

    session.feed(body.as_bytes());
    session.absorb_body();
    assert!(session.body_complete());
    assert_eq!(session.body(), body.as_bytes());

    // malformed SDP still yields a composed (error) response, not a panic.
    handler::dispatch(&ctx, &mut session);
    session.begin_send();
    assert_eq!(session.phase, SessionPhase::SendHeader);
}
