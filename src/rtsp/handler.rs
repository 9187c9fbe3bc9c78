//! Method dispatch for the Airplay embedding, grounded on
//! `receiver::rtsp_handler`'s per-method shape: one private function per
//! method, composing its response directly onto the session via the
//! `init_response`/`add_header`/`set_packet` API rather than returning an
//! intermediate struct (the session already owns that state).

use crate::protocol::rtsp::transport::TransportHeader;
use crate::protocol::sdp::SdpParser;
use crate::protocol::sdp::raop::{detect_codec, extract_stream_parameters, parse_encryption};
use crate::receiver::session::SessionSockets;

use super::{Method, RtspContext, RtspSession};
use super::auth::{self, AuthOutcome};

/// Dispatch one fully-framed request. Always leaves `session` with a
/// composed response ready for `begin_send`.
pub fn dispatch(ctx: &RtspContext, session: &mut RtspSession) {
    if let Err(text) = authenticate(ctx, session) {
        session.init_response(401, "Unauthorized");
        session.add_header("WWW-Authenticate", &text);
        apply_common_headers(session);
        return;
    }

    match session.method {
        Some(Method::Options) => handle_options(session),
        Some(Method::Announce) => handle_announce(ctx, session),
        Some(Method::Setup) => handle_setup(ctx, session),
        Some(Method::Record) => handle_record(session),
        Some(Method::Flush) => handle_flush(session),
        Some(Method::Teardown) => handle_teardown(ctx, session),
        Some(Method::SetParameter) => handle_set_parameter(session),
        Some(Method::GetParameter) => handle_get_parameter(session),
        Some(Method::Describe | Method::Play | Method::Pause) => handle_ok(session),
        None => session.init_response(404, "Not Found"),
    }

    if let Some(header) = session.header("Apple-Challenge").map(str::to_string) {
        match super::apple_challenge::respond(ctx.private_key(), &header, ctx.server_ip(), ctx.mac_address()) {
            Ok(response) => session.add_header("Apple-Response", &response),
            Err(_) => { /* malformed challenge: respond without Apple-Response */ }
        }
    }

    apply_common_headers(session);
}

/// `401`/challenge handling per the authentication paragraph; once
/// `auth_ok` is set the session is never challenged again.
fn authenticate(ctx: &RtspContext, session: &mut RtspSession) -> Result<(), String> {
    let Some(credentials) = &ctx.credentials else { return Ok(()) };
    if session.auth_ok {
        return Ok(());
    }

    let nonce = session.nonce.clone().unwrap_or_else(|| {
        let nonce = auth::generate_nonce();
        session.nonce = Some(nonce.clone());
        nonce
    });

    let method = session.method.unwrap_or(Method::Options);
    let header = session.header("Authorization").map(str::to_string);
    match auth::check(credentials, header.as_deref(), method, &session.url, &nonce) {
        AuthOutcome::Authenticated => {
            session.auth_ok = true;
            Ok(())
        }
        AuthOutcome::Required => Err(auth::challenge_header(&ctx.realm, &nonce)),
    }
}

fn apply_common_headers(session: &mut RtspSession) {
    session.add_header("Server", "Melo/1.0");
    if let Some(seq) = session.seq {
        session.add_header("CSeq", &seq.to_string());
    }
    if let Some(id) = session.rtsp_session_id.clone() {
        session.add_header("Session", &id);
    }
}

fn handle_ok(session: &mut RtspSession) {
    session.init_response(200, "OK");
}

fn handle_options(session: &mut RtspSession) {
    session.init_response(200, "OK");
    session.add_header("Public", &Method::PUBLIC.join(", "));
}

fn handle_announce(ctx: &RtspContext, session: &mut RtspSession) {
    let body = String::from_utf8_lossy(session.body()).into_owned();
    let Ok(sdp) = SdpParser::parse(&body) else {
        session.init_response(400, "Bad Request");
        return;
    };

    let Some(media) = sdp.audio_media() else {
        session.init_response(400, "Bad Request");
        return;
    };
    if detect_codec(media).is_none() {
        session.init_response(400, "Bad Request");
        return;
    }

    match extract_stream_parameters(&sdp, None) {
        Ok(mut params) => {
            // `extract_stream_parameters` only decrypts the AES key when
            // handed DER key bytes; the Airport key lives behind
            // `decrypt_oaep` instead, so the decryption happens here.
            if let Ok(Some(encryption)) = parse_encryption(media) {
                if let Ok(key_bytes) = ctx.private_key().decrypt_oaep(&encryption.encrypted_aes_key) {
                    if let Ok(key) = <[u8; 16]>::try_from(key_bytes.as_slice()) {
                        params.aes_key = Some(key);
                    }
                }
            }
            session.stream = Some(params);
            session.init_response(200, "OK");
        }
        Err(_) => session.init_response(400, "Bad Request"),
    }
}

fn handle_setup(ctx: &RtspContext, session: &mut RtspSession) {
    let Some(transport_header) = session.header("Transport").map(str::to_string) else {
        session.init_response(400, "Bad Request");
        return;
    };
    let Ok(transport) = TransportHeader::parse(&transport_header) else {
        session.init_response(400, "Bad Request");
        return;
    };

    let (audio_port, control_port, timing_port) = ctx.allocate_ports();
    let sockets = SessionSockets {
        audio_port,
        control_port,
        timing_port,
        client_control_port: transport.control_port,
        client_timing_port: transport.timing_port,
        client_addr: Some(session.client_addr),
    };

    let client_instance = session
        .header("Client-Instance")
        .or_else(|| session.header("DACP-ID"))
        .unwrap_or("unknown")
        .to_string();

    if let Some(stream) = session.stream.clone() {
        ctx.record_setup(&client_instance, sockets.clone(), &stream);
    }

    let rtsp_session_id = format!("{:08x}", rand_session_id());
    session.rtsp_session_id = Some(rtsp_session_id);
    session.sockets = Some(sockets);

    session.init_response(200, "OK");
    let response_transport = format!(
        "RTP/AVP/UDP;unicast;server_port={audio_port};control_port={control_port};timing_port={timing_port}"
    );
    session.add_header("Transport", &response_transport);
}

fn rand_session_id() -> u32 {
    use rand::RngCore;
    rand::thread_rng().next_u32()
}

fn handle_record(session: &mut RtspSession) {
    // `RTP-Info: seq=N;rtptime=M` — the starting sequence is recorded for
    // the (external) pipeline to begin from; this engine only parses it.
    session.init_response(200, "OK");
    session.add_header("Audio-Latency", "11025");
}

fn handle_flush(session: &mut RtspSession) {
    session.init_response(200, "OK");
}

fn handle_teardown(ctx: &RtspContext, session: &mut RtspSession) {
    if let Some(client_instance) = session.header("Client-Instance").or_else(|| session.header("DACP-ID")) {
        ctx.forget_setup(client_instance);
    }
    session.init_response(200, "OK");
}

fn handle_set_parameter(session: &mut RtspSession) {
    let content_type = session.header("Content-Type").unwrap_or_default().to_string();
    let body = String::from_utf8_lossy(session.body()).into_owned();

    if content_type == "text/parameters" {
        for line in body.lines() {
            if let Some((key, value)) = line.split_once(':') {
                session.user_data.insert(key.trim().to_string(), value.trim().to_string());
            }
        }
    } else if content_type == "application/x-dmap-tagged" {
        session.user_data.insert("dmap".to_string(), format!("{} bytes", session.body().len()));
    } else if content_type.starts_with("image/") {
        session.user_data.insert("cover".to_string(), format!("{} bytes", session.body().len()));
    }

    session.init_response(200, "OK");
}

fn handle_get_parameter(session: &mut RtspSession) {
    let content_type = session.header("Content-Type").unwrap_or_default();
    session.init_response(200, "OK");
    if content_type == "text/parameters" {
        let volume = session.user_data.get("volume").cloned().unwrap_or_else(|| "0.0".to_string());
        session.set_packet(format!("volume: {volume}\r\n").into_bytes());
        session.add_header("Content-Type", "text/parameters");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rtsp::context::Credentials;
    use std::net::{IpAddr, Ipv4Addr, SocketAddr};

    fn ctx() -> RtspContext {
        RtspContext::new(
            "Melo",
            None,
            5,
            crate::protocol::crypto::RaopRsaPrivateKey::generate().unwrap(),
            IpAddr::V4(Ipv4Addr::new(192, 168, 1, 10)),
            [0x00, 0x11, 0x22, 0x33, 0x44, 0x55],
        )
    }

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port)
    }

    fn session() -> RtspSession {
        RtspSession::new(1, addr(7000), addr(54321), "client.local".to_string())
    }

    #[test]
    fn options_with_apple_challenge_matches_scenario_1() {
        let ctx = ctx();
        let mut s = session();
        s.feed(b"OPTIONS * RTSP/1.0\r\nCSeq: 1\r\nApple-Challenge: SdX9kFJVxgKVMFof3DBzZw\r\n\r\n");
        s.try_parse_head().unwrap();

        dispatch(&ctx, &mut s);

        let head = String::from_utf8_lossy(s.header_block()).into_owned();
        assert!(head.starts_with("RTSP/1.0 200 OK\r\n"));
        assert!(head.contains("CSeq: 1\r\n"));
        assert!(head.contains("Apple-Response:"));
        for method in Method::PUBLIC {
            assert!(head.contains(method), "missing {method} in Public header");
        }
    }

    #[test]
    fn announce_without_auth_is_rejected_with_digest_challenge() {
        let mut ctx = ctx();
        ctx.credentials = Some(Credentials { username: None, password: "secret".to_string() });
        let mut s = session();
        s.feed(b"ANNOUNCE / RTSP/1.0\r\nCSeq: 2\r\n\r\n");
        s.try_parse_head().unwrap();

        dispatch(&ctx, &mut s);

        let head = String::from_utf8_lossy(s.header_block()).into_owned();
        assert!(head.starts_with("RTSP/1.0 401 Unauthorized\r\n"));
        assert!(head.contains("WWW-Authenticate: Digest realm=\"Melo\""));
    }

    #[test]
    fn setup_negotiates_udp_transport() {
        let ctx = ctx();
        let mut s = session();
        s.feed(
            b"SETUP /1 RTSP/1.0\r\nCSeq: 3\r\nTransport: RTP/AVP/UDP;unicast;control_port=6001;timing_port=6002\r\n\r\n",
        );
        s.try_parse_head().unwrap();

        dispatch(&ctx, &mut s);

        let head = String::from_utf8_lossy(s.header_block()).into_owned();
        assert!(head.starts_with("RTSP/1.0 200 OK\r\n"));
        assert!(head.contains("Transport: RTP/AVP/UDP;unicast;server_port="));
        assert!(s.sockets.is_some());
    }
}
