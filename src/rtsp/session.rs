//! Per-connection RTSP session state: wire framing fields and the small
//! response-composition API, grounded on the field list and the
//! `init_response`/`add_header`/`set_response`/`set_packet` API named by
//! the system's RTSP engine section.

use std::collections::HashMap;
use std::net::SocketAddr;

use crate::receiver::session::{SessionSockets, StreamParameters};

use super::{Method, RtspError};

/// Where a session sits in the request/response framing cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Reading bytes until the CRLF CRLF header terminator is found.
    WaitHeader,
    /// Header parsed; accumulating `content_length` bytes of body.
    WaitBody,
    /// Draining the composed response header block.
    SendHeader,
    /// Streaming the composed response body.
    SendBody,
}

/// One accepted RTSP connection's parse/response state. All buffers are
/// per-session and never shared.
pub struct RtspSession {
    pub id: u64,
    pub phase: SessionPhase,
    pub method: Option<Method>,
    pub method_name: String,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub content_length: usize,
    pub seq: Option<u32>,
    pub server_addr: SocketAddr,
    pub client_addr: SocketAddr,
    pub hostname: String,
    in_buffer: Vec<u8>,
    body: Vec<u8>,
    out_buffer: Vec<u8>,
    response_body: Option<Vec<u8>>,
    /// Per-session digest nonce, established on first challenge.
    pub nonce: Option<String>,
    /// Opaque caller data: `Client-Instance`/`DACP-ID`, negotiated stream
    /// parameters, allocated sockets, and the server-issued RTSP session id.
    pub user_data: HashMap<String, String>,
    pub auth_ok: bool,
    pub stream: Option<StreamParameters>,
    pub sockets: Option<SessionSockets>,
    pub rtsp_session_id: Option<String>,
}

/// Input buffer size before falling back to unbounded growth for an
/// in-flight body (control bodies are small; see the framing note in
/// `handler.rs`).
pub const BUFFER_SIZE: usize = 8 * 1024;

impl RtspSession {
    #[must_use]
    pub fn new(id: u64, server_addr: SocketAddr, client_addr: SocketAddr, hostname: String) -> Self {
        Self {
            id,
            phase: SessionPhase::WaitHeader,
            method: None,
            method_name: String::new(),
            url: String::new(),
            headers: HashMap::new(),
            content_length: 0,
            seq: None,
            server_addr,
            client_addr,
            hostname,
            in_buffer: Vec::with_capacity(BUFFER_SIZE),
            body: Vec::new(),
            out_buffer: Vec::with_capacity(BUFFER_SIZE),
            response_body: None,
            nonce: None,
            user_data: HashMap::new(),
            auth_ok: false,
            stream: None,
            sockets: None,
            rtsp_session_id: None,
        }
    }

    /// Append freshly-read bytes to the input buffer.
    pub fn feed(&mut self, data: &[u8]) {
        self.in_buffer.extend_from_slice(data);
    }

    /// In `WaitHeader`, try to find and parse a complete request head.
    /// Leaves leftover bytes (the body prefix) at the front of the input
    /// buffer and transitions to `WaitBody`.
    ///
    /// # Errors
    /// Returns `RtspError::Malformed` if the request line or a header line
    /// is not well-formed.
    pub fn try_parse_head(&mut self) -> Result<bool, RtspError> {
        let Some(term) = find_header_terminator(&self.in_buffer) else {
            return Ok(false);
        };

        let head = self.in_buffer[..term].to_vec();
        let rest = self.in_buffer.split_off(term + 4);
        self.in_buffer = rest;

        let text = String::from_utf8_lossy(&head);
        let mut lines = text.split("\r\n");
        let request_line = lines.next().unwrap_or_default();
        let mut parts = request_line.splitn(3, ' ');
        let method_name = parts.next().unwrap_or_default().to_string();
        let url = parts.next().unwrap_or_default().to_string();
        if method_name.is_empty() || url.is_empty() {
            return Err(RtspError::Malformed(format!("bad request line: {request_line}")));
        }

        self.method = Method::parse(&method_name);
        self.method_name = method_name;
        self.url = url;
        self.headers.clear();

        for line in lines {
            if line.is_empty() {
                continue;
            }
            let Some((name, value)) = line.split_once(':') else {
                return Err(RtspError::Malformed(format!("bad header line: {line}")));
            };
            self.headers.insert(name.trim().to_string(), value.trim().to_string());
        }

        self.content_length = self
            .headers
            .get("Content-Length")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        self.seq = self.headers.get("CSeq").and_then(|v| v.parse().ok());

        self.body.clear();
        self.phase = SessionPhase::WaitBody;
        Ok(true)
    }

    /// In `WaitBody`, true once the remaining `content_length` has been
    /// driven to zero by `absorb_body`.
    #[must_use]
    pub fn body_complete(&self) -> bool {
        self.content_length == 0
    }

    /// Deliver as many chunks as the input buffer currently allows, per the
    /// three-case body delivery rule: if the buffer already holds the
    /// (remaining) `content_length`, consume exactly that and finish;
    /// else if the buffer is full (`BUFFER_SIZE`), deliver that much,
    /// reset it, and decrement the remaining `content_length`; else wait
    /// for more data. Loops so a single read that fills several chunks'
    /// worth is fully drained in one call.
    pub fn absorb_body(&mut self) {
        loop {
            if self.content_length == 0 {
                return;
            }
            if self.in_buffer.len() >= self.content_length {
                let rest = self.in_buffer.split_off(self.content_length);
                self.body.extend_from_slice(&self.in_buffer);
                self.in_buffer = rest;
                self.content_length = 0;
                return;
            }
            if self.in_buffer.len() >= BUFFER_SIZE {
                self.body.extend_from_slice(&self.in_buffer[..BUFFER_SIZE]);
                self.in_buffer.drain(..BUFFER_SIZE);
                self.content_length = self.content_length.saturating_sub(BUFFER_SIZE);
                continue;
            }
            return;
        }
    }

    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Reset the output buffer and write the status line plus the blank
    /// line that terminates an (initially empty) header block.
    pub fn init_response(&mut self, code: u16, reason: &str) {
        self.out_buffer.clear();
        self.response_body = None;
        self.out_buffer
            .extend_from_slice(format!("RTSP/1.0 {code} {reason}\r\n\r\n").as_bytes());
    }

    /// Overwrite the trailing blank line with a new header plus a fresh
    /// blank line.
    pub fn add_header(&mut self, name: &str, value: &str) {
        debug_assert!(self.out_buffer.ends_with(b"\r\n\r\n"));
        self.out_buffer.truncate(self.out_buffer.len() - 2);
        self.out_buffer
            .extend_from_slice(format!("{name}: {value}\r\n\r\n").as_bytes());
    }

    /// Replace the entire header block verbatim (status line included).
    pub fn set_response(&mut self, text: &str) {
        self.out_buffer.clear();
        self.out_buffer.extend_from_slice(text.as_bytes());
    }

    /// Attach a response body, adding `Content-Length` for it.
    pub fn set_packet(&mut self, body: Vec<u8>) {
        self.add_header("Content-Length", &body.len().to_string());
        self.response_body = Some(body);
    }

    /// Move to `SendHeader`, ready for the server loop to drain
    /// `take_output`.
    pub fn begin_send(&mut self) {
        self.phase = SessionPhase::SendHeader;
    }

    #[must_use]
    pub fn header_block(&self) -> &[u8] {
        &self.out_buffer
    }

    pub fn take_response_body(&mut self) -> Option<Vec<u8>> {
        self.response_body.take()
    }

    /// Back to `WaitHeader`, clearing everything scoped to one request.
    pub fn reset_for_next_request(&mut self) {
        self.phase = SessionPhase::WaitHeader;
        self.method = None;
        self.method_name.clear();
        self.url.clear();
        self.headers.clear();
        self.content_length = 0;
        self.seq = None;
        self.body.clear();
        self.out_buffer.clear();
        self.response_body = None;
    }
}

fn find_header_terminator(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port)
    }

    fn session() -> RtspSession {
        RtspSession::new(1, addr(7000), addr(54321), "client.local".to_string())
    }

    #[test]
    fn parses_request_line_and_headers() {
        let mut s = session();
        s.feed(b"OPTIONS * RTSP/1.0\r\nCSeq: 1\r\nApple-Challenge: abc\r\n\r\n");

        assert!(s.try_parse_head().unwrap());
        assert_eq!(s.method, Some(Method::Options));
        assert_eq!(s.seq, Some(1));
        assert_eq!(s.header("Apple-Challenge"), Some("abc"));
        assert_eq!(s.phase, SessionPhase::WaitBody);
    }

    #[test]
    fn waits_for_more_data_without_terminator() {
        let mut s = session();
        s.feed(b"OPTIONS * RTSP/1.0\r\nCSeq: 1\r\n");
        assert!(!s.try_parse_head().unwrap());
    }

    #[test]
    fn body_accumulates_across_feeds() {
        let mut s = session();
        s.feed(b"ANNOUNCE / RTSP/1.0\r\nContent-Length: 6\r\n\r\nab");
        s.try_parse_head().unwrap();
        s.absorb_body();
        assert!(!s.body_complete());
        s.feed(b"cdef");
        s.absorb_body();
        assert!(s.body_complete());
        assert_eq!(s.body(), b"abcdef");
    }

    #[test]
    fn body_larger_than_buffer_delivers_in_chunks() {
        let mut s = session();
        let total = BUFFER_SIZE * 2 + 10;
        let payload: Vec<u8> = (0..total).map(|i| (i % 256) as u8).collect();

        s.feed(format!("ANNOUNCE / RTSP/1.0\r\nContent-Length: {total}\r\n\r\n").as_bytes());
        s.feed(&payload[..BUFFER_SIZE]);
        s.try_parse_head().unwrap();
        s.absorb_body();
        assert!(!s.body_complete());
        assert_eq!(s.body().len(), BUFFER_SIZE);

        s.feed(&payload[BUFFER_SIZE..BUFFER_SIZE * 2]);
        s.absorb_body();
        assert!(!s.body_complete());
        assert_eq!(s.body().len(), BUFFER_SIZE * 2);

        s.feed(&payload[BUFFER_SIZE * 2..]);
        s.absorb_body();
        assert!(s.body_complete());
        assert_eq!(s.body(), payload.as_slice());
    }

    #[test]
    fn response_api_round_trip() {
        let mut s = session();
        s.init_response(200, "OK");
        s.add_header("CSeq", "1");
        s.set_packet(b"hello".to_vec());

        let head = String::from_utf8_lossy(s.header_block()).into_owned();
        assert!(head.starts_with("RTSP/1.0 200 OK\r\n"));
        assert!(head.contains("CSeq: 1\r\n"));
        assert!(head.contains("Content-Length: 5\r\n"));
        assert_eq!(s.take_response_body(), Some(b"hello".to_vec()));
    }
}
