//! The RTSP accept loop: bind, accept, frame, dispatch, respond. Grounded
//! on `receiver::server::AirPlayReceiver`'s `tokio::select!` accept loop and
//! per-connection `tokio::spawn`, narrowed to this engine's own framing
//! state machine (`WaitHeader` → `WaitBody` → `SendHeader` → `SendBody`).

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;

use super::session::{RtspSession, SessionPhase, BUFFER_SIZE};
use super::{RtspContext, RtspError};

/// Errors from starting or running the server.
#[derive(Debug, thiserror::Error)]
pub enum RtspServerError {
    #[error("failed to bind {0}: {1}")]
    Bind(SocketAddr, #[source] std::io::Error),
}

/// A running (or not-yet-started) RTSP server instance.
pub struct RtspServer {
    context: Arc<RtspContext>,
    active_clients: Arc<AtomicUsize>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl RtspServer {
    #[must_use]
    pub fn new(context: Arc<RtspContext>) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self { context, active_clients: Arc::new(AtomicUsize::new(0)), shutdown_tx, shutdown_rx }
    }

    /// Bind to `addr` and run the accept loop until `stop` is called. Each
    /// accepted connection is handled on its own task.
    ///
    /// # Errors
    /// Returns `RtspServerError::Bind` if the listener cannot be bound.
    pub async fn start(&self, addr: SocketAddr) -> Result<(), RtspServerError> {
        let listener = TcpListener::bind(addr).await.map_err(|e| RtspServerError::Bind(addr, e))?;
        tracing::info!(%addr, "rtsp: listening");

        let mut shutdown_rx = self.shutdown_rx.clone();
        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let Ok((stream, peer)) = accepted else { continue };
                    self.spawn_connection(stream, peer, addr);
                }
                _ = shutdown_rx.changed() => {
                    tracing::info!("rtsp: shutting down accept loop");
                    break;
                }
            }
        }
        Ok(())
    }

    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    fn spawn_connection(&self, stream: TcpStream, peer: SocketAddr, local: SocketAddr) {
        if self.active_clients.load(Ordering::SeqCst) >= self.context.max_clients {
            tokio::spawn(async move {
                let mut stream = stream;
                let _ = stream.write_all(b"RTSP/1.0 503 Server too busy\r\n\r\n").await;
            });
            return;
        }

        let context = self.context.clone();
        let active_clients = self.active_clients.clone();
        active_clients.fetch_add(1, Ordering::SeqCst);

        tokio::spawn(async move {
            let hostname = reverse_lookup_hostname(peer);
            let mut session = RtspSession::new(next_session_id(), local, peer, hostname);
            if let Err(err) = run_connection(&context, &mut session, stream).await {
                tracing::debug!(session = session.id, ?err, "rtsp: connection ended");
            }
            active_clients.fetch_sub(1, Ordering::SeqCst);
        });
    }
}

async fn run_connection(
    context: &RtspContext,
    session: &mut RtspSession,
    mut stream: TcpStream,
) -> Result<(), std::io::Error> {
    let mut read_buf = vec![0u8; BUFFER_SIZE];

    loop {
        match session.phase {
            SessionPhase::WaitHeader | SessionPhase::WaitBody => {
                let n = stream.read(&mut read_buf).await?;
                if n == 0 {
                    return Ok(());
                }
                session.feed(&read_buf[..n]);

                if session.phase == SessionPhase::WaitHeader {
                    match session.try_parse_head() {
                        Ok(true) => {}
                        Ok(false) => continue,
                        Err(RtspError::Malformed(_)) => {
                            stream.write_all(b"RTSP/1.0 400 Bad Request\r\n\r\n").await?;
                            return Ok(());
                        }
                        Err(_) => continue,
                    }
                }

                if session.phase == SessionPhase::WaitBody {
                    session.absorb_body();
                    if session.body_complete() {
                        super::handler::dispatch(context, session);
                        session.begin_send();
                    }
                }
            }
            SessionPhase::SendHeader | SessionPhase::SendBody => {
                stream.write_all(session.header_block()).await?;
                if let Some(body) = session.take_response_body() {
                    // `write_all` loops internally on partial writes, so
                    // `SendBody` never needs to be observed as its own
                    // readiness-driven step the way the sans-IO framing
                    // model describes.
                    stream.write_all(&body).await?;
                }
                session.reset_for_next_request();
            }
        }
    }
}

fn reverse_lookup_hostname(peer: SocketAddr) -> String {
    peer.ip().to_string()
}

fn next_session_id() -> u64 {
    use std::sync::atomic::AtomicU64;
    static NEXT: AtomicU64 = AtomicU64::new(1);
    NEXT.fetch_add(1, Ordering::SeqCst)
}
