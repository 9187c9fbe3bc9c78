//! Server-wide state shared across every accepted RTSP session: credentials,
//! the Airport private key, the device's advertised MAC, and the table of
//! in-progress streaming setups keyed by sender `Client-Instance`.
//!
//! The media pipeline itself is an external collaborator (see the design
//! note on the playback pipeline); this context stops at negotiated
//! transport and stream parameters, and hands them off through `on_setup`.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Mutex;

use crate::protocol::crypto::RaopRsaPrivateKey;
use crate::receiver::session::{SessionSockets, StreamParameters};

/// Callback invoked once a `SETUP`/`RECORD` pair has negotiated a transport
/// and stream parameters for a `Client-Instance`; wiring a concrete
/// `Player` to these parameters is left to the caller.
pub type SetupHook = Box<dyn Fn(&str, &StreamParameters, &SessionSockets) + Send + Sync>;

/// Digest/Basic credentials, `None` accepts every request unauthenticated.
#[derive(Clone, Default)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials").field("username", &self.username).field("password", &"<redacted>").finish()
    }
}

/// Shared state handed to every session's handler.
pub struct RtspContext {
    pub realm: String,
    pub credentials: Option<Credentials>,
    pub max_clients: usize,
    private_key: RaopRsaPrivateKey,
    server_ip: IpAddr,
    mac_address: [u8; 6],
    next_port: AtomicU16,
    setups: Mutex<HashMap<String, SessionSockets>>,
    on_setup: Option<SetupHook>,
}

impl RtspContext {
    #[must_use]
    pub fn new(
        realm: impl Into<String>,
        credentials: Option<Credentials>,
        max_clients: usize,
        private_key: RaopRsaPrivateKey,
        server_ip: IpAddr,
        mac_address: [u8; 6],
    ) -> Self {
        Self {
            realm: realm.into(),
            credentials,
            max_clients,
            private_key,
            server_ip,
            mac_address,
            next_port: AtomicU16::new(6000),
            setups: Mutex::new(HashMap::new()),
            on_setup: None,
        }
    }

    /// Attach the hook invoked once transport negotiation completes.
    #[must_use]
    pub fn with_setup_hook(mut self, hook: SetupHook) -> Self {
        self.on_setup = Some(hook);
        self
    }

    #[must_use]
    pub fn private_key(&self) -> &RaopRsaPrivateKey {
        &self.private_key
    }

    #[must_use]
    pub fn server_ip(&self) -> IpAddr {
        self.server_ip
    }

    #[must_use]
    pub fn mac_address(&self) -> [u8; 6] {
        self.mac_address
    }

    /// Reserve three consecutive ports for audio/control/timing.
    pub fn allocate_ports(&self) -> (u16, u16, u16) {
        let base = self.next_port.fetch_add(3, Ordering::SeqCst);
        (base, base + 1, base + 2)
    }

    pub fn record_setup(&self, client_instance: &str, sockets: SessionSockets, stream: &StreamParameters) {
        self.setups
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(client_instance.to_string(), sockets.clone());
        if let Some(hook) = &self.on_setup {
            hook(client_instance, stream, &sockets);
        }
    }

    pub fn forget_setup(&self, client_instance: &str) {
        self.setups.lock().unwrap_or_else(|e| e.into_inner()).remove(client_instance);
    }
}

/// Build a context for production use: a fresh ephemeral RSA key and the
/// machine's stable pseudo-MAC, matching how the mDNS advertiser derives
/// its own instance identity.
pub fn default_context(
    realm: impl Into<String>,
    credentials: Option<Credentials>,
    max_clients: usize,
    server_ip: IpAddr,
) -> Result<RtspContext, crate::protocol::crypto::CryptoError> {
    let private_key = RaopRsaPrivateKey::generate()?;
    let mac_address = crate::discovery::advertiser::get_device_mac()
        .unwrap_or_else(|_| crate::discovery::advertiser::generate_stable_mac());
    Ok(RtspContext::new(realm, credentials, max_clients, private_key, server_ip, mac_address))
}
