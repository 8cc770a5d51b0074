use std::net::SocketAddr;
use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    /// TOML file accounts are loaded from and saved to. In-memory only when absent.
    #[serde(default)]
    pub accounts_path: Option<PathBuf>,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub ws: WsConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub tls: TlsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Lifetime of the login session bridging /login and /ticket.
    #[serde(default = "default_session_ttl_seconds")]
    pub session_ttl_seconds: u64,
    /// Lifetime of a WebSocket ticket. Short: it only bridges two
    /// back-to-back network calls.
    #[serde(default = "default_ticket_ttl_seconds")]
    pub ticket_ttl_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WsConfig {
    /// How long a new connection may take to present its ticket frame.
    #[serde(default = "default_handshake_timeout_seconds")]
    pub handshake_timeout_seconds: u64,
    /// Whether a broadcast is delivered back to its sender.
    #[serde(default = "default_echo_to_sender")]
    pub echo_to_sender: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_login_rpm")]
    pub login_requests_per_minute: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TlsConfig {
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
}

fn default_bind_addr() -> SocketAddr {
    "0.0.0.0:1337".parse().unwrap()
}

fn default_session_ttl_seconds() -> u64 { 600 }
fn default_ticket_ttl_seconds() -> u64 { 30 }
fn default_handshake_timeout_seconds() -> u64 { 10 }
fn default_echo_to_sender() -> bool { true }
fn default_login_rpm() -> u32 { 5 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            accounts_path: None,
            auth: AuthConfig::default(),
            ws: WsConfig::default(),
            rate_limit: RateLimitConfig::default(),
            tls: TlsConfig::default(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl_seconds: default_session_ttl_seconds(),
            ticket_ttl_seconds: default_ticket_ttl_seconds(),
        }
    }
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            handshake_timeout_seconds: default_handshake_timeout_seconds(),
            echo_to_sender: default_echo_to_sender(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            login_requests_per_minute: default_login_rpm(),
        }
    }
}

impl ServerConfig {
    pub fn tls_enabled(&self) -> bool {
        self.tls.cert_path.is_some() && self.tls.key_path.is_some()
    }

    pub fn load() -> anyhow::Result<Self> {
        let config_path = std::env::var("PARLEY_WEB_CONFIG").map(PathBuf::from).ok();

        let mut config = if let Some(path) = config_path {
            let contents = std::fs::read_to_string(&path)?;
            toml::from_str(&contents)?
        } else {
            ServerConfig::default()
        };

        if let Ok(addr) = std::env::var("PARLEY_BIND_ADDR") {
            config.bind_addr = addr.parse()?;
        }

        if let Ok(path) = std::env::var("PARLEY_ACCOUNTS_PATH") {
            config.accounts_path = Some(PathBuf::from(path));
        }

        if let Ok(cert) = std::env::var("PARLEY_TLS_CERT") {
            config.tls.cert_path = Some(cert);
        }
        if let Ok(key) = std::env::var("PARLEY_TLS_KEY") {
            config.tls.key_path = Some(key);
        }

        if config.accounts_path.is_none() {
            tracing::warn!(
                "No accounts_path configured. Accounts are in-memory and will be lost on restart."
            );
        }

        Ok(config)
    }
}
