//! Parley core library — transport-agnostic chat gateway logic.
//!
//! `parley-core` provides the credential and ticket machinery behind the
//! Parley chat server. It is intentionally decoupled from any HTTP or
//! WebSocket framework so the server crate (`parley-web`) stays a thin
//! transport layer.
//!
//! # Modules
//!
//! - [`account`] — Credential store: registration and verification, optional TOML file persistence.
//! - [`ticket`] — Single-use, TTL-bounded tickets exchanged for WebSocket authentication.
//! - [`token`] — Cryptographically random opaque ids shared by tickets and login sessions.
//! - [`password`] — Argon2 salted hashing.
//! - [`error`] — Error taxonomy: [`AccountError`], [`AuthError`], [`TicketError`].

pub mod account;
pub mod error;
pub mod password;
pub mod ticket;
pub mod token;

pub use account::{Account, AccountStore};
pub use error::{AccountError, AuthError, TicketError};
pub use ticket::TicketIssuer;
