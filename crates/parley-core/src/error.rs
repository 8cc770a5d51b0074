//! Error types for `parley-core`.
//!
//! Each store has its own error enum so callers can map failures onto the
//! right HTTP status or close code without string matching.

/// Errors raised while creating or loading accounts.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    /// The username is already taken by an existing account.
    #[error("username already taken")]
    DuplicateUsername,

    /// A required field (username, password or email) was empty.
    #[error("username, password and email must not be empty")]
    InvalidInput,

    /// Password hashing failed.
    #[error("password hashing failed: {0}")]
    Hash(String),

    /// Failed to parse the accounts file.
    #[error("accounts file parse error: {0}")]
    Parse(String),

    /// An I/O error while reading or writing the accounts file.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors raised while verifying a credential claim.
///
/// `UnknownAccount` and `BadPassword` are distinct here so callers can log
/// the real cause, but the HTTP layer must present both as the same generic
/// message to prevent username enumeration.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No account exists for the given username.
    #[error("unknown account")]
    UnknownAccount,

    /// The password does not match the stored hash.
    #[error("bad password")]
    BadPassword,

    /// The stored hash could not be parsed or verified.
    #[error("password verification failed: {0}")]
    Hash(String),
}

/// Errors raised while redeeming a ticket.
#[derive(Debug, thiserror::Error)]
pub enum TicketError {
    /// No ticket exists for the given id.
    #[error("ticket not found")]
    NotFound,

    /// The ticket exists but its expiry has passed.
    #[error("ticket expired")]
    Expired,

    /// The ticket has already been redeemed once.
    #[error("ticket already redeemed")]
    AlreadyRedeemed,
}
