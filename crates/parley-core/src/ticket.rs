//! Single-use, time-bounded tickets bridging HTTP login and the WebSocket
//! handshake.
//!
//! A ticket is minted for an authenticated identity and can be redeemed
//! exactly once, within its TTL. Redemption is a single critical section on
//! the ticket's map entry, so concurrent redemption attempts for the same id
//! yield exactly one success.

use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::error::TicketError;
use crate::token;

#[derive(Debug)]
struct Ticket {
    owner: String,
    issued_at: Instant,
    expires_at: Instant,
    redeemed: bool,
}

pub struct TicketIssuer {
    tickets: DashMap<String, Ticket>,
    ttl: Duration,
}

impl TicketIssuer {
    pub fn new(ttl: Duration) -> Self {
        Self {
            tickets: DashMap::new(),
            ttl,
        }
    }

    /// Mints a ticket bound to `owner` and returns its opaque id.
    pub fn issue(&self, owner: &str) -> String {
        let id = token::generate();
        let now = Instant::now();
        self.tickets.insert(
            id.clone(),
            Ticket {
                owner: owner.to_string(),
                issued_at: now,
                expires_at: now + self.ttl,
                redeemed: false,
            },
        );
        tracing::debug!("Ticket issued for {owner} (store size: {})", self.tickets.len());
        id
    }

    /// Redeems a ticket, returning the bound identity.
    ///
    /// Expiry wins over prior redemption: a ticket past its TTL always fails
    /// with [`TicketError::Expired`] and is removed.
    pub fn redeem(&self, id: &str) -> Result<String, TicketError> {
        // The exclusive entry guard makes read-check-mark atomic.
        let mut entry = self.tickets.get_mut(id).ok_or(TicketError::NotFound)?;

        if Instant::now() >= entry.expires_at {
            drop(entry);
            self.tickets.remove(id);
            return Err(TicketError::Expired);
        }

        if entry.redeemed {
            return Err(TicketError::AlreadyRedeemed);
        }

        entry.redeemed = true;
        tracing::debug!(
            "Ticket redeemed for {} after {:?}",
            entry.owner,
            entry.issued_at.elapsed()
        );
        Ok(entry.owner.clone())
    }

    /// Removes tickets past their expiry. Redeemed tickets are kept until
    /// expiry so a second redemption attempt still reports
    /// [`TicketError::AlreadyRedeemed`] rather than `NotFound`.
    pub fn sweep_expired(&self) {
        let now = Instant::now();
        self.tickets.retain(|_, ticket| now < ticket.expires_at);
    }

    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }
}
