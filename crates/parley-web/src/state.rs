use std::sync::Arc;
use std::time::Duration;

use parley_core::{AccountStore, TicketIssuer};

use crate::auth::session::SessionStore;
use crate::config::ServerConfig;
use crate::relay::BroadcastRelay;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub accounts: Arc<AccountStore>,
    pub sessions: Arc<SessionStore>,
    pub tickets: Arc<TicketIssuer>,
    pub relay: Arc<BroadcastRelay>,
}

impl AppState {
    pub fn new(config: ServerConfig, accounts: AccountStore) -> Self {
        let sessions = SessionStore::new(config.auth.session_ttl_seconds);
        let tickets = TicketIssuer::new(Duration::from_secs(config.auth.ticket_ttl_seconds));
        let relay = BroadcastRelay::new(config.ws.echo_to_sender);

        Self {
            config: Arc::new(config),
            accounts: Arc::new(accounts),
            sessions: Arc::new(sessions),
            tickets: Arc::new(tickets),
            relay: Arc::new(relay),
        }
    }
}
