//! Shared fixtures for the in-crate tests.

use parley_core::AccountStore;

use crate::config::ServerConfig;
use crate::state::AppState;

pub fn test_state() -> AppState {
    AppState::new(ServerConfig::default(), AccountStore::in_memory())
}
