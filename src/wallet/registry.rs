//! Wallet registry
//!
//! Tracks issued addresses. Wallets live off-chain; only the addresses
//! they own appear in transactions.

use std::collections::HashSet;
use super::generate_address;

/// Issued wallet addresses
#[derive(Debug, Clone, Default)]
pub struct WalletRegistry {
    wallets: HashSet<String>,
}

impl WalletRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore previously issued wallets
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self {
            wallets: entries.into_iter().collect(),
        }
    }

    /// Draw an address not yet issued. Does not register it.
    pub fn fresh_address(&self) -> String {
        loop {
            let address = generate_address();
            if !self.wallets.contains(&address) {
                return address;
            }
        }
    }

    /// Register an address. Returns false if it was already issued.
    pub fn register(&mut self, address: String) -> bool {
        self.wallets.insert(address)
    }

    pub fn contains(&self, address: &str) -> bool {
        self.wallets.contains(address)
    }

    pub fn len(&self) -> usize {
        self.wallets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wallets.is_empty()
    }
}
