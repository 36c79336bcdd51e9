// ============================================================================
// Economy Service Interface
// External balance ledger consumed by the marketplace
// ============================================================================

use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::domain::PlayerId;

/// External economy ledger.
///
/// The engine calls `credit` for sellers during a settlement sweep. It never
/// calls `debit` for buyers — applying `spent` against the buyer's balance
/// is the caller's responsibility, using the figures the engine returns.
pub trait EconomyService: Send + Sync {
    fn balance(&self, player: PlayerId) -> Decimal;

    fn credit(&self, player: PlayerId, amount: Decimal);

    fn debit(&self, player: PlayerId, amount: Decimal);
}

/// Simple in-memory economy for tests and embedding.
#[derive(Debug, Default)]
pub struct InMemoryEconomy {
    balances: RwLock<HashMap<PlayerId, Decimal>>,
}

impl InMemoryEconomy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_balance(self, player: PlayerId, amount: Decimal) -> Self {
        self.balances.write().insert(player, amount);
        self
    }

    pub fn set_balance(&self, player: PlayerId, amount: Decimal) {
        self.balances.write().insert(player, amount);
    }
}

impl EconomyService for InMemoryEconomy {
    fn balance(&self, player: PlayerId) -> Decimal {
        self.balances
            .read()
            .get(&player)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    fn credit(&self, player: PlayerId, amount: Decimal) {
        *self
            .balances
            .write()
            .entry(player)
            .or_insert(Decimal::ZERO) += amount;
    }

    fn debit(&self, player: PlayerId, amount: Decimal) {
        *self
            .balances
            .write()
            .entry(player)
            .or_insert(Decimal::ZERO) -= amount;
    }
}
