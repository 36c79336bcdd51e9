// ============================================================================
// Trade Ledger Domain Model
// Append-only record of completed trades
// ============================================================================

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::listing::{ItemVariant, PlayerId};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A completed trade. Records are never mutated or deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TradeRecord {
    pub variant: ItemVariant,
    pub seller: PlayerId,
    pub buyer: PlayerId,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub timestamp: DateTime<Utc>,
}

impl TradeRecord {
    pub fn new(
        variant: ItemVariant,
        seller: PlayerId,
        buyer: PlayerId,
        unit_price: Decimal,
        quantity: u32,
    ) -> Self {
        Self {
            variant,
            seller,
            buyer,
            unit_price,
            quantity,
            timestamp: Utc::now(),
        }
    }

    /// Total money moved by this trade (unit_price * quantity).
    pub fn total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Which side of a trade the queried player was on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TradeRole {
    Sold,
    Bought,
}

/// A ledger row viewed relative to one player. Replaces the legacy
/// signed-quantity encoding with an explicit role.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TradeView {
    pub role: TradeRole,
    pub record: TradeRecord,
}

// ============================================================================
// Trade Ledger
// ============================================================================

/// Append-only trade history, newest last.
#[derive(Debug, Default)]
pub struct TradeLedger {
    records: Vec<TradeRecord>,
}

impl TradeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, record: TradeRecord) {
        self.records.push(record);
    }

    /// Every trade a player took part in, as seller or buyer, oldest first.
    /// A self-trade yields a single row with role `Bought` (the buy is the
    /// action the player took; the cash transfer was net zero).
    pub fn history_for(&self, player: PlayerId) -> Vec<TradeView> {
        self.records
            .iter()
            .filter_map(|record| {
                let role = if record.buyer == player {
                    TradeRole::Bought
                } else if record.seller == player {
                    TradeRole::Sold
                } else {
                    return None;
                };
                Some(TradeView {
                    role,
                    record: record.clone(),
                })
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
