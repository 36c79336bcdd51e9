// ============================================================================
// Pending-Order Domain Model
// Per-player staged action awaiting /confirm, with a wall-clock TTL
// ============================================================================

use rust_decimal::Decimal;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use super::listing::{ItemVariant, PlayerId};
use super::lot::{Enchantment, LotId};

/// How long a staged order stays confirmable.
pub const PENDING_ORDER_TTL: Duration = Duration::from_millis(5000);

/// A staged marketplace action, captured with the exact parameters the
/// player invoked it with. One tagged union instead of the legacy
/// Order/BuyOrder/SellOrder/EBuyOrder/ESellOrder hierarchy; dispatch happens
/// once, at confirm time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingOrder {
    Buy {
        variant: ItemVariant,
        quantity: u32,
        max_price: Option<Decimal>,
    },
    Sell {
        variant: ItemVariant,
        quantity: u32,
        /// `None` keeps the current listing price
        price: Option<Decimal>,
    },
    EBuy {
        lot_id: LotId,
        /// Price shown to the player at staging time; drift fails the confirm
        expected_price: Decimal,
    },
    ESell {
        variant: ItemVariant,
        enchantments: Vec<Enchantment>,
        seller_alias: String,
        price: Decimal,
    },
}

/// A pending order plus the instant it was staged.
#[derive(Debug, Clone)]
pub struct StagedOrder {
    pub order: PendingOrder,
    pub created_at: Instant,
}

impl StagedOrder {
    pub fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.created_at) > PENDING_ORDER_TTL
    }
}

// ============================================================================
// Pending Book
// ============================================================================

/// At most one staged order per player. Staging silently replaces any prior
/// entry; expiry is evaluated by clock comparison at confirm time, never by
/// a background timer.
#[derive(Debug, Default)]
pub struct PendingBook {
    rows: HashMap<PlayerId, StagedOrder>,
}

impl PendingBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&mut self, player: PlayerId, order: PendingOrder) {
        self.stage_at(player, order, Instant::now());
    }

    pub fn stage_at(&mut self, player: PlayerId, order: PendingOrder, created_at: Instant) {
        self.rows.insert(player, StagedOrder { order, created_at });
    }

    pub fn peek(&self, player: PlayerId) -> Option<&StagedOrder> {
        self.rows.get(&player)
    }

    pub fn clear(&mut self, player: PlayerId) -> Option<StagedOrder> {
        self.rows.remove(&player)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buy_order(quantity: u32) -> PendingOrder {
        PendingOrder::Buy {
            variant: ItemVariant::new("STONE"),
            quantity,
            max_price: None,
        }
    }

    #[test]
    fn test_stage_replaces_silently() {
        let mut book = PendingBook::new();
        let player = PlayerId::new();

        book.stage(player, buy_order(10));
        book.stage(player, buy_order(99));

        assert_eq!(book.len(), 1);
        match &book.peek(player).unwrap().order {
            PendingOrder::Buy { quantity, .. } => assert_eq!(*quantity, 99),
            other => panic!("unexpected order {other:?}"),
        }
    }

    #[test]
    fn test_expiry_boundary() {
        let now = Instant::now();
        let staged = StagedOrder {
            order: buy_order(1),
            created_at: now,
        };

        assert!(!staged.is_expired(now + PENDING_ORDER_TTL));
        assert!(staged.is_expired(now + PENDING_ORDER_TTL + Duration::from_millis(1)));
    }

    #[test]
    fn test_clear_removes_entry() {
        let mut book = PendingBook::new();
        let player = PlayerId::new();

        assert!(book.clear(player).is_none());
        book.stage(player, buy_order(1));
        assert!(book.clear(player).is_some());
        assert!(book.is_empty());
    }
}
