// ============================================================================
// Pending-Order Confirmation
// Staging and /confirm dispatch for the two-step confirm flow
// ============================================================================

use std::time::Instant;

use crate::domain::{ConfirmAction, Lot, LotId, PendingOrder, PlayerId};
use crate::engine::marketplace::{Marketplace, SellOutcome};
use crate::engine::sweep::BuyOutcome;
use crate::error::{MarketError, MarketResult};

/// What a successful `/confirm` dispatched to.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfirmOutcome {
    Bought(BuyOutcome),
    Listed(SellOutcome),
    LotBought(Lot),
    LotListed(LotId),
}

impl Marketplace {
    /// True when `action` by `player` must go through the staged-order
    /// confirm step instead of executing immediately.
    pub fn requires_confirmation(&self, player: PlayerId, action: ConfirmAction) -> bool {
        !self.skips_confirmation(player, action)
    }

    /// Stage an action for later `/confirm`, silently replacing any prior
    /// staged order for this player. Staged orders live in memory only; they
    /// are not journaled and do not survive a restart.
    pub fn stage(&self, player: PlayerId, order: PendingOrder) {
        self.state.write().pending.stage(player, order);
    }

    /// The player's currently staged order, if any (expired entries
    /// included — expiry is decided at confirm time).
    pub fn staged_order(&self, player: PlayerId) -> Option<PendingOrder> {
        self.state
            .read()
            .pending
            .peek(player)
            .map(|staged| staged.order.clone())
    }

    /// Execute the player's staged order with the exact parameters captured
    /// at staging time.
    ///
    /// Nothing staged is `NoPendingOrder`. A stale order is removed on
    /// detection and reported as `PendingOrderExpired`, so it can never be
    /// resurrected by a later confirm. On a dispatch failure (frozen market,
    /// vanished lot, ...) the order is re-staged with its original age and
    /// the error is passed through; a success consumes the order.
    pub fn confirm(&self, player: PlayerId) -> MarketResult<ConfirmOutcome> {
        self.confirm_at(player, Instant::now())
    }

    fn confirm_at(&self, player: PlayerId, now: Instant) -> MarketResult<ConfirmOutcome> {
        let staged = {
            let mut state = self.state.write();
            let staged = state.pending.clear(player).ok_or(MarketError::NoPendingOrder)?;
            if staged.is_expired(now) {
                return Err(MarketError::PendingOrderExpired);
            }
            staged
        };

        let result = self.dispatch(player, staged.order.clone());
        if result.is_err() {
            self.state
                .write()
                .pending
                .stage_at(player, staged.order, staged.created_at);
        }
        result
    }

    fn dispatch(&self, player: PlayerId, order: PendingOrder) -> MarketResult<ConfirmOutcome> {
        match order {
            PendingOrder::Buy {
                variant,
                quantity,
                max_price,
            } => {
                let balance = self.economy.balance(player);
                self.buy(player, variant, quantity, max_price, balance)
                    .map(ConfirmOutcome::Bought)
            },
            PendingOrder::Sell {
                variant,
                quantity,
                price,
            } => self
                .upsert_sell(player, variant, quantity, price)
                .map(ConfirmOutcome::Listed),
            PendingOrder::EBuy {
                lot_id,
                expected_price,
            } => {
                let balance = self.economy.balance(player);
                self.ebuy(player, lot_id, expected_price, balance)
                    .map(ConfirmOutcome::LotBought)
            },
            PendingOrder::ESell {
                variant,
                enchantments,
                seller_alias,
                price,
            } => self
                .create_lot(player, seller_alias, variant, enchantments, price)
                .map(ConfirmOutcome::LotListed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ItemVariant, PENDING_ORDER_TTL};
    use crate::interfaces::{InMemoryEconomy, NoOpEventHandler, NoOpJournal};
    use rust_decimal::Decimal;
    use std::sync::Arc;
    use std::time::Duration;

    fn market() -> (Arc<InMemoryEconomy>, Marketplace) {
        let economy = Arc::new(InMemoryEconomy::new());
        let market = Marketplace::new(
            economy.clone(),
            Arc::new(NoOpJournal),
            Arc::new(NoOpEventHandler),
        );
        (economy, market)
    }

    fn stone() -> ItemVariant {
        ItemVariant::new("STONE")
    }

    #[test]
    fn test_confirm_without_staged_order() {
        let (_, market) = market();
        assert_eq!(
            market.confirm(PlayerId::new()).unwrap_err(),
            MarketError::NoPendingOrder
        );
    }

    #[test]
    fn test_confirm_dispatches_staged_buy_with_captured_params() {
        let (economy, market) = market();
        let (seller, buyer) = (PlayerId::new(), PlayerId::new());
        economy.set_balance(buyer, Decimal::from(100));

        market
            .upsert_sell(seller, stone(), 10, Some(Decimal::from(2)))
            .unwrap();
        market.stage(
            buyer,
            PendingOrder::Buy {
                variant: stone(),
                quantity: 4,
                max_price: Some(Decimal::from(3)),
            },
        );

        let outcome = market.confirm(buyer).unwrap();
        match outcome {
            ConfirmOutcome::Bought(buy) => {
                assert_eq!(buy.filled, 4);
                assert_eq!(buy.spent, Decimal::from(8));
            },
            other => panic!("expected buy outcome, got {other:?}"),
        }

        // Consumed: a second confirm has nothing to do
        assert_eq!(
            market.confirm(buyer).unwrap_err(),
            MarketError::NoPendingOrder
        );
    }

    #[test]
    fn test_expired_order_cleared_on_detection() {
        let (_, market) = market();
        let player = PlayerId::new();
        market.stage(
            player,
            PendingOrder::Sell {
                variant: stone(),
                quantity: 1,
                price: Some(Decimal::ONE),
            },
        );

        let later = Instant::now() + PENDING_ORDER_TTL + Duration::from_millis(1);
        assert_eq!(
            market.confirm_at(player, later).unwrap_err(),
            MarketError::PendingOrderExpired
        );
        // Cleared, not left to be resurrected
        assert!(market.staged_order(player).is_none());
        assert_eq!(
            market.confirm_at(player, later).unwrap_err(),
            MarketError::NoPendingOrder
        );
    }

    #[test]
    fn test_failed_dispatch_keeps_order_staged() {
        let (_, market) = market();
        let player = PlayerId::new();
        market.stage(
            player,
            PendingOrder::ESell {
                variant: ItemVariant::new("BOW"),
                enchantments: vec![],
                seller_alias: "steve".to_string(),
                price: Decimal::ONE,
            },
        );

        market.toggle_freeze().unwrap();
        assert_eq!(
            market.confirm(player).unwrap_err(),
            MarketError::MarketFrozen
        );
        assert!(market.staged_order(player).is_some());

        market.toggle_freeze().unwrap();
        assert!(matches!(
            market.confirm(player).unwrap(),
            ConfirmOutcome::LotListed(_)
        ));
    }

    #[test]
    fn test_staging_replaces_previous_order() {
        let (economy, market) = market();
        let (seller, buyer) = (PlayerId::new(), PlayerId::new());
        economy.set_balance(buyer, Decimal::from(100));
        market
            .upsert_sell(seller, stone(), 10, Some(Decimal::ONE))
            .unwrap();

        market.stage(
            buyer,
            PendingOrder::Buy {
                variant: stone(),
                quantity: 1,
                max_price: None,
            },
        );
        market.stage(
            buyer,
            PendingOrder::Buy {
                variant: stone(),
                quantity: 7,
                max_price: None,
            },
        );

        match market.confirm(buyer).unwrap() {
            ConfirmOutcome::Bought(buy) => assert_eq!(buy.filled, 7),
            other => panic!("expected buy outcome, got {other:?}"),
        }
    }

    #[test]
    fn test_confirm_flag_gating() {
        let (_, market) = market();
        let player = PlayerId::new();

        assert!(market.requires_confirmation(player, ConfirmAction::Buy));
        assert!(market.toggle_confirm_skip(player, ConfirmAction::Buy).unwrap());
        assert!(!market.requires_confirmation(player, ConfirmAction::Buy));
        // Independent per action
        assert!(market.requires_confirmation(player, ConfirmAction::EBuy));
    }
}
