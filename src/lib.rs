// ============================================================================
// Bazaar Engine Library
// Player-to-player marketplace: listings, lots, greedy price-ascending
// matching, and the staged-order confirmation flow
// ============================================================================

//! # Bazaar Engine
//!
//! A player-to-player marketplace engine. Sellers post quantities of an item
//! type at a unit price; buyers consume postings up to a requested quantity
//! and an optional price ceiling; the market clears greedily by ascending
//! price.
//!
//! ## Features
//!
//! - **Fungible listings** that merge per (seller, variant), plus unique
//!   enchanted **lots** that never merge
//! - **Greedy ascending-price sweep** with exact partial-fill arithmetic,
//!   applied all-or-nothing
//! - **Staged orders** with a 5 second confirm window per player
//! - **Global freeze** circuit breaker and per-player confirmation-skip flags
//! - **Trait seams** for the economy ledger, notification delivery, and
//!   durable journaling
//!
//! ## Example
//!
//! ```rust
//! use bazaar_engine::prelude::*;
//! use rust_decimal::Decimal;
//! use std::sync::Arc;
//!
//! let economy = Arc::new(InMemoryEconomy::new());
//! let market = Marketplace::new(
//!     economy.clone(),
//!     Arc::new(NoOpJournal),
//!     Arc::new(NoOpEventHandler),
//! );
//!
//! let seller = PlayerId::new();
//! let buyer = PlayerId::new();
//! economy.set_balance(buyer, Decimal::from(100));
//!
//! market
//!     .upsert_sell(seller, ItemVariant::new("STONE"), 64, Some(Decimal::from(2)))
//!     .unwrap();
//!
//! let outcome = market
//!     .buy(buyer, ItemVariant::new("STONE"), 10, None, economy.balance(buyer))
//!     .unwrap();
//! assert_eq!(outcome.filled, 10);
//!
//! // The engine credited the seller but never debits the buyer itself:
//! economy.debit(buyer, outcome.spent);
//! ```

pub mod domain;
pub mod engine;
pub mod error;
pub mod interfaces;
pub mod utils;

// Re-exports for convenience
pub mod prelude {
    pub use crate::domain::{
        ConfirmAction, Enchantment, ItemVariant, Listing, ListingId, Lot, LotId, PendingOrder,
        PlayerId, TradeRecord, TradeRole, TradeView, PENDING_ORDER_TTL,
    };
    pub use crate::engine::{
        BuyOutcome, CancelAmount, ConfirmOutcome, Marketplace, QuoteOutcome, SellOutcome,
    };
    pub use crate::error::{MarketError, MarketResult};
    pub use crate::interfaces::{
        EconomyService, EventHandler, InMemoryEconomy, JournalEntry, MarketEvent, MarketJournal,
        NoOpEventHandler, NoOpJournal, StoreError,
    };
}

#[cfg(test)]
mod integration_tests {
    use super::prelude::*;
    use parking_lot::Mutex;
    use rust_decimal::Decimal;
    use std::sync::Arc;

    struct RecordingHandler {
        events: Mutex<Vec<MarketEvent>>,
    }

    impl EventHandler for RecordingHandler {
        fn on_event(&self, event: MarketEvent) {
            self.events.lock().push(event);
        }
    }

    fn market_with_handler() -> (Arc<InMemoryEconomy>, Arc<RecordingHandler>, Marketplace) {
        let economy = Arc::new(InMemoryEconomy::new());
        let handler = Arc::new(RecordingHandler {
            events: Mutex::new(Vec::new()),
        });
        let market = Marketplace::new(economy.clone(), Arc::new(NoOpJournal), handler.clone());
        (economy, handler, market)
    }

    #[test]
    fn test_end_to_end_sell_quote_buy_history() {
        let (economy, handler, market) = market_with_handler();
        let (alice, bob, carol) = (PlayerId::new(), PlayerId::new(), PlayerId::new());
        economy.set_balance(carol, Decimal::from(15));

        let stone = ItemVariant::new("STONE");
        market
            .upsert_sell(alice, stone.clone(), 10, Some(Decimal::ONE))
            .unwrap();
        market
            .upsert_sell(bob, stone.clone(), 10, Some(Decimal::from(2)))
            .unwrap();

        assert_eq!(
            market.price_quote(&stone, 20),
            QuoteOutcome::Full {
                total_cost: Decimal::from(30)
            }
        );

        let outcome = market
            .buy(carol, stone.clone(), 15, None, economy.balance(carol))
            .unwrap();
        assert_eq!(outcome.filled, 12);
        assert_eq!(outcome.spent, Decimal::from(14));
        assert!(outcome.went_broke);

        // Caller applies the debit
        economy.debit(carol, outcome.spent);
        assert_eq!(economy.balance(carol), Decimal::ONE);
        assert_eq!(economy.balance(alice), Decimal::from(10));
        assert_eq!(economy.balance(bob), Decimal::from(4));

        // One notification per consumed listing, emitted post-settlement
        let events = handler.events.lock();
        let sold: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, MarketEvent::SoldToBuyer { .. }))
            .collect();
        assert_eq!(sold.len(), 2);

        // History from both sides
        assert_eq!(market.history_for(carol).len(), 2);
        assert!(market
            .history_for(carol)
            .iter()
            .all(|view| view.role == TradeRole::Bought));
        assert_eq!(market.history_for(alice).len(), 1);
        assert_eq!(market.history_for(alice)[0].role, TradeRole::Sold);
    }

    #[test]
    fn test_staged_ebuy_confirm_flow() {
        let (economy, _, market) = market_with_handler();
        let (seller, buyer) = (PlayerId::new(), PlayerId::new());
        economy.set_balance(buyer, Decimal::from(500));

        let sword = ItemVariant::new("DIAMOND_SWORD");
        let lot_id = market
            .create_lot(
                seller,
                "steve",
                sword.clone(),
                vec![Enchantment::new("sharpness", 5)],
                Decimal::from(250),
            )
            .unwrap();

        // Player has confirmation on: the command layer stages instead of
        // executing
        assert!(market.requires_confirmation(buyer, ConfirmAction::EBuy));
        let quoted_price = market.lot(lot_id).unwrap().price;
        market.stage(
            buyer,
            PendingOrder::EBuy {
                lot_id,
                expected_price: quoted_price,
            },
        );

        // Seller raises the price before the confirm lands
        market.reprice_lot(seller, lot_id, Decimal::from(400)).unwrap();
        assert_eq!(market.confirm(buyer).unwrap_err(), MarketError::PriceChanged);
        assert!(market.lot(lot_id).is_some());

        // Back to the quoted price, confirm goes through
        market.reprice_lot(seller, lot_id, quoted_price).unwrap();
        match market.confirm(buyer).unwrap() {
            ConfirmOutcome::LotBought(lot) => {
                assert_eq!(lot.id, lot_id);
                economy.debit(buyer, lot.price);
            },
            other => panic!("expected lot purchase, got {other:?}"),
        }

        assert!(market.lot(lot_id).is_none());
        assert_eq!(economy.balance(seller), Decimal::from(250));
        assert_eq!(economy.balance(buyer), Decimal::from(250));
    }

    #[test]
    fn test_enchantment_search_and_esell() {
        let (_, _, market) = market_with_handler();
        let seller = PlayerId::new();
        let sword = ItemVariant::new("DIAMOND_SWORD");

        market
            .create_lot(
                seller,
                "alex",
                sword.clone(),
                vec![Enchantment::new("sharpness", 5)],
                Decimal::from(300),
            )
            .unwrap();
        market
            .create_lot(
                seller,
                "alex",
                sword.clone(),
                vec![
                    Enchantment::new("sharpness", 5),
                    Enchantment::new("unbreaking", 3),
                ],
                Decimal::from(200),
            )
            .unwrap();

        let all = market.lots_matching(&sword, &[Enchantment::new("sharpness", 5)]);
        assert_eq!(all.len(), 2);
        // Cheapest first
        assert_eq!(all[0].price, Decimal::from(200));

        let durable = market.lots_matching(&sword, &[Enchantment::new("unbreaking", 3)]);
        assert_eq!(durable.len(), 1);

        assert_eq!(market.lots_for_seller(seller).len(), 2);
    }

    #[test]
    fn test_freeze_is_global_circuit_breaker() {
        let (economy, _, market) = market_with_handler();
        let (seller, buyer) = (PlayerId::new(), PlayerId::new());
        economy.set_balance(buyer, Decimal::from(100));
        let stone = ItemVariant::new("STONE");
        market
            .upsert_sell(seller, stone.clone(), 10, Some(Decimal::ONE))
            .unwrap();

        assert!(market.toggle_freeze().unwrap());
        assert!(market.is_frozen());

        assert_eq!(
            market
                .buy(buyer, stone.clone(), 5, None, economy.balance(buyer))
                .unwrap_err(),
            MarketError::MarketFrozen
        );
        // Queries keep working while frozen
        assert_eq!(market.stock(&stone), 10);
        assert_eq!(market.listings_for_variant(&stone).len(), 1);

        assert!(!market.toggle_freeze().unwrap());
        assert!(market
            .buy(buyer, stone, 5, None, economy.balance(buyer))
            .is_ok());
    }
}
