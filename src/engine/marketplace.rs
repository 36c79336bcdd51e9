// ============================================================================
// Marketplace Engine
// Core business logic: listing/lot mutations, the buy sweep, market control
// ============================================================================

use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{
    ConfirmAction, Enchantment, ItemVariant, Listing, ListingBook, ListingId, Lot, LotBook,
    LotId, PendingBook, PlayerFlags, PlayerId, TradeLedger, TradeRecord, TradeView,
};
use crate::engine::sweep::{plan_sweep, BuyOutcome, QuoteOutcome};
use crate::error::{MarketError, MarketResult};
use crate::interfaces::{
    EconomyService, EventHandler, JournalEntry, MarketEvent, MarketJournal,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Result of an upsert-style sell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SellOutcome {
    /// No prior listing existed; a new row was created
    Created(Listing),
    /// An existing row was merged into; carries the pre-update state so the
    /// caller can display the delta
    Merged { previous: Listing },
}

/// How much of a listing to cancel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CancelAmount {
    All,
    Quantity(u32),
}

/// Everything the marketplace owns, behind one lock.
#[derive(Debug, Default)]
pub(crate) struct MarketState {
    pub listings: ListingBook,
    pub lots: LotBook,
    pub ledger: TradeLedger,
    pub flags: PlayerFlags,
    pub pending: PendingBook,
    pub frozen: bool,
}

/// The shared mutable marketplace.
///
/// One `RwLock` is the single serialization point: every mutating operation
/// (sell/buy/cancel/reprice and the enchanted variants, plus the freeze and
/// flag toggles) runs its whole critical section — candidate scan, journal
/// batch, state application, seller credits, ledger appends — under the
/// write guard. Queries take the read guard and therefore always observe a
/// fully applied state. Notification events are emitted only after the
/// guard drops.
pub struct Marketplace {
    pub(crate) state: RwLock<MarketState>,
    pub(crate) economy: Arc<dyn EconomyService>,
    journal: Arc<dyn MarketJournal>,
    event_handler: Arc<dyn EventHandler>,
    listing_seq: AtomicU64,
    lot_seq: AtomicU64,
}

impl Marketplace {
    pub fn new(
        economy: Arc<dyn EconomyService>,
        journal: Arc<dyn MarketJournal>,
        event_handler: Arc<dyn EventHandler>,
    ) -> Self {
        Self {
            state: RwLock::new(MarketState::default()),
            economy,
            journal,
            event_handler,
            listing_seq: AtomicU64::new(1),
            lot_seq: AtomicU64::new(1),
        }
    }

    // ========================================================================
    // Listing mutations
    // ========================================================================

    /// Post `add_quantity` units of `variant` at `price`, merging into the
    /// seller's existing listing for that variant if there is one.
    ///
    /// `price = None` means "keep the current price" and fails with
    /// `NotFound` when no listing exists to take the price from.
    pub fn upsert_sell(
        &self,
        seller: PlayerId,
        variant: ItemVariant,
        add_quantity: u32,
        price: Option<Decimal>,
    ) -> MarketResult<SellOutcome> {
        if add_quantity == 0 {
            return Err(MarketError::InvalidQuantity);
        }
        validate_price(price)?;

        let mut state = self.state.write();
        ensure_unfrozen(&state)?;

        match state.listings.get(seller, &variant).cloned() {
            Some(previous) => {
                let quantity = previous
                    .quantity
                    .checked_add(add_quantity)
                    .ok_or(MarketError::InvalidQuantity)?;
                let updated = Listing {
                    quantity,
                    price: price.unwrap_or(previous.price),
                    ..previous.clone()
                };
                self.commit(&[JournalEntry::ListingPut(updated.clone())])?;
                state.listings.put(updated);
                Ok(SellOutcome::Merged { previous })
            },
            None => {
                let price = price.ok_or(MarketError::NotFound)?;
                let listing = Listing {
                    id: self.next_listing_id(),
                    variant,
                    seller,
                    price,
                    quantity: add_quantity,
                };
                self.commit(&[JournalEntry::ListingPut(listing.clone())])?;
                state.listings.put(listing.clone());
                Ok(SellOutcome::Created(listing))
            },
        }
    }

    /// Change the unit price of an existing listing; returns the old state.
    pub fn reprice(
        &self,
        seller: PlayerId,
        variant: ItemVariant,
        new_price: Decimal,
    ) -> MarketResult<Listing> {
        validate_price(Some(new_price))?;

        let mut state = self.state.write();
        ensure_unfrozen(&state)?;

        let previous = state
            .listings
            .get(seller, &variant)
            .cloned()
            .ok_or(MarketError::NotFound)?;
        let updated = Listing {
            price: new_price,
            ..previous.clone()
        };
        self.commit(&[JournalEntry::ListingPut(updated.clone())])?;
        state.listings.put(updated);
        Ok(previous)
    }

    /// Withdraw stock from a listing. `CancelAmount::All` or any quantity at
    /// or above the current one deletes the row and returns the full prior
    /// quantity; otherwise the row is decremented and the requested quantity
    /// returned.
    pub fn cancel(
        &self,
        seller: PlayerId,
        variant: ItemVariant,
        amount: CancelAmount,
    ) -> MarketResult<u32> {
        if let CancelAmount::Quantity(0) = amount {
            return Err(MarketError::InvalidQuantity);
        }

        let mut state = self.state.write();
        ensure_unfrozen(&state)?;

        let existing = state
            .listings
            .get(seller, &variant)
            .cloned()
            .ok_or(MarketError::NoStock)?;

        let remove_all = match amount {
            CancelAmount::All => true,
            CancelAmount::Quantity(q) => q >= existing.quantity,
        };

        if remove_all {
            self.commit(&[JournalEntry::ListingRemoved(existing.id)])?;
            state.listings.remove(seller, &variant);
            Ok(existing.quantity)
        } else {
            let CancelAmount::Quantity(q) = amount else {
                unreachable!("All always removes the row");
            };
            let updated = Listing {
                quantity: existing.quantity - q,
                ..existing
            };
            self.commit(&[JournalEntry::ListingPut(updated.clone())])?;
            state.listings.put(updated);
            Ok(q)
        }
    }

    // ========================================================================
    // Lot mutations
    // ========================================================================

    /// Post a single enchanted item (`esell`). Lots never merge.
    pub fn create_lot(
        &self,
        seller: PlayerId,
        seller_alias: impl Into<String>,
        variant: ItemVariant,
        enchantments: Vec<Enchantment>,
        price: Decimal,
    ) -> MarketResult<LotId> {
        validate_price(Some(price))?;

        let mut state = self.state.write();
        ensure_unfrozen(&state)?;

        let lot = Lot {
            id: self.next_lot_id(),
            variant,
            enchantments,
            seller,
            seller_alias: seller_alias.into(),
            price,
        };
        self.commit(&[JournalEntry::LotPut(lot.clone())])?;
        let id = lot.id;
        state.lots.put(lot);
        drop(state);

        self.event_handler
            .on_event(MarketEvent::LotListed { seller, lot_id: id });
        Ok(id)
    }

    /// Withdraw a lot (`ecancel`). Only the owning seller may do this; a
    /// foreign or unknown id is `NotFound` either way.
    pub fn delete_lot(&self, seller: PlayerId, id: LotId) -> MarketResult<Lot> {
        let mut state = self.state.write();
        ensure_unfrozen(&state)?;

        match state.lots.get(id) {
            Some(lot) if lot.seller == seller => {},
            _ => return Err(MarketError::NotFound),
        }
        self.commit(&[JournalEntry::LotRemoved(id)])?;
        Ok(state.lots.remove(id).expect("checked above"))
    }

    /// Change a lot's price (`ereprice`); returns the old state.
    pub fn reprice_lot(
        &self,
        seller: PlayerId,
        id: LotId,
        new_price: Decimal,
    ) -> MarketResult<Lot> {
        validate_price(Some(new_price))?;

        let mut state = self.state.write();
        ensure_unfrozen(&state)?;

        let previous = match state.lots.get(id) {
            Some(lot) if lot.seller == seller => lot.clone(),
            _ => return Err(MarketError::NotFound),
        };
        let updated = Lot {
            price: new_price,
            ..previous.clone()
        };
        self.commit(&[JournalEntry::LotPut(updated.clone())])?;
        state.lots.put(updated);
        Ok(previous)
    }

    // ========================================================================
    // Matching
    // ========================================================================

    /// Buy up to `requested_quantity` of `variant`, cheapest listings first,
    /// optionally ignoring listings above `max_price`, spending at most
    /// `buyer_balance`.
    ///
    /// Sellers are credited and trades recorded inside the call; the buyer
    /// is **never** debited here — the caller must apply `spent` through the
    /// economy service after this returns.
    ///
    /// The sweep is planned first and journaled as one batch, then applied;
    /// a journal failure leaves no partial effect.
    pub fn buy(
        &self,
        buyer: PlayerId,
        variant: ItemVariant,
        requested_quantity: u32,
        max_price: Option<Decimal>,
        buyer_balance: Decimal,
    ) -> MarketResult<BuyOutcome> {
        if requested_quantity == 0 {
            return Err(MarketError::InvalidQuantity);
        }
        validate_price(max_price)?;

        let mut state = self.state.write();
        ensure_unfrozen(&state)?;

        let candidates = state.listings.candidates(&variant, max_price);
        if candidates.is_empty() {
            return Err(MarketError::NoStock);
        }

        let plan = plan_sweep(&candidates, buyer, requested_quantity, Some(buyer_balance));
        if plan.filled == 0 {
            return Err(MarketError::InsufficientFunds);
        }

        // Journal the whole sweep before touching anything.
        let mut batch = Vec::with_capacity(plan.takes.len() * 2);
        let mut records = Vec::with_capacity(plan.takes.len());
        for take in &plan.takes {
            if take.exhausts_listing {
                batch.push(JournalEntry::ListingRemoved(take.listing_id));
            } else {
                let mut row = state
                    .listings
                    .get(take.seller, &variant)
                    .cloned()
                    .expect("planned take targets an existing row");
                row.quantity -= take.quantity;
                batch.push(JournalEntry::ListingPut(row));
            }
            let record = TradeRecord::new(
                variant.clone(),
                take.seller,
                buyer,
                take.unit_price,
                take.quantity,
            );
            batch.push(JournalEntry::TradeAppended(record.clone()));
            records.push(record);
        }
        self.commit(&batch)?;

        // Apply: consume listings, record trades, credit sellers.
        let mut events = Vec::with_capacity(plan.takes.len());
        for (take, record) in plan.takes.iter().zip(records) {
            if take.exhausts_listing {
                state.listings.remove(take.seller, &variant);
            } else {
                let row = state
                    .listings
                    .get_mut(take.seller, &variant)
                    .expect("planned take targets an existing row");
                row.quantity -= take.quantity;
            }
            state.ledger.append(record);
            self.economy.credit(take.seller, take.cost());
            events.push(MarketEvent::SoldToBuyer {
                seller: take.seller,
                buyer,
                variant: variant.clone(),
                quantity: take.quantity,
                total: take.cost(),
            });
        }
        drop(state);

        tracing::debug!(
            %buyer,
            %variant,
            filled = plan.filled,
            %plan.spent,
            "buy settled"
        );
        self.event_handler.on_events(events);

        Ok(BuyOutcome {
            filled: plan.filled,
            spent: plan.spent,
            went_broke: plan.went_broke,
            self_quantity: plan.self_quantity,
        })
    }

    /// Read-only price quote: the same sweep with an unlimited balance and
    /// no mutation. Available even while the market is frozen.
    pub fn price_quote(&self, variant: &ItemVariant, requested_quantity: u32) -> QuoteOutcome {
        let state = self.state.read();
        let candidates = state.listings.candidates(variant, None);
        if candidates.is_empty() {
            return QuoteOutcome::Unavailable;
        }

        let nobody = PlayerId::from_uuid(Uuid::nil());
        let plan = plan_sweep(&candidates, nobody, requested_quantity, None);
        if plan.filled < requested_quantity {
            QuoteOutcome::Partial {
                available_quantity: plan.filled,
                total_cost: plan.spent,
            }
        } else {
            QuoteOutcome::Full {
                total_cost: plan.spent,
            }
        }
    }

    /// Buy one specific lot (`ebuy`). Not a sweep: the lot must still exist
    /// and still cost exactly `expected_price` (captured at staging time, a
    /// defence against price drift). Returns the lot for delivery; the
    /// caller debits the buyer.
    pub fn ebuy(
        &self,
        buyer: PlayerId,
        lot_id: LotId,
        expected_price: Decimal,
        buyer_balance: Decimal,
    ) -> MarketResult<Lot> {
        let mut state = self.state.write();
        ensure_unfrozen(&state)?;

        let lot = state
            .lots
            .get(lot_id)
            .cloned()
            .ok_or(MarketError::ListingGone)?;
        if lot.price != expected_price {
            return Err(MarketError::PriceChanged);
        }
        if buyer_balance < lot.price {
            return Err(MarketError::InsufficientFunds);
        }

        let record = TradeRecord::new(lot.variant.clone(), lot.seller, buyer, lot.price, 1);
        self.commit(&[
            JournalEntry::LotRemoved(lot_id),
            JournalEntry::TradeAppended(record.clone()),
        ])?;

        state.lots.remove(lot_id);
        state.ledger.append(record);
        self.economy.credit(lot.seller, lot.price);
        drop(state);

        self.event_handler.on_event(MarketEvent::LotSoldToBuyer {
            seller: lot.seller,
            buyer,
            lot: lot.clone(),
            total: lot.price,
        });
        Ok(lot)
    }

    // ========================================================================
    // Market control
    // ========================================================================

    /// Flip the global freeze and return the new state. While frozen, every
    /// mutating operation fails fast with `MarketFrozen`; queries still work.
    pub fn toggle_freeze(&self) -> MarketResult<bool> {
        let mut state = self.state.write();
        let frozen = !state.frozen;
        self.commit(&[JournalEntry::FreezeSet(frozen)])?;
        state.frozen = frozen;
        drop(state);

        tracing::info!(frozen, "general freeze toggled");
        self.event_handler
            .on_event(MarketEvent::FreezeToggled { frozen });
        Ok(frozen)
    }

    pub fn is_frozen(&self) -> bool {
        self.state.read().frozen
    }

    /// Flip a player's confirmation-skip flag for one action; returns the
    /// new value. Allowed even while frozen — it gates the confirm flow, not
    /// the market rows.
    pub fn toggle_confirm_skip(
        &self,
        player: PlayerId,
        action: ConfirmAction,
    ) -> MarketResult<bool> {
        let mut state = self.state.write();
        let value = !state.flags.skips_confirmation(player, action);
        self.commit(&[JournalEntry::FlagSet {
            player,
            action,
            value,
        }])?;
        state.flags.set(player, action, value);
        Ok(value)
    }

    pub fn skips_confirmation(&self, player: PlayerId, action: ConfirmAction) -> bool {
        self.state.read().flags.skips_confirmation(player, action)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn listing(&self, seller: PlayerId, variant: &ItemVariant) -> Option<Listing> {
        self.state.read().listings.get(seller, variant).cloned()
    }

    /// Price ascending, ties broken by ascending listing id.
    pub fn listings_for_variant(&self, variant: &ItemVariant) -> Vec<Listing> {
        self.state.read().listings.for_variant(variant)
    }

    pub fn listings_for_seller(&self, seller: PlayerId) -> Vec<Listing> {
        self.state.read().listings.for_seller(seller)
    }

    pub fn stock(&self, variant: &ItemVariant) -> u32 {
        self.state.read().listings.stock(variant)
    }

    pub fn lot(&self, id: LotId) -> Option<Lot> {
        self.state.read().lots.get(id).cloned()
    }

    pub fn lots_matching(&self, variant: &ItemVariant, required: &[Enchantment]) -> Vec<Lot> {
        self.state.read().lots.matching(variant, required)
    }

    pub fn lots_for_seller(&self, seller: PlayerId) -> Vec<Lot> {
        self.state.read().lots.for_seller(seller)
    }

    pub fn history_for(&self, player: PlayerId) -> Vec<TradeView> {
        self.state.read().ledger.history_for(player)
    }

    // ========================================================================
    // Private helpers
    // ========================================================================

    fn next_listing_id(&self) -> ListingId {
        ListingId(self.listing_seq.fetch_add(1, Ordering::AcqRel))
    }

    fn next_lot_id(&self) -> LotId {
        LotId(self.lot_seq.fetch_add(1, Ordering::AcqRel))
    }

    /// Journal one mutation batch. The detail of a failure is logged here;
    /// the actor only ever sees the opaque `StoreFailure`.
    fn commit(&self, batch: &[JournalEntry]) -> MarketResult<()> {
        self.journal.record(batch).map_err(|err| {
            tracing::error!(error = %err, entries = batch.len(), "journal write failed");
            MarketError::StoreFailure
        })
    }
}

fn ensure_unfrozen(state: &MarketState) -> MarketResult<()> {
    if state.frozen {
        Err(MarketError::MarketFrozen)
    } else {
        Ok(())
    }
}

fn validate_price(price: Option<Decimal>) -> MarketResult<()> {
    match price {
        Some(p) if p <= Decimal::ZERO => Err(MarketError::InvalidPrice),
        _ => Ok(()),
    }
}
