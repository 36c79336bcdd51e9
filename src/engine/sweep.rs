// ============================================================================
// Sweep Planner
// The ascending-price walk at the heart of buy and price quoting
// ============================================================================

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::domain::{Listing, ListingId, PlayerId};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One slice of a planned sweep: how much to take from a single listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepTake {
    pub listing_id: ListingId,
    pub seller: PlayerId,
    pub unit_price: Decimal,
    pub quantity: u32,
    /// True when the take empties the listing, so the row is deleted rather
    /// than decremented
    pub exhausts_listing: bool,
}

impl SweepTake {
    pub fn cost(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// The complete consumption plan for one buy. Computed before any state is
/// touched, so the engine can journal and apply it as a single all-or-nothing
/// unit.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepPlan {
    pub takes: Vec<SweepTake>,
    pub filled: u32,
    pub spent: Decimal,
    pub went_broke: bool,
    pub self_quantity: u32,
}

/// Figures returned to the caller after a buy. The engine has already
/// credited sellers and recorded trades; debiting `spent` from the buyer is
/// the caller's job.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BuyOutcome {
    /// Units actually acquired
    pub filled: u32,
    /// Money owed by the buyer; always <= the balance passed in
    pub spent: Decimal,
    /// True iff the sweep stopped on the balance constraint rather than on
    /// the requested quantity being met
    pub went_broke: bool,
    /// Units taken from the buyer's own listings (net-zero cash, still
    /// surfaced for display)
    pub self_quantity: u32,
}

/// Result of a read-only price quote. A discriminated type, replacing the
/// legacy overloaded-sign encoding.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum QuoteOutcome {
    /// Nothing listed for the variant
    Unavailable,
    /// Less than the requested quantity is listed
    Partial {
        available_quantity: u32,
        total_cost: Decimal,
    },
    /// The full requested quantity is listed
    Full { total_cost: Decimal },
}

/// Walk `candidates` (already sorted price ascending, id ascending) and plan
/// what a buyer with `balance` takes when asking for `requested_quantity`.
///
/// Listings that fit both the remaining balance and the remaining quantity
/// are consumed whole. The first listing that fits neither is the boundary:
/// take `min(affordable, wanted)` from it and stop — later listings are
/// never examined. `balance = None` means unlimited (quote mode).
pub fn plan_sweep(
    candidates: &[Listing],
    buyer: PlayerId,
    requested_quantity: u32,
    balance: Option<Decimal>,
) -> SweepPlan {
    let mut plan = SweepPlan {
        takes: Vec::new(),
        filled: 0,
        spent: Decimal::ZERO,
        went_broke: false,
        self_quantity: 0,
    };

    for listing in candidates {
        if plan.filled >= requested_quantity {
            break;
        }

        let fits_quantity =
            plan.filled as u64 + listing.quantity as u64 <= requested_quantity as u64;
        let fits_balance = balance.map_or(true, |b| plan.spent + listing.notional() <= b);

        let take = if fits_quantity && fits_balance {
            listing.quantity
        } else {
            // Boundary listing
            let wanted = requested_quantity - plan.filled;
            let affordable = match balance {
                None => u32::MAX,
                Some(b) => {
                    let remaining = b - plan.spent;
                    if remaining.is_sign_negative() {
                        0
                    } else {
                        (remaining / listing.price)
                            .floor()
                            .to_u32()
                            .unwrap_or(u32::MAX)
                    }
                },
            };
            let take = affordable.min(wanted);
            if take < wanted {
                plan.went_broke = true;
            }
            take
        };

        if take > 0 {
            plan.spent += listing.price * Decimal::from(take);
            plan.filled += take;
            if listing.seller == buyer {
                plan.self_quantity += take;
            }
            plan.takes.push(SweepTake {
                listing_id: listing.id,
                seller: listing.seller,
                unit_price: listing.price,
                quantity: take,
                exhausts_listing: take == listing.quantity,
            });
        }

        // A boundary listing ends the sweep whether or not anything was taken
        if take < listing.quantity {
            break;
        }
    }

    plan
}
