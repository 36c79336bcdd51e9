// ============================================================================
// Listing Domain Model
// Fungible sell postings keyed by (seller, item variant)
// ============================================================================

use rust_decimal::Decimal;
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// ============================================================================
// Value Objects
// ============================================================================

/// Identifies a player (buyer or seller).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlayerId(Uuid);

impl PlayerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Opaque key for a fungible item type (material + damage/sub-type).
///
/// The engine never inspects the contents; equality and ordering are all it
/// needs. Item-name resolution lives in the command layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ItemVariant(String);

impl ItemVariant {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Monotone listing identifier. Doubles as the documented tie-break among
/// equal-price listings: lower id means listed earlier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ListingId(pub u64);

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ============================================================================
// Listing Entity
// ============================================================================

/// A fungible sell posting.
///
/// Unique per (seller, variant); repeated sells merge into the same row.
/// Invariant: `quantity > 0` — a listing that would reach zero is deleted
/// instead of stored.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Listing {
    pub id: ListingId,
    pub variant: ItemVariant,
    pub seller: PlayerId,
    pub price: Decimal,
    pub quantity: u32,
}

impl Listing {
    /// Total cost of consuming this listing entirely (price * quantity).
    pub fn notional(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

// ============================================================================
// Listing Book
// ============================================================================

/// In-memory table of listings keyed by (seller, variant).
///
/// Pure container: freeze checks, journaling and id allocation belong to the
/// engine. Queries return owned rows so callers never hold references into
/// the locked state.
#[derive(Debug, Default)]
pub struct ListingBook {
    rows: HashMap<(PlayerId, ItemVariant), Listing>,
}

impl ListingBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, seller: PlayerId, variant: &ItemVariant) -> Option<&Listing> {
        self.rows.get(&(seller, variant.clone()))
    }

    pub fn get_mut(&mut self, seller: PlayerId, variant: &ItemVariant) -> Option<&mut Listing> {
        self.rows.get_mut(&(seller, variant.clone()))
    }

    /// Insert or replace the row for (seller, variant).
    pub fn put(&mut self, listing: Listing) {
        self.rows
            .insert((listing.seller, listing.variant.clone()), listing);
    }

    pub fn remove(&mut self, seller: PlayerId, variant: &ItemVariant) -> Option<Listing> {
        self.rows.remove(&(seller, variant.clone()))
    }

    /// All listings for a variant, price ascending, with equal prices broken
    /// by ascending listing id (insertion order).
    pub fn for_variant(&self, variant: &ItemVariant) -> Vec<Listing> {
        self.candidates(variant, None)
    }

    /// Listings for a variant priced at or under `ceiling` (when given),
    /// sorted price ascending then id ascending. This is the sweep's
    /// candidate order.
    pub fn candidates(&self, variant: &ItemVariant, ceiling: Option<Decimal>) -> Vec<Listing> {
        let mut found: Vec<Listing> = self
            .rows
            .values()
            .filter(|l| &l.variant == variant)
            .filter(|l| ceiling.map_or(true, |max| l.price <= max))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.price.cmp(&b.price).then(a.id.cmp(&b.id)));
        found
    }

    /// All listings owned by a seller, sorted by variant.
    pub fn for_seller(&self, seller: PlayerId) -> Vec<Listing> {
        let mut found: Vec<Listing> = self
            .rows
            .values()
            .filter(|l| l.seller == seller)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.variant.cmp(&b.variant));
        found
    }

    /// Total quantity listed for a variant across all sellers.
    pub fn stock(&self, variant: &ItemVariant) -> u32 {
        self.rows
            .values()
            .filter(|l| &l.variant == variant)
            .map(|l| l.quantity)
            .sum()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
