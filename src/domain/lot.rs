// ============================================================================
// Lot Domain Model
// Non-fungible enchanted-item postings, one row per physical item
// ============================================================================

use rust_decimal::Decimal;
use std::collections::HashMap;
use std::fmt;

use super::listing::{ItemVariant, PlayerId};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Monotone lot identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LotId(pub u64);

impl fmt::Display for LotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One enchantment carried by a lot. Enchantment-name parsing is a command
/// layer concern; the engine only compares (name, level) pairs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Enchantment {
    pub name: String,
    pub level: u32,
}

impl Enchantment {
    pub fn new(name: impl Into<String>, level: u32) -> Self {
        Self {
            name: name.into(),
            level,
        }
    }
}

/// A single enchanted item posting.
///
/// Quantity is implicitly 1 and lots never merge — every enchanted item is
/// unique. The lot belongs exclusively to `seller` until sold or cancelled.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Lot {
    pub id: LotId,
    pub variant: ItemVariant,
    pub enchantments: Vec<Enchantment>,
    pub seller: PlayerId,
    pub seller_alias: String,
    pub price: Decimal,
}

impl Lot {
    /// Multiset subset match: true iff for every queried (name, level) pair
    /// this lot carries at least that many copies.
    pub fn carries_all(&self, required: &[Enchantment]) -> bool {
        required.iter().all(|want| {
            let wanted = required.iter().filter(|e| *e == want).count();
            let have = self.enchantments.iter().filter(|e| *e == want).count();
            have >= wanted
        })
    }
}

// ============================================================================
// Lot Book
// ============================================================================

/// In-memory table of lots keyed by id.
#[derive(Debug, Default)]
pub struct LotBook {
    rows: HashMap<LotId, Lot>,
}

impl LotBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: LotId) -> Option<&Lot> {
        self.rows.get(&id)
    }

    pub fn get_mut(&mut self, id: LotId) -> Option<&mut Lot> {
        self.rows.get_mut(&id)
    }

    pub fn put(&mut self, lot: Lot) {
        self.rows.insert(lot.id, lot);
    }

    pub fn remove(&mut self, id: LotId) -> Option<Lot> {
        self.rows.remove(&id)
    }

    /// Lots of a variant carrying at least the required enchantments,
    /// price ascending, ties broken by ascending lot id.
    pub fn matching(&self, variant: &ItemVariant, required: &[Enchantment]) -> Vec<Lot> {
        let mut found: Vec<Lot> = self
            .rows
            .values()
            .filter(|lot| &lot.variant == variant && lot.carries_all(required))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.price.cmp(&b.price).then(a.id.cmp(&b.id)));
        found
    }

    /// All lots owned by a seller, sorted by lot id.
    pub fn for_seller(&self, seller: PlayerId) -> Vec<Lot> {
        let mut found: Vec<Lot> = self
            .rows
            .values()
            .filter(|lot| lot.seller == seller)
            .cloned()
            .collect();
        found.sort_by_key(|lot| lot.id);
        found
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
