// ============================================================================
// Market Journal Interface
// Durability seam: every mutation is journaled as one batch before it is
// applied to in-memory state
// ============================================================================

use thiserror::Error;

use crate::domain::{ConfirmAction, Listing, ListingId, Lot, LotId, PlayerId, TradeRecord};

/// Opaque persistence failure. The engine logs the detail and reports a bare
/// `StoreFailure` to the actor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct StoreError(pub String);

/// One durable state change. `ListingPut`/`LotPut` carry the full row as it
/// will exist after the mutation, so replaying a journal is a sequence of
/// upserts and deletes.
#[derive(Debug, Clone, PartialEq)]
pub enum JournalEntry {
    ListingPut(Listing),
    ListingRemoved(ListingId),
    LotPut(Lot),
    LotRemoved(LotId),
    TradeAppended(TradeRecord),
    FlagSet {
        player: PlayerId,
        action: ConfirmAction,
        value: bool,
    },
    FreezeSet(bool),
}

/// Persistence backend for marketplace state.
///
/// `record` receives the complete batch for one mutation before any of it is
/// applied in memory; an `Err` aborts the mutation with no partial effect.
/// `ping` is a no-op keep-alive issued on a fixed interval to prevent
/// idle-connection drops (see `utils::keepalive`).
pub trait MarketJournal: Send + Sync {
    fn record(&self, batch: &[JournalEntry]) -> Result<(), StoreError>;

    fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Journal that durably stores nothing. Default for embedders that treat the
/// in-memory state as authoritative.
pub struct NoOpJournal;

impl MarketJournal for NoOpJournal {
    fn record(&self, _batch: &[JournalEntry]) -> Result<(), StoreError> {
        Ok(())
    }
}
