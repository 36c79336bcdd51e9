// ============================================================================
// Event Handler Interface
// Notification events emitted after a mutation's critical section exits
// ============================================================================

use rust_decimal::Decimal;

use crate::domain::{ItemVariant, Lot, LotId, PlayerId};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Events emitted by the marketplace for the caller to render and deliver.
///
/// Events are collected inside the mutation's critical section and handed to
/// the `EventHandler` only after the lock is released, so a slow handler can
/// never block or fail a settlement.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MarketEvent {
    /// A seller's stock (or part of it) was bought
    SoldToBuyer {
        seller: PlayerId,
        buyer: PlayerId,
        variant: ItemVariant,
        quantity: u32,
        total: Decimal,
    },

    /// A seller's enchanted lot was bought
    LotSoldToBuyer {
        seller: PlayerId,
        buyer: PlayerId,
        lot: Lot,
        total: Decimal,
    },

    /// A new lot was posted
    LotListed { seller: PlayerId, lot_id: LotId },

    /// The global freeze flag flipped
    FreezeToggled { frozen: bool },
}

/// Event handler trait for marketplace notifications.
/// Implementations can handle chat delivery, logging, metrics, etc.
pub trait EventHandler: Send + Sync {
    /// Handle a marketplace event
    fn on_event(&self, event: MarketEvent);

    /// Batch event handler (optional optimization)
    fn on_events(&self, events: Vec<MarketEvent>) {
        for event in events {
            self.on_event(event);
        }
    }
}

/// No-op event handler for testing
pub struct NoOpEventHandler;

impl EventHandler for NoOpEventHandler {
    fn on_event(&self, _event: MarketEvent) {
        // Do nothing
    }
}

/// Logging event handler
pub struct LoggingEventHandler;

impl EventHandler for LoggingEventHandler {
    fn on_event(&self, event: MarketEvent) {
        tracing::debug!("marketplace event: {:?}", event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_handler() {
        let handler = NoOpEventHandler;
        handler.on_event(MarketEvent::FreezeToggled { frozen: true });
        // Should not panic
    }

    #[test]
    fn test_batch_dispatch() {
        let handler = NoOpEventHandler;
        handler.on_events(vec![
            MarketEvent::FreezeToggled { frozen: true },
            MarketEvent::FreezeToggled { frozen: false },
        ]);
    }
}
