// ============================================================================
// Interfaces Module
// Contains all trait definitions and contracts
// ============================================================================

mod economy;
mod event_handler;
mod journal;

pub use economy::{EconomyService, InMemoryEconomy};
pub use event_handler::{EventHandler, LoggingEventHandler, MarketEvent, NoOpEventHandler};
pub use journal::{JournalEntry, MarketJournal, NoOpJournal, StoreError};
