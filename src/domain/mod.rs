// ============================================================================
// Domain Models Module
// Contains all core domain entities and value objects
// ============================================================================

pub mod flags;
pub mod listing;
pub mod lot;
pub mod pending;
pub mod trade;

pub use flags::{ConfirmAction, PlayerFlags};
pub use listing::{ItemVariant, Listing, ListingBook, ListingId, PlayerId};
pub use lot::{Enchantment, Lot, LotBook, LotId};
pub use pending::{PendingBook, PendingOrder, StagedOrder, PENDING_ORDER_TTL};
pub use trade::{TradeLedger, TradeRecord, TradeRole, TradeView};
