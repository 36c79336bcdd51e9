// ============================================================================
// Engine Module
// Contains the core marketplace business logic
// ============================================================================

mod confirm;
mod marketplace;
mod sweep;

pub use confirm::ConfirmOutcome;
pub use marketplace::{CancelAmount, Marketplace, SellOutcome};
pub use sweep::{plan_sweep, BuyOutcome, QuoteOutcome, SweepPlan, SweepTake};
