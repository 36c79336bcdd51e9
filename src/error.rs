// ============================================================================
// Marketplace Errors
// Typed failure taxonomy returned to the command layer
// ============================================================================

use thiserror::Error;

/// Errors surfaced by marketplace operations.
///
/// The engine never formats user-facing text; callers translate these into
/// chat messages. `StoreFailure` is deliberately opaque — the underlying
/// detail is logged, not carried to the actor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarketError {
    /// The referenced listing or lot does not exist
    #[error("listing not found")]
    NotFound,

    /// Cancel requested but the seller has nothing listed
    #[error("no stock to cancel")]
    NoStock,

    /// Lot price changed between staging and confirmation
    #[error("lot price changed since it was quoted")]
    PriceChanged,

    /// Lot vanished between staging and confirmation
    #[error("lot no longer exists")]
    ListingGone,

    /// The global freeze is active; all mutations are rejected
    #[error("market is frozen")]
    MarketFrozen,

    /// Buyer cannot afford even one unit of the cheapest candidate
    #[error("insufficient funds")]
    InsufficientFunds,

    /// `/confirm` with nothing staged
    #[error("no pending order to confirm")]
    NoPendingOrder,

    /// `/confirm` after the staged order's TTL elapsed
    #[error("pending order expired")]
    PendingOrderExpired,

    /// Price must be strictly positive
    #[error("price must be positive")]
    InvalidPrice,

    /// Quantity must be strictly positive
    #[error("quantity must be positive")]
    InvalidQuantity,

    /// Persistence layer failure; the mutation left no partial effect
    #[error("storage failure")]
    StoreFailure,
}

/// Result type alias for marketplace operations
pub type MarketResult<T> = Result<T, MarketError>;
