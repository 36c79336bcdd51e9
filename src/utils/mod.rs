// ============================================================================
// Utilities Module
// Operational helpers outside the core contract
// ============================================================================

pub mod keepalive;

pub use keepalive::{spawn_keepalive, KeepAlive};
