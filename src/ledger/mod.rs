/*!
 * Quota reservation ledger.
 *
 * SQLite-backed persistence for:
 * - Per-shop credit balances
 * - Pending reservation holds with expiry
 * - Append-only usage audit records
 */

// Allow dead code - ledger types are for library consumers
#![allow(dead_code)]

pub mod db;
pub mod models;
pub mod schema;
pub mod store;

// Re-export main types
pub use db::LedgerDb;
pub use models::{
    ConfirmOutcome, CreditReservation, ReservationStatus, UsageMetadata, UsageRecord,
};
pub use store::{LedgerStore, content_digest};
