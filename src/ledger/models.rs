/*!
 * Ledger entity models.
 *
 * These structures map directly to ledger tables and provide type-safe
 * access to persisted quota state.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reservation lifecycle status
///
/// Transitions are monotonic: Pending may become Confirmed, Released, or
/// Expired; terminal states never change again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    /// Hold is active and counted against the shop's available credits
    Pending,
    /// Actual usage was deducted and the hold dropped
    Confirmed,
    /// Hold was given back without any deduction
    Released,
    /// Hold aged out and was terminated by cleanup
    Expired,
}

impl ReservationStatus {
    /// Whether this status can still transition
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ReservationStatus::Pending)
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReservationStatus::Pending => write!(f, "pending"),
            ReservationStatus::Confirmed => write!(f, "confirmed"),
            ReservationStatus::Released => write!(f, "released"),
            ReservationStatus::Expired => write!(f, "expired"),
        }
    }
}

impl std::str::FromStr for ReservationStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(ReservationStatus::Pending),
            "confirmed" => Ok(ReservationStatus::Confirmed),
            "released" => Ok(ReservationStatus::Released),
            "expired" => Ok(ReservationStatus::Expired),
            _ => Err(anyhow::anyhow!("Invalid reservation status: {}", s)),
        }
    }
}

/// A credit hold against a shop balance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditReservation {
    /// Unique reservation id
    pub id: String,
    /// Shop whose balance this hold counts against
    pub shop_id: String,
    /// Credits held while the reservation is pending
    pub reserved_credits: i64,
    /// Lifecycle status
    pub status: ReservationStatus,
    /// When the hold was created
    pub created_at: DateTime<Utc>,
    /// When cleanup may terminate the hold
    pub expires_at: DateTime<Utc>,
    /// Credits actually deducted, set on confirmation
    pub actual_credits: Option<i64>,
}

/// Descriptive fields recorded alongside confirmed usage
#[derive(Debug, Clone, Default)]
pub struct UsageMetadata {
    /// Store resource the translation belongs to
    pub resource_id: String,
    /// Resource kind, e.g. "product" or "theme_section"
    pub resource_type: String,
    /// Source content language
    pub source_language: String,
    /// Target content language
    pub target_language: String,
}

/// One append-only usage audit row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageRecord {
    /// Shop the usage was billed to
    pub shop_id: String,
    /// Store resource the translation belongs to
    pub resource_id: String,
    /// Resource kind
    pub resource_type: String,
    /// Source content language
    pub source_language: String,
    /// Target content language
    pub target_language: String,
    /// Credits held at reservation time
    pub estimated_credits: i64,
    /// Credits actually deducted
    pub credits_used: i64,
    /// Estimated minus used
    pub credits_diff: i64,
    /// Diff relative to the estimate, in percent
    pub diff_percentage: f64,
    /// When the usage was confirmed
    pub usage_date: DateTime<Utc>,
    /// Terminal reservation status this row records
    pub status: String,
    /// SHA-256 digest of the source content
    pub content_digest: String,
}

/// Result of confirming a reservation
#[derive(Debug, Clone)]
pub struct ConfirmOutcome {
    /// Credits deducted from the shop balance
    pub credits_used: i64,
    /// Unused portion of the hold given back
    pub released: i64,
    /// Shop balance after the deduction
    pub remaining_balance: i64,
}
