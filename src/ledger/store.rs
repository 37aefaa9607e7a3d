/*!
 * Quota reservation ledger operations.
 *
 * High-level API over the ledger tables. Admission control lives here:
 * the balance read, the pending-hold sum, and the reservation insert run
 * in one transaction serialized on the connection mutex, so concurrent
 * reservations can never oversubscribe a shop's balance.
 */

use chrono::{DateTime, SecondsFormat, Utc};
use log::{debug, info};
use rusqlite::{OptionalExtension, params};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::errors::QuotaError;

use super::db::LedgerDb;
use super::models::{
    ConfirmOutcome, CreditReservation, ReservationStatus, UsageMetadata, UsageRecord,
};

/// Quota ledger over a SQLite store
#[derive(Clone)]
pub struct LedgerStore {
    /// Underlying connection
    db: LedgerDb,
    /// Pending-hold lifetime in seconds
    ttl_secs: i64,
}

impl LedgerStore {
    /// Create a store over an open ledger database
    pub fn new(db: LedgerDb, reservation_ttl_secs: u64) -> Self {
        Self {
            db,
            ttl_secs: reservation_ttl_secs as i64,
        }
    }

    /// Create a store over an in-memory ledger (for testing)
    pub fn new_in_memory(reservation_ttl_secs: u64) -> Result<Self, QuotaError> {
        Ok(Self::new(LedgerDb::new_in_memory()?, reservation_ttl_secs))
    }

    /// Set a shop's spendable balance, creating the row if needed
    pub async fn set_balance(&self, shop_id: &str, credits: i64) -> Result<(), QuotaError> {
        let shop_id = shop_id.to_string();
        let now = timestamp(Utc::now());

        self.db
            .execute_async(move |conn| {
                conn.execute(
                    r#"
                    INSERT INTO balances (shop_id, credits, updated_at)
                    VALUES (?1, ?2, ?3)
                    ON CONFLICT(shop_id) DO UPDATE SET
                        credits = excluded.credits,
                        updated_at = excluded.updated_at
                    "#,
                    params![shop_id, credits, now],
                )?;
                Ok(())
            })
            .await
    }

    /// A shop's raw balance, ignoring pending holds
    pub async fn balance(&self, shop_id: &str) -> Result<i64, QuotaError> {
        let shop_id = shop_id.to_string();

        self.db
            .execute_async(move |conn| {
                conn.query_row(
                    "SELECT credits FROM balances WHERE shop_id = ?1",
                    [&shop_id],
                    |row| row.get(0),
                )
                .optional()?
                .ok_or(QuotaError::UnknownShop(shop_id))
            })
            .await
    }

    /// Credits still admittable: balance minus live pending holds
    pub async fn available_credits(&self, shop_id: &str) -> Result<i64, QuotaError> {
        let shop_id = shop_id.to_string();
        let now = timestamp(Utc::now());

        self.db
            .execute_async(move |conn| {
                let balance: i64 = conn
                    .query_row(
                        "SELECT credits FROM balances WHERE shop_id = ?1",
                        [&shop_id],
                        |row| row.get(0),
                    )
                    .optional()?
                    .ok_or(QuotaError::UnknownShop(shop_id.clone()))?;

                let pending: i64 = conn.query_row(
                    r#"
                    SELECT COALESCE(SUM(reserved_credits), 0) FROM credit_reservations
                    WHERE shop_id = ?1 AND status = 'pending' AND expires_at > ?2
                    "#,
                    params![shop_id, now],
                    |row| row.get(0),
                )?;

                Ok(balance - pending)
            })
            .await
    }

    /// Place a hold for the estimated cost
    ///
    /// Admits iff `estimated <= balance - SUM(live pending holds)`. The
    /// check and the insert are one transaction, so two concurrent calls
    /// cannot both be admitted against the same headroom.
    pub async fn reserve(
        &self,
        shop_id: &str,
        estimated_credits: i64,
    ) -> Result<CreditReservation, QuotaError> {
        let shop_id = shop_id.to_string();
        let id = Uuid::new_v4().to_string();
        let created_at = Utc::now();
        let expires_at = created_at + chrono::Duration::seconds(self.ttl_secs);
        let now_str = timestamp(created_at);
        let expires_str = timestamp(expires_at);

        let reservation = self
            .db
            .transaction_async(move |tx| {
                let balance: i64 = tx
                    .query_row(
                        "SELECT credits FROM balances WHERE shop_id = ?1",
                        [&shop_id],
                        |row| row.get(0),
                    )
                    .optional()?
                    .ok_or(QuotaError::UnknownShop(shop_id.clone()))?;

                let pending: i64 = tx.query_row(
                    r#"
                    SELECT COALESCE(SUM(reserved_credits), 0) FROM credit_reservations
                    WHERE shop_id = ?1 AND status = 'pending' AND expires_at > ?2
                    "#,
                    params![shop_id, now_str],
                    |row| row.get(0),
                )?;

                let available = balance - pending;
                if estimated_credits > available {
                    return Err(QuotaError::InsufficientCredits {
                        shop_id,
                        requested: estimated_credits,
                        available,
                    });
                }

                tx.execute(
                    r#"
                    INSERT INTO credit_reservations
                        (id, shop_id, reserved_credits, status, created_at, expires_at)
                    VALUES (?1, ?2, ?3, 'pending', ?4, ?5)
                    "#,
                    params![id, shop_id, estimated_credits, now_str, expires_str],
                )?;

                Ok(CreditReservation {
                    id,
                    shop_id,
                    reserved_credits: estimated_credits,
                    status: ReservationStatus::Pending,
                    created_at,
                    expires_at,
                    actual_credits: None,
                })
            })
            .await?;

        debug!(
            "Reserved {} credit(s) for shop {} (reservation {})",
            reservation.reserved_credits, reservation.shop_id, reservation.id
        );

        Ok(reservation)
    }

    /// Confirm a pending reservation with the actual cost
    ///
    /// Deducts `actual_credits` from the balance, drops the hold (any
    /// unused portion is implicitly released), and appends a usage row.
    pub async fn confirm(
        &self,
        reservation_id: &str,
        actual_credits: i64,
        metadata: &UsageMetadata,
        source_content: &str,
    ) -> Result<ConfirmOutcome, QuotaError> {
        let reservation_id = reservation_id.to_string();
        let metadata = metadata.clone();
        let digest = content_digest(source_content);
        let now_str = timestamp(Utc::now());

        let outcome = self
            .db
            .transaction_async(move |tx| {
                let (shop_id, reserved, status): (String, i64, String) = tx
                    .query_row(
                        r#"
                        SELECT shop_id, reserved_credits, status
                        FROM credit_reservations WHERE id = ?1
                        "#,
                        [&reservation_id],
                        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                    )
                    .optional()?
                    .ok_or_else(|| QuotaError::ReservationNotFound(reservation_id.clone()))?;

                if status != ReservationStatus::Pending.to_string() {
                    return Err(QuotaError::AlreadyFinalized {
                        id: reservation_id,
                        status,
                    });
                }

                tx.execute(
                    r#"
                    UPDATE credit_reservations
                    SET status = 'confirmed', actual_credits = ?2
                    WHERE id = ?1
                    "#,
                    params![reservation_id, actual_credits],
                )?;

                tx.execute(
                    "UPDATE balances SET credits = credits - ?2, updated_at = ?3 WHERE shop_id = ?1",
                    params![shop_id, actual_credits, now_str],
                )?;

                let remaining_balance: i64 = tx.query_row(
                    "SELECT credits FROM balances WHERE shop_id = ?1",
                    [&shop_id],
                    |row| row.get(0),
                )?;

                let credits_diff = reserved - actual_credits;
                let diff_percentage = if reserved > 0 {
                    credits_diff as f64 * 100.0 / reserved as f64
                } else {
                    0.0
                };

                tx.execute(
                    r#"
                    INSERT INTO usage_records
                        (shop_id, resource_id, resource_type, source_language, target_language,
                         estimated_credits, credits_used, credits_diff, diff_percentage,
                         usage_date, status, content_digest)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 'confirmed', ?11)
                    "#,
                    params![
                        shop_id,
                        metadata.resource_id,
                        metadata.resource_type,
                        metadata.source_language,
                        metadata.target_language,
                        reserved,
                        actual_credits,
                        credits_diff,
                        diff_percentage,
                        now_str,
                        digest,
                    ],
                )?;

                Ok(ConfirmOutcome {
                    credits_used: actual_credits,
                    released: credits_diff.max(0),
                    remaining_balance,
                })
            })
            .await?;

        debug!(
            "Confirmed reservation: used {} credit(s), released {}",
            outcome.credits_used, outcome.released
        );

        Ok(outcome)
    }

    /// Drop a pending hold without any deduction
    ///
    /// Releasing a reservation that is already terminal (released,
    /// confirmed, or expired) is a no-op: the hold no longer counts
    /// against the balance, so there is nothing left to undo.
    pub async fn release(&self, reservation_id: &str) -> Result<(), QuotaError> {
        let reservation_id = reservation_id.to_string();

        self.db
            .transaction_async(move |tx| {
                let status: String = tx
                    .query_row(
                        "SELECT status FROM credit_reservations WHERE id = ?1",
                        [&reservation_id],
                        |row| row.get(0),
                    )
                    .optional()?
                    .ok_or_else(|| QuotaError::ReservationNotFound(reservation_id.clone()))?;

                if status.parse().unwrap_or(ReservationStatus::Pending)
                    == ReservationStatus::Pending
                {
                    tx.execute(
                        "UPDATE credit_reservations SET status = 'released' WHERE id = ?1",
                        [&reservation_id],
                    )?;
                }
                Ok(())
            })
            .await
    }

    /// Terminate pending holds past their expiry
    ///
    /// Backstop for reservations orphaned by a crash between reserve and
    /// confirm. Returns the number of holds terminated.
    pub async fn cleanup_expired(&self) -> Result<usize, QuotaError> {
        let now = timestamp(Utc::now());

        let terminated = self
            .db
            .execute_async(move |conn| {
                let changed = conn.execute(
                    r#"
                    UPDATE credit_reservations SET status = 'expired'
                    WHERE status = 'pending' AND expires_at <= ?1
                    "#,
                    [&now],
                )?;
                Ok(changed)
            })
            .await?;

        if terminated > 0 {
            info!("Terminated {} expired reservation(s)", terminated);
        }

        Ok(terminated)
    }

    /// Look up a reservation by id
    pub async fn get_reservation(
        &self,
        reservation_id: &str,
    ) -> Result<Option<CreditReservation>, QuotaError> {
        let reservation_id = reservation_id.to_string();

        self.db
            .execute_async(move |conn| {
                let row: Option<(String, String, i64, String, String, String, Option<i64>)> = conn
                    .query_row(
                        r#"
                        SELECT id, shop_id, reserved_credits, status, created_at, expires_at,
                               actual_credits
                        FROM credit_reservations WHERE id = ?1
                        "#,
                        [&reservation_id],
                        |row| {
                            Ok((
                                row.get(0)?,
                                row.get(1)?,
                                row.get(2)?,
                                row.get(3)?,
                                row.get(4)?,
                                row.get(5)?,
                                row.get(6)?,
                            ))
                        },
                    )
                    .optional()?;

                match row {
                    None => Ok(None),
                    Some((id, shop_id, reserved, status, created, expires, actual)) => {
                        Ok(Some(CreditReservation {
                            id,
                            shop_id,
                            reserved_credits: reserved,
                            status: status.parse().map_err(|_| {
                                QuotaError::Datastore(format!("bad reservation status: {}", status))
                            })?,
                            created_at: parse_timestamp(&created)?,
                            expires_at: parse_timestamp(&expires)?,
                            actual_credits: actual,
                        }))
                    }
                }
            })
            .await
    }

    /// Usage audit rows for a shop, newest first
    pub async fn usage_for_shop(&self, shop_id: &str) -> Result<Vec<UsageRecord>, QuotaError> {
        let shop_id = shop_id.to_string();

        self.db
            .execute_async(move |conn| {
                let mut stmt = conn.prepare(
                    r#"
                    SELECT shop_id, resource_id, resource_type, source_language, target_language,
                           estimated_credits, credits_used, credits_diff, diff_percentage,
                           usage_date, status, content_digest
                    FROM usage_records WHERE shop_id = ?1
                    ORDER BY id DESC
                    "#,
                )?;

                let rows = stmt.query_map([&shop_id], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, i64>(5)?,
                        row.get::<_, i64>(6)?,
                        row.get::<_, i64>(7)?,
                        row.get::<_, f64>(8)?,
                        row.get::<_, String>(9)?,
                        row.get::<_, String>(10)?,
                        row.get::<_, String>(11)?,
                    ))
                })?;

                let mut records = Vec::new();
                for row in rows {
                    let (
                        shop_id,
                        resource_id,
                        resource_type,
                        source_language,
                        target_language,
                        estimated_credits,
                        credits_used,
                        credits_diff,
                        diff_percentage,
                        usage_date,
                        status,
                        content_digest,
                    ) = row?;

                    records.push(UsageRecord {
                        shop_id,
                        resource_id,
                        resource_type,
                        source_language,
                        target_language,
                        estimated_credits,
                        credits_used,
                        credits_diff,
                        diff_percentage,
                        usage_date: parse_timestamp(&usage_date)?,
                        status,
                        content_digest,
                    });
                }

                Ok(records)
            })
            .await
    }
}

/// SHA-256 hex digest of source content, for the audit trail
pub fn content_digest(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Fixed-width UTC timestamp so string comparison matches time order
fn timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, QuotaError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| QuotaError::Datastore(format!("bad ledger timestamp {:?}: {}", s, e)))
}
