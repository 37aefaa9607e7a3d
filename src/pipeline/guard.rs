/*!
 * Scoped acquisition of credit reservations.
 *
 * A reservation spans the whole translation of a field. The guard owns
 * the hold and guarantees that every exit path either confirms it or
 * releases it. Abandoning a guard (caller timeout, panic unwinding a
 * task) triggers a logged best-effort release from `Drop`, and the
 * ledger's expiry cleanup remains the final backstop.
 */

use log::warn;
use tokio::runtime::Handle;

use crate::errors::QuotaError;
use crate::ledger::{ConfirmOutcome, CreditReservation, LedgerStore, UsageMetadata};

/// A live hold on a shop's credits
#[must_use = "an unconfirmed guard releases its hold on drop"]
pub struct ReservationGuard {
    store: LedgerStore,
    reservation: CreditReservation,
    finalized: bool,
}

impl ReservationGuard {
    /// Reserve the estimated cost and take ownership of the hold
    pub async fn acquire(
        store: &LedgerStore,
        shop_id: &str,
        estimated_credits: i64,
    ) -> Result<Self, QuotaError> {
        let reservation = store.reserve(shop_id, estimated_credits).await?;
        Ok(Self {
            store: store.clone(),
            reservation,
            finalized: false,
        })
    }

    /// Reservation id of the underlying hold
    pub fn id(&self) -> &str {
        &self.reservation.id
    }

    /// Credits held while this guard is live
    pub fn reserved_credits(&self) -> i64 {
        self.reservation.reserved_credits
    }

    /// Finalize the hold with the actual cost
    pub async fn confirm(
        mut self,
        actual_credits: i64,
        metadata: &UsageMetadata,
        source_content: &str,
    ) -> Result<ConfirmOutcome, QuotaError> {
        let outcome = self
            .store
            .confirm(&self.reservation.id, actual_credits, metadata, source_content)
            .await?;
        self.finalized = true;
        Ok(outcome)
    }

    /// Give the hold back without any deduction
    pub async fn release(mut self) -> Result<(), QuotaError> {
        self.finalized = true;
        self.store.release(&self.reservation.id).await
    }
}

impl Drop for ReservationGuard {
    fn drop(&mut self) {
        if self.finalized {
            return;
        }

        warn!(
            "Reservation {} abandoned without confirm or release, attempting release",
            self.reservation.id
        );

        // Drop cannot await; spawn the release when a runtime is around,
        // otherwise expiry cleanup will terminate the hold.
        if let Ok(handle) = Handle::try_current() {
            let store = self.store.clone();
            let id = self.reservation.id.clone();
            handle.spawn(async move {
                if let Err(e) = store.release(&id).await {
                    warn!("Best-effort release of reservation {} failed: {}", id, e);
                }
            });
        }
    }
}
