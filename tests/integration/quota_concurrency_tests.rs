/*!
 * Concurrent quota admission tests
 *
 * The ledger is the only contended state in the pipeline. These tests
 * hammer one shop's balance from many tasks and check the admission
 * invariant: the sum of live holds plus confirmed usage never exceeds
 * the balance, under any interleaving.
 */

use std::sync::Arc;
use tokio_test;

use shopglot::ledger::{LedgerStore, ReservationStatus};
use shopglot::pipeline::{ReservationGuard, TranslationPipeline};
use shopglot::providers::mock::MockProvider;
use shopglot::reporting::CollectingReporter;

use crate::common;

/// Test concurrent reservations never oversubscribe the balance
#[tokio::test]
async fn test_concurrentReserve_manyTasks_shouldNeverOversubscribe() {
    let store = common::ledger_with_balance("shop-1", 500).await;

    let mut handles = Vec::new();
    for _ in 0..50 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store.reserve("shop-1", 40).await.is_ok()
        }));
    }

    let mut admitted = 0;
    for handle in handles {
        if handle.await.unwrap() {
            admitted += 1;
        }
    }

    // 500 / 40 = 12 full holds fit
    assert_eq!(admitted, 12);
    assert_eq!(store.available_credits("shop-1").await.unwrap(), 20);
}

/// Test mixed confirm and release under concurrency keeps the books exact
#[tokio::test]
async fn test_concurrentConfirmAndRelease_shouldKeepBalanceConsistent() {
    let store = common::ledger_with_balance("shop-1", 200).await;

    let mut handles = Vec::new();
    for i in 0..10 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            let guard = match ReservationGuard::acquire(&store, "shop-1", 20).await {
                Ok(guard) => guard,
                Err(_) => return 0i64,
            };
            if i % 2 == 0 {
                let metadata = shopglot::ledger::UsageMetadata {
                    resource_id: format!("res-{}", i),
                    resource_type: "product".to_string(),
                    source_language: "en".to_string(),
                    target_language: "fr".to_string(),
                };
                guard.confirm(5, &metadata, "content").await.unwrap().credits_used
            } else {
                guard.release().await.unwrap();
                0
            }
        }));
    }

    let mut used = 0;
    for handle in handles {
        used += handle.await.unwrap();
    }

    // Five confirms of 5 credits each, five releases of nothing
    assert_eq!(used, 25);
    assert_eq!(store.balance("shop-1").await.unwrap(), 175);
    assert_eq!(store.available_credits("shop-1").await.unwrap(), 175);
}

/// Test abandoned holds are terminated by cleanup, never left pending
#[tokio::test]
async fn test_cleanupExpired_afterAbandonment_shouldTerminateEveryHold() {
    let store = LedgerStore::new_in_memory(0).unwrap();
    store.set_balance("shop-1", 100).await.unwrap();

    let first = store.reserve("shop-1", 30).await.unwrap();
    let second = store.reserve("shop-1", 30).await.unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    let terminated = store.cleanup_expired().await.unwrap();

    assert_eq!(terminated, 2);
    for id in [&first.id, &second.id] {
        let status = store.get_reservation(id).await.unwrap().unwrap().status;
        assert_eq!(status, ReservationStatus::Expired);
    }
    assert_eq!(store.available_credits("shop-1").await.unwrap(), 100);
}

/// Test whole-pipeline concurrency against one shared balance
#[tokio::test]
async fn test_concurrentTranslateField_sharedQuota_shouldStayWithinBalance() {
    let initial_balance = 5i64;
    let ledger = common::ledger_with_balance("shop-1", initial_balance).await;
    let pipeline = Arc::new(TranslationPipeline::new(
        common::test_config(),
        Arc::new(MockProvider::working()),
        ledger.clone(),
        CollectingReporter::shared(),
    ));

    let mut handles = Vec::new();
    for i in 0..20 {
        let pipeline = pipeline.clone();
        handles.push(tokio::spawn(async move {
            let request = common::field_request(
                "shop-1",
                &format!("product.field_{}", i),
                "A short translatable sentence.",
            );
            pipeline.translate_field(&request).await
        }));
    }

    let mut total_used = 0;
    let mut rejected = 0;
    for handle in handles {
        let result = handle.await.unwrap();
        total_used += result.credits_used;
        if result.failure.is_some() {
            rejected += 1;
        }
    }

    assert!(total_used <= initial_balance);
    assert!(rejected > 0);
    let remaining = ledger.balance("shop-1").await.unwrap();
    assert!(remaining >= 0);
    assert_eq!(remaining, initial_balance - total_used);
}

/// Test the full hold lifecycle driven from a synchronous entry point
#[test]
fn test_holdLifecycle_blockingEntry_shouldSettleBalance() {
    let outcome = tokio_test::block_on(async {
        let store = common::ledger_with_balance("shop-1", 50).await;
        let reservation = store.reserve("shop-1", 10).await?;
        let metadata = shopglot::ledger::UsageMetadata {
            resource_id: "res-1".to_string(),
            resource_type: "product".to_string(),
            source_language: "en".to_string(),
            target_language: "fr".to_string(),
        };
        let confirmed = store.confirm(&reservation.id, 7, &metadata, "content").await?;
        let balance = store.balance("shop-1").await?;
        Ok::<_, shopglot::errors::QuotaError>((confirmed, balance))
    });

    let (confirmed, balance) = outcome.unwrap();
    assert_eq!(confirmed.credits_used, 7);
    assert_eq!(confirmed.released, 3);
    assert_eq!(balance, 43);
}
