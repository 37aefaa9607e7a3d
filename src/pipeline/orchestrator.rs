/*!
 * Pipeline orchestration for field translation.
 *
 * Drives one field through the stage machine: eligibility, reservation,
 * protection, chunking, strategy execution, validation, restoration, and
 * confirmation. Faults inside the transform stages degrade to safe
 * defaults; only ledger faults surface as an unrecoverable result for
 * the field. The batch entry point runs many fields concurrently against
 * one shop's quota.
 */

use futures::StreamExt;
use futures::stream;
use log::{debug, info, warn};
use std::fmt;
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::app_config::Config;
use crate::chunker::Chunker;
use crate::eligibility::{EligibilityFilter, SkipReason};
use crate::eligibility::schema::SchemaCatalog;
use crate::errors::QuotaError;
use crate::ledger::{LedgerStore, UsageMetadata};
use crate::locales;
use crate::protection::{MarkupProtector, MaskedText};
use crate::providers::TranslationProvider;
use crate::quality::{QualityRecord, QualityValidator, QualityVerdict};
use crate::reporting::{Incident, IncidentCategory, IncidentReporter};
use crate::request::TranslationRequest;
use crate::strategy::{ExecutionOutcome, ExecutorConfig, FallbackKind, StrategyExecutor};

use super::guard::ReservationGuard;

/// Stage of the per-field state machine, used in logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    /// Eligibility evaluation
    Filtering,
    /// Quota hold acquisition
    Reserving,
    /// Markup masking
    Protecting,
    /// Boundary-safe segmentation
    Chunking,
    /// Provider calls
    Translating,
    /// Quality assessment
    Validating,
    /// Token restoration
    Restoring,
    /// Ledger confirmation
    Confirming,
    /// Terminal success
    Done,
    /// Terminal failure
    Failed,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineStage::Filtering => write!(f, "filtering"),
            PipelineStage::Reserving => write!(f, "reserving"),
            PipelineStage::Protecting => write!(f, "protecting"),
            PipelineStage::Chunking => write!(f, "chunking"),
            PipelineStage::Translating => write!(f, "translating"),
            PipelineStage::Validating => write!(f, "validating"),
            PipelineStage::Restoring => write!(f, "restoring"),
            PipelineStage::Confirming => write!(f, "confirming"),
            PipelineStage::Done => write!(f, "done"),
            PipelineStage::Failed => write!(f, "failed"),
        }
    }
}

/// Caller-visible result of translating one field
#[derive(Debug, Clone)]
pub struct FieldTranslation {
    /// Whether the field reached a usable result
    pub success: bool,
    /// Final text: translated, or the original on skip and degraded paths
    pub text: String,
    /// Whether `text` is the untranslated source
    pub is_original: bool,
    /// Fallback taken during execution, if any
    pub fallback: FallbackKind,
    /// Why the field was skipped, when it was
    pub skip_reason: Option<SkipReason>,
    /// Issues flagged by the validator
    pub quality_issues: Vec<QualityRecord>,
    /// Credits actually deducted for this field
    pub credits_used: i64,
    /// Machine-readable failure reason for unrecoverable results
    pub failure: Option<String>,
}

impl FieldTranslation {
    fn skipped(text: String, reason: Option<SkipReason>) -> Self {
        Self {
            success: true,
            text,
            is_original: true,
            fallback: FallbackKind::None,
            skip_reason: reason,
            quality_issues: Vec::new(),
            credits_used: 0,
            failure: None,
        }
    }

    fn failed(text: String, failure: String) -> Self {
        Self {
            success: false,
            text,
            is_original: true,
            fallback: FallbackKind::None,
            skip_reason: None,
            quality_issues: Vec::new(),
            credits_used: 0,
            failure: Some(failure),
        }
    }
}

/// Orchestrates the full per-field translation pipeline
pub struct TranslationPipeline {
    config: Config,
    filter: EligibilityFilter,
    chunker: Chunker,
    validator: QualityValidator,
    executor: StrategyExecutor,
    ledger: LedgerStore,
    reporter: Arc<dyn IncidentReporter>,
}

impl TranslationPipeline {
    /// Build a pipeline over a provider, a quota ledger, and a reporter
    pub fn new(
        config: Config,
        provider: Arc<dyn TranslationProvider>,
        ledger: LedgerStore,
        reporter: Arc<dyn IncidentReporter>,
    ) -> Self {
        let mut filter = EligibilityFilter::new(
            config.brand_words.clone(),
            config.limits.max_batch_fields,
        );
        if let Some(path) = &config.schema_catalog_path {
            if let Some(catalog) = SchemaCatalog::global(path) {
                filter = filter.with_catalog(Arc::new(catalog.clone()));
            }
        }

        let executor = StrategyExecutor::new(
            provider,
            ExecutorConfig {
                retry_count: config.limits.retry_count,
                retry_backoff_ms: config.limits.retry_backoff_ms,
            },
            config.brand_words.clone(),
        );

        Self {
            filter,
            chunker: Chunker::new(config.limits.max_chunk_chars),
            validator: QualityValidator::new(config.quality.clone()),
            executor,
            ledger,
            reporter,
            config,
        }
    }

    /// Translate a single field end to end
    ///
    /// Never returns an error: quota exhaustion and datastore faults come
    /// back as a failed `FieldTranslation` carrying the original text.
    pub async fn translate_field(&self, request: &TranslationRequest) -> FieldTranslation {
        let field = &request.field_path;

        debug!("[{}] {}", PipelineStage::Filtering, field);
        if locales::locales_match(&request.source_locale, &request.target_locale) {
            debug!(
                "[{}] {} skipped: {} -> {} is the same language",
                PipelineStage::Done,
                field,
                request.source_locale,
                request.target_locale
            );
            return FieldTranslation::skipped(
                request.source_text.clone(),
                Some(SkipReason::SameLocale),
            );
        }
        let value = serde_json::Value::String(request.source_text.clone());
        let verdict = self
            .filter
            .evaluate(request.field_key(), &value, &request.resource_context);
        if !verdict.should_translate {
            debug!(
                "[{}] {} skipped: {}",
                PipelineStage::Done,
                field,
                verdict
                    .reason
                    .map(|r| r.to_string())
                    .unwrap_or_else(|| "unknown".to_string())
            );
            return FieldTranslation::skipped(request.source_text.clone(), verdict.reason);
        }

        debug!("[{}] {}", PipelineStage::Reserving, field);
        let estimated = self.config.credits.estimate(&request.source_text);
        let guard = match ReservationGuard::acquire(&self.ledger, &request.shop_id, estimated).await
        {
            Ok(guard) => guard,
            Err(e) => return self.quota_failure(request, e),
        };

        debug!("[{}] {}", PipelineStage::Protecting, field);
        let masked = MarkupProtector::protect(&request.source_text);

        debug!("[{}] {}", PipelineStage::Chunking, field);
        let chunks = self.chunker.chunk(&masked.text);

        debug!(
            "[{}] {} ({} chunk(s))",
            PipelineStage::Translating,
            field,
            chunks.len()
        );
        let mut outcome = self
            .executor
            .execute(
                &request.source_text,
                &chunks,
                &masked.token_map,
                &request.source_locale,
                &request.target_locale,
                &request.resource_context,
            )
            .await;

        debug!("[{}] {}", PipelineStage::Restoring, field);
        let mut restored = MarkupProtector::restore(&outcome.text, &masked.token_map);

        debug!("[{}] {}", PipelineStage::Validating, field);
        let mut quality = self.assess(request, &outcome, &restored);

        // At most one validator-driven retry, and only when execution
        // itself went cleanly
        if quality.should_retry()
            && outcome.fallback == FallbackKind::None
            && outcome.attempts.iter().all(|a| a.success)
        {
            debug!("[{}] {} retrying after quality verdict", PipelineStage::Translating, field);
            let retry = self
                .executor
                .execute(
                    &request.source_text,
                    &chunks,
                    &masked.token_map,
                    &request.source_locale,
                    &request.target_locale,
                    &request.resource_context,
                )
                .await;
            let retry_restored = MarkupProtector::restore(&retry.text, &masked.token_map);
            let retry_quality = self.assess(request, &retry, &retry_restored);

            if retry_quality.is_valid {
                outcome = retry;
                restored = retry_restored;
                quality = retry_quality;
            }
        }

        self.report_execution(request, &outcome, &quality, &masked);

        // A field whose every provider call failed costs nothing
        if outcome.attempts.iter().all(|a| !a.success) {
            debug!("[{}] {} releasing hold, no usable attempt", PipelineStage::Failed, field);
            if let Err(e) = guard.release().await {
                warn!("Failed to release reservation for {}: {}", field, e);
            }
            return FieldTranslation {
                success: true,
                text: request.source_text.clone(),
                is_original: true,
                fallback: outcome.fallback,
                skip_reason: None,
                quality_issues: quality.records,
                credits_used: 0,
                failure: None,
            };
        }

        debug!("[{}] {}", PipelineStage::Confirming, field);
        let actual = self.config.credits.estimate(&restored);
        let metadata = UsageMetadata {
            resource_id: request
                .resource_context
                .resource_id
                .clone()
                .unwrap_or_else(|| request.field_path.clone()),
            resource_type: request
                .resource_context
                .resource_type
                .clone()
                .unwrap_or_else(|| "field".to_string()),
            source_language: request.source_locale.clone(),
            target_language: request.target_locale.clone(),
        };
        let credits_used = match guard.confirm(actual, &metadata, &request.source_text).await {
            Ok(confirmed) => confirmed.credits_used,
            Err(e) => return self.quota_failure(request, e),
        };

        info!(
            "[{}] {} ({} credit(s), fallback={})",
            PipelineStage::Done,
            field,
            credits_used,
            outcome.fallback
        );

        FieldTranslation {
            success: true,
            text: restored,
            is_original: outcome.is_original,
            fallback: outcome.fallback,
            skip_reason: None,
            quality_issues: quality.records,
            credits_used,
            failure: None,
        }
    }

    /// Translate many fields of one shop with bounded concurrency
    ///
    /// Results come back in request order. Quota admission is evaluated
    /// per request, so a batch can be partially admitted when the balance
    /// runs out mid-flight.
    pub async fn translate_fields(
        &self,
        requests: Vec<TranslationRequest>,
    ) -> Vec<FieldTranslation> {
        let concurrency = self.config.limits.concurrent_requests.max(1);
        let semaphore = Arc::new(Semaphore::new(concurrency));

        let mut indexed: Vec<(usize, FieldTranslation)> = stream::iter(
            requests.into_iter().enumerate(),
        )
        .map(|(index, request)| {
            let semaphore = semaphore.clone();
            async move {
                // Closed only on semaphore drop, which cannot happen here
                let _permit = semaphore.acquire_owned().await;
                let result = self.translate_field(&request).await;
                (index, result)
            }
        })
        .buffer_unordered(concurrency)
        .collect()
        .await;

        indexed.sort_by_key(|(index, _)| *index);
        indexed.into_iter().map(|(_, result)| result).collect()
    }

    /// Quality scoring, suppressed for placeholder fallbacks
    fn assess(
        &self,
        request: &TranslationRequest,
        outcome: &ExecutionOutcome,
        restored: &str,
    ) -> QualityVerdict {
        if outcome.fallback == FallbackKind::PlaceholderError {
            return QualityVerdict::valid();
        }
        self.validator
            .assess(&request.source_text, restored, &request.target_locale)
    }

    fn report_execution(
        &self,
        request: &TranslationRequest,
        outcome: &ExecutionOutcome,
        quality: &QualityVerdict,
        masked: &MaskedText,
    ) {
        if outcome.fallback == FallbackKind::PlaceholderError {
            self.reporter.report(Incident::new(
                IncidentCategory::Provider,
                "placeholder_corruption",
                format!(
                    "provider echoed protected tokens ({} masked span(s)), original text returned",
                    masked.token_map.len()
                ),
                request.field_path.clone(),
            ));
        }

        if outcome.attempts.iter().all(|a| !a.success) {
            self.reporter.report(Incident::new(
                IncidentCategory::Provider,
                "provider_failure",
                "all provider attempts failed, original text returned",
                request.field_path.clone(),
            ));
        }

        for record in &quality.records {
            self.reporter.report(Incident::new(
                record.category,
                record.code,
                record.message.clone(),
                request.field_path.clone(),
            ));
        }
    }

    fn quota_failure(&self, request: &TranslationRequest, error: QuotaError) -> FieldTranslation {
        let code = match &error {
            QuotaError::InsufficientCredits { .. } => "insufficient_credits",
            QuotaError::UnknownShop(_) => "unknown_shop",
            QuotaError::ReservationNotFound(_) => "reservation_not_found",
            QuotaError::AlreadyFinalized { .. } => "reservation_finalized",
            QuotaError::Datastore(_) => "ledger_unavailable",
        };

        warn!(
            "[{}] {}: {}",
            PipelineStage::Failed,
            request.field_path,
            error
        );
        self.reporter.report(Incident::new(
            IncidentCategory::Quota,
            code,
            error.to_string(),
            request.field_path.clone(),
        ));

        FieldTranslation::failed(request.source_text.clone(), code.to_string())
    }
}
