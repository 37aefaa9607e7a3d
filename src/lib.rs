/*!
 * # shopglot - Content-safe translation pipeline for store content
 *
 * A Rust library for translating structured store content (product
 * fields, theme settings, configuration blocks) into target languages
 * while preserving embedded markup and template syntax, respecting a
 * per-shop credit quota, and guarding against degenerate
 * machine-translation output.
 *
 * ## Features
 *
 * - Pattern- and schema-based field eligibility filtering
 * - Masking of scripts, styles, comments, and media tags before
 *   translation, with byte-exact restoration
 * - Deterministic boundary-safe chunking of oversized text
 * - Strategy selection with per-chunk bounded retries and
 *   placeholder-corruption fallback
 * - Quality and completeness validation of translated output
 * - SQLite-backed quota reservation ledger with atomic admission
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `eligibility`: Field eligibility filter and schema catalog
 * - `protection`: Markup masking and restoration
 * - `chunker`: Boundary-safe text segmentation
 * - `strategy`: Prompt building and strategy execution:
 *   - `strategy::prompts`: Prompt templates per strategy
 *   - `strategy::executor`: Retry loop around the provider
 * - `quality`: Quality and completeness validation
 * - `ledger`: Quota reservation ledger:
 *   - `ledger::db`: SQLite connection wrapper
 *   - `ledger::store`: Reserve, confirm, release, cleanup
 * - `pipeline`: Per-field orchestration and the reservation guard
 * - `providers`: Translation provider trait, HTTP and mock clients
 * - `reporting`: Incident sink for audit
 * - `locales`: ISO language code utilities
 * - `errors`: Custom error types for the pipeline
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod chunker;
pub mod eligibility;
pub mod errors;
pub mod ledger;
pub mod locales;
pub mod pipeline;
pub mod protection;
pub mod providers;
pub mod quality;
pub mod reporting;
pub mod request;
pub mod strategy;

// Re-export main types for easier usage
pub use app_config::Config;
pub use eligibility::{EligibilityFilter, EligibilityVerdict, SkipReason};
pub use errors::{AppError, ProviderError, QuotaError};
pub use ledger::{LedgerDb, LedgerStore};
pub use pipeline::{FieldTranslation, TranslationPipeline};
pub use protection::{MarkupProtector, MaskedText};
pub use providers::TranslationProvider;
pub use quality::{QualityValidator, QualityVerdict};
pub use reporting::{Incident, IncidentCategory, IncidentReporter};
pub use request::{ResourceContext, TranslationRequest};
