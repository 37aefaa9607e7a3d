/*!
 * Pipeline orchestration.
 *
 * The orchestrator drives one field through the full stage machine; the
 * reservation guard guarantees that quota holds never leak across any
 * exit path.
 */

pub mod guard;
pub mod orchestrator;

// Re-export main types
pub use guard::ReservationGuard;
pub use orchestrator::{FieldTranslation, PipelineStage, TranslationPipeline};
