//! Quality gate for generated replies: scorer, deterministic reranker and
//! the bounded self-correction loop.

pub mod correction;
pub mod reranker;
pub mod scorer;

pub use correction::{
    compare_results, AttemptRecord, CorrectionConfig, CorrectionOutcome, CorrectionRequest,
    CorrectionResult, CorrectionState, SelfCorrectionLoop,
};
pub use reranker::{check_tone_markers, ToneReranker};
pub use scorer::{
    compare_reports, Dimension, DimensionWeights, PartialCredit, ResponseQualityScorer,
    ScoreReport, ScoringConfig,
};

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::tone::{Level, Pace, StyleDirectives};

    /// Scores 100 on every dimension under [`supportive`] directives.
    pub const SUPPORTIVE_REPLY: &str = "I totally hear you, and what you're feeling makes \
        complete sense because applying to 12 schools while keeping up with classes is a lot for \
        anyone to carry at once. You've got real strengths here, so let's take this one step at a \
        time and pick the first two essays together this week.";

    pub fn supportive() -> StyleDirectives {
        StyleDirectives {
            warmth: Level::High,
            firmness: Level::Low,
            pace: Pace::Slow,
            empathy: Level::High,
            cheer: Level::Medium,
            intensity: Level::Low,
        }
    }
}
