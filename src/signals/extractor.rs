//! Signal extraction: utterance → bounded deltas, pattern tags, categories.
//!
//! Two interchangeable strategies sit behind [`SignalExtractor`]:
//!
//! ```text
//! KeywordSignalExtractor  ── pure, deterministic phrase scan
//! HybridSignalExtractor   ── keyword pass ─► optional refiner (categories only)
//!                                         └► on error/timeout: keyword result
//! ```
//!
//! Within one utterance each dimension is set at most once (first match),
//! so repeating a phrase never accumulates.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::categories::{classify_keywords, EqSignal};
use crate::collaborators::{bounded, SignalRefiner};
use crate::errors::ValidationError;

/// Largest magnitude a single delta component may carry.
pub const MAX_DELTA: i8 = 5;

/// Behavioral pattern tags accumulated into the session's emotional state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternTag {
    EmpowermentLanguageEmerging,
    ExcitementAboutPossibilities,
    TakingOwnership,
    MicroWinCelebration,
    SeekingPermission,
    ParentalPressureExpressed,
    AvoidanceOfDifficultTopics,
    AnalysisParalysis,
}

impl PatternTag {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EmpowermentLanguageEmerging => "empowerment_language_emerging",
            Self::ExcitementAboutPossibilities => "excitement_about_possibilities",
            Self::TakingOwnership => "taking_ownership",
            Self::MicroWinCelebration => "micro_win_celebration",
            Self::SeekingPermission => "seeking_permission",
            Self::ParentalPressureExpressed => "parental_pressure_expressed",
            Self::AvoidanceOfDifficultTopics => "avoidance_of_difficult_topics",
            Self::AnalysisParalysis => "analysis_paralysis",
        }
    }
}

/// One turn's worth of detected change. Ephemeral.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalDelta {
    pub frustration: i8,
    pub confidence: i8,
    pub overwhelm: i8,
    pub motivation: i8,
    pub agency: i8,
    /// Behavioral tags (set semantics).
    #[serde(default)]
    pub patterns: BTreeSet<PatternTag>,
    /// Detected categories, deduplicated, in enumeration order.
    #[serde(default)]
    pub categories: Vec<EqSignal>,
}

impl SignalDelta {
    /// A delta that changes nothing.
    pub fn neutral() -> Self {
        Self::default()
    }

    /// Named numeric components, in state field order.
    pub fn components(&self) -> [(&'static str, i8); 5] {
        [
            ("frustration", self.frustration),
            ("confidence", self.confidence),
            ("overwhelm", self.overwhelm),
            ("motivation", self.motivation),
            ("agency", self.agency),
        ]
    }

    /// Reject any component outside `[-MAX_DELTA, MAX_DELTA]`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in self.components() {
            if !(-MAX_DELTA..=MAX_DELTA).contains(&value) {
                return Err(ValidationError::DeltaOutOfRange { field, value });
            }
        }
        Ok(())
    }

    pub fn is_neutral(&self) -> bool {
        self.components().iter().all(|(_, v)| *v == 0)
            && self.patterns.is_empty()
            && self.categories.is_empty()
    }

    /// Union extra categories into this delta, keeping enumeration order.
    pub fn merge_categories(&mut self, extra: &[EqSignal]) {
        let merged: BTreeSet<EqSignal> = self
            .categories
            .iter()
            .chain(extra.iter())
            .copied()
            .collect();
        self.categories = merged.into_iter().collect();
    }
}

/// Which strategy produced a delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
    Keyword,
    Hybrid,
}

/// Contract shared by both extraction strategies.
#[async_trait]
pub trait SignalExtractor: Send + Sync {
    /// Produce the delta for one utterance. Never fails: collaborator
    /// problems degrade to the keyword result.
    async fn extract(&self, utterance: &str) -> SignalDelta;

    fn strategy(&self) -> ExtractionStrategy;
}

// ---------------------------------------------------------------------------
// Keyword strategy
// ---------------------------------------------------------------------------

const FRUSTRATION_PHRASES: &[&str] = &["frustrated", "annoyed", "irritated", "confused"];
const CONFIDENCE_UP_PHRASES: &[&str] = &["i can", "i will", "i'm going to", "i got this"];
const CONFIDENCE_DOWN_PHRASES: &[&str] = &[
    "i can't",
    "i cannot",
    "i can not",
    "i won't",
    "i don't think i can",
    "what if i fail",
];
const OVERWHELM_PHRASES: &[&str] = &["overwhelmed", "too much", "can't keep up", "drowning"];
const MOTIVATION_UP_PHRASES: &[&str] = &["excited", "can't wait", "looking forward", "pumped"];
const MOTIVATION_DOWN_PHRASES: &[&str] = &[
    "don't care",
    "whatever",
    "not sure why",
    "not excited",
    "not looking forward",
];
const AGENCY_UP_PHRASES: &[&str] = &["i signed up", "i did", "i completed", "i decided"];
const AGENCY_DOWN_PHRASES: &[&str] = &[
    "should i",
    "is it okay",
    "my parents want",
    "they said",
    "i didn't",
    "i did not",
    "i haven't",
    "i never",
];
const PARENTAL_PHRASES: &[&str] = &["my parents", "my mom", "my dad", "they want me to"];
const AVOIDANCE_PHRASES: &[&str] = &["let's talk about something else", "anyway", "maybe later"];
const PARALYSIS_PHRASES: &[&str] = &["can't decide", "overthinking", "going back and forth"];

/// Whole-phrase alternation: `i did` must not fire inside `i didn't`.
fn phrase_set(phrases: &[&str]) -> Regex {
    let alternation = phrases
        .iter()
        .map(|p| regex::escape(p))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"\b(?:{alternation})\b")).expect("escaped phrase list must compile")
}

static FRUSTRATION_RE: Lazy<Regex> = Lazy::new(|| phrase_set(FRUSTRATION_PHRASES));
static CONFIDENCE_UP_RE: Lazy<Regex> = Lazy::new(|| phrase_set(CONFIDENCE_UP_PHRASES));
static CONFIDENCE_DOWN_RE: Lazy<Regex> = Lazy::new(|| phrase_set(CONFIDENCE_DOWN_PHRASES));
static OVERWHELM_RE: Lazy<Regex> = Lazy::new(|| phrase_set(OVERWHELM_PHRASES));
static MOTIVATION_UP_RE: Lazy<Regex> = Lazy::new(|| phrase_set(MOTIVATION_UP_PHRASES));
static MOTIVATION_DOWN_RE: Lazy<Regex> = Lazy::new(|| phrase_set(MOTIVATION_DOWN_PHRASES));
static AGENCY_UP_RE: Lazy<Regex> = Lazy::new(|| phrase_set(AGENCY_UP_PHRASES));
static AGENCY_DOWN_RE: Lazy<Regex> = Lazy::new(|| phrase_set(AGENCY_DOWN_PHRASES));
static PARENTAL_RE: Lazy<Regex> = Lazy::new(|| phrase_set(PARENTAL_PHRASES));
static AVOIDANCE_RE: Lazy<Regex> = Lazy::new(|| phrase_set(AVOIDANCE_PHRASES));
static PARALYSIS_RE: Lazy<Regex> = Lazy::new(|| phrase_set(PARALYSIS_PHRASES));

pub const FRUSTRATION_DELTA: i8 = 1;
pub const CONFIDENCE_UP_DELTA: i8 = 1;
pub const CONFIDENCE_DOWN_DELTA: i8 = -1;
pub const OVERWHELM_DELTA: i8 = 2;
pub const MOTIVATION_UP_DELTA: i8 = 1;
pub const MOTIVATION_DOWN_DELTA: i8 = -1;
pub const AGENCY_UP_DELTA: i8 = 2;
pub const AGENCY_DOWN_DELTA: i8 = -1;

/// Pure keyword scan. Deterministic: identical input yields identical output.
pub fn extract_keyword_signals(utterance: &str) -> SignalDelta {
    let lower = utterance.to_lowercase().replace('\u{2019}', "'");
    let mut delta = SignalDelta::neutral();

    if FRUSTRATION_RE.is_match(&lower) {
        delta.frustration = FRUSTRATION_DELTA;
    }

    // "i can't" still reads as "i can" at a word boundary; the negative wins.
    if CONFIDENCE_DOWN_RE.is_match(&lower) {
        delta.confidence = CONFIDENCE_DOWN_DELTA;
    } else if CONFIDENCE_UP_RE.is_match(&lower) {
        delta.confidence = CONFIDENCE_UP_DELTA;
        delta.patterns.insert(PatternTag::EmpowermentLanguageEmerging);
    }

    if OVERWHELM_RE.is_match(&lower) {
        delta.overwhelm = OVERWHELM_DELTA;
    }

    if MOTIVATION_DOWN_RE.is_match(&lower) {
        delta.motivation = MOTIVATION_DOWN_DELTA;
    } else if MOTIVATION_UP_RE.is_match(&lower) {
        delta.motivation = MOTIVATION_UP_DELTA;
        delta.patterns.insert(PatternTag::ExcitementAboutPossibilities);
    }

    if AGENCY_DOWN_RE.is_match(&lower) {
        delta.agency = AGENCY_DOWN_DELTA;
        delta.patterns.insert(PatternTag::SeekingPermission);
    } else if AGENCY_UP_RE.is_match(&lower) {
        delta.agency = AGENCY_UP_DELTA;
        delta.patterns.insert(PatternTag::TakingOwnership);
        delta.patterns.insert(PatternTag::MicroWinCelebration);
    }

    if PARENTAL_RE.is_match(&lower) {
        delta.patterns.insert(PatternTag::ParentalPressureExpressed);
    }
    if AVOIDANCE_RE.is_match(&lower) {
        delta.patterns.insert(PatternTag::AvoidanceOfDifficultTopics);
    }
    if PARALYSIS_RE.is_match(&lower) {
        delta.patterns.insert(PatternTag::AnalysisParalysis);
    }

    delta.categories = classify_keywords(&lower);
    delta
}

/// Keyword-only strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordSignalExtractor;

#[async_trait]
impl SignalExtractor for KeywordSignalExtractor {
    async fn extract(&self, utterance: &str) -> SignalDelta {
        extract_keyword_signals(utterance)
    }

    fn strategy(&self) -> ExtractionStrategy {
        ExtractionStrategy::Keyword
    }
}

// ---------------------------------------------------------------------------
// Hybrid strategy
// ---------------------------------------------------------------------------

/// Default deadline for the external refiner.
pub const DEFAULT_REFINER_TIMEOUT: Duration = Duration::from_millis(5_000);

/// Keyword pass followed by an optional external category refiner.
///
/// Without a refiner this behaves exactly like [`KeywordSignalExtractor`].
#[derive(Clone)]
pub struct HybridSignalExtractor {
    refiner: Option<Arc<dyn SignalRefiner>>,
    timeout: Duration,
}

impl std::fmt::Debug for HybridSignalExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HybridSignalExtractor")
            .field("has_refiner", &self.refiner.is_some())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl HybridSignalExtractor {
    pub fn new(refiner: Option<Arc<dyn SignalRefiner>>) -> Self {
        Self {
            refiner,
            timeout: DEFAULT_REFINER_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl SignalExtractor for HybridSignalExtractor {
    async fn extract(&self, utterance: &str) -> SignalDelta {
        let mut delta = extract_keyword_signals(utterance);

        let Some(refiner) = &self.refiner else {
            return delta;
        };

        let refined = bounded(
            "signal refiner",
            self.timeout,
            refiner.refine(utterance, &delta.categories),
        )
        .await;

        match refined {
            Ok(extra) => {
                log::debug!(
                    "[SignalExtractor] refiner returned {} categories for {} preliminary",
                    extra.len(),
                    delta.categories.len()
                );
                delta.merge_categories(&extra);
            }
            Err(failure) => {
                log::warn!("[SignalExtractor] {failure}; using keyword result");
            }
        }
        delta
    }

    fn strategy(&self) -> ExtractionStrategy {
        ExtractionStrategy::Hybrid
    }
}

/// Classify a batch of utterances concurrently with one extractor.
pub async fn extract_batch(
    extractor: &dyn SignalExtractor,
    utterances: &[String],
) -> Vec<SignalDelta> {
    futures::future::join_all(utterances.iter().map(|u| extractor.extract(u))).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CollaboratorFailure;

    struct AddCuriosity;

    #[async_trait]
    impl SignalRefiner for AddCuriosity {
        async fn refine(
            &self,
            _utterance: &str,
            _preliminary: &[EqSignal],
        ) -> Result<Vec<EqSignal>, CollaboratorFailure> {
            Ok(vec![EqSignal::Curiosity, EqSignal::Anxiety])
        }
    }

    struct Broken;

    #[async_trait]
    impl SignalRefiner for Broken {
        async fn refine(
            &self,
            _utterance: &str,
            _preliminary: &[EqSignal],
        ) -> Result<Vec<EqSignal>, CollaboratorFailure> {
            Err(CollaboratorFailure::failed("signal refiner", "boom"))
        }
    }

    struct Sleepy;

    #[async_trait]
    impl SignalRefiner for Sleepy {
        async fn refine(
            &self,
            _utterance: &str,
            _preliminary: &[EqSignal],
        ) -> Result<Vec<EqSignal>, CollaboratorFailure> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(vec![EqSignal::Pride])
        }
    }

    #[test]
    fn test_keyword_extraction_is_deterministic() {
        let text = "I'm frustrated and overwhelmed, my parents want me to apply everywhere";
        assert_eq!(extract_keyword_signals(text), extract_keyword_signals(text));
    }

    #[test]
    fn test_first_match_per_dimension_no_accumulation() {
        let delta = extract_keyword_signals("frustrated frustrated FRUSTRATED and annoyed");
        assert_eq!(delta.frustration, FRUSTRATION_DELTA);
    }

    #[test]
    fn test_negative_confidence_wins_over_substring() {
        let delta = extract_keyword_signals("I can't do calculus");
        assert_eq!(delta.confidence, CONFIDENCE_DOWN_DELTA);
        assert!(!delta
            .patterns
            .contains(&PatternTag::EmpowermentLanguageEmerging));
    }

    #[test]
    fn test_negated_phrases_do_not_read_as_positive() {
        let delta = extract_keyword_signals("I didn't do anything this summer");
        assert_eq!(delta.agency, AGENCY_DOWN_DELTA);
        assert!(!delta.patterns.contains(&PatternTag::TakingOwnership));
        assert!(!delta.patterns.contains(&PatternTag::MicroWinCelebration));

        let delta = extract_keyword_signals("Honestly i cannot see myself at a big school");
        assert_eq!(delta.confidence, CONFIDENCE_DOWN_DELTA);

        let delta = extract_keyword_signals("I'm not excited about any of it");
        assert_eq!(delta.motivation, MOTIVATION_DOWN_DELTA);

        // Curly apostrophes read the same as straight ones.
        let delta = extract_keyword_signals("I didn\u{2019}t apply anywhere yet");
        assert_eq!(delta.agency, AGENCY_DOWN_DELTA);
    }

    #[test]
    fn test_phrases_match_whole_words_only() {
        // "i did" inside "i diddle" and "i can" inside "i candidly" stay silent.
        let delta = extract_keyword_signals("I diddled around; I candidly admit it");
        assert_eq!(delta.agency, 0);
        assert_eq!(delta.confidence, 0);

        let delta = extract_keyword_signals("I did the whole application myself");
        assert_eq!(delta.agency, AGENCY_UP_DELTA);
    }

    #[test]
    fn test_agency_and_ownership_patterns() {
        let delta = extract_keyword_signals("I signed up for the robotics club!");
        assert_eq!(delta.agency, AGENCY_UP_DELTA);
        assert!(delta.patterns.contains(&PatternTag::TakingOwnership));
        assert!(delta.patterns.contains(&PatternTag::MicroWinCelebration));
    }

    #[test]
    fn test_permission_seeking() {
        let delta = extract_keyword_signals("Should I drop AP Physics? My parents want me to stay.");
        assert_eq!(delta.agency, AGENCY_DOWN_DELTA);
        assert!(delta.patterns.contains(&PatternTag::SeekingPermission));
        assert!(delta.patterns.contains(&PatternTag::ParentalPressureExpressed));
    }

    #[test]
    fn test_keyword_deltas_always_valid() {
        let delta = extract_keyword_signals(
            "frustrated overwhelmed excited i did it should i i can't whatever",
        );
        assert!(delta.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let delta = SignalDelta {
            overwhelm: 7,
            ..SignalDelta::neutral()
        };
        assert_eq!(
            delta.validate(),
            Err(ValidationError::DeltaOutOfRange {
                field: "overwhelm",
                value: 7
            })
        );
    }

    #[test]
    fn test_neutral_message_is_neutral() {
        assert!(extract_keyword_signals("My GPA is 3.9 unweighted.").is_neutral());
    }

    #[tokio::test]
    async fn test_hybrid_merges_categories_only() {
        let hybrid = HybridSignalExtractor::new(Some(Arc::new(AddCuriosity)));
        let text = "I'm nervous about essays";
        let keyword = extract_keyword_signals(text);
        let delta = hybrid.extract(text).await;

        assert_eq!(delta.categories, vec![EqSignal::Anxiety, EqSignal::Curiosity]);
        assert_eq!(delta.components(), keyword.components());
        assert_eq!(delta.patterns, keyword.patterns);
        assert_eq!(hybrid.strategy(), ExtractionStrategy::Hybrid);
    }

    #[tokio::test]
    async fn test_hybrid_fails_open_on_error() {
        let hybrid = HybridSignalExtractor::new(Some(Arc::new(Broken)));
        let text = "I'm frustrated and nervous";
        assert_eq!(hybrid.extract(text).await, extract_keyword_signals(text));
    }

    #[tokio::test]
    async fn test_hybrid_fails_open_on_timeout() {
        let hybrid = HybridSignalExtractor::new(Some(Arc::new(Sleepy)))
            .with_timeout(Duration::from_millis(20));
        let text = "I won the regional science fair";
        assert_eq!(hybrid.extract(text).await, extract_keyword_signals(text));
    }

    #[tokio::test]
    async fn test_hybrid_without_refiner_equals_keyword() {
        let hybrid = HybridSignalExtractor::new(None);
        let text = "I'm excited and ready";
        assert_eq!(
            hybrid.extract(text).await,
            KeywordSignalExtractor.extract(text).await
        );
    }

    #[tokio::test]
    async fn test_extract_batch_preserves_order() {
        let utterances = vec!["I'm nervous".to_string(), "I'm pumped".to_string()];
        let deltas = extract_batch(&KeywordSignalExtractor, &utterances).await;
        assert_eq!(deltas.len(), 2);
        assert_eq!(deltas[0].categories, vec![EqSignal::Anxiety]);
        assert_eq!(deltas[1].categories, vec![EqSignal::Eagerness]);
    }
}
