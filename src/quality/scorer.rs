//! Response quality scoring: detect the delivered style of a candidate
//! reply and compare it with the expected directives.
//!
//! Seven dimensions are scored 0–100 and combined into a weighted mean:
//!
//! | dimension   | detector                               | default weight |
//! |-------------|----------------------------------------|----------------|
//! | warmth      | warm-phrase hits (≥3 high, ≥1 medium)  | 1.5            |
//! | empathy     | mirroring hits (≥2 high, 1 medium)     | 1.5            |
//! | firmness    | anchor hits (≥2 high, 1 medium)        | 1.0            |
//! | cheer       | encouragement hits (≥2 high, 1 medium) | 1.0            |
//! | pace        | mean words per sentence                | 0.8            |
//! | specificity | digits or concrete markers             | 1.2            |
//! | signature   | rubric phrases + variations            | 1.3            |

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;
use crate::tone::rubric;
use crate::tone::{Level, Pace, StyleDirectives};

pub const DEFAULT_PASSING_THRESHOLD: f64 = 70.0;
pub const DEFAULT_RECOMMENDATION_CUTOFF: f64 = 80.0;

/// Mean sentence length above which pace reads as slow.
pub const SLOW_PACE_WORDS: f64 = 15.0;
/// Mean sentence length at or below which pace reads as fast.
pub const FAST_PACE_WORDS: f64 = 4.0;

pub const SPECIFICITY_HIGH_SCORE: f64 = 100.0;
pub const SPECIFICITY_LOW_SCORE: f64 = 40.0;

// ---------------------------------------------------------------------------
// Dimensions
// ---------------------------------------------------------------------------

/// Scored dimensions, in report and recommendation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Warmth,
    Empathy,
    Firmness,
    Cheer,
    Pace,
    Specificity,
    Signature,
}

impl Dimension {
    pub const ALL: [Dimension; 7] = [
        Self::Warmth,
        Self::Empathy,
        Self::Firmness,
        Self::Cheer,
        Self::Pace,
        Self::Specificity,
        Self::Signature,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Warmth => "warmth",
            Self::Empathy => "empathy",
            Self::Firmness => "firmness",
            Self::Cheer => "cheer",
            Self::Pace => "pace",
            Self::Specificity => "specificity",
            Self::Signature => "signature",
        }
    }

    /// Improvement hint emitted when this dimension scores below the cutoff.
    pub fn recommendation(self) -> &'static str {
        match self {
            Self::Warmth => "Increase warmth (add validation phrases, warm openings)",
            Self::Empathy => "Increase empathy (add reflective listening, emotion mirroring)",
            Self::Firmness => "Adjust firmness (add boundaries or soften directness)",
            Self::Cheer => "Adjust motivational energy",
            Self::Pace => "Adjust pacing (sentence length and rhythm)",
            Self::Specificity => "Add specificity (examples, numbers, concrete details)",
            Self::Signature => "Use more signature coaching patterns from the tone rubric",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Per-dimension weights of the overall score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DimensionWeights {
    pub warmth: f64,
    pub empathy: f64,
    pub firmness: f64,
    pub cheer: f64,
    pub pace: f64,
    pub specificity: f64,
    pub signature: f64,
}

impl Default for DimensionWeights {
    fn default() -> Self {
        Self {
            warmth: 1.5,
            empathy: 1.5,
            firmness: 1.0,
            cheer: 1.0,
            pace: 0.8,
            specificity: 1.2,
            signature: 1.3,
        }
    }
}

impl DimensionWeights {
    pub fn weight(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::Warmth => self.warmth,
            Dimension::Empathy => self.empathy,
            Dimension::Firmness => self.firmness,
            Dimension::Cheer => self.cheer,
            Dimension::Pace => self.pace,
            Dimension::Specificity => self.specificity,
            Dimension::Signature => self.signature,
        }
    }

    pub fn total(&self) -> f64 {
        Dimension::ALL.iter().map(|d| self.weight(*d)).sum()
    }
}

/// Credit for a categorical detection by bucket distance from the target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartialCredit {
    pub exact: f64,
    pub one_off: f64,
    pub two_off: f64,
    pub pace_opposite: f64,
    pub unknown: f64,
}

impl Default for PartialCredit {
    fn default() -> Self {
        Self {
            exact: 100.0,
            one_off: 60.0,
            two_off: 20.0,
            pace_opposite: 30.0,
            unknown: 0.0,
        }
    }
}

impl PartialCredit {
    /// Credit for the distance between two bucket ranks.
    pub fn credit(&self, expected_rank: u8, detected_rank: u8, is_pace: bool) -> f64 {
        match expected_rank.abs_diff(detected_rank) {
            0 => self.exact,
            1 => self.one_off,
            2 if is_pace => self.pace_opposite,
            2 => self.two_off,
            _ => self.unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub passing_threshold: f64,
    pub recommendation_cutoff: f64,
    pub weights: DimensionWeights,
    pub partial_credit: PartialCredit,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            passing_threshold: DEFAULT_PASSING_THRESHOLD,
            recommendation_cutoff: DEFAULT_RECOMMENDATION_CUTOFF,
            weights: DimensionWeights::default(),
            partial_credit: PartialCredit::default(),
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let invalid = |message: String| Err(ValidationError::InvalidConfig { message });
        for (name, value) in [
            ("passing_threshold", self.passing_threshold),
            ("recommendation_cutoff", self.recommendation_cutoff),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return invalid(format!("scoring.{name} must be within 0..=100, got {value}"));
            }
        }
        for dimension in Dimension::ALL {
            let weight = self.weights.weight(dimension);
            if !weight.is_finite() || weight < 0.0 {
                return invalid(format!(
                    "scoring weight for {dimension} must be >= 0, got {weight}"
                ));
            }
        }
        if self.weights.total() <= 0.0 {
            return invalid("scoring weights must have a positive sum".to_string());
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionScore {
    pub dimension: Dimension,
    pub expected: String,
    pub detected: String,
    pub score: f64,
    #[serde(default)]
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    pub scores: Vec<DimensionScore>,
    pub overall: f64,
    pub passing_threshold: f64,
    pub is_passing: bool,
    pub recommendations: Vec<String>,
    /// Dimensions that scored below the recommendation cutoff.
    pub failing_dimensions: Vec<Dimension>,
}

impl ScoreReport {
    pub fn score_for(&self, dimension: Dimension) -> Option<&DimensionScore> {
        self.scores.iter().find(|s| s.dimension == dimension)
    }

    pub fn summary(&self) -> String {
        let mut lines = vec![format!(
            "Quality score: {:.1}/100 ({})",
            self.overall,
            if self.is_passing { "PASS" } else { "FAIL" }
        )];
        for score in &self.scores {
            lines.push(format!(
                "  {}: {:.0} (expected {}, detected {})",
                score.dimension, score.score, score.expected, score.detected
            ));
        }
        if !self.recommendations.is_empty() {
            lines.push("  Recommendations:".to_string());
            for rec in &self.recommendations {
                lines.push(format!("    - {rec}"));
            }
        }
        lines.join("\n")
    }
}

/// Per-dimension movement between two reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComparison {
    pub improved: Vec<String>,
    pub regressed: Vec<String>,
    pub unchanged: Vec<String>,
    pub overall_change: f64,
}

/// Changes within this band count as unchanged.
pub const COMPARISON_BAND: f64 = 5.0;

pub fn compare_reports(before: &ScoreReport, after: &ScoreReport) -> ScoreComparison {
    let mut comparison = ScoreComparison {
        improved: Vec::new(),
        regressed: Vec::new(),
        unchanged: Vec::new(),
        overall_change: after.overall - before.overall,
    };
    for old in &before.scores {
        let Some(new) = after.score_for(old.dimension) else {
            continue;
        };
        let change = new.score - old.score;
        if change > COMPARISON_BAND {
            comparison.improved.push(format!("{} (+{:.0})", old.dimension, change));
        } else if change < -COMPARISON_BAND {
            comparison.regressed.push(format!("{} ({:.0})", old.dimension, change));
        } else {
            comparison.unchanged.push(old.dimension.to_string());
        }
    }
    comparison
}

// ---------------------------------------------------------------------------
// Detectors
// ---------------------------------------------------------------------------

fn compile_all(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(&format!("(?i){p}")).unwrap())
        .collect()
}

static WARMTH_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile_all(&[
        r"i totally hear you",
        r"totally hear you",
        r"i get why that feels",
        r"this is super normal",
        r"you're not alone",
        r"that makes (complete )?sense",
        r"and here's the good part",
        r"i'm with you",
        r"what you're feeling",
        r"i'm here",
        r"i get (it|that|why)",
    ])
});

static EMPATHY_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile_all(&[
        r"sounds like",
        r"so what i'm hearing is",
        r"it seems like",
        r"i hear",
        r"what you're saying",
        r"makes sense that",
        r"what you're feeling",
        r"i get why",
        r"i see why",
        r"completely valid",
        r"makes (complete )?sense",
    ])
});

static FIRMNESS_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile_all(&[
        r"here's the part that matters",
        r"let's make sure",
        r"the move now is",
        r"here's what i'd do",
        r"non-negotiable",
        r"reality check",
        r"let's be honest",
        r"here's what we can't ignore",
    ])
});

static CHEER_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile_all(&[
        r"this is actually good news",
        r"you're more capable than you think",
        r"we've totally got this",
        r"this is fixable",
        r"you've got real strengths",
        r"this is solid",
        r"you're doing the right work",
    ])
});

static SIGNATURE_VARIATIONS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile_all(&[
        r"here's the part that matters",
        r"let's break this down",
        r"step by step",
        r"we've got this",
        r"totally got this",
        r"this is (actually |really )?good news",
        r"you're on the right track",
        r"this is solid",
        r"let's take this one",
        r"one step at a time",
        r"this is fixable",
        r"you've got (this|real strengths)",
        r"let's work (on|through|this)",
        r"sounds like you're",
        r"(let's|we'll) (work|tackle|handle) (this|it) together",
    ])
});

static RUBRIC_PHRASES: Lazy<Vec<String>> = Lazy::new(|| rubric::lowercase_phrases().collect());

static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());
static CONCRETE_MARKERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(example|specifically|for instance|here's how|step \d)").unwrap()
});
static SENTENCE_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]+").unwrap());

fn hits(patterns: &[Regex], text: &str) -> usize {
    patterns.iter().filter(|p| p.is_match(text)).count()
}

fn level_from_hits(count: usize, high_at: usize) -> Level {
    if count >= high_at {
        Level::High
    } else if count >= 1 {
        Level::Medium
    } else {
        Level::Low
    }
}

pub fn detect_warmth(text: &str) -> Level {
    level_from_hits(hits(&WARMTH_PATTERNS, text), 3)
}

pub fn detect_empathy(text: &str) -> Level {
    level_from_hits(hits(&EMPATHY_PATTERNS, text), 2)
}

pub fn detect_firmness(text: &str) -> Level {
    level_from_hits(hits(&FIRMNESS_PATTERNS, text), 2)
}

pub fn detect_cheer(text: &str) -> Level {
    level_from_hits(hits(&CHEER_PATTERNS, text), 2)
}

/// Mean words per sentence, or `None` for text with no sentences.
pub fn mean_sentence_length(text: &str) -> Option<f64> {
    let sentences: Vec<&str> = SENTENCE_SPLIT
        .split(text)
        .filter(|s| !s.trim().is_empty())
        .collect();
    if sentences.is_empty() {
        return None;
    }
    let words: usize = sentences.iter().map(|s| s.split_whitespace().count()).sum();
    Some(words as f64 / sentences.len() as f64)
}

pub fn detect_pace(text: &str) -> Pace {
    match mean_sentence_length(text) {
        Some(mean) if mean > SLOW_PACE_WORDS => Pace::Slow,
        Some(mean) if mean <= FAST_PACE_WORDS => Pace::Fast,
        _ => Pace::Normal,
    }
}

/// High when the text carries digits or concrete-detail markers.
pub fn detect_specificity(text: &str) -> Level {
    if DIGITS.is_match(text) || CONCRETE_MARKERS.is_match(text) {
        Level::High
    } else {
        Level::Low
    }
}

/// Count of rubric phrases and signature variations present in the text.
pub fn count_signature_patterns(text: &str) -> usize {
    let lower = text.to_lowercase();
    let phrases = RUBRIC_PHRASES
        .iter()
        .filter(|p| lower.contains(p.as_str()))
        .count();
    phrases + hits(&SIGNATURE_VARIATIONS, &lower)
}

pub fn signature_score(count: usize) -> f64 {
    match count {
        0 => 20.0,
        1 => 60.0,
        2 => 85.0,
        _ => 100.0,
    }
}

// ---------------------------------------------------------------------------
// Scorer
// ---------------------------------------------------------------------------

/// Scores candidate text against style directives. Stateless apart from
/// its configuration.
#[derive(Debug, Clone, Default)]
pub struct ResponseQualityScorer {
    config: ScoringConfig,
}

impl ResponseQualityScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    fn categorical(
        &self,
        dimension: Dimension,
        expected: Level,
        detected: Level,
    ) -> DimensionScore {
        let score = self
            .config
            .partial_credit
            .credit(expected.rank(), detected.rank(), false);
        DimensionScore {
            dimension,
            expected: expected.to_string(),
            detected: detected.to_string(),
            score,
            notes: mismatch_note(expected.as_str(), detected.as_str()),
        }
    }

    pub fn score(&self, text: &str, directives: &StyleDirectives) -> ScoreReport {
        let detected_pace = detect_pace(text);
        let specificity = detect_specificity(text);
        let signature_count = count_signature_patterns(text);

        let mut scores = vec![
            self.categorical(Dimension::Warmth, directives.warmth, detect_warmth(text)),
            self.categorical(Dimension::Empathy, directives.empathy, detect_empathy(text)),
            self.categorical(Dimension::Firmness, directives.firmness, detect_firmness(text)),
            self.categorical(Dimension::Cheer, directives.cheer, detect_cheer(text)),
        ];
        scores.push(DimensionScore {
            dimension: Dimension::Pace,
            expected: directives.pace.to_string(),
            detected: detected_pace.to_string(),
            score: self.config.partial_credit.credit(
                directives.pace.rank(),
                detected_pace.rank(),
                true,
            ),
            notes: mismatch_note(directives.pace.as_str(), detected_pace.as_str()),
        });
        let specificity_score = if specificity == Level::High {
            SPECIFICITY_HIGH_SCORE
        } else {
            SPECIFICITY_LOW_SCORE
        };
        scores.push(DimensionScore {
            dimension: Dimension::Specificity,
            expected: Level::High.to_string(),
            detected: specificity.to_string(),
            score: specificity_score,
            notes: if specificity == Level::High {
                Vec::new()
            } else {
                vec!["Add more concrete examples or specific details".to_string()]
            },
        });
        let signature = signature_score(signature_count);
        scores.push(DimensionScore {
            dimension: Dimension::Signature,
            expected: ">=3".to_string(),
            detected: signature_count.to_string(),
            score: signature,
            notes: if signature < 100.0 {
                vec![format!("Found {signature_count} signature patterns, expected at least 3")]
            } else {
                Vec::new()
            },
        });

        let weights = &self.config.weights;
        let total_weight = weights.total();
        let overall = if total_weight > 0.0 {
            let weighted: f64 = scores
                .iter()
                .map(|s| s.score * weights.weight(s.dimension))
                .sum();
            (weighted / total_weight).clamp(0.0, 100.0)
        } else {
            0.0
        };
        let is_passing = overall >= self.config.passing_threshold;

        let failing_dimensions: Vec<Dimension> = scores
            .iter()
            .filter(|s| s.score < self.config.recommendation_cutoff)
            .map(|s| s.dimension)
            .collect();
        let recommendations = failing_dimensions
            .iter()
            .map(|d| d.recommendation().to_string())
            .collect();

        log::debug!(
            "[QualityScorer] {} chars scored {:.1}/100 ({})",
            text.len(),
            overall,
            if is_passing { "pass" } else { "fail" }
        );

        ScoreReport {
            scores,
            overall,
            passing_threshold: self.config.passing_threshold,
            is_passing,
            recommendations,
            failing_dimensions,
        }
    }
}

fn mismatch_note(expected: &str, detected: &str) -> Vec<String> {
    if expected == detected {
        Vec::new()
    } else {
        vec![format!("Expected {expected}, got {detected}")]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::fixtures::{supportive, SUPPORTIVE_REPLY};

    #[test]
    fn test_detectors_on_supportive_reply() {
        assert_eq!(detect_warmth(SUPPORTIVE_REPLY), Level::High);
        assert_eq!(detect_empathy(SUPPORTIVE_REPLY), Level::High);
        assert_eq!(detect_firmness(SUPPORTIVE_REPLY), Level::Low);
        assert_eq!(detect_cheer(SUPPORTIVE_REPLY), Level::Medium);
        assert_eq!(detect_pace(SUPPORTIVE_REPLY), Pace::Slow);
        assert_eq!(detect_specificity(SUPPORTIVE_REPLY), Level::High);
        assert_eq!(count_signature_patterns(SUPPORTIVE_REPLY), 3);
    }

    #[test]
    fn test_perfect_match_scores_100() {
        let report = ResponseQualityScorer::default().score(SUPPORTIVE_REPLY, &supportive());
        assert!((report.overall - 100.0).abs() < 1e-9);
        assert!(report.is_passing);
        assert!(report.recommendations.is_empty());
        assert!(report.failing_dimensions.is_empty());
    }

    #[test]
    fn test_flat_reply_fails_with_ordered_recommendations() {
        let report = ResponseQualityScorer::default().score("Here is your plan.", &supportive());
        assert!(!report.is_passing);
        assert_eq!(
            report.failing_dimensions,
            vec![
                Dimension::Warmth,
                Dimension::Empathy,
                Dimension::Cheer,
                Dimension::Pace,
                Dimension::Specificity,
                Dimension::Signature,
            ]
        );
        assert_eq!(report.recommendations.len(), 6);
        assert!(report.recommendations[0].starts_with("Increase warmth"));
        // Pace: expected slow, detected fast.
        assert_eq!(report.score_for(Dimension::Pace).unwrap().score, 30.0);
        assert_eq!(report.score_for(Dimension::Warmth).unwrap().score, 20.0);
        assert_eq!(report.score_for(Dimension::Firmness).unwrap().score, 100.0);
    }

    #[test]
    fn test_partial_credit_table() {
        let credit = PartialCredit::default();
        assert_eq!(credit.credit(1, 1, false), 100.0);
        assert_eq!(credit.credit(0, 1, false), 60.0);
        assert_eq!(credit.credit(0, 2, false), 20.0);
        assert_eq!(credit.credit(0, 1, true), 60.0);
        assert_eq!(credit.credit(2, 0, true), 30.0);
        assert_eq!(credit.credit(0, 7, false), 0.0);
    }

    #[test]
    fn test_pace_detector_edges() {
        assert_eq!(detect_pace(""), Pace::Normal);
        assert_eq!(detect_pace("...!!"), Pace::Normal);
        assert_eq!(detect_pace("Go now. Do it."), Pace::Fast);
        assert_eq!(
            detect_pace("We can start with the essay outline and then review your list."),
            Pace::Normal
        );
        assert_eq!(mean_sentence_length("One two. Three four five six."), Some(3.0));
    }

    #[test]
    fn test_signature_score_steps() {
        assert_eq!(signature_score(0), 20.0);
        assert_eq!(signature_score(1), 60.0);
        assert_eq!(signature_score(2), 85.0);
        assert_eq!(signature_score(9), 100.0);
    }

    #[test]
    fn test_custom_weights_change_overall() {
        let only_specificity = ScoringConfig {
            weights: DimensionWeights {
                warmth: 0.0,
                empathy: 0.0,
                firmness: 0.0,
                cheer: 0.0,
                pace: 0.0,
                specificity: 1.0,
                signature: 0.0,
            },
            ..ScoringConfig::default()
        };
        let report = ResponseQualityScorer::new(only_specificity)
            .score("Take 2 practice tests.", &supportive());
        assert_eq!(report.overall, 100.0);
    }

    #[test]
    fn test_validate_config() {
        assert!(ScoringConfig::default().validate().is_ok());
        let mut bad = ScoringConfig::default();
        bad.weights.cheer = -1.0;
        assert!(bad.validate().is_err());
        let mut zero = ScoringConfig::default();
        zero.weights = DimensionWeights {
            warmth: 0.0,
            empathy: 0.0,
            firmness: 0.0,
            cheer: 0.0,
            pace: 0.0,
            specificity: 0.0,
            signature: 0.0,
        };
        assert!(zero.validate().is_err());
        let threshold = ScoringConfig {
            passing_threshold: 120.0,
            ..ScoringConfig::default()
        };
        assert!(threshold.validate().is_err());
    }

    #[test]
    fn test_compare_reports() {
        let scorer = ResponseQualityScorer::default();
        let before = scorer.score("Here is your plan.", &supportive());
        let after = scorer.score(SUPPORTIVE_REPLY, &supportive());
        let comparison = compare_reports(&before, &after);
        assert!(comparison.overall_change > 0.0);
        assert!(comparison.improved.iter().any(|s| s.starts_with("warmth")));
        assert!(comparison.regressed.is_empty());
        assert_eq!(comparison.unchanged, vec!["firmness".to_string()]);
        assert!(after.summary().contains("PASS"));
    }
}
