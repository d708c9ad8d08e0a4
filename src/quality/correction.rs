//! Self-correction loop: a bounded score → rewrite → rerank → rescore
//! controller.
//!
//! ```text
//!            ┌──────── passing ────────► Accepted (0 attempts, text unchanged)
//! Scoring ───┤
//!            └─ failing ─► Rewriting ─► Rescoring ─┬─ passing ─► Accepted
//!                              ▲                   │
//!                              └─── attempts left ─┤
//!                                                  └─ exhausted ─► Escalated
//! ```
//!
//! The loop is a pure function of `(text, directives)` plus the rewrite
//! collaborator: it never touches session state, so abandoning it mid-retry
//! leaks nothing.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::reranker::ToneReranker;
use super::scorer::{Dimension, ResponseQualityScorer, ScoreReport};
use crate::collaborators::{bounded, Rewriter};
use crate::errors::{CollaboratorFailure, ValidationError};
use crate::tone::StyleDirectives;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_MIN_SCORE: f64 = 70.0;
pub const DEFAULT_REWRITE_TIMEOUT_MS: u64 = 15_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrectionConfig {
    pub max_attempts: u32,
    pub min_score: f64,
    pub rewrite_timeout_ms: u64,
    pub skip_reranking: bool,
}

impl Default for CorrectionConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            min_score: DEFAULT_MIN_SCORE,
            rewrite_timeout_ms: DEFAULT_REWRITE_TIMEOUT_MS,
            skip_reranking: false,
        }
    }
}

impl CorrectionConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_attempts == 0 {
            return Err(ValidationError::InvalidConfig {
                message: "correction.max_attempts must be at least 1".to_string(),
            });
        }
        if !(0.0..=100.0).contains(&self.min_score) {
            return Err(ValidationError::InvalidConfig {
                message: format!(
                    "correction.min_score must be within 0..=100, got {}",
                    self.min_score
                ),
            });
        }
        Ok(())
    }

    pub fn rewrite_timeout(&self) -> Duration {
        Duration::from_millis(self.rewrite_timeout_ms)
    }
}

/// Controller states, recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionState {
    Scoring,
    Rewriting,
    Rescoring,
    Accepted,
    Escalated,
}

/// Terminal outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionOutcome {
    Accepted,
    /// Could not pass within the attempt budget. Must be surfaced to the
    /// host, never served silently as a success.
    Escalated,
}

impl fmt::Display for CorrectionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accepted => f.write_str("accepted"),
            Self::Escalated => f.write_str("escalated"),
        }
    }
}

/// What the rewrite collaborator is asked to fix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionRequest {
    pub attempt: u32,
    pub original_text: String,
    pub directives: StyleDirectives,
    pub current_score: f64,
    pub failing_dimensions: Vec<Dimension>,
    pub recommendations: Vec<String>,
    /// Detected value per failing dimension, for prompt rendering.
    pub detected: Vec<(Dimension, String)>,
    pub min_score: f64,
}

impl CorrectionRequest {
    fn build(
        attempt: u32,
        text: &str,
        directives: &StyleDirectives,
        report: &ScoreReport,
        min_score: f64,
    ) -> Self {
        Self {
            attempt,
            original_text: text.to_string(),
            directives: *directives,
            current_score: report.overall,
            failing_dimensions: report.failing_dimensions.clone(),
            recommendations: report.recommendations.clone(),
            detected: report
                .scores
                .iter()
                .filter(|s| report.failing_dimensions.contains(&s.dimension))
                .map(|s| (s.dimension, s.detected.clone()))
                .collect(),
            min_score,
        }
    }

    /// System and user prompt pair for chat-completion rewriters.
    pub fn to_prompt(&self) -> (String, String) {
        let system = "You are the tone-correction layer of a supportive admissions coach.\n\
            Fix emotional tone drift while keeping meaning unchanged.\n\n\
            Rules:\n\
            1. Preserve all factual meaning and advice.\n\
            2. Match the requested style directives exactly.\n\
            3. Add warmth, empathy, cheer, pacing or firmness where missing.\n\
            4. Remove stiffness, robotic rhythm and generic assistant phrasing.\n\
            5. Do not add content that was not in the original.\n\n\
            Return only the corrected message."
            .to_string();

        let mut user = format!(
            "Original response needing correction:\n---\n{}\n---\n\nStyle directives:\n",
            self.original_text
        );
        for (name, value) in self.directives.fields() {
            user.push_str(&format!("- {name}: {value}\n"));
        }
        if !self.detected.is_empty() {
            user.push_str("\nCurrently detected:\n");
            for (dimension, detected) in &self.detected {
                user.push_str(&format!("- {dimension}: {detected}\n"));
            }
        }
        user.push_str(&format!(
            "\nOverall score: {:.1}/100 (needs to be >= {:.0})\n\nIssues to fix:\n",
            self.current_score, self.min_score
        ));
        for (i, rec) in self.recommendations.iter().enumerate() {
            user.push_str(&format!("{}. {}\n", i + 1, rec));
        }
        user.push_str(
            "\nKeep the same core message and advice; adjust only the emotional delivery.",
        );
        (system, user)
    }
}

/// One rewrite attempt in the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub attempt: u32,
    pub states: Vec<CorrectionState>,
    pub score_before: f64,
    pub score_after: f64,
    /// `None` when the rewrite succeeded.
    pub rewrite_failure: Option<String>,
    pub reranked: bool,
    pub candidate: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionResult {
    pub final_text: String,
    pub attempts: u32,
    pub initial_score: ScoreReport,
    pub final_score: ScoreReport,
    pub fixed: bool,
    pub outcome: CorrectionOutcome,
    pub notes: Vec<String>,
    pub audit: Vec<AttemptRecord>,
}

impl CorrectionResult {
    pub fn is_escalated(&self) -> bool {
        self.outcome == CorrectionOutcome::Escalated
    }

    pub fn summary(&self) -> String {
        let pass = |r: &ScoreReport| if r.is_passing { "PASS" } else { "FAIL" };
        let mut lines = vec![
            "=== Self-correction summary ===".to_string(),
            format!(
                "Initial score: {:.1}/100 ({})",
                self.initial_score.overall,
                pass(&self.initial_score)
            ),
            format!(
                "Final score: {:.1}/100 ({})",
                self.final_score.overall,
                pass(&self.final_score)
            ),
            format!("Attempts: {}", self.attempts),
            format!("Outcome: {}", self.outcome),
            format!("Fixed: {}", if self.fixed { "yes" } else { "no" }),
            String::new(),
            "Audit trail:".to_string(),
        ];
        lines.extend(self.notes.iter().map(|n| format!("  {n}")));
        lines.join("\n")
    }
}

/// Which of two results is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preferred {
    First,
    Second,
    Tie,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultComparison {
    pub better: Preferred,
    pub score_difference: f64,
    pub attempt_difference: i64,
}

/// Score differences within this band fall back to comparing attempts.
pub const RESULT_COMPARISON_BAND: f64 = 5.0;

pub fn compare_results(first: &CorrectionResult, second: &CorrectionResult) -> ResultComparison {
    let score_difference = first.final_score.overall - second.final_score.overall;
    let attempt_difference = i64::from(first.attempts) - i64::from(second.attempts);
    let better = if score_difference > RESULT_COMPARISON_BAND {
        Preferred::First
    } else if score_difference < -RESULT_COMPARISON_BAND {
        Preferred::Second
    } else if attempt_difference < 0 {
        Preferred::First
    } else if attempt_difference > 0 {
        Preferred::Second
    } else {
        Preferred::Tie
    };
    ResultComparison {
        better,
        score_difference,
        attempt_difference,
    }
}

/// The bounded retry controller.
#[derive(Clone)]
pub struct SelfCorrectionLoop {
    scorer: ResponseQualityScorer,
    reranker: ToneReranker,
    rewriter: Option<Arc<dyn Rewriter>>,
    config: CorrectionConfig,
}

impl fmt::Debug for SelfCorrectionLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelfCorrectionLoop")
            .field("config", &self.config)
            .field("has_rewriter", &self.rewriter.is_some())
            .finish()
    }
}

impl SelfCorrectionLoop {
    pub fn new(
        scorer: ResponseQualityScorer,
        rewriter: Option<Arc<dyn Rewriter>>,
        config: CorrectionConfig,
    ) -> Self {
        Self {
            scorer,
            reranker: ToneReranker::new(),
            rewriter,
            config,
        }
    }

    pub fn config(&self) -> &CorrectionConfig {
        &self.config
    }

    fn passes(&self, report: &ScoreReport) -> bool {
        report.overall >= self.config.min_score
    }

    async fn request_rewrite(
        &self,
        request: &CorrectionRequest,
    ) -> Result<String, CollaboratorFailure> {
        let rewriter = self
            .rewriter
            .as_ref()
            .ok_or_else(|| CollaboratorFailure::failed("rewriter", "not configured"))?;
        let rewritten = bounded(
            "rewriter",
            self.config.rewrite_timeout(),
            rewriter.rewrite(request),
        )
        .await?;
        match rewritten {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(CollaboratorFailure::Empty { collaborator: "rewriter" }),
        }
    }

    /// Score `raw_text` and, if it fails, rewrite it up to `max_attempts`
    /// times. Never errors: collaborator problems are recorded and skipped.
    pub async fn run(&self, raw_text: &str, directives: &StyleDirectives) -> CorrectionResult {
        let min_score = self.config.min_score;
        let initial = self.scorer.score(raw_text, directives);
        let mut notes = vec![format!(
            "Initial score: {:.1}/100 (threshold {:.0})",
            initial.overall, min_score
        )];

        if self.passes(&initial) {
            notes.push("Already within the tone target; no correction needed.".to_string());
            return CorrectionResult {
                final_text: raw_text.to_string(),
                attempts: 0,
                final_score: initial.clone(),
                initial_score: initial,
                fixed: false,
                outcome: CorrectionOutcome::Accepted,
                notes,
                audit: Vec::new(),
            };
        }

        let mut current_text = raw_text.to_string();
        let mut current_score = initial.clone();
        let mut best_text = current_text.clone();
        let mut best_score = initial.clone();
        let mut audit = Vec::new();

        for attempt in 1..=self.config.max_attempts {
            let request = CorrectionRequest::build(
                attempt,
                &current_text,
                directives,
                &current_score,
                min_score,
            );
            let mut states = vec![CorrectionState::Scoring, CorrectionState::Rewriting];

            let candidate = match self.request_rewrite(&request).await {
                Ok(text) => text,
                Err(failure) => {
                    // No new text: nothing to rerank or rescore this round.
                    log::warn!(
                        "[SelfCorrection] attempt {attempt}: {failure}; keeping previous text"
                    );
                    notes.push(format!("Attempt {attempt}: {failure}, keeping previous version"));
                    states.push(CorrectionState::Scoring);
                    audit.push(AttemptRecord {
                        attempt,
                        states,
                        score_before: current_score.overall,
                        score_after: current_score.overall,
                        rewrite_failure: Some(failure.to_string()),
                        reranked: false,
                        candidate: current_text.clone(),
                    });
                    continue;
                }
            };

            let candidate = if self.config.skip_reranking {
                candidate
            } else {
                self.reranker.rerank(&candidate, directives)
            };

            states.push(CorrectionState::Rescoring);
            let rescored = self.scorer.score(&candidate, directives);
            notes.push(format!(
                "Attempt {attempt}: {:.1} -> {:.1}/100",
                current_score.overall, rescored.overall
            ));

            let passed = self.passes(&rescored);
            states.push(if passed {
                CorrectionState::Accepted
            } else {
                CorrectionState::Scoring
            });
            audit.push(AttemptRecord {
                attempt,
                states,
                score_before: current_score.overall,
                score_after: rescored.overall,
                rewrite_failure: None,
                reranked: !self.config.skip_reranking,
                candidate: candidate.clone(),
            });

            if rescored.overall > best_score.overall {
                best_text = candidate.clone();
                best_score = rescored.clone();
            }
            current_text = candidate;
            current_score = rescored;

            if passed {
                log::info!(
                    "[SelfCorrection] accepted after {attempt} attempt(s) at {:.1}/100",
                    current_score.overall
                );
                notes.push(format!("Corrected after {attempt} attempt(s)"));
                return CorrectionResult {
                    final_text: current_text,
                    attempts: attempt,
                    initial_score: initial,
                    final_score: current_score,
                    fixed: true,
                    outcome: CorrectionOutcome::Accepted,
                    notes,
                    audit,
                };
            }
        }

        log::warn!(
            "[SelfCorrection] escalating after {} attempts; best score {:.1}/100",
            self.config.max_attempts,
            best_score.overall
        );
        notes.push(format!(
            "Max attempts reached; escalating with best candidate at {:.1}/100 (below {:.0})",
            best_score.overall, min_score
        ));
        if let Some(last) = audit.last_mut() {
            if let Some(state) = last.states.last_mut() {
                *state = CorrectionState::Escalated;
            }
        }

        CorrectionResult {
            final_text: best_text,
            attempts: self.config.max_attempts,
            initial_score: initial,
            final_score: best_score,
            fixed: false,
            outcome: CorrectionOutcome::Escalated,
            notes,
            audit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::fixtures::{supportive, SUPPORTIVE_REPLY};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Replays a fixed list of answers, then repeats the last one.
    struct ScriptedRewriter {
        answers: Vec<Option<String>>,
        calls: AtomicU32,
    }

    impl ScriptedRewriter {
        fn new(answers: Vec<Option<&str>>) -> Self {
            Self {
                answers: answers.into_iter().map(|a| a.map(str::to_string)).collect(),
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl Rewriter for ScriptedRewriter {
        async fn rewrite(
            &self,
            _request: &CorrectionRequest,
        ) -> Result<Option<String>, CollaboratorFailure> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
            let idx = n.min(self.answers.len().saturating_sub(1));
            Ok(self.answers.get(idx).cloned().flatten())
        }
    }

    struct FailingRewriter;

    #[async_trait]
    impl Rewriter for FailingRewriter {
        async fn rewrite(
            &self,
            _request: &CorrectionRequest,
        ) -> Result<Option<String>, CollaboratorFailure> {
            Err(CollaboratorFailure::failed("rewriter", "upstream 503"))
        }
    }

    struct SlowRewriter;

    #[async_trait]
    impl Rewriter for SlowRewriter {
        async fn rewrite(
            &self,
            _request: &CorrectionRequest,
        ) -> Result<Option<String>, CollaboratorFailure> {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(Some(SUPPORTIVE_REPLY.to_string()))
        }
    }

    /// Firm phrasing the reranker cannot soften, so reranking alone never
    /// rescues it under supportive directives.
    const FIRM_FLAT: &str = "Let's be honest. Reality check. Here is your plan.";

    fn looped(rewriter: Option<Arc<dyn Rewriter>>, config: CorrectionConfig) -> SelfCorrectionLoop {
        SelfCorrectionLoop::new(ResponseQualityScorer::default(), rewriter, config)
    }

    #[tokio::test]
    async fn test_passing_text_needs_zero_attempts() {
        let rewriter = Arc::new(ScriptedRewriter::new(vec![Some("unused")]));
        let lp = looped(Some(rewriter.clone()), CorrectionConfig::default());
        let result = lp.run(SUPPORTIVE_REPLY, &supportive()).await;

        assert_eq!(result.attempts, 0);
        assert_eq!(result.final_text, SUPPORTIVE_REPLY);
        assert_eq!(result.outcome, CorrectionOutcome::Accepted);
        assert!(!result.fixed);
        assert_eq!(rewriter.calls.load(Ordering::SeqCst), 0);

        // Re-running on accepted text evaluates afresh and stays at zero.
        let again = lp.run(&result.final_text, &supportive()).await;
        assert_eq!(again.attempts, 0);
    }

    #[tokio::test]
    async fn test_rewrite_fixes_on_second_attempt() {
        let rewriter = Arc::new(ScriptedRewriter::new(vec![
            Some(FIRM_FLAT),
            Some(SUPPORTIVE_REPLY),
        ]));
        let lp = looped(Some(rewriter), CorrectionConfig::default());
        let result = lp.run("Here is your plan.", &supportive()).await;

        assert_eq!(result.outcome, CorrectionOutcome::Accepted);
        assert_eq!(result.attempts, 2);
        assert!(result.fixed);
        assert!(result.final_score.overall >= result.initial_score.overall);
        assert_eq!(result.audit.len(), 2);
        assert_eq!(
            result.audit[1].states.last(),
            Some(&CorrectionState::Accepted)
        );
    }

    #[tokio::test]
    async fn test_failures_escalate_without_panicking() {
        let lp = looped(Some(Arc::new(FailingRewriter)), CorrectionConfig::default());
        let result = lp.run(FIRM_FLAT, &supportive()).await;

        assert_eq!(result.outcome, CorrectionOutcome::Escalated);
        assert_eq!(result.attempts, 3);
        assert!(!result.fixed);
        assert_eq!(result.audit.len(), 3);
        assert!(result.audit.iter().all(|a| a.rewrite_failure.is_some()));
        assert!(result.final_score.overall >= result.initial_score.overall);
        assert_eq!(
            result.audit[2].states.last(),
            Some(&CorrectionState::Escalated)
        );
        assert!(result.summary().contains("Outcome: escalated"));
    }

    #[tokio::test]
    async fn test_escalation_keeps_best_candidate() {
        // Second answer is worse than the first; the first must win.
        let rewriter = Arc::new(ScriptedRewriter::new(vec![
            Some("I totally hear you, and I'm with you. Take 3 steps."),
            Some("ok"),
        ]));
        let config = CorrectionConfig {
            max_attempts: 2,
            min_score: 99.0,
            skip_reranking: true,
            ..CorrectionConfig::default()
        };
        let lp = looped(Some(rewriter), config);
        let result = lp.run("ok", &supportive()).await;

        assert!(result.is_escalated());
        assert_eq!(result.final_text, "I totally hear you, and I'm with you. Take 3 steps.");
        assert!(result.final_score.overall > result.initial_score.overall);
    }

    #[tokio::test]
    async fn test_rewrite_timeout_is_fail_open() {
        let config = CorrectionConfig {
            max_attempts: 1,
            rewrite_timeout_ms: 20,
            ..CorrectionConfig::default()
        };
        let lp = looped(Some(Arc::new(SlowRewriter)), config);
        let result = lp.run(FIRM_FLAT, &supportive()).await;

        assert!(result.is_escalated());
        assert!(result.audit[0]
            .rewrite_failure
            .as_deref()
            .is_some_and(|m| m.contains("timed out")));
    }

    #[tokio::test]
    async fn test_empty_rewrite_is_treated_as_failure() {
        let rewriter = Arc::new(ScriptedRewriter::new(vec![None, Some("   ")]));
        let config = CorrectionConfig {
            max_attempts: 2,
            ..CorrectionConfig::default()
        };
        let result = looped(Some(rewriter), config)
            .run(FIRM_FLAT, &supportive())
            .await;
        assert_eq!(
            result.audit[0].rewrite_failure.as_deref(),
            Some("rewriter returned no usable output")
        );
        assert!(result.audit[1].rewrite_failure.is_some());
    }

    #[tokio::test]
    async fn test_failed_rewrite_skips_rerank_and_rescore() {
        // The reranker alone would push this reply over the line; without a
        // rewrite it must not get the chance.
        let text = "We will map out all 12 of your applications across the next few weeks so that \
                    nothing lands on the same weekend, and let's take this one step at a time.";
        let result = looped(None, CorrectionConfig::default())
            .run(text, &supportive())
            .await;

        assert!(result.initial_score.overall < DEFAULT_MIN_SCORE);
        assert_eq!(result.outcome, CorrectionOutcome::Escalated);
        assert!(!result.fixed);
        assert_eq!(result.attempts, 3);
        assert_eq!(result.final_text, text);
        assert_eq!(result.final_score, result.initial_score);
        for record in &result.audit {
            assert!(!record.reranked);
            assert!(!record.states.contains(&CorrectionState::Rescoring));
            assert_eq!(record.score_before, record.score_after);
            assert_eq!(record.candidate, text);
        }
    }

    #[tokio::test]
    async fn test_rewrite_after_failure_is_reranked() {
        let rewriter = Arc::new(ScriptedRewriter::new(vec![None, Some(SUPPORTIVE_REPLY)]));
        let result = looped(Some(rewriter), CorrectionConfig::default())
            .run(FIRM_FLAT, &supportive())
            .await;

        assert_eq!(result.outcome, CorrectionOutcome::Accepted);
        assert_eq!(result.attempts, 2);
        assert!(result.fixed);
        assert!(!result.audit[0].reranked);
        assert!(result.audit[1].reranked);
        assert_eq!(
            result.audit[1].states.last(),
            Some(&CorrectionState::Accepted)
        );
    }

    #[test]
    fn test_request_prompt_lists_issues() {
        let scorer = ResponseQualityScorer::default();
        let report = scorer.score("Here is your plan.", &supportive());
        let request =
            CorrectionRequest::build(1, "Here is your plan.", &supportive(), &report, 70.0);
        let (system, user) = request.to_prompt();
        assert!(system.contains("Return only the corrected message."));
        assert!(user.contains("Here is your plan."));
        assert!(user.contains("- warmth: high"));
        assert!(user.contains("1. Increase warmth"));
        assert_eq!(request.failing_dimensions.len(), request.recommendations.len());
    }

    #[test]
    fn test_config_validation() {
        assert!(CorrectionConfig::default().validate().is_ok());
        let zero = CorrectionConfig {
            max_attempts: 0,
            ..CorrectionConfig::default()
        };
        assert!(zero.validate().is_err());
    }

    #[tokio::test]
    async fn test_compare_results_prefers_fewer_attempts_in_band() {
        let lp = looped(None, CorrectionConfig::default());
        let clean = lp.run(SUPPORTIVE_REPLY, &supportive()).await;
        let mut slower = clean.clone();
        slower.attempts = 2;
        assert_eq!(compare_results(&clean, &slower).better, Preferred::First);
        assert_eq!(compare_results(&clean, &clean).better, Preferred::Tie);
    }
}
