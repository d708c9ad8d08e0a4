//! `CoachingEngine`: the host-facing facade.
//!
//! Wires the signal extractor, dialogue orchestrator, scorer, reranker and
//! self-correction loop from one [`EngineConfig`] plus optional
//! collaborators.

use std::sync::Arc;

use crate::collaborators::{bounded, Generator, Rewriter, SignalRefiner};
use crate::config::{EngineConfig, SessionConfig};
use crate::dialogue::{DialogueOrchestrator, SessionState};
use crate::errors::{CatalogIntegrityError, CollaboratorFailure, SessionError, ValidationError};
use crate::quality::{
    CorrectionOutcome, CorrectionResult, ResponseQualityScorer, ScoreReport, SelfCorrectionLoop,
};
use crate::signals::HybridSignalExtractor;
use crate::tone::StyleDirectives;

/// Optional host capabilities. Every one of them may be absent.
#[derive(Clone, Default)]
pub struct Collaborators {
    pub generator: Option<Arc<dyn Generator>>,
    pub refiner: Option<Arc<dyn SignalRefiner>>,
    pub rewriter: Option<Arc<dyn Rewriter>>,
}

impl Collaborators {
    pub fn with_generator(mut self, generator: Arc<dyn Generator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn with_refiner(mut self, refiner: Arc<dyn SignalRefiner>) -> Self {
        self.refiner = Some(refiner);
        self
    }

    pub fn with_rewriter(mut self, rewriter: Arc<dyn Rewriter>) -> Self {
        self.rewriter = Some(rewriter);
        self
    }
}

#[derive(Clone)]
pub struct CoachingEngine {
    config: EngineConfig,
    orchestrator: DialogueOrchestrator,
    scorer: ResponseQualityScorer,
    correction: SelfCorrectionLoop,
    generator: Option<Arc<dyn Generator>>,
}

impl std::fmt::Debug for CoachingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoachingEngine")
            .field("config", &self.config)
            .field("orchestrator", &self.orchestrator)
            .field("has_generator", &self.generator.is_some())
            .finish()
    }
}

impl CoachingEngine {
    pub fn new(
        config: EngineConfig,
        collaborators: Collaborators,
    ) -> Result<Self, ValidationError> {
        config.validate()?;

        let extractor = HybridSignalExtractor::new(collaborators.refiner)
            .with_timeout(config.signals.refiner_timeout());
        let orchestrator = DialogueOrchestrator::new(Arc::new(extractor)).with_blend(config.blend);
        let scorer = ResponseQualityScorer::new(config.scoring.clone());
        let correction = SelfCorrectionLoop::new(
            scorer.clone(),
            collaborators.rewriter,
            config.correction.clone(),
        );

        log::info!(
            "[Engine] ready: generator={} min_score={} max_attempts={}",
            collaborators.generator.is_some(),
            config.correction.min_score,
            config.correction.max_attempts
        );

        Ok(Self {
            config,
            orchestrator,
            scorer,
            correction,
            generator: collaborators.generator,
        })
    }

    /// Keyword extraction, no rewriter, no generator.
    pub fn standalone(config: EngineConfig) -> Result<Self, ValidationError> {
        Self::new(config, Collaborators::default())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn orchestrator(&self) -> &DialogueOrchestrator {
        &self.orchestrator
    }

    pub fn init_session(&self, config: &SessionConfig) -> Result<SessionState, ValidationError> {
        self.orchestrator.init_session(config)
    }

    pub async fn run_turn(
        &self,
        utterance: &str,
        state: &SessionState,
    ) -> Result<SessionState, SessionError> {
        self.orchestrator.run_turn(utterance, state).await
    }

    pub fn is_complete(&self, state: &SessionState) -> bool {
        self.orchestrator.is_complete(state)
    }

    pub fn current_prompt(&self, state: &SessionState) -> Result<String, CatalogIntegrityError> {
        self.orchestrator.current_prompt(state)
    }

    pub fn score(&self, text: &str, directives: &StyleDirectives) -> ScoreReport {
        self.scorer.score(text, directives)
    }

    /// Gate a candidate reply. Pure in `(text, directives)`; never touches
    /// session state.
    pub async fn score_and_correct(
        &self,
        candidate: &str,
        directives: &StyleDirectives,
    ) -> CorrectionResult {
        let result = self.correction.run(candidate, directives).await;
        if result.is_escalated() {
            log::warn!(
                "[Engine] reply escalated after {} attempt(s) at {:.1}/100",
                result.attempts,
                result.final_score.overall
            );
        }
        result
    }

    /// Generate, gate and deliver the coach reply for the current step.
    ///
    /// Only an accepted reply is appended to history. An escalated result is
    /// returned for the host to decide on; a generator failure becomes an
    /// escalated result with empty text, never an error.
    pub async fn respond(
        &self,
        state: &SessionState,
    ) -> Result<(SessionState, CorrectionResult), SessionError> {
        let prompt = self.current_prompt(state)?;
        let directives = state.tone.directives;

        let generated = match &self.generator {
            Some(generator) => {
                bounded(
                    "generator",
                    self.config.correction.rewrite_timeout(),
                    generator.generate(&prompt, &directives),
                )
                .await
            }
            None => Err(CollaboratorFailure::failed("generator", "not configured")),
        };

        let generated = generated.and_then(|text| {
            if text.trim().is_empty() {
                Err(CollaboratorFailure::Empty {
                    collaborator: "generator",
                })
            } else {
                Ok(text)
            }
        });
        let result = match generated {
            Ok(text) => self.score_and_correct(&text, &directives).await,
            Err(failure) => self.generator_failed(failure, &directives),
        };

        let mut next = state.clone();
        if result.outcome == CorrectionOutcome::Accepted {
            next.add_assistant_message(result.final_text.clone());
        }
        Ok((next, result))
    }

    fn generator_failed(
        &self,
        failure: CollaboratorFailure,
        directives: &StyleDirectives,
    ) -> CorrectionResult {
        log::warn!("[Engine] {failure}; escalating with empty reply");
        let report = self.scorer.score("", directives);
        CorrectionResult {
            final_text: String::new(),
            attempts: 0,
            initial_score: report.clone(),
            final_score: report,
            fixed: false,
            outcome: CorrectionOutcome::Escalated,
            notes: vec![format!("Generation failed: {failure}")],
            audit: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::fixtures::{supportive, SUPPORTIVE_REPLY};
    use async_trait::async_trait;
    use std::time::Duration;

    struct CannedGenerator(&'static str);

    #[async_trait]
    impl Generator for CannedGenerator {
        async fn generate(
            &self,
            _prompt: &str,
            _directives: &StyleDirectives,
        ) -> Result<String, CollaboratorFailure> {
            Ok(self.0.to_string())
        }
    }

    struct BrokenGenerator;

    #[async_trait]
    impl Generator for BrokenGenerator {
        async fn generate(
            &self,
            _prompt: &str,
            _directives: &StyleDirectives,
        ) -> Result<String, CollaboratorFailure> {
            Err(CollaboratorFailure::failed("generator", "upstream 503"))
        }
    }

    struct StalledGenerator;

    #[async_trait]
    impl Generator for StalledGenerator {
        async fn generate(
            &self,
            _prompt: &str,
            _directives: &StyleDirectives,
        ) -> Result<String, CollaboratorFailure> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(SUPPORTIVE_REPLY.to_string())
        }
    }

    fn engine_with(generator: Arc<dyn Generator>) -> CoachingEngine {
        CoachingEngine::new(
            EngineConfig::default(),
            Collaborators::default().with_generator(generator),
        )
        .unwrap()
    }

    fn supportive_session(engine: &CoachingEngine) -> SessionState {
        let mut state = engine.init_session(&SessionConfig::default()).unwrap();
        state.tone.directives = supportive();
        state
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = EngineConfig::default();
        config.correction.max_attempts = 0;
        assert!(CoachingEngine::standalone(config).is_err());
    }

    #[tokio::test]
    async fn test_respond_delivers_accepted_reply() {
        let engine = engine_with(Arc::new(CannedGenerator(SUPPORTIVE_REPLY)));
        let state = supportive_session(&engine);

        let (next, result) = engine.respond(&state).await.unwrap();
        assert_eq!(result.outcome, CorrectionOutcome::Accepted);
        assert_eq!(result.attempts, 0);
        assert_eq!(next.last_assistant_message(), Some(SUPPORTIVE_REPLY));
        assert!(state.history.is_empty());
        // Delivering a reply does not advance the dialogue.
        assert_eq!(next.step_id, state.step_id);
        assert_eq!(next.turn_count, state.turn_count);
    }

    #[tokio::test]
    async fn test_generator_failure_escalates_without_error() {
        let engine = engine_with(Arc::new(BrokenGenerator));
        let state = supportive_session(&engine);

        let (next, result) = engine.respond(&state).await.unwrap();
        assert!(result.is_escalated());
        assert!(result.final_text.is_empty());
        assert!(result.notes[0].contains("upstream 503"));
        assert!(next.history.is_empty());
    }

    #[tokio::test]
    async fn test_generator_timeout_escalates() {
        let mut config = EngineConfig::default();
        config.correction.rewrite_timeout_ms = 20;
        let engine = CoachingEngine::new(
            config,
            Collaborators::default().with_generator(Arc::new(StalledGenerator)),
        )
        .unwrap();
        let state = supportive_session(&engine);

        let (_, result) = engine.respond(&state).await.unwrap();
        assert!(result.is_escalated());
        assert!(result.notes[0].contains("timed out"));
    }

    #[tokio::test]
    async fn test_missing_generator_escalates() {
        let engine = CoachingEngine::standalone(EngineConfig::default()).unwrap();
        let state = supportive_session(&engine);
        let (_, result) = engine.respond(&state).await.unwrap();
        assert!(result.is_escalated());
        assert!(result.notes[0].contains("not configured"));
    }

    #[tokio::test]
    async fn test_score_and_correct_is_stateless() {
        let engine = CoachingEngine::standalone(EngineConfig::default()).unwrap();
        let first = engine.score_and_correct(SUPPORTIVE_REPLY, &supportive()).await;
        let second = engine.score_and_correct(&first.final_text, &supportive()).await;
        assert_eq!(first.attempts, 0);
        assert_eq!(second.attempts, 0);
        assert_eq!(second.final_text, SUPPORTIVE_REPLY);
    }

    #[tokio::test]
    async fn test_full_session_runs_to_completion() {
        let engine = CoachingEngine::standalone(EngineConfig::default()).unwrap();
        let mut state = engine.init_session(&SessionConfig::default()).unwrap();
        let mut turns = 0;
        while !engine.is_complete(&state) {
            state = engine.run_turn("I guess that's fine", &state).await.unwrap();
            turns += 1;
            assert!(turns < 100);
        }
        assert_eq!(state.history.len(), turns);
        assert!(engine.current_prompt(&state).is_ok());
    }
}
