//! Turn orchestration: walks exactly one catalog step per student utterance.
//!
//! A turn is all-or-nothing. [`DialogueOrchestrator::run_turn`] works on a
//! clone of the caller's state and only hands it back when every stage
//! succeeded, so a fatal error leaves the original untouched.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use super::catalog::{catalog, DialogueStep, StepCatalog, INITIAL_STEP, TERMINAL_STEP};
use super::state::{HistoryEntry, Role, SessionState};
use crate::config::SessionConfig;
use crate::errors::{CatalogIntegrityError, SessionError, ValidationError};
use crate::signals::{KeywordSignalExtractor, SignalExtractor};
use crate::tone::{BlendWeights, ToneSnapshot};

/// Drives the dialogue automaton and keeps the emotional state and tone
/// metadata in step with it.
#[derive(Clone)]
pub struct DialogueOrchestrator {
    extractor: Arc<dyn SignalExtractor>,
    catalog: &'static StepCatalog,
    blend: BlendWeights,
}

impl std::fmt::Debug for DialogueOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialogueOrchestrator")
            .field("strategy", &self.extractor.strategy())
            .field("steps", &self.catalog.total_step_count())
            .field("blend", &self.blend)
            .finish()
    }
}

impl Default for DialogueOrchestrator {
    fn default() -> Self {
        Self::new(Arc::new(KeywordSignalExtractor))
    }
}

impl DialogueOrchestrator {
    pub fn new(extractor: Arc<dyn SignalExtractor>) -> Self {
        Self {
            extractor,
            catalog: catalog(),
            blend: BlendWeights::default(),
        }
    }

    pub fn with_blend(mut self, blend: BlendWeights) -> Self {
        self.blend = blend;
        self
    }

    /// Swap the step table. Used for alternative scripts and fault injection.
    pub fn with_catalog(mut self, catalog: &'static StepCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn catalog(&self) -> &'static StepCatalog {
        self.catalog
    }

    /// Create a session at the configured (or default) entry step.
    pub fn init_session(&self, config: &SessionConfig) -> Result<SessionState, ValidationError> {
        let session_id = config
            .session_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let start = config.start_step.as_deref().unwrap_or(INITIAL_STEP);
        let Some(step) = self.catalog.get(start) else {
            return Err(ValidationError::UnknownStep {
                step_id: start.to_string(),
            });
        };

        let mut state = SessionState::new(session_id);
        if let Some(emotional) = &config.initial_emotional {
            emotional.validate()?;
            state.emotional = emotional.clone();
        }
        state.step_id = step.id.to_string();
        state.phase = step.phase;
        state.metadata.coach_id = config.coach_id.clone();
        state.metadata.student_id = config.student_id.clone();
        state.tone = ToneSnapshot::compute(&state.emotional, &state.profile, "", self.blend);

        log::info!(
            "[Orchestrator] session {} started at {} ({})",
            state.session_id(),
            state.step_id,
            state.phase
        );
        Ok(state)
    }

    fn step(&self, step_id: &str) -> Result<&'static DialogueStep, CatalogIntegrityError> {
        self.catalog
            .get(step_id)
            .ok_or_else(|| CatalogIntegrityError::MissingStep {
                step_id: step_id.to_string(),
            })
    }

    /// Run one turn and return the successor state.
    ///
    /// Order within the turn:
    /// 1. extract the delta and apply it to the emotional state
    /// 2. recompute tone metadata (profile, mood vector, directives, instruction)
    /// 3. look up the current step
    /// 4. append the utterance to history
    /// 5. run the step's collector
    /// 6. evaluate the transition on the post-collection state
    /// 7. derive the phase from the next step
    /// 8. bump the turn counter and timestamp
    pub async fn run_turn(
        &self,
        utterance: &str,
        state: &SessionState,
    ) -> Result<SessionState, SessionError> {
        log::debug!(
            "[Orchestrator] turn {} of session {} at {} ({})",
            state.turn_count + 1,
            state.session_id(),
            state.step_id,
            state.phase
        );

        let result = self.advance(utterance, state).await;
        if let Err(err) = &result {
            log::error!(
                "[Orchestrator] turn failed for session {} at {}: {err}",
                state.session_id(),
                state.step_id
            );
        }
        result
    }

    async fn advance(
        &self,
        utterance: &str,
        state: &SessionState,
    ) -> Result<SessionState, SessionError> {
        let mut next = state.clone();

        let delta = self.extractor.extract(utterance).await;
        next.emotional = state.emotional.apply(&delta)?;
        next.profile.add_signals(&delta.categories);
        log::debug!("[Orchestrator] emotional state: {}", next.emotional.summary());

        next.tone = ToneSnapshot::compute(
            &next.emotional,
            &next.profile,
            state.last_assistant_message().unwrap_or(""),
            self.blend,
        );
        log::debug!("[Orchestrator] directives: {}", next.tone.directives.summary());

        let step = self.step(&state.step_id)?;

        let now = Utc::now();
        next.history.push(HistoryEntry {
            role: Role::User,
            text: utterance.to_string(),
            timestamp: now,
            phase: state.phase,
            step: state.step_id.clone(),
            emotional: next.emotional.clone(),
        });

        step.collect(utterance, &mut next.collected);

        let next_id = step.next(&next);
        let Some(next_step) = self.catalog.get(next_id) else {
            return Err(CatalogIntegrityError::UnknownTransition {
                from: step.id.to_string(),
                to: next_id.to_string(),
            }
            .into());
        };
        if step.is_terminal() && next_id != step.id {
            return Err(CatalogIntegrityError::UnknownTransition {
                from: step.id.to_string(),
                to: next_id.to_string(),
            }
            .into());
        }

        if next_step.phase != state.phase {
            log::info!(
                "[Orchestrator] phase transition {} -> {} (session {})",
                state.phase,
                next_step.phase,
                state.session_id()
            );
        }
        log::debug!("[Orchestrator] transition {} -> {}", step.id, next_step.id);

        next.step_id = next_step.id.to_string();
        next.phase = next_step.phase;
        next.turn_count += 1;
        next.metadata.last_updated_at = now;

        if next.is_complete() && !state.is_complete() {
            log::info!(
                "[Orchestrator] session {} complete after {} turns",
                next.session_id(),
                next.turn_count
            );
        }
        Ok(next)
    }

    pub fn is_complete(&self, state: &SessionState) -> bool {
        state.step_id == TERMINAL_STEP
    }

    /// Instruction text of the current step.
    pub fn current_instruction(
        &self,
        state: &SessionState,
    ) -> Result<&'static str, CatalogIntegrityError> {
        Ok(self.step(&state.step_id)?.instruction)
    }

    /// Generation prompt for the current step: the step instruction followed
    /// by the latest tone guidance.
    pub fn current_prompt(&self, state: &SessionState) -> Result<String, CatalogIntegrityError> {
        let instruction = self.current_instruction(state)?;
        Ok(format!(
            "## Current step: {} ({})\n{}\n\n## Tone guidance\n{}",
            state.step_id,
            state.phase,
            instruction,
            state.tone.format_for_prompt()
        ))
    }
}
