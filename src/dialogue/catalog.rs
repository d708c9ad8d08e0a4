//! The step catalog: every micro-step of a coaching session.
//!
//! Steps are immutable records of plain function pointers. The graph they
//! form is computed: an edge is whatever a transition function returns for
//! the current session state. Only step ids are ever persisted.
//!
//! ```text
//! warmup ─► diagnostic ─► deep_probe ─► narrative ─► wrap ─► session_complete ⟲
//! ```

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;

use super::collectors::*;
use super::state::{CollectedData, Phase, SessionState};
use crate::errors::CatalogIntegrityError;

pub type Collector = fn(&str, &mut CollectedData);
pub type Transition = fn(&SessionState) -> &'static str;

pub const INITIAL_STEP: &str = "warmup_intro";
/// The single absorbing step. Its transition always returns itself.
pub const TERMINAL_STEP: &str = "session_complete";

/// One micro-step of the session script.
#[derive(Clone, Copy)]
pub struct DialogueStep {
    pub id: &'static str,
    pub phase: Phase,
    /// What the coach should ask or do on this step.
    pub instruction: &'static str,
    pub collector: Option<Collector>,
    pub transition: Transition,
    /// Set on clarification variants: the confident step this one re-asks.
    pub clarifies: Option<&'static str>,
}

impl fmt::Debug for DialogueStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialogueStep")
            .field("id", &self.id)
            .field("phase", &self.phase)
            .field("has_collector", &self.collector.is_some())
            .field("clarifies", &self.clarifies)
            .finish()
    }
}

impl DialogueStep {
    pub fn new(
        id: &'static str,
        phase: Phase,
        instruction: &'static str,
        transition: Transition,
    ) -> Self {
        Self {
            id,
            phase,
            instruction,
            collector: None,
            transition,
            clarifies: None,
        }
    }

    pub fn with_collector(mut self, collector: Collector) -> Self {
        self.collector = Some(collector);
        self
    }

    pub fn clarifying(mut self, step_id: &'static str) -> Self {
        self.clarifies = Some(step_id);
        self
    }

    /// Run the collector, if any.
    pub fn collect(&self, utterance: &str, data: &mut CollectedData) {
        if let Some(collector) = self.collector {
            collector(utterance, data);
        }
    }

    /// Next step id for the given (post-collection) state.
    pub fn next(&self, state: &SessionState) -> &'static str {
        (self.transition)(state)
    }

    pub fn is_terminal(&self) -> bool {
        self.id == TERMINAL_STEP
    }

    pub fn is_clarification(&self) -> bool {
        self.clarifies.is_some()
    }
}

/// Immutable step table plus its declaration order.
#[derive(Debug)]
pub struct StepCatalog {
    steps: HashMap<&'static str, DialogueStep>,
    order: Vec<&'static str>,
}

impl StepCatalog {
    /// Build a catalog. A repeated id keeps the later definition at the
    /// earlier position.
    pub fn from_steps(steps: Vec<DialogueStep>) -> Self {
        let mut map = HashMap::with_capacity(steps.len());
        let mut order = Vec::with_capacity(steps.len());
        for step in steps {
            if map.insert(step.id, step).is_none() {
                order.push(step.id);
            }
        }
        Self { steps: map, order }
    }

    pub fn get(&self, step_id: &str) -> Option<&DialogueStep> {
        self.steps.get(step_id)
    }

    pub fn contains(&self, step_id: &str) -> bool {
        self.steps.contains_key(step_id)
    }

    pub fn phase_of(&self, step_id: &str) -> Option<Phase> {
        self.get(step_id).map(|step| step.phase)
    }

    pub fn position(&self, step_id: &str) -> Option<usize> {
        self.order.iter().position(|id| *id == step_id)
    }

    pub fn order(&self) -> &[&'static str] {
        &self.order
    }

    pub fn total_step_count(&self) -> usize {
        self.order.len()
    }

    /// Steps declared for `phase`, in catalog order.
    pub fn steps_for_phase(&self, phase: Phase) -> Vec<&DialogueStep> {
        self.iter().filter(|step| step.phase == phase).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DialogueStep> {
        self.order.iter().filter_map(|id| self.steps.get(id))
    }

    /// Structural check: the entry and terminal steps exist, the terminal
    /// step absorbs, clarification variants point at real steps, and every
    /// transition evaluated on a fresh session lands inside the catalog.
    pub fn check_integrity(&self) -> Result<(), CatalogIntegrityError> {
        for required in [INITIAL_STEP, TERMINAL_STEP] {
            if !self.contains(required) {
                return Err(CatalogIntegrityError::MissingStep {
                    step_id: required.to_string(),
                });
            }
        }

        let scratch = SessionState::new("catalog-integrity-scratch");
        for step in self.iter() {
            if let Some(target) = step.clarifies {
                if !self.contains(target) {
                    return Err(CatalogIntegrityError::MissingStep {
                        step_id: target.to_string(),
                    });
                }
            }
            let next = step.next(&scratch);
            if !self.contains(next) || (step.is_terminal() && next != step.id) {
                return Err(CatalogIntegrityError::UnknownTransition {
                    from: step.id.to_string(),
                    to: next.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// The process-wide catalog. Built once, never written afterwards.
pub static CATALOG: Lazy<StepCatalog> = Lazy::new(|| StepCatalog::from_steps(session_steps()));

pub fn catalog() -> &'static StepCatalog {
    &CATALOG
}

pub fn steps_for_phase(phase: Phase) -> Vec<&'static DialogueStep> {
    catalog().steps_for_phase(phase)
}

pub fn total_step_count() -> usize {
    catalog().total_step_count()
}

// ---------------------------------------------------------------------------
// Conditional transitions
// ---------------------------------------------------------------------------

fn after_background(state: &SessionState) -> &'static str {
    let shared = state
        .collected
        .personality
        .as_ref()
        .is_some_and(|p| !p.background.is_empty());
    if shared {
        "warmup_school_context"
    } else {
        "warmup_background_probe"
    }
}

fn after_school_context(state: &SessionState) -> &'static str {
    let known = state
        .collected
        .academics
        .as_ref()
        .is_some_and(|a| a.grade_level.is_some());
    if known {
        "warmup_transition_to_diagnostic"
    } else {
        "warmup_school_context_clarify"
    }
}

fn after_gpa(state: &SessionState) -> &'static str {
    let known = state
        .collected
        .academics
        .as_ref()
        .and_then(|a| a.gpa.as_ref())
        .is_some_and(|gpa| gpa.unweighted.is_some());
    if known {
        "diagnostic_academics_rigor"
    } else {
        "diagnostic_academics_gpa_clarify"
    }
}

fn after_ecs_overview(state: &SessionState) -> &'static str {
    let named = state
        .collected
        .ecs
        .as_ref()
        .is_some_and(|ecs| !ecs.activities.is_empty());
    if named {
        "diagnostic_ecs_depth"
    } else {
        "diagnostic_ecs_overview_clarify"
    }
}

// ---------------------------------------------------------------------------
// Step table
// ---------------------------------------------------------------------------

fn session_steps() -> Vec<DialogueStep> {
    use Phase::*;

    vec![
        // Warmup: rapport and context.
        DialogueStep::new(
            "warmup_intro",
            Warmup,
            "Open warmly and keep it conversational. Briefly introduce yourself, then ask \
             what brought the student here today and what about college admissions is \
             exciting them or keeping them up at night.",
            |_| "warmup_background",
        )
        .with_collector(collect_intro),
        DialogueStep::new(
            "warmup_background",
            Warmup,
            "Ask about their personal background with genuine curiosity: where they are \
             from, family situation, anything that shapes how they see the world. Invite, \
             never force, identity details.",
            after_background,
        )
        .with_collector(collect_background),
        DialogueStep::new(
            "warmup_background_probe",
            Warmup,
            "They kept background brief. Probe once more, gently and specifically: is \
             college something their family pushed for, or more their own thing?",
            |_| "warmup_school_context",
        )
        .with_collector(collect_background_probe)
        .clarifying("warmup_background"),
        DialogueStep::new(
            "warmup_school_context",
            Warmup,
            "Ask what grade they are in and what their school is like: big public, small \
             private, competitive or laid-back, and how they feel about it.",
            after_school_context,
        )
        .with_collector(collect_school_context),
        DialogueStep::new(
            "warmup_school_context_clarify",
            Warmup,
            "The grade level is still unclear. Ask directly which year they are in \
             (freshman, sophomore, junior or senior).",
            |_| "warmup_transition_to_diagnostic",
        )
        .with_collector(collect_school_context)
        .clarifying("warmup_school_context"),
        DialogueStep::new(
            "warmup_transition_to_diagnostic",
            Warmup,
            "Signal the shift into the diagnostic part: academics, activities and awards. \
             Reassure them it is not an interrogation, just the full picture.",
            |_| "diagnostic_academics_gpa",
        ),
        // Diagnostic: academics, activities, awards.
        DialogueStep::new(
            "diagnostic_academics_gpa",
            Diagnostic,
            "Ask casually about GPA, weighted and unweighted if they know both.",
            after_gpa,
        )
        .with_collector(collect_gpa),
        DialogueStep::new(
            "diagnostic_academics_gpa_clarify",
            Diagnostic,
            "No clear GPA yet. Ask again more directly for a ballpark number and whether \
             it is weighted or unweighted.",
            |_| "diagnostic_academics_rigor",
        )
        .with_collector(collect_gpa_clarify)
        .clarifying("diagnostic_academics_gpa"),
        DialogueStep::new(
            "diagnostic_academics_rigor",
            Diagnostic,
            "Ask about course rigor: AP, IB, Honors. How many APs have they taken or are \
             taking now?",
            |_| "diagnostic_academics_favorites",
        )
        .with_collector(collect_rigor),
        DialogueStep::new(
            "diagnostic_academics_favorites",
            Diagnostic,
            "Ask about their favorite and least favorite subjects to separate passion \
             from obligation.",
            |_| "diagnostic_ecs_overview",
        )
        .with_collector(collect_favorites),
        DialogueStep::new(
            "diagnostic_ecs_overview",
            Diagnostic,
            "Ask for a high-level overview of their extracurriculars. No exhaustive lists \
             yet.",
            after_ecs_overview,
        )
        .with_collector(collect_ecs_overview),
        DialogueStep::new(
            "diagnostic_ecs_overview_clarify",
            Diagnostic,
            "No specific activities came through. Ask them to name the two or three \
             things they spend the most time on outside class.",
            |_| "diagnostic_ecs_depth",
        )
        .with_collector(collect_ecs_overview)
        .clarifying("diagnostic_ecs_overview"),
        DialogueStep::new(
            "diagnostic_ecs_depth",
            Diagnostic,
            "Ask about the one or two activities they care most about: hours per week, \
             years involved, roles and impact.",
            |_| "diagnostic_awards",
        )
        .with_collector(collect_ecs_depth),
        DialogueStep::new(
            "diagnostic_awards",
            Diagnostic,
            "Ask about awards, honors and competitions, academic and extracurricular.",
            |_| "diagnostic_transition_to_deep_probe",
        )
        .with_collector(collect_awards),
        DialogueStep::new(
            "diagnostic_transition_to_deep_probe",
            Diagnostic,
            "Tell them you are moving from the what to the why.",
            |_| "deep_probe_passion",
        ),
        // Deep probe: passion, service, curiosity.
        DialogueStep::new(
            "deep_probe_passion",
            DeepProbe,
            "Ask what energizes them: projects, problems, fascinations. Not what they \
             want to major in, but what keeps them up at night in a good way.",
            |_| "deep_probe_service",
        )
        .with_collector(collect_passion),
        DialogueStep::new(
            "deep_probe_service",
            DeepProbe,
            "Ask about service and community impact. Do they orient toward helping \
             others?",
            |_| "deep_probe_challenges",
        )
        .with_collector(collect_service),
        DialogueStep::new(
            "deep_probe_challenges",
            DeepProbe,
            "Ask about challenges they have faced, personal, academic or identity-based. \
             Listen for resilience and story material.",
            |_| "deep_probe_intellectual_curiosity",
        )
        .with_collector(collect_challenges),
        DialogueStep::new(
            "deep_probe_intellectual_curiosity",
            DeepProbe,
            "Ask what they read, learn and explore beyond school requirements.",
            |_| "narrative_reflection",
        )
        .with_collector(collect_curiosity),
        // Narrative: positioning, themes, story.
        DialogueStep::new(
            "narrative_reflection",
            Narrative,
            "Reflect back the patterns you are seeing and offer an early positioning \
             hypothesis. Show them you get them.",
            |_| "narrative_positioning_test",
        )
        .with_collector(collect_reflection),
        DialogueStep::new(
            "narrative_positioning_test",
            Narrative,
            "Test one specific positioning statement, for example systems-builder, \
             community-first organizer or interdisciplinary thinker.",
            |_| "narrative_story_threads",
        )
        .with_collector(collect_positioning_test),
        DialogueStep::new(
            "narrative_story_threads",
            Narrative,
            "Ask about the thread that ties everything together: family legacy, \
             overcoming something, building something.",
            |_| "narrative_risks",
        )
        .with_collector(collect_story_threads),
        DialogueStep::new(
            "narrative_risks",
            Narrative,
            "Gently name one narrative risk you want to watch and say you will address \
             it together.",
            |_| "narrative_opportunities",
        )
        .with_collector(collect_risks),
        DialogueStep::new(
            "narrative_opportunities",
            Narrative,
            "Highlight where their narrative has leverage.",
            |_| "narrative_archetype_check",
        )
        .with_collector(collect_opportunities),
        DialogueStep::new(
            "narrative_archetype_check",
            Narrative,
            "Check whether the proposed narrative frame resonates with them.",
            |_| "narrative_differentiation",
        )
        .with_collector(collect_archetype_check),
        DialogueStep::new(
            "narrative_differentiation",
            Narrative,
            "Explain what differentiates their narrative, or warn them if it reads as \
             generic.",
            |_| "wrap_college_preferences",
        )
        .with_collector(collect_differentiation),
        // Wrap: targets, actions, close.
        DialogueStep::new(
            "wrap_college_preferences",
            Wrap,
            "Quick check on college preferences: targets, interests, deal-breakers.",
            |_| "wrap_action_items",
        )
        .with_collector(collect_college_preferences),
        DialogueStep::new(
            "wrap_action_items",
            Wrap,
            "Give three immediate action items that are concrete, time-bounded and \
             achievable, framed as momentum rather than homework.",
            |_| "wrap_assessment_timeline",
        ),
        DialogueStep::new(
            "wrap_assessment_timeline",
            Wrap,
            "Explain when the full written assessment will arrive and what it will cover.",
            |_| "wrap_concerns_check",
        ),
        DialogueStep::new(
            "wrap_concerns_check",
            Wrap,
            "Ask whether they have any final concerns or questions before closing.",
            |_| "wrap_close",
        )
        .with_collector(collect_concerns),
        DialogueStep::new(
            "wrap_close",
            Wrap,
            "Close with warmth and confidence. Leave them feeling capable and proud.",
            |_| TERMINAL_STEP,
        ),
        DialogueStep::new(
            TERMINAL_STEP,
            Wrap,
            "Session complete. No further interaction needed.",
            |_| TERMINAL_STEP,
        ),
    ]
}
