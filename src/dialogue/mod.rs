//! The dialogue automaton: step catalog, collectors, session state,
//! orchestrator and transcript.
//!
//! Each student utterance walks exactly one step. A step optionally collects
//! structured answers from the utterance, then its transition function picks
//! the next step from the post-collection state. The phase is always derived
//! from the step, never set independently.

pub mod catalog;
pub mod collectors;
pub mod orchestrator;
pub mod state;
pub mod transcript;

pub use catalog::{
    catalog, steps_for_phase, total_step_count, DialogueStep, StepCatalog, INITIAL_STEP,
    TERMINAL_STEP,
};
pub use orchestrator::DialogueOrchestrator;
pub use state::{CollectedData, HistoryEntry, Phase, Role, SessionMetadata, SessionState};
pub use transcript::{build_transcript, Transcript, TranscriptEntry};
