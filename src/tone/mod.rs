//! Tone control: mood vector, style directives, tone instruction and the
//! signature phrase rubric.
//!
//! ```text
//! EqProfile ──► MoodVector ──► StyleDirectives ──► scorer / generator
//! EmotionalState + last reply ──► ToneInstruction ──► generator
//! ```

pub mod instruction;
pub mod mood_vector;
pub mod rubric;
pub mod style_mixer;

use serde::{Deserialize, Serialize};

use crate::emotion::{EmotionalState, EqProfile, EqProfileTracker};

pub use instruction::{detect_tone_violations, ToneInstruction};
pub use mood_vector::{
    compute_mood_vector, compute_mood_vector_with, BlendWeights, MoodVector, MOOD_TABLE,
    MOOD_TABLE_VERSION,
};
pub use style_mixer::{mix_style, Level, Pace, StyleArchetype, StyleDirectives};

/// Generation-facing tone metadata recomputed every turn.
///
/// Derived data only; never read back to drive dialogue transitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToneSnapshot {
    pub profile: EqProfile,
    pub mood: MoodVector,
    pub directives: StyleDirectives,
    pub instruction: ToneInstruction,
}

impl Default for ToneSnapshot {
    fn default() -> Self {
        Self::compute(
            &EmotionalState::default(),
            &EqProfileTracker::new(),
            "",
            BlendWeights::default(),
        )
    }
}

impl ToneSnapshot {
    /// Profile, then mood vector, then directives, in that order.
    pub fn compute(
        state: &EmotionalState,
        tracker: &EqProfileTracker,
        last_assistant_message: &str,
        blend: BlendWeights,
    ) -> Self {
        let profile = tracker.profile();
        let mood = compute_mood_vector_with(&profile, blend);
        let directives = mix_style(&mood);
        let instruction = ToneInstruction::derive(state, last_assistant_message);
        Self {
            profile,
            mood,
            directives,
            instruction,
        }
    }

    /// Combined prompt block (mood vector followed by tone instruction).
    pub fn format_for_prompt(&self) -> String {
        format!(
            "{}\n\n{}\n\n{}",
            self.mood.format_for_prompt(),
            self.directives.summary(),
            self.instruction.format_for_prompt()
        )
    }
}
