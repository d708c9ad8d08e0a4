//! The five bounded session-level mood counters.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;
use crate::signals::{PatternTag, SignalDelta};

/// Upper bound of every emotional-state field.
pub const STATE_MAX: u8 = 5;

/// Session-level emotional state. Every field stays within `[0, STATE_MAX]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmotionalState {
    pub frustration: u8,
    pub confidence: u8,
    pub overwhelm: u8,
    pub motivation: u8,
    pub agency: u8,
    /// Accumulated behavioral patterns (set semantics).
    #[serde(default)]
    pub patterns: BTreeSet<PatternTag>,
}

impl Default for EmotionalState {
    fn default() -> Self {
        Self {
            frustration: 0,
            confidence: 3,
            overwhelm: 0,
            motivation: 3,
            agency: 3,
            patterns: BTreeSet::new(),
        }
    }
}

fn clamped_add(current: u8, delta: i8) -> u8 {
    (i16::from(current) + i16::from(delta)).clamp(0, i16::from(STATE_MAX)) as u8
}

impl EmotionalState {
    pub fn fields(&self) -> [(&'static str, u8); 5] {
        [
            ("frustration", self.frustration),
            ("confidence", self.confidence),
            ("overwhelm", self.overwhelm),
            ("motivation", self.motivation),
            ("agency", self.agency),
        ]
    }

    /// Reject a state with any field above `STATE_MAX`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in self.fields() {
            if value > STATE_MAX {
                return Err(ValidationError::StateOutOfRange { field, value });
            }
        }
        Ok(())
    }

    /// Apply one turn's delta by clamped addition and union its patterns.
    ///
    /// The delta is validated first; an out-of-range component is a
    /// producer-side error and leaves `self` unchanged.
    pub fn apply(&self, delta: &SignalDelta) -> Result<Self, ValidationError> {
        delta.validate()?;
        let mut next = self.clone();
        next.frustration = clamped_add(self.frustration, delta.frustration);
        next.confidence = clamped_add(self.confidence, delta.confidence);
        next.overwhelm = clamped_add(self.overwhelm, delta.overwhelm);
        next.motivation = clamped_add(self.motivation, delta.motivation);
        next.agency = clamped_add(self.agency, delta.agency);
        next.patterns.extend(delta.patterns.iter().copied());
        Ok(next)
    }

    pub fn has_pattern(&self, tag: PatternTag) -> bool {
        self.patterns.contains(&tag)
    }

    /// One-line rendering for logs and transcripts.
    pub fn summary(&self) -> String {
        format!(
            "frustration {}/5, confidence {}/5, overwhelm {}/5, motivation {}/5, agency {}/5",
            self.frustration, self.confidence, self.overwhelm, self.motivation, self.agency
        )
    }
}
