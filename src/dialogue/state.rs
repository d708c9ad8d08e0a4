//! Session state: the single carrier of everything that survives a turn.
//!
//! `SessionState` is plain serde data. The step catalog is code, so only the
//! current step *id* is persisted; resuming validates it against the catalog.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::catalog::{catalog, INITIAL_STEP, TERMINAL_STEP};
use crate::emotion::{EmotionalState, EqProfileTracker};
use crate::errors::{SessionError, ValidationError};
use crate::tone::ToneSnapshot;

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// Macro phase of a session. Always derived from the current step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Warmup,
    Diagnostic,
    DeepProbe,
    Narrative,
    Wrap,
}

impl Phase {
    pub const ALL: [Phase; 5] = [
        Phase::Warmup,
        Phase::Diagnostic,
        Phase::DeepProbe,
        Phase::Narrative,
        Phase::Wrap,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Warmup => "warmup",
            Phase::Diagnostic => "diagnostic",
            Phase::DeepProbe => "deep_probe",
            Phase::Narrative => "narrative",
            Phase::Wrap => "wrap",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == name)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Collected data
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Gpa {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weighted: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unweighted: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Academics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpa: Option<Gpa>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rigor_level: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ap_courses: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub favorite_subjects: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub weak_subjects: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub academic_challenges: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub years_involved: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours_per_week: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Extracurriculars {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub activities: Vec<Activity>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub leadership: Vec<String>,
    /// "deep specialist", "well-rounded" or "scattered".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Awards {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub academic: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ec: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub competitions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Personality {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub background: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identity: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passion: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub challenges: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fears: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excitements: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Narrative {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub thematic_hubs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub positioning: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub archetypes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub risks: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub opportunities: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollegePreferences {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interests: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deal_breakers: Vec<String>,
}

/// Structured answers extracted from the student's free text.
///
/// A partial record: a section is `None` until some collector first touches
/// it. Scalar fields are overwritten by later writes; list fields accumulate
/// without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectedData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub academics: Option<Academics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ecs: Option<Extracurriculars>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub awards: Option<Awards>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personality: Option<Personality>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative: Option<Narrative>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub red_flags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colleges: Option<CollegePreferences>,
}

impl CollectedData {
    pub fn academics(&mut self) -> &mut Academics {
        self.academics.get_or_insert_with(Academics::default)
    }

    pub fn ecs(&mut self) -> &mut Extracurriculars {
        self.ecs.get_or_insert_with(Extracurriculars::default)
    }

    pub fn awards(&mut self) -> &mut Awards {
        self.awards.get_or_insert_with(Awards::default)
    }

    pub fn personality(&mut self) -> &mut Personality {
        self.personality.get_or_insert_with(Personality::default)
    }

    pub fn narrative(&mut self) -> &mut Narrative {
        self.narrative.get_or_insert_with(Narrative::default)
    }

    pub fn colleges(&mut self) -> &mut CollegePreferences {
        self.colleges.get_or_insert_with(CollegePreferences::default)
    }

    /// `(section, present)` pairs for progress reporting.
    pub fn sections(&self) -> [(&'static str, bool); 5] {
        [
            ("Academics", self.academics.is_some()),
            ("ECs", self.ecs.is_some()),
            ("Awards", self.awards.is_some()),
            ("Personality", self.personality.is_some()),
            ("Narrative", self.narrative.is_some()),
        ]
    }
}

/// Append `value` unless an equal entry is already present.
pub fn push_unique(list: &mut Vec<String>, value: impl Into<String>) {
    let value = value.into();
    if !list.contains(&value) {
        list.push(value);
    }
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One history record with the dialogue position and emotional state at the
/// time it was written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub phase: Phase,
    pub step: String,
    pub emotional: EmotionalState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMetadata {
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coach_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    pub started_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Complete state of one coaching session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub phase: Phase,
    pub step_id: String,
    pub turn_count: u32,
    #[serde(default)]
    pub collected: CollectedData,
    pub emotional: EmotionalState,
    #[serde(default)]
    pub profile: EqProfileTracker,
    /// Generation-facing tone metadata from the latest turn.
    #[serde(default)]
    pub tone: ToneSnapshot,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    pub metadata: SessionMetadata,
}

impl SessionState {
    /// Fresh state at the catalog's initial step.
    pub fn new(session_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            phase: Phase::Warmup,
            step_id: INITIAL_STEP.to_string(),
            turn_count: 0,
            collected: CollectedData::default(),
            emotional: EmotionalState::default(),
            profile: EqProfileTracker::new(),
            tone: ToneSnapshot::default(),
            history: Vec::new(),
            metadata: SessionMetadata {
                session_id: session_id.into(),
                coach_id: None,
                student_id: None,
                started_at: now,
                last_updated_at: now,
            },
        }
    }

    pub fn session_id(&self) -> &str {
        &self.metadata.session_id
    }

    pub fn is_complete(&self) -> bool {
        self.step_id == TERMINAL_STEP
    }

    pub fn last_assistant_message(&self) -> Option<&str> {
        self.history
            .iter()
            .rev()
            .find(|entry| entry.role == Role::Assistant)
            .map(|entry| entry.text.as_str())
    }

    /// Record a delivered coach reply. Does not advance the dialogue.
    pub fn add_assistant_message(&mut self, text: impl Into<String>) {
        let now = Utc::now();
        self.history.push(HistoryEntry {
            role: Role::Assistant,
            text: text.into(),
            timestamp: now,
            phase: self.phase,
            step: self.step_id.clone(),
            emotional: self.emotional.clone(),
        });
        self.metadata.last_updated_at = now;
    }

    /// Position of the current step in catalog order, as a whole percentage.
    pub fn phase_progress(&self) -> u32 {
        let cat = catalog();
        match cat.position(&self.step_id) {
            Some(index) => ((index as f64 / cat.total_step_count() as f64) * 100.0).round() as u32,
            None => 0,
        }
    }

    /// Multi-line progress report for logs and operator views.
    pub fn progress_summary(&self) -> String {
        let mut lines = vec![
            "=== Session Progress ===".to_string(),
            format!("Phase: {} ({}%)", self.phase, self.phase_progress()),
            format!("Step: {}", self.step_id),
            format!("Turn Count: {}", self.turn_count),
            format!("Emotional State: {}", self.emotional.summary()),
            String::new(),
            "Data Collection:".to_string(),
        ];
        for (section, present) in self.collected.sections() {
            lines.push(format!("  {section}: {}", if present { "✓" } else { "○" }));
        }
        lines.join("\n")
    }

    /// Checks a deserialized or caller-built state against the catalog and
    /// the emotional bounds.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.emotional.validate()?;
        let Some(phase) = catalog().phase_of(&self.step_id) else {
            return Err(ValidationError::UnknownStep {
                step_id: self.step_id.clone(),
            });
        };
        if phase != self.phase {
            return Err(ValidationError::InvalidConfig {
                message: format!(
                    "phase {} does not match step {} (declared {phase})",
                    self.phase, self.step_id
                ),
            });
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, SessionError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Resume a paused session.
    pub fn from_json(json: &str) -> Result<Self, SessionError> {
        let state: Self = serde_json::from_str(json)?;
        state.validate()?;
        Ok(state)
    }
}
