//! Transcript sink: an ordered, cleaned view of a session's history.
//!
//! Building a transcript never touches the filesystem. Exporters (Markdown,
//! JSON lines, documents) consume the serde form.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::state::{Phase, Role, SessionState};
use crate::emotion::EmotionalState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Student,
    Coach,
}

impl From<Role> for Speaker {
    fn from(role: Role) -> Self {
        match role {
            Role::User => Speaker::Student,
            Role::Assistant => Speaker::Coach,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub speaker: Speaker,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub phase: Phase,
    pub step: String,
    pub emotional: EmotionalState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptMetadata {
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub total_turns: usize,
    pub student_turns: usize,
    pub coach_turns: usize,
    pub duration_minutes: i64,
    pub final_phase: Phase,
    pub final_step: String,
    pub completed: bool,
    pub themes: Vec<String>,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub session_id: String,
    pub coach_id: String,
    pub student_id: String,
    pub metadata: TranscriptMetadata,
    pub entries: Vec<TranscriptEntry>,
}

static CODE_FENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```(?:json|typescript|javascript|rust)?").expect("static regex"));
static ROLE_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"</?(?:system|assistant|user)>").expect("static regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));

/// Strip code fences and role tags, collapse whitespace.
pub fn clean_text(text: &str) -> String {
    let text = CODE_FENCE_RE.replace_all(text, "");
    let text = ROLE_TAG_RE.replace_all(&text, "");
    WHITESPACE_RE.replace_all(&text, " ").trim().to_string()
}

const THEMES: &[(&str, &[&str])] = &[
    ("research interest", &["research", "lab", "paper", "publication"]),
    ("leadership", &["leader", "president", "captain", "founded"]),
    ("service orientation", &["volunteer", "community service", "non-profit", "outreach"]),
    ("activity involvement", &["club", "team", "activity", "extracurricular"]),
    ("academic passion", &["love", "passionate", "fascinated", "obsessed"]),
    ("college anxiety", &["worried", "anxious", "stressed", "overwhelmed"]),
    ("family expectations", &["parents want", "family pressure", "expected to"]),
    ("identity exploration", &["immigrant", "first-gen", "background", "identity"]),
];

/// Session themes by keyword presence anywhere in the conversation.
pub fn extract_themes<'a>(texts: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let all = texts
        .into_iter()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ");
    THEMES
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|k| all.contains(k)))
        .map(|(theme, _)| theme.to_string())
        .collect()
}

/// Build the transcript for `state`. Ids missing from both the arguments
/// and the session metadata are reported as `"unknown"`.
pub fn build_transcript(
    state: &SessionState,
    coach_id: Option<&str>,
    student_id: Option<&str>,
) -> Transcript {
    let entries: Vec<TranscriptEntry> = state
        .history
        .iter()
        .map(|h| TranscriptEntry {
            speaker: h.role.into(),
            text: clean_text(&h.text),
            timestamp: h.timestamp,
            phase: h.phase,
            step: h.step.clone(),
            emotional: h.emotional.clone(),
        })
        .collect();

    let started_at = entries
        .first()
        .map_or(state.metadata.started_at, |e| e.timestamp);
    let ended_at = entries.last().map_or(started_at, |e| e.timestamp);
    let duration_minutes = ((ended_at - started_at).num_seconds() as f64 / 60.0)
        .round()
        .max(0.0) as i64;

    let student_turns = entries
        .iter()
        .filter(|e| e.speaker == Speaker::Student)
        .count();
    let coach_turns = entries.len() - student_turns;
    let themes = extract_themes(entries.iter().map(|e| e.text.as_str()));

    let mut summary = format!(
        "This session included {} total turns. Student spoke {student_turns} times; coach spoke {coach_turns} times.",
        entries.len()
    );
    if themes.is_empty() {
        summary.push_str(" Session focused on initial rapport-building and diagnostic intake.");
    } else {
        summary.push_str(&format!(" Key themes: {}.", themes.join(", ")));
    }

    log::debug!(
        "[Transcript] built {} entries for session {}",
        entries.len(),
        state.session_id()
    );

    let pick = |arg: Option<&str>, meta: &Option<String>| {
        arg.map(str::to_string)
            .or_else(|| meta.clone())
            .unwrap_or_else(|| "unknown".to_string())
    };

    Transcript {
        session_id: state.session_id().to_string(),
        coach_id: pick(coach_id, &state.metadata.coach_id),
        student_id: pick(student_id, &state.metadata.student_id),
        metadata: TranscriptMetadata {
            started_at,
            ended_at,
            total_turns: entries.len(),
            student_turns,
            coach_turns,
            duration_minutes,
            final_phase: state.phase,
            final_step: state.step_id.clone(),
            completed: state.is_complete(),
            themes,
            summary,
        },
        entries,
    }
}
