//! Deterministic tone post-processor.
//!
//! For every mandatory marker implied by a `high` directive and missing
//! from the text, a fixed canonical phrase is inserted once. Whitespace is
//! normalized before marker detection and again at the end, which makes
//! [`ToneReranker::rerank`] idempotent.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::tone::{Level, StyleDirectives};

pub const WARM_OPENER: &str = "I totally hear you — ";
pub const FIRMNESS_ANCHOR: &str = "Here's the part that matters.";
pub const EMPATHY_VALIDATION: &str = "What you're feeling makes sense.";
pub const CHEER_LINE: &str = "You've got real strengths here.";

static WARM_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)i totally hear you|i'm with you|this makes sense|totally hear you").unwrap()
});
static FIRMNESS_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)here's the part that matters|let's be honest|reality check").unwrap()
});
static EMPATHY_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)what you're feeling|makes sense|completely valid|i see why").unwrap()
});
static CHEER_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)this is (actually )?good news|you've got (real strengths|this)|we've got this|this is fixable",
    )
    .unwrap()
});

static DASH_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"—(?:\s*—)+").unwrap());
static PERIOD_SPACING: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.\s+").unwrap());
static MULTI_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").unwrap());

/// Which markers a tone check found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ToneMarkers {
    pub warm_opening: bool,
    pub firmness_anchor: bool,
    pub validation: bool,
    pub cheer: bool,
}

pub fn check_tone_markers(text: &str) -> ToneMarkers {
    ToneMarkers {
        warm_opening: WARM_MARKER.is_match(text),
        firmness_anchor: FIRMNESS_MARKER.is_match(text),
        validation: EMPATHY_MARKER.is_match(text),
        cheer: CHEER_MARKER.is_match(text),
    }
}

/// Collapse dash runs, sentence spacing and whitespace runs, then trim.
pub fn normalize_whitespace(text: &str) -> String {
    let text = DASH_RUN.replace_all(text, "—");
    let text = PERIOD_SPACING.replace_all(&text, ". ");
    let text = MULTI_SPACE.replace_all(&text, " ");
    text.trim().to_string()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ToneReranker;

impl ToneReranker {
    pub fn new() -> Self {
        Self
    }

    pub fn rerank(&self, text: &str, directives: &StyleDirectives) -> String {
        let mut output = normalize_whitespace(text);

        if directives.warmth == Level::High && !WARM_MARKER.is_match(&output) {
            output = format!("{WARM_OPENER}{output}");
        }

        if directives.firmness == Level::High && !FIRMNESS_MARKER.is_match(&output) {
            output.push(' ');
            output.push_str(FIRMNESS_ANCHOR);
        }

        if directives.empathy == Level::High && !EMPATHY_MARKER.is_match(&output) {
            match output.find('.') {
                Some(idx) if idx + 1 < output.len() => {
                    output.insert_str(idx + 1, &format!(" {EMPATHY_VALIDATION}"));
                }
                _ => {
                    output.push(' ');
                    output.push_str(EMPATHY_VALIDATION);
                }
            }
        }

        if directives.cheer == Level::High && !CHEER_MARKER.is_match(&output) {
            output.push(' ');
            output.push_str(CHEER_LINE);
        }

        normalize_whitespace(&output)
    }

    /// Human-readable list of what a rerank pass added.
    pub fn describe_changes(original: &str, reranked: &str) -> String {
        let before = check_tone_markers(original);
        let after = check_tone_markers(reranked);
        let mut changes = Vec::new();
        if !before.warm_opening && after.warm_opening {
            changes.push("added warm opening");
        }
        if !before.firmness_anchor && after.firmness_anchor {
            changes.push("added firmness anchor");
        }
        if !before.validation && after.validation {
            changes.push("added validation");
        }
        if !before.cheer && after.cheer {
            changes.push("added cheer");
        }
        if changes.is_empty() {
            "no changes applied".to_string()
        } else {
            changes.join(", ")
        }
    }
}
