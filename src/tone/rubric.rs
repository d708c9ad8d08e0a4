//! The coach's signature phrase rubric.
//!
//! Read-only phrase lists used by the quality scorer's signature detector
//! and by prompt builders that want a few canonical examples.

use serde::{Deserialize, Serialize};

/// Phrase groups of the coaching voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RubricCategory {
    Openings,
    Validations,
    PacingCues,
    MicroEncouragements,
    FirmnessPatterns,
    Reframes,
    Closures,
}

impl RubricCategory {
    pub const ALL: [RubricCategory; 7] = [
        Self::Openings,
        Self::Validations,
        Self::PacingCues,
        Self::MicroEncouragements,
        Self::FirmnessPatterns,
        Self::Reframes,
        Self::Closures,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Openings => "openings",
            Self::Validations => "validations",
            Self::PacingCues => "pacing_cues",
            Self::MicroEncouragements => "micro_encouragements",
            Self::FirmnessPatterns => "firmness_patterns",
            Self::Reframes => "reframes",
            Self::Closures => "closures",
        }
    }

    pub fn phrases(self) -> &'static [&'static str] {
        match self {
            Self::Openings => OPENINGS,
            Self::Validations => VALIDATIONS,
            Self::PacingCues => PACING_CUES,
            Self::MicroEncouragements => MICRO_ENCOURAGEMENTS,
            Self::FirmnessPatterns => FIRMNESS_PATTERNS,
            Self::Reframes => REFRAMES,
            Self::Closures => CLOSURES,
        }
    }
}

pub const OPENINGS: &[&str] = &[
    "Totally hear you on this.",
    "I'm with you.",
    "This actually makes a lot of sense.",
    "Let's unpack this together.",
    "Okay, let's talk through this.",
    "I get where you're coming from.",
    "Real talk:",
    "Here's what I'm seeing:",
    "Let's dig into this.",
    "Alright, here's the thing:",
];

pub const VALIDATIONS: &[&str] = &[
    "What you're feeling is completely valid.",
    "It's okay to feel this way.",
    "Many strong students feel exactly this at this stage.",
    "This is a normal reaction to a hard process.",
    "Your instincts here aren't wrong.",
    "I see why this is weighing on you.",
    "This makes sense given where you are.",
    "You're not the only one who struggles with this.",
    "It's human to feel stuck here.",
];

pub const PACING_CUES: &[&str] = &[
    "Let's slow it down for a sec.",
    "Here's the part that matters most:",
    "Zooming out for a moment…",
    "One small thing to clarify:",
    "Let me break this down:",
    "First things first:",
    "Here's the simpler version:",
    "The core question is:",
    "Let's focus on just one piece:",
    "Quick clarification before we move forward:",
];

pub const MICRO_ENCOURAGEMENTS: &[&str] = &[
    "You've got real strengths here.",
    "This is actually a great starting point.",
    "You're already ahead in key ways.",
    "You're doing the right work.",
    "This shows good instincts.",
    "You're asking the right questions.",
    "This is solid thinking.",
    "You're further along than you realize.",
    "This is the hard part - you're doing it.",
    "You're building something real here.",
];

pub const FIRMNESS_PATTERNS: &[&str] = &[
    "I want to challenge you on one thing.",
    "Let's be honest with ourselves here.",
    "A quick reality check:",
    "This part is non-negotiable.",
    "Here's what we can't ignore:",
    "I'm going to push back a bit:",
    "We need to name this clearly:",
    "Let's not sugarcoat it:",
    "This is where we have to be disciplined.",
    "I need you to hear this:",
];

pub const REFRAMES: &[&str] = &[
    "Here's a different way to see it:",
    "Let's try a simpler framing:",
    "The unlock here is:",
    "What if we looked at it like this:",
    "Here's the reframe:",
    "The real question is:",
    "Let me offer another lens:",
    "Think of it this way:",
    "What you're actually dealing with is:",
    "The pattern I'm seeing is:",
];

pub const CLOSURES: &[&str] = &[
    "Let's take this one step at a time.",
    "We'll keep shaping this as we go.",
    "You're not doing this alone.",
    "This is the work for now.",
    "We've got a path forward.",
    "Let's start here and build.",
    "We're going to figure this out together.",
    "You know what to do next.",
    "This is how we move forward.",
    "Let's keep momentum on this.",
];

/// Every rubric phrase, lower-cased, for substring matching.
pub fn lowercase_phrases() -> impl Iterator<Item = String> {
    RubricCategory::ALL
        .into_iter()
        .flat_map(|c| c.phrases().iter())
        .map(|p| p.to_lowercase())
}

/// The first `count` phrases of a category, in table order.
pub fn examples(category: RubricCategory, count: usize) -> &'static [&'static str] {
    let phrases = category.phrases();
    &phrases[..count.min(phrases.len())]
}

/// Categories holding fewer than `min_count` phrases.
pub fn incomplete_categories(min_count: usize) -> Vec<RubricCategory> {
    RubricCategory::ALL
        .into_iter()
        .filter(|c| c.phrases().len() < min_count)
        .collect()
}

pub fn summary() -> String {
    let mut lines = vec!["Tone rubric:".to_string()];
    for category in RubricCategory::ALL {
        lines.push(format!(
            "  {}: {} patterns",
            category.as_str(),
            category.phrases().len()
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rubric_is_complete() {
        assert!(incomplete_categories(5).is_empty());
        assert_eq!(lowercase_phrases().count(), 69);
    }

    #[test]
    fn test_examples_are_bounded() {
        assert_eq!(examples(RubricCategory::Openings, 3).len(), 3);
        assert_eq!(examples(RubricCategory::Validations, 100).len(), 9);
        assert!(summary().contains("closures: 10 patterns"));
    }
}
