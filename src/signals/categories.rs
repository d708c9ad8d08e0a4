//! EQ signal categories — the fixed enumeration the profile tracker counts.
//!
//! The enumeration order is significant: it is the tie-break order for the
//! profile's primary/secondary selection and the index order of the mood
//! table.

use serde::{Deserialize, Serialize};

/// Twelve discrete emotional/behavioral categories detected from text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EqSignal {
    Anxiety,
    Insecurity,
    Confusion,
    Overwhelm,
    Apathy,
    Eagerness,
    Confidence,
    Curiosity,
    Pride,
    Discipline,
    Frustration,
    Resistance,
}

/// Coarse grouping of a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    Negative,
    Positive,
    Neutral,
}

impl EqSignal {
    /// Number of categories.
    pub const COUNT: usize = 12;

    /// All categories in canonical enumeration order.
    pub const ALL: [EqSignal; 12] = [
        Self::Anxiety,
        Self::Insecurity,
        Self::Confusion,
        Self::Overwhelm,
        Self::Apathy,
        Self::Eagerness,
        Self::Confidence,
        Self::Curiosity,
        Self::Pride,
        Self::Discipline,
        Self::Frustration,
        Self::Resistance,
    ];

    /// Position in the canonical enumeration.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Upper-case wire name (`"ANXIETY"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Anxiety => "ANXIETY",
            Self::Insecurity => "INSECURITY",
            Self::Confusion => "CONFUSION",
            Self::Overwhelm => "OVERWHELM",
            Self::Apathy => "APATHY",
            Self::Eagerness => "EAGERNESS",
            Self::Confidence => "CONFIDENCE",
            Self::Curiosity => "CURIOSITY",
            Self::Pride => "PRIDE",
            Self::Discipline => "DISCIPLINE",
            Self::Frustration => "FRUSTRATION",
            Self::Resistance => "RESISTANCE",
        }
    }

    /// Parse a wire name, case-insensitively.
    pub fn parse(name: &str) -> Option<Self> {
        let upper = name.trim().to_ascii_uppercase();
        Self::ALL.into_iter().find(|s| s.as_str() == upper)
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Anxiety => "Anxious/Nervous",
            Self::Insecurity => "Insecure/Self-Doubt",
            Self::Confusion => "Confused/Uncertain",
            Self::Overwhelm => "Overwhelmed/Burnt Out",
            Self::Apathy => "Apathetic/Disengaged",
            Self::Eagerness => "Eager/Excited",
            Self::Confidence => "Confident/Self-Assured",
            Self::Curiosity => "Curious/Questioning",
            Self::Pride => "Proud/Accomplished",
            Self::Discipline => "Disciplined/Consistent",
            Self::Frustration => "Frustrated/Annoyed",
            Self::Resistance => "Resistant/Defiant",
        }
    }

    pub fn polarity(self) -> Polarity {
        match self {
            Self::Anxiety
            | Self::Insecurity
            | Self::Confusion
            | Self::Overwhelm
            | Self::Apathy
            | Self::Frustration
            | Self::Resistance => Polarity::Negative,
            Self::Eagerness | Self::Confidence | Self::Pride | Self::Discipline => {
                Polarity::Positive
            }
            Self::Curiosity => Polarity::Neutral,
        }
    }

    /// Whether this category calls for a high-warmth, high-empathy reply.
    pub fn needs_support(self) -> bool {
        matches!(
            self,
            Self::Anxiety | Self::Insecurity | Self::Overwhelm | Self::Frustration
        )
    }

    /// Whether this category tolerates more challenge and firmness.
    pub fn allows_challenge(self) -> bool {
        matches!(
            self,
            Self::Confidence | Self::Eagerness | Self::Discipline | Self::Pride
        )
    }

    /// Keyword phrases (lower case) that indicate this category.
    pub fn keywords(self) -> &'static [&'static str] {
        EQ_KEYWORDS[self.index()]
    }
}

impl std::fmt::Display for EqSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keyword table indexed by `EqSignal::index()`.
pub static EQ_KEYWORDS: [&[&str]; 12] = [
    // ANXIETY
    &[
        "nervous", "anxious", "worried", "scared", "afraid", "panic", "stress",
        "freaking out", "terrified",
    ],
    // INSECURITY
    &[
        "i'm not good enough", "not smart enough", "i can't do it", "others are better",
        "everyone else", "i'm behind", "not qualified", "don't deserve", "imposter",
    ],
    // CONFUSION
    &[
        "i don't get", "not sure", "confused", "don't understand", "unclear",
        "what does that mean", "lost", "how do i", "which one",
    ],
    // OVERWHELM
    &[
        "too much", "can't handle", "burnt out", "overwhelmed", "drowning",
        "can't keep up", "exhausted", "so much to do", "never ending",
    ],
    // APATHY
    &[
        "don't care", "whatever", "why bother", "doesn't matter", "who cares",
        "not motivated", "meh", "uninspired", "going through motions",
    ],
    // EAGERNESS
    &[
        "excited", "let's do it", "ready", "can't wait", "pumped", "motivated",
        "let's go", "bring it on", "i want to start",
    ],
    // CONFIDENCE
    &[
        "i can do this", "i feel good", "i got it", "i know i can", "i'm ready",
        "i'm capable", "i believe", "i'll succeed", "i'm strong",
    ],
    // CURIOSITY
    &[
        "why", "how does", "can you explain", "tell me more", "what if", "i wonder",
        "interested in", "want to learn", "what about",
    ],
    // PRIDE
    &[
        "i achieved", "i won", "i built", "i accomplished", "proud of", "i did it",
        "i finished", "i succeeded", "i completed",
    ],
    // DISCIPLINE
    &[
        "i followed", "i stayed consistent", "i stuck with", "i kept going",
        "i didn't give up", "i maintained", "i practiced", "i committed", "i held myself",
    ],
    // FRUSTRATION
    &[
        "annoyed", "this sucks", "not working", "fed up", "irritated", "sick of",
        "hate this", "so annoying", "pissed off",
    ],
    // RESISTANCE
    &[
        "i don't want", "i refuse", "stop telling me", "not doing that", "won't do it",
        "don't make me", "no way", "i'm not going to", "leave me alone",
    ],
];

/// Pairs of categories that contradict each other when detected together.
pub const CONFLICT_PAIRS: [(EqSignal, EqSignal); 4] = [
    (EqSignal::Confidence, EqSignal::Insecurity),
    (EqSignal::Eagerness, EqSignal::Apathy),
    (EqSignal::Discipline, EqSignal::Apathy),
    (EqSignal::Pride, EqSignal::Insecurity),
];

/// Whether the detected categories contain a contradictory pair.
pub fn has_conflicting_signals(signals: &[EqSignal]) -> bool {
    CONFLICT_PAIRS
        .iter()
        .any(|(a, b)| signals.contains(a) && signals.contains(b))
}

/// Keyword classification: every category whose keyword list matches,
/// at most once per category, in enumeration order.
pub fn classify_keywords(text: &str) -> Vec<EqSignal> {
    let normalized = text.to_lowercase();
    EqSignal::ALL
        .into_iter()
        .filter(|signal| signal.keywords().iter().any(|k| normalized.contains(k)))
        .collect()
}
