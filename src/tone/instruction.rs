//! Tone instruction: generation-facing coaching guidance derived from the
//! emotional state, the accumulated behavioral patterns and drift markers
//! found in the coach's previous message.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::emotion::EmotionalState;
use crate::signals::PatternTag;

/// Messages longer than this (in chars) count as over-explaining.
pub const OVERLONG_MESSAGE_CHARS: usize = 500;
/// Messages longer than this with no empathy marker count as emotionless.
pub const EMOTIONLESS_MIN_CHARS: usize = 100;
/// Bullet count above which a reply counts as a long list.
pub const LONG_LIST_ITEMS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarmthMode {
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmpathyMode {
    Standard,
    Reflective,
    Validating,
    Gentle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pacing {
    Steady,
    Slower,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoachingStyle {
    Balanced,
    DeEscalate,
    ReinforceStrengths,
    SparkMomentum,
    EncourageOwnership,
    SimplifyDecision,
}

/// Things the next reply should not do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvoidRule {
    MinimizingConcern,
    DismissiveLanguage,
    OverwhelmingOptions,
    LongLists,
    TooManyOptions,
    TellingThemWhatToDo,
    RoboticPhrasing,
    AiSelfReference,
    AcademicTone,
    FormalTransitions,
    CorporateSpeak,
    OverExplaining,
    LongParagraphs,
    Lecturing,
    DirectiveLanguage,
    ReinforcingParentExpectations,
}

/// Things the next reply must contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MustInclude {
    AcknowledgeEmotion,
    ValidateConcern,
    SmallActionableStep,
    SimplifyNextStep,
    EmpowermentLanguage,
    ConversationalWarmth,
    CasualConnectors,
    EverydayLanguage,
    ShortReply,
    InvitationalLanguage,
    EmpathyMarker,
    StudentOwnVoice,
    CelebrateProgress,
    SafeSpace,
    NarrowOptions,
}

impl AvoidRule {
    pub fn label(self) -> &'static str {
        match self {
            Self::MinimizingConcern => "minimizing their concern",
            Self::DismissiveLanguage => "dismissive language",
            Self::OverwhelmingOptions => "overwhelming them with options",
            Self::LongLists => "giving long lists",
            Self::TooManyOptions => "introducing too many options",
            Self::TellingThemWhatToDo => "telling them what to do",
            Self::RoboticPhrasing => "robotic phrasing",
            Self::AiSelfReference => "AI self-reference",
            Self::AcademicTone => "academic tone",
            Self::FormalTransitions => "formal transitions",
            Self::CorporateSpeak => "corporate speak",
            Self::OverExplaining => "over-explaining",
            Self::LongParagraphs => "long paragraphs",
            Self::Lecturing => "lecturing",
            Self::DirectiveLanguage => "directive language",
            Self::ReinforcingParentExpectations => "reinforcing parent expectations",
        }
    }
}

impl MustInclude {
    pub fn label(self) -> &'static str {
        match self {
            Self::AcknowledgeEmotion => "acknowledge emotion",
            Self::ValidateConcern => "validate their concern",
            Self::SmallActionableStep => "suggest small actionable next step",
            Self::SimplifyNextStep => "simplify the next step",
            Self::EmpowermentLanguage => "use empowerment language",
            Self::ConversationalWarmth => "use conversational warmth",
            Self::CasualConnectors => "use casual connectors",
            Self::EverydayLanguage => "use everyday language",
            Self::ShortReply => "keep response under 3 sentences",
            Self::InvitationalLanguage => "use invitational language",
            Self::EmpathyMarker => "include empathy marker",
            Self::StudentOwnVoice => "validate student's own voice",
            Self::CelebrateProgress => "celebrate the progress",
            Self::SafeSpace => "create safe space for exploration",
            Self::NarrowOptions => "narrow down to 2 options max",
        }
    }
}

/// Coaching guidance for the next generated reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToneInstruction {
    pub warmth: WarmthMode,
    pub empathy: EmpathyMode,
    pub pacing: Pacing,
    pub coaching_style: CoachingStyle,
    pub avoid: Vec<AvoidRule>,
    pub must_include: Vec<MustInclude>,
}

impl Default for ToneInstruction {
    fn default() -> Self {
        Self::neutral()
    }
}

static ROBOTIC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(as an ai|i'm an ai|robot|synthetic|language model)\b").unwrap());
static ACADEMIC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(however|moreover|therefore|thus|consequently|furthermore)\b").unwrap()
});
static CORPORATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(leverage|synergy|optimize|utilize|facilitate|stakeholder)\b").unwrap()
});
static LECTURING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(you should|you need to|you must|it's important that you)\b").unwrap()
});
static EMPATHY_MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(feel|hear|understand|makes sense|get it|totally)\b").unwrap());
static BULLET_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-•]\s+").unwrap());

static ACKNOWLEDGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(feel|hear you|understand|makes sense|get it|i see)\b").unwrap());
static VALIDATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(valid|makes sense|understand|get it|that's real)\b").unwrap());
static WARMTH_MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(feel|totally|yeah|i hear you|makes sense|get it)\b").unwrap());
static NEXT_STEP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(next step|try|could you|how about|what if you)\b").unwrap());
static CELEBRATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(awesome|great|nice|love|proud|progress|win)\b").unwrap());

fn push_unique<T: PartialEq>(items: &mut Vec<T>, item: T) {
    if !items.contains(&item) {
        items.push(item);
    }
}

impl ToneInstruction {
    pub fn neutral() -> Self {
        Self {
            warmth: WarmthMode::Medium,
            empathy: EmpathyMode::Standard,
            pacing: Pacing::Steady,
            coaching_style: CoachingStyle::Balanced,
            avoid: Vec::new(),
            must_include: Vec::new(),
        }
    }

    fn avoid(&mut self, rule: AvoidRule) {
        push_unique(&mut self.avoid, rule);
    }

    fn include(&mut self, rule: MustInclude) {
        push_unique(&mut self.must_include, rule);
    }

    /// Derive guidance for the next reply.
    ///
    /// Rules apply in a fixed order; later rules may overwrite the scalar
    /// fields set by earlier ones, while avoid/must-include lists only grow.
    pub fn derive(state: &EmotionalState, last_assistant_message: &str) -> Self {
        let mut out = Self::neutral();

        if state.frustration >= 3 {
            out.warmth = WarmthMode::High;
            out.empathy = EmpathyMode::Reflective;
            out.pacing = Pacing::Slower;
            out.coaching_style = CoachingStyle::DeEscalate;
            out.include(MustInclude::AcknowledgeEmotion);
            out.avoid(AvoidRule::MinimizingConcern);
        }
        if state.confidence <= 2 {
            out.warmth = WarmthMode::High;
            out.empathy = EmpathyMode::Validating;
            out.coaching_style = CoachingStyle::ReinforceStrengths;
            out.include(MustInclude::ValidateConcern);
            out.avoid(AvoidRule::DismissiveLanguage);
        }
        if state.motivation <= 2 {
            out.coaching_style = CoachingStyle::SparkMomentum;
            out.include(MustInclude::SmallActionableStep);
            out.avoid(AvoidRule::OverwhelmingOptions);
        }
        if state.overwhelm >= 3 {
            out.avoid(AvoidRule::LongLists);
            out.avoid(AvoidRule::TooManyOptions);
            out.pacing = Pacing::Slower;
            out.include(MustInclude::SimplifyNextStep);
        }
        if state.agency <= 2 {
            out.coaching_style = CoachingStyle::EncourageOwnership;
            out.include(MustInclude::EmpowermentLanguage);
            out.avoid(AvoidRule::TellingThemWhatToDo);
        }

        out.apply_drift_markers(last_assistant_message);
        out.apply_patterns(state);
        out
    }

    fn apply_drift_markers(&mut self, last: &str) {
        if ROBOTIC_RE.is_match(last) {
            self.avoid(AvoidRule::RoboticPhrasing);
            self.avoid(AvoidRule::AiSelfReference);
            self.include(MustInclude::ConversationalWarmth);
        }
        if ACADEMIC_RE.is_match(last) {
            self.avoid(AvoidRule::AcademicTone);
            self.avoid(AvoidRule::FormalTransitions);
            self.include(MustInclude::CasualConnectors);
        }
        if CORPORATE_RE.is_match(last) {
            self.avoid(AvoidRule::CorporateSpeak);
            self.include(MustInclude::EverydayLanguage);
        }
        let length = last.chars().count();
        if length > OVERLONG_MESSAGE_CHARS {
            self.avoid(AvoidRule::OverExplaining);
            self.avoid(AvoidRule::LongParagraphs);
            self.include(MustInclude::ShortReply);
        }
        if LECTURING_RE.is_match(last) {
            self.avoid(AvoidRule::Lecturing);
            self.avoid(AvoidRule::DirectiveLanguage);
            self.include(MustInclude::InvitationalLanguage);
        }
        if length > EMOTIONLESS_MIN_CHARS && !EMPATHY_MARKER_RE.is_match(last) {
            self.empathy = EmpathyMode::Validating;
            self.include(MustInclude::EmpathyMarker);
        }
    }

    fn apply_patterns(&mut self, state: &EmotionalState) {
        if state.has_pattern(PatternTag::ParentalPressureExpressed) {
            self.include(MustInclude::StudentOwnVoice);
            self.avoid(AvoidRule::ReinforcingParentExpectations);
        }
        if state.has_pattern(PatternTag::MicroWinCelebration) {
            self.include(MustInclude::CelebrateProgress);
            self.warmth = WarmthMode::High;
        }
        if state.has_pattern(PatternTag::AvoidanceOfDifficultTopics) {
            self.empathy = EmpathyMode::Gentle;
            self.pacing = Pacing::Slower;
            self.include(MustInclude::SafeSpace);
        }
        if state.has_pattern(PatternTag::AnalysisParalysis) {
            self.coaching_style = CoachingStyle::SimplifyDecision;
            self.include(MustInclude::NarrowOptions);
        }
    }

    /// Prompt block for the generator.
    pub fn format_for_prompt(&self) -> String {
        let mut lines = vec![
            "# TONE INSTRUCTION".to_string(),
            format!("- Warmth: {:?}", self.warmth),
            format!("- Empathy: {:?}", self.empathy),
            format!("- Pacing: {:?}", self.pacing),
            format!("- Coaching style: {:?}", self.coaching_style),
        ];
        if !self.must_include.is_empty() {
            let items: Vec<&str> = self.must_include.iter().map(|m| m.label()).collect();
            lines.push(format!("- Must include: {}", items.join("; ")));
        }
        if !self.avoid.is_empty() {
            let items: Vec<&str> = self.avoid.iter().map(|a| a.label()).collect();
            lines.push(format!("- Avoid: {}", items.join("; ")));
        }
        lines.join("\n")
    }
}

/// Check a reply against an instruction's avoid and must-include rules.
///
/// Only rules with a text-detectable form are checked; the rest are
/// advisory for the generator.
pub fn detect_tone_violations(message: &str, instruction: &ToneInstruction) -> Vec<String> {
    let mut violations = Vec::new();
    let length = message.chars().count();

    for rule in &instruction.avoid {
        let hit = match rule {
            AvoidRule::RoboticPhrasing | AvoidRule::AiSelfReference => ROBOTIC_RE.is_match(message),
            AvoidRule::AcademicTone | AvoidRule::FormalTransitions => ACADEMIC_RE.is_match(message),
            AvoidRule::CorporateSpeak => CORPORATE_RE.is_match(message),
            AvoidRule::Lecturing | AvoidRule::DirectiveLanguage => LECTURING_RE.is_match(message),
            AvoidRule::OverExplaining | AvoidRule::LongParagraphs => {
                if length > OVERLONG_MESSAGE_CHARS {
                    violations.push(format!("Message too long ({length} chars)"));
                }
                false
            }
            AvoidRule::LongLists => {
                let items = BULLET_RE.find_iter(message).count();
                if items > LONG_LIST_ITEMS {
                    violations.push(format!("List too long ({items} items)"));
                }
                false
            }
            _ => false,
        };
        if hit {
            violations.push(format!("Contains {}", rule.label()));
        }
    }

    for rule in &instruction.must_include {
        let pattern: Option<&Regex> = match rule {
            MustInclude::AcknowledgeEmotion => Some(&*ACKNOWLEDGE_RE),
            MustInclude::ValidateConcern => Some(&*VALIDATE_RE),
            MustInclude::ConversationalWarmth | MustInclude::EmpathyMarker => {
                Some(&*WARMTH_MARKER_RE)
            }
            MustInclude::SmallActionableStep => Some(&*NEXT_STEP_RE),
            MustInclude::CelebrateProgress => Some(&*CELEBRATE_RE),
            _ => None,
        };
        if let Some(re) = pattern {
            if !re.is_match(message) {
                violations.push(format!("Missing: {}", rule.label()));
            }
        }
    }

    violations
}
