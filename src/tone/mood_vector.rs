//! Mood vector: a continuous 7-D tone-control vector derived from the EQ
//! profile.
//!
//! ```text
//! primary   ──► MOOD_TABLE[primary]            (weight 1.0)
//! secondary ──► blend: p * 0.7 + s * 0.3       (only if present)
//! none      ──► MoodVector::NEUTRAL            (all 0.5)
//! ```

use serde::{Deserialize, Serialize};

use crate::emotion::EqProfile;
use crate::signals::EqSignal;

/// Version of [`MOOD_TABLE`]. Bump whenever a row changes.
pub const MOOD_TABLE_VERSION: &str = "4.0";

/// Default weight of the primary category's row in a blend.
pub const PRIMARY_BLEND_WEIGHT: f64 = 0.7;
/// Default weight of the secondary category's row in a blend.
pub const SECONDARY_BLEND_WEIGHT: f64 = 0.3;

/// Seven tone dimensions, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoodVector {
    pub warmth: f64,
    pub firmness: f64,
    pub optimism: f64,
    pub pace: f64,
    pub empathy: f64,
    pub cheer: f64,
    pub intensity: f64,
}

impl Default for MoodVector {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

const fn row(
    warmth: f64,
    firmness: f64,
    optimism: f64,
    pace: f64,
    empathy: f64,
    cheer: f64,
    intensity: f64,
) -> MoodVector {
    MoodVector {
        warmth,
        firmness,
        optimism,
        pace,
        empathy,
        cheer,
        intensity,
    }
}

/// Per-category tone rows, indexed by `EqSignal::index()`.
/// Columns: warmth, firmness, optimism, pace, empathy, cheer, intensity.
pub static MOOD_TABLE: [MoodVector; EqSignal::COUNT] = [
    row(0.90, 0.20, 0.50, 0.40, 0.90, 0.60, 0.30), // ANXIETY
    row(0.85, 0.30, 0.75, 0.50, 0.90, 0.70, 0.40), // INSECURITY
    row(0.80, 0.30, 0.60, 0.30, 0.80, 0.50, 0.40), // CONFUSION
    row(0.90, 0.25, 0.50, 0.30, 0.90, 0.50, 0.20), // OVERWHELM
    row(0.60, 0.60, 0.90, 0.60, 0.50, 0.80, 0.80), // APATHY
    row(0.60, 0.70, 0.80, 0.70, 0.50, 0.80, 0.70), // EAGERNESS
    row(0.50, 0.80, 0.80, 0.70, 0.40, 0.70, 0.80), // CONFIDENCE
    row(0.60, 0.50, 0.80, 0.55, 0.60, 0.70, 0.50), // CURIOSITY
    row(0.75, 0.60, 0.90, 0.50, 0.70, 0.90, 0.60), // PRIDE
    row(0.50, 0.90, 0.75, 0.70, 0.50, 0.65, 0.75), // DISCIPLINE
    row(0.70, 0.60, 0.65, 0.50, 0.70, 0.50, 0.70), // FRUSTRATION
    row(0.55, 0.90, 0.70, 0.60, 0.60, 0.50, 0.90), // RESISTANCE
];

/// Primary/secondary blend weights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlendWeights {
    pub primary: f64,
    pub secondary: f64,
}

impl Default for BlendWeights {
    fn default() -> Self {
        Self {
            primary: PRIMARY_BLEND_WEIGHT,
            secondary: SECONDARY_BLEND_WEIGHT,
        }
    }
}

impl MoodVector {
    pub const NEUTRAL: MoodVector = row(0.5, 0.5, 0.5, 0.5, 0.5, 0.5, 0.5);

    pub fn for_signal(signal: EqSignal) -> Self {
        MOOD_TABLE[signal.index()]
    }

    /// Named dimensions in declaration order.
    pub fn dimensions(&self) -> [(&'static str, f64); 7] {
        [
            ("warmth", self.warmth),
            ("firmness", self.firmness),
            ("optimism", self.optimism),
            ("pace", self.pace),
            ("empathy", self.empathy),
            ("cheer", self.cheer),
            ("intensity", self.intensity),
        ]
    }

    fn map2(&self, other: &Self, f: impl Fn(f64, f64) -> f64) -> Self {
        Self {
            warmth: f(self.warmth, other.warmth),
            firmness: f(self.firmness, other.firmness),
            optimism: f(self.optimism, other.optimism),
            pace: f(self.pace, other.pace),
            empathy: f(self.empathy, other.empathy),
            cheer: f(self.cheer, other.cheer),
            intensity: f(self.intensity, other.intensity),
        }
    }

    /// Dimension-wise difference `other - self`. Components lie in `[-1, 1]`.
    pub fn diff(&self, other: &Self) -> Self {
        self.map2(other, |a, b| b - a)
    }

    pub fn is_within_bounds(&self) -> bool {
        self.dimensions()
            .iter()
            .all(|(_, v)| (0.0..=1.0).contains(v))
    }

    /// Prompt block describing every dimension.
    pub fn format_for_prompt(&self) -> String {
        format!(
            "# MOOD VECTOR\n\
             Use this to calibrate your tone and pacing:\n\n\
             - Warmth: {:.2} ({})\n\
             - Firmness: {:.2} ({})\n\
             - Empathy: {:.2} ({})\n\
             - Pace: {:.2} ({})\n\
             - Cheer: {:.2} ({})\n\
             - Optimism: {:.2} ({})\n\
             - Intensity: {:.2} ({})\n\n\
             High warmth = more emotional support. High firmness = more direct. High pace = faster momentum.",
            self.warmth,
            describe_level(self.warmth),
            self.firmness,
            describe_level(self.firmness),
            self.empathy,
            describe_level(self.empathy),
            self.pace,
            describe_pace(self.pace),
            self.cheer,
            describe_level(self.cheer),
            self.optimism,
            describe_level(self.optimism),
            self.intensity,
            describe_level(self.intensity),
        )
    }
}

/// Compute the mood vector for a profile with the default blend weights.
pub fn compute_mood_vector(profile: &EqProfile) -> MoodVector {
    compute_mood_vector_with(profile, BlendWeights::default())
}

/// Compute the mood vector with explicit blend weights.
///
/// The weights are expected to be in `[0, 1]` and to sum to 1 so the
/// result remains a convex combination of table rows.
pub fn compute_mood_vector_with(profile: &EqProfile, weights: BlendWeights) -> MoodVector {
    let Some(primary) = profile.primary else {
        return MoodVector::NEUTRAL;
    };
    let base = MoodVector::for_signal(primary);
    let vector = match profile.secondary {
        Some(secondary) => base.map2(&MoodVector::for_signal(secondary), |p, s| {
            (p * weights.primary + s * weights.secondary).clamp(0.0, 1.0)
        }),
        None => base,
    };
    log::debug!(
        "[MoodVector] primary={} secondary={} warmth={:.2} firmness={:.2} empathy={:.2}",
        primary,
        profile.secondary.map_or("none", EqSignal::as_str),
        vector.warmth,
        vector.firmness,
        vector.empathy
    );
    vector
}

pub fn describe_level(value: f64) -> &'static str {
    if value < 0.3 {
        "Low"
    } else if value < 0.5 {
        "Moderate-Low"
    } else if value < 0.7 {
        "Moderate"
    } else if value < 0.9 {
        "Moderate-High"
    } else {
        "High"
    }
}

pub fn describe_pace(value: f64) -> &'static str {
    if value < 0.4 {
        "Slow/Careful"
    } else if value < 0.6 {
        "Moderate"
    } else {
        "Fast/Momentum"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emotion::EqProfileTracker;

    fn profile_of(signals: &[EqSignal]) -> EqProfile {
        let mut tracker = EqProfileTracker::new();
        tracker.add_signals(signals);
        tracker.profile()
    }

    #[test]
    fn test_empty_profile_is_neutral() {
        assert_eq!(compute_mood_vector(&EqProfile::empty()), MoodVector::NEUTRAL);
    }

    #[test]
    fn test_primary_only_uses_table_row() {
        let vector = compute_mood_vector(&profile_of(&[EqSignal::Anxiety]));
        assert_eq!(vector, MOOD_TABLE[0]);
    }

    #[test]
    fn test_primary_secondary_blend() {
        let vector = compute_mood_vector(&profile_of(&[
            EqSignal::Anxiety,
            EqSignal::Anxiety,
            EqSignal::Confidence,
        ]));
        assert!((vector.warmth - (0.9 * 0.7 + 0.5 * 0.3)).abs() < 1e-9);
        assert!((vector.firmness - (0.2 * 0.7 + 0.8 * 0.3)).abs() < 1e-9);
    }

    #[test]
    fn test_every_pair_stays_in_bounds() {
        for a in EqSignal::ALL {
            assert!(MoodVector::for_signal(a).is_within_bounds());
            for b in EqSignal::ALL {
                if a == b {
                    continue;
                }
                let vector = compute_mood_vector(&profile_of(&[a, a, b]));
                assert!(vector.is_within_bounds(), "{a}+{b} out of bounds");
            }
        }
    }

    #[test]
    fn test_diff_and_descriptions() {
        let calm = MoodVector::for_signal(EqSignal::Overwhelm);
        let push = MoodVector::for_signal(EqSignal::Resistance);
        let delta = calm.diff(&push);
        assert!((delta.firmness - 0.65).abs() < 1e-9);
        assert!((delta.intensity - 0.7).abs() < 1e-9);

        assert_eq!(describe_level(0.1), "Low");
        assert_eq!(describe_level(0.5), "Moderate");
        assert_eq!(describe_level(0.95), "High");
        assert_eq!(describe_pace(0.3), "Slow/Careful");
        assert_eq!(describe_pace(0.7), "Fast/Momentum");
    }

    #[test]
    fn test_format_for_prompt_mentions_levels() {
        let text = MoodVector::for_signal(EqSignal::Anxiety).format_for_prompt();
        assert!(text.contains("- Warmth: 0.90 (High)"));
        assert!(text.contains("- Pace: 0.40 (Moderate)"));
    }
}
