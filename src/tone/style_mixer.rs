//! Style directives: the mood vector bucketed into discrete levels.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::mood_vector::MoodVector;

/// Upper edge (inclusive) of the low/slow bucket.
pub const LOW_UPPER: f64 = 0.33;
/// Upper edge (inclusive) of the medium/normal bucket.
pub const MEDIUM_UPPER: f64 = 0.66;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pace {
    Slow,
    Normal,
    Fast,
}

impl Level {
    pub fn from_value(value: f64) -> Self {
        if value <= LOW_UPPER {
            Self::Low
        } else if value <= MEDIUM_UPPER {
            Self::Medium
        } else {
            Self::High
        }
    }

    pub fn rank(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl Pace {
    pub fn from_value(value: f64) -> Self {
        if value <= LOW_UPPER {
            Self::Slow
        } else if value <= MEDIUM_UPPER {
            Self::Normal
        } else {
            Self::Fast
        }
    }

    pub fn rank(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Slow => "slow",
            Self::Normal => "normal",
            Self::Fast => "fast",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Pace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Categorical delivery instructions attached to a generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleDirectives {
    pub warmth: Level,
    pub firmness: Level,
    pub pace: Pace,
    pub empathy: Level,
    pub cheer: Level,
    pub intensity: Level,
}

impl Default for StyleDirectives {
    /// Directives of the neutral mood vector.
    fn default() -> Self {
        mix_style(&MoodVector::NEUTRAL)
    }
}

/// Coarse label for a directive set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StyleArchetype {
    Supportive,
    Motivational,
    FirmCoach,
    Balanced,
}

/// Bucket every dimension of `mood`. Optimism has no directive.
pub fn mix_style(mood: &MoodVector) -> StyleDirectives {
    StyleDirectives {
        warmth: Level::from_value(mood.warmth),
        firmness: Level::from_value(mood.firmness),
        pace: Pace::from_value(mood.pace),
        empathy: Level::from_value(mood.empathy),
        cheer: Level::from_value(mood.cheer),
        intensity: Level::from_value(mood.intensity),
    }
}

impl StyleDirectives {
    /// Field names and rendered values in declaration order.
    pub fn fields(&self) -> [(&'static str, &'static str); 6] {
        [
            ("warmth", self.warmth.as_str()),
            ("firmness", self.firmness.as_str()),
            ("pace", self.pace.as_str()),
            ("empathy", self.empathy.as_str()),
            ("cheer", self.cheer.as_str()),
            ("intensity", self.intensity.as_str()),
        ]
    }

    pub fn summary(&self) -> String {
        let mut out = String::from("Style directives:");
        for (name, value) in self.fields() {
            out.push_str(&format!("\n  {name}: {value}"));
        }
        out
    }

    /// Names of the fields that differ from `other`, in declaration order.
    pub fn changed_fields(&self, other: &Self) -> Vec<&'static str> {
        self.fields()
            .iter()
            .zip(other.fields().iter())
            .filter(|(a, b)| a.1 != b.1)
            .map(|(a, _)| a.0)
            .collect()
    }

    pub fn dominant_traits(&self) -> Vec<&'static str> {
        let mut traits = Vec::new();
        if self.warmth == Level::High {
            traits.push("high warmth");
        }
        if self.firmness == Level::High {
            traits.push("high firmness");
        }
        if self.empathy == Level::High {
            traits.push("high empathy");
        }
        if self.cheer == Level::High {
            traits.push("high energy");
        }
        if self.intensity == Level::High {
            traits.push("high intensity");
        }
        match self.pace {
            Pace::Slow => traits.push("slow pace"),
            Pace::Fast => traits.push("fast pace"),
            Pace::Normal => {}
        }
        if self.warmth == Level::Low {
            traits.push("low warmth");
        }
        if self.firmness == Level::Low {
            traits.push("low firmness");
        }
        if self.intensity == Level::Low {
            traits.push("gentle intensity");
        }
        traits
    }

    pub fn archetype(&self) -> Option<StyleArchetype> {
        use Level::*;
        match (self.warmth, self.firmness, self.empathy, self.cheer, self.intensity, self.pace) {
            (High, _, High, _, _, Pace::Slow) => Some(StyleArchetype::Supportive),
            (_, _, _, High, High, Pace::Fast) => Some(StyleArchetype::Motivational),
            (Medium, High, _, _, High, _) => Some(StyleArchetype::FirmCoach),
            (Medium, Medium, _, _, _, Pace::Normal) => Some(StyleArchetype::Balanced),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::EqSignal;

    fn uniform(value: f64) -> MoodVector {
        MoodVector {
            warmth: value,
            firmness: value,
            optimism: value,
            pace: value,
            empathy: value,
            cheer: value,
            intensity: value,
        }
    }

    #[test]
    fn test_boundary_033_is_low_for_every_dimension() {
        let d = mix_style(&uniform(0.33));
        assert_eq!(d.pace, Pace::Slow);
        for (_, value) in d.fields().iter().filter(|(n, _)| *n != "pace") {
            assert_eq!(*value, "low");
        }
    }

    #[test]
    fn test_boundary_034_moves_up_for_every_dimension() {
        let d = mix_style(&uniform(0.34));
        assert_eq!(d.pace, Pace::Normal);
        for (_, value) in d.fields().iter().filter(|(n, _)| *n != "pace") {
            assert_eq!(*value, "medium");
        }
    }

    #[test]
    fn test_upper_boundary() {
        assert_eq!(Level::from_value(0.66), Level::Medium);
        assert_eq!(Level::from_value(0.67), Level::High);
        assert_eq!(Pace::from_value(0.66), Pace::Normal);
        assert_eq!(Pace::from_value(0.67), Pace::Fast);
        assert_eq!(Level::from_value(0.0), Level::Low);
        assert_eq!(Level::from_value(1.0), Level::High);
    }

    #[test]
    fn test_anxiety_row_is_supportive() {
        let d = mix_style(&MoodVector::for_signal(EqSignal::Overwhelm));
        assert_eq!(d.warmth, Level::High);
        assert_eq!(d.empathy, Level::High);
        assert_eq!(d.pace, Pace::Slow);
        assert_eq!(d.archetype(), Some(StyleArchetype::Supportive));
        assert!(d.dominant_traits().contains(&"slow pace"));
    }

    #[test]
    fn test_neutral_is_balanced_and_changed_fields() {
        let neutral = StyleDirectives::default();
        assert_eq!(neutral.archetype(), Some(StyleArchetype::Balanced));

        let pushed = StyleDirectives {
            firmness: Level::High,
            pace: Pace::Fast,
            ..neutral
        };
        assert_eq!(neutral.changed_fields(&pushed), vec!["firmness", "pace"]);
        assert!(neutral.changed_fields(&neutral).is_empty());
        assert!(pushed.summary().contains("firmness: high"));
    }

    #[test]
    fn test_serde_lowercase_levels() {
        let json = serde_json::to_value(StyleDirectives::default()).unwrap();
        assert_eq!(json["warmth"], "medium");
        assert_eq!(json["pace"], "normal");
    }
}
