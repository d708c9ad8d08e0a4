//! Session-long EQ category counters and the derived profile.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::signals::EqSignal;

/// Snapshot derived from the tracker's counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EqProfile {
    pub primary: Option<EqSignal>,
    pub secondary: Option<EqSignal>,
    pub distribution: BTreeMap<EqSignal, u32>,
    pub total: u32,
    /// Primary count over total, in `[0, 1]`.
    pub dominance: f64,
}

impl EqProfile {
    /// Profile of a session with no recorded categories.
    pub fn empty() -> Self {
        EqProfileTracker::new().profile()
    }
}

/// Accumulates EQ category detections over a session.
///
/// Counters only ever grow until [`reset`](Self::reset). The tracker is
/// plain data and is persisted inside the session state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EqProfileTracker {
    counts: [u32; EqSignal::COUNT],
    total: u32,
}

impl EqProfileTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one detection per listed category.
    pub fn add_signals(&mut self, signals: &[EqSignal]) {
        for signal in signals {
            self.counts[signal.index()] = self.counts[signal.index()].saturating_add(1);
            self.total = self.total.saturating_add(1);
        }
        if !signals.is_empty() {
            log::debug!(
                "[EqProfileTracker] recorded {} signals, total {}",
                signals.len(),
                self.total
            );
        }
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn count(&self, signal: EqSignal) -> u32 {
        self.counts[signal.index()]
    }

    pub fn has_signal(&self, signal: EqSignal) -> bool {
        self.count(signal) > 0
    }

    /// Share of all detections, as a percentage in `[0, 100]`.
    pub fn percentage(&self, signal: EqSignal) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        f64::from(self.count(signal)) / f64::from(self.total) * 100.0
    }

    pub fn is_predominantly(&self, signal: EqSignal, threshold_pct: f64) -> bool {
        self.total > 0 && self.percentage(signal) >= threshold_pct
    }

    pub fn distribution(&self) -> BTreeMap<EqSignal, u32> {
        EqSignal::ALL
            .into_iter()
            .map(|s| (s, self.count(s)))
            .collect()
    }

    /// The `n` most frequent categories. Equal counts keep enumeration order.
    pub fn top_n(&self, n: usize) -> Vec<(EqSignal, u32)> {
        let mut entries: Vec<(EqSignal, u32)> = EqSignal::ALL
            .into_iter()
            .map(|s| (s, self.count(s)))
            .collect();
        // Stable sort keeps the enumeration order among ties.
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries.truncate(n);
        entries
    }

    /// Highest-count category other than `exclude`; first in enumeration
    /// order wins a tie.
    fn most_frequent(&self, exclude: Option<EqSignal>) -> Option<(EqSignal, u32)> {
        let mut best: Option<(EqSignal, u32)> = None;
        for signal in EqSignal::ALL {
            if Some(signal) == exclude {
                continue;
            }
            let count = self.count(signal);
            if best.map_or(true, |(_, c)| count > c) {
                best = Some((signal, count));
            }
        }
        best
    }

    pub fn profile(&self) -> EqProfile {
        let (primary, dominance) = if self.total == 0 {
            (None, 0.0)
        } else {
            match self.most_frequent(None) {
                Some((signal, count)) => {
                    (Some(signal), f64::from(count) / f64::from(self.total))
                }
                None => (None, 0.0),
            }
        };

        let secondary = primary.and_then(|p| {
            self.most_frequent(Some(p))
                .filter(|(_, count)| *count > 0)
                .map(|(s, _)| s)
        });

        EqProfile {
            primary,
            secondary,
            distribution: self.distribution(),
            total: self.total,
            dominance,
        }
    }

    pub fn summary(&self) -> String {
        let profile = self.profile();
        if profile.total == 0 {
            return "No EQ signals recorded yet.".to_string();
        }

        let mut lines = vec![
            "EQ Profile:".to_string(),
            format!("  Total signals: {}", profile.total),
            format!(
                "  Primary: {} ({:.0}% dominance)",
                profile.primary.map_or("None", EqSignal::as_str),
                profile.dominance * 100.0
            ),
            format!(
                "  Secondary: {}",
                profile.secondary.map_or("None", EqSignal::as_str)
            ),
            "  Top signals:".to_string(),
        ];
        for (signal, count) in self.top_n(5).into_iter().filter(|(_, c)| *c > 0) {
            lines.push(format!(
                "    {}: {} ({:.0}%)",
                signal,
                count,
                self.percentage(signal)
            ));
        }
        lines.join("\n")
    }

    pub fn reset(&mut self) {
        log::debug!("[EqProfileTracker] reset");
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_profile() {
        let profile = EqProfileTracker::new().profile();
        assert_eq!(profile.primary, None);
        assert_eq!(profile.secondary, None);
        assert_eq!(profile.total, 0);
        assert_eq!(profile.dominance, 0.0);
        assert_eq!(EqProfile::empty(), profile);
    }

    #[test]
    fn test_single_category_full_dominance() {
        let mut tracker = EqProfileTracker::new();
        tracker.add_signals(&[EqSignal::Curiosity]);
        tracker.add_signals(&[EqSignal::Curiosity]);
        let profile = tracker.profile();
        assert_eq!(profile.primary, Some(EqSignal::Curiosity));
        assert_eq!(profile.secondary, None);
        assert_eq!(profile.dominance, 1.0);
    }

    #[test]
    fn test_ties_break_in_enumeration_order() {
        let mut tracker = EqProfileTracker::new();
        // Insertion order deliberately reversed.
        tracker.add_signals(&[EqSignal::Resistance, EqSignal::Pride, EqSignal::Anxiety]);
        let profile = tracker.profile();
        assert_eq!(profile.primary, Some(EqSignal::Anxiety));
        assert_eq!(profile.secondary, Some(EqSignal::Pride));
        assert!((profile.dominance - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_counts_sum_to_total() {
        let mut tracker = EqProfileTracker::new();
        tracker.add_signals(&[EqSignal::Anxiety, EqSignal::Overwhelm]);
        tracker.add_signals(&[EqSignal::Anxiety]);
        tracker.add_signals(&[]);
        let profile = tracker.profile();
        assert_eq!(profile.distribution.values().sum::<u32>(), profile.total);
        assert_eq!(tracker.count(EqSignal::Anxiety), 2);
        assert!((tracker.percentage(EqSignal::Anxiety) - 66.666).abs() < 0.01);
        assert!(tracker.is_predominantly(EqSignal::Anxiety, 50.0));
        assert!(!tracker.is_predominantly(EqSignal::Overwhelm, 50.0));
        assert!(profile.dominance > 0.0 && profile.dominance < 1.0);
    }

    #[test]
    fn test_top_n_and_summary() {
        let mut tracker = EqProfileTracker::new();
        tracker.add_signals(&[EqSignal::Eagerness, EqSignal::Eagerness, EqSignal::Confusion]);
        let top = tracker.top_n(3);
        assert_eq!(top[0], (EqSignal::Eagerness, 2));
        assert_eq!(top[1], (EqSignal::Confusion, 1));
        assert_eq!(top[2], (EqSignal::Anxiety, 0));

        let summary = tracker.summary();
        assert!(summary.contains("Primary: EAGERNESS (67% dominance)"));
        assert!(summary.contains("Secondary: CONFUSION"));
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut tracker = EqProfileTracker::new();
        tracker.add_signals(&[EqSignal::Apathy]);
        tracker.reset();
        assert_eq!(tracker, EqProfileTracker::new());
        assert_eq!(tracker.summary(), "No EQ signals recorded yet.");
    }

    #[test]
    fn test_tracker_serde_roundtrip() {
        let mut tracker = EqProfileTracker::new();
        tracker.add_signals(&[EqSignal::Frustration, EqSignal::Discipline]);
        let json = serde_json::to_string(&tracker).unwrap();
        let restored: EqProfileTracker = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, tracker);
    }
}
