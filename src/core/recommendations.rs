//! Recommendation selection from a mental state estimate.
//!
//! Rules fire independently and their catalog entries are concatenated, so a single window can
//! produce stress, focus and sleepiness advice at once. The combined list is stably sorted by
//! priority (1 = most urgent).

use crate::core::classifier::MentalState;
use serde::{Deserialize, Serialize};

/// Kind of intervention being recommended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    /// Audio entrainment at a target frequency
    BinauralBeats,
    Meditation,
    Break,
    Breathing,
}

/// A single recommendation. Built fresh for every window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(rename = "type")]
    pub kind: RecommendationKind,
    /// Target frequency, only set for binaural beats
    pub frequency_hz: Option<f64>,
    pub duration_minutes: u32,
    pub title: String,
    pub description: String,
    /// 1 = highest
    pub priority: u8,
}

impl Recommendation {
    fn binaural(
        frequency_hz: f64,
        duration_minutes: u32,
        title: &str,
        description: &str,
        priority: u8,
    ) -> Self {
        Self {
            kind: RecommendationKind::BinauralBeats,
            frequency_hz: Some(frequency_hz),
            duration_minutes,
            title: title.to_string(),
            description: description.to_string(),
            priority,
        }
    }

    fn activity(
        kind: RecommendationKind,
        duration_minutes: u32,
        title: &str,
        description: &str,
        priority: u8,
    ) -> Self {
        Self {
            kind,
            frequency_hz: None,
            duration_minutes,
            title: title.to_string(),
            description: description.to_string(),
            priority,
        }
    }
}

/// Level thresholds for the selection rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// Stress strictly above this triggers the stress set
    pub high_stress_threshold: u8,
    /// Focus strictly below this triggers the focus set
    pub low_focus_threshold: u8,
    /// Sleepiness strictly above this triggers the sleepiness set
    pub high_sleepiness_threshold: u8,
    /// Upper focus bound of the steady state
    pub steady_focus_max: u8,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            high_stress_threshold: 60,
            low_focus_threshold: 40,
            high_sleepiness_threshold: 70,
            steady_focus_max: 70,
        }
    }
}

/// Threshold-driven recommendation selector.
#[derive(Debug, Clone, Default)]
pub struct RecommendationEngine {
    config: SelectorConfig,
}

impl RecommendationEngine {
    pub fn new(config: SelectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    /// Select recommendations for a state, ordered by ascending priority.
    pub fn select(&self, state: &MentalState) -> Vec<Recommendation> {
        let cfg = &self.config;
        let high_stress = state.stress_level > cfg.high_stress_threshold;
        let low_focus = state.focus_level < cfg.low_focus_threshold;
        let high_sleepiness = state.sleepiness_level > cfg.high_sleepiness_threshold;

        let mut recommendations = Vec::new();
        if high_stress {
            recommendations.extend(stress_set());
        }
        if low_focus {
            recommendations.extend(focus_set());
        }
        if high_sleepiness {
            recommendations.extend(sleepiness_set());
        }

        let steady = (cfg.low_focus_threshold..=cfg.steady_focus_max).contains(&state.focus_level)
            && !high_stress
            && !high_sleepiness;
        if steady {
            recommendations.extend(maintenance_set());
        }

        // sort_by_key is stable: catalog order survives on ties
        recommendations.sort_by_key(|r| r.priority);
        recommendations
    }
}

fn stress_set() -> Vec<Recommendation> {
    vec![
        Recommendation::binaural(
            10.0,
            10,
            "Alpha Waves - Stress Relief",
            "10 Hz alpha entrainment to support deep relaxation. Best with headphones.",
            1,
        ),
        Recommendation::activity(
            RecommendationKind::Breathing,
            5,
            "4-7-8 Breathing",
            "Inhale through the nose for 4 seconds, hold for 7, exhale through the mouth for 8. \
             Repeat four times.",
            1,
        ),
        Recommendation::activity(
            RecommendationKind::Meditation,
            10,
            "Body Scan Meditation",
            "Move your attention through each part of the body in turn and release tension.",
            2,
        ),
    ]
}

fn focus_set() -> Vec<Recommendation> {
    vec![
        Recommendation::binaural(
            20.0,
            15,
            "Beta Waves - Concentration",
            "20 Hz beta entrainment to support focus. Can play in the background while working.",
            1,
        ),
        Recommendation::activity(
            RecommendationKind::Break,
            5,
            "Short Break",
            "Stand up, stretch and drink some water for 5 minutes. \
             Pomodoro: 25 minutes of work, 5 minutes of rest.",
            2,
        ),
    ]
}

fn sleepiness_set() -> Vec<Recommendation> {
    vec![
        Recommendation::activity(
            RecommendationKind::Break,
            10,
            "Energy Break",
            "Take a short walk or do light stretches. Some daylight outside helps.",
            1,
        ),
        Recommendation::binaural(
            15.0,
            10,
            "Alertness Boost",
            "15 Hz entrainment to support wakefulness.",
            2,
        ),
        Recommendation::activity(
            RecommendationKind::Breathing,
            3,
            "Bellows Breath",
            "Fast, deep breathing for 30 seconds followed by 30 seconds of normal breathing.",
            2,
        ),
    ]
}

fn maintenance_set() -> Vec<Recommendation> {
    vec![Recommendation::activity(
        RecommendationKind::Meditation,
        5,
        "Mindful Moment",
        "A short awareness exercise to refresh the mind.",
        3,
    )]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(stress: u8, focus: u8, sleepiness: u8) -> MentalState {
        MentalState {
            stress_level: stress,
            focus_level: focus,
            sleepiness_level: sleepiness,
            confidence: 0.9,
        }
    }

    fn kinds(recs: &[Recommendation]) -> Vec<(RecommendationKind, u8)> {
        recs.iter().map(|r| (r.kind, r.priority)).collect()
    }

    #[test]
    fn test_high_stress() {
        let engine = RecommendationEngine::default();
        let recs = engine.select(&state(85, 50, 30));

        assert_eq!(
            kinds(&recs),
            vec![
                (RecommendationKind::BinauralBeats, 1),
                (RecommendationKind::Breathing, 1),
                (RecommendationKind::Meditation, 2),
            ]
        );
        assert_eq!(recs[0].frequency_hz, Some(10.0));
        assert_eq!(recs[1].frequency_hz, None);
    }

    #[test]
    fn test_low_focus() {
        let engine = RecommendationEngine::default();
        let recs = engine.select(&state(30, 25, 20));

        assert_eq!(
            kinds(&recs),
            vec![
                (RecommendationKind::BinauralBeats, 1),
                (RecommendationKind::Break, 2),
            ]
        );
        assert_eq!(recs[0].frequency_hz, Some(20.0));
    }

    #[test]
    fn test_high_sleepiness() {
        let engine = RecommendationEngine::default();
        let recs = engine.select(&state(20, 40, 85));

        assert_eq!(
            kinds(&recs),
            vec![
                (RecommendationKind::Break, 1),
                (RecommendationKind::BinauralBeats, 2),
                (RecommendationKind::Breathing, 2),
            ]
        );
        assert_eq!(recs[1].frequency_hz, Some(15.0));
    }

    #[test]
    fn test_steady_state() {
        let engine = RecommendationEngine::default();
        let recs = engine.select(&state(35, 60, 30));

        assert_eq!(kinds(&recs), vec![(RecommendationKind::Meditation, 3)]);
    }

    #[test]
    fn test_steady_state_boundaries_inclusive() {
        let engine = RecommendationEngine::default();
        assert_eq!(engine.select(&state(60, 40, 70)).len(), 1);
        assert_eq!(engine.select(&state(60, 70, 70)).len(), 1);
    }

    #[test]
    fn test_high_focus_calm_gets_nothing() {
        let engine = RecommendationEngine::default();
        assert!(engine.select(&state(30, 90, 20)).is_empty());
    }

    #[test]
    fn test_combined_rules_sorted_stably() {
        let engine = RecommendationEngine::default();
        let recs = engine.select(&state(90, 10, 90));

        assert_eq!(recs.len(), 8);
        assert!(recs.windows(2).all(|w| w[0].priority <= w[1].priority));

        let titles: Vec<&str> = recs.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Alpha Waves - Stress Relief",
                "4-7-8 Breathing",
                "Beta Waves - Concentration",
                "Energy Break",
                "Body Scan Meditation",
                "Short Break",
                "Alertness Boost",
                "Bellows Breath",
            ]
        );
    }

    #[test]
    fn test_binaural_only_carries_frequency() {
        let engine = RecommendationEngine::default();
        for rec in engine.select(&state(90, 10, 90)) {
            assert_eq!(
                rec.frequency_hz.is_some(),
                rec.kind == RecommendationKind::BinauralBeats
            );
            assert!(rec.duration_minutes > 0);
        }
    }

    #[test]
    fn test_thresholds_are_configurable() {
        let engine = RecommendationEngine::new(SelectorConfig {
            high_stress_threshold: 90,
            ..SelectorConfig::default()
        });
        let recs = engine.select(&state(85, 50, 30));
        assert_eq!(kinds(&recs), vec![(RecommendationKind::Meditation, 3)]);
    }

    #[test]
    fn test_select_is_idempotent() {
        let engine = RecommendationEngine::default();
        let s = state(70, 30, 75);
        assert_eq!(engine.select(&s), engine.select(&s));
    }

    #[test]
    fn test_kind_serialization() {
        let rec = &RecommendationEngine::default().select(&state(85, 50, 30))[0];
        let json = serde_json::to_value(rec).unwrap();
        assert_eq!(json["type"], "binaural_beats");
        assert_eq!(json["priority"], 1);
    }
}
