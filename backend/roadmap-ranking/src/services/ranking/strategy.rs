use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Named ranking strategies, in the order the fallback loop falls back through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyName {
    Basic,
    SkillGainFocus,
    DiversityFocus,
    PositionBiasControl,
}

impl StrategyName {
    pub const ALL: [StrategyName; 4] = [
        StrategyName::Basic,
        StrategyName::SkillGainFocus,
        StrategyName::DiversityFocus,
        StrategyName::PositionBiasControl,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyName::Basic => "basic",
            StrategyName::SkillGainFocus => "skill_gain_focus",
            StrategyName::DiversityFocus => "diversity_focus",
            StrategyName::PositionBiasControl => "position_bias_control",
        }
    }

    /// Resolve a strategy name, falling back to `basic` for unknown names.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "basic" => StrategyName::Basic,
            "skill_gain_focus" => StrategyName::SkillGainFocus,
            "diversity_focus" => StrategyName::DiversityFocus,
            "position_bias_control" => StrategyName::PositionBiasControl,
            other => {
                warn!(strategy = %other, "Unknown ranking strategy, using basic");
                StrategyName::Basic
            }
        }
    }

    pub fn profile(&self) -> StrategyProfile {
        match self {
            StrategyName::Basic => StrategyProfile {
                name: *self,
                weights: ScoreWeights::new(0.45, 0.45, 0.10),
                filter_low_quality: false,
                diversity_penalty: 0.0,
                known_skills_penalty: 0.0,
                position_bias_shuffle: false,
                max_top_similar_courses: None,
            },
            StrategyName::SkillGainFocus => StrategyProfile {
                name: *self,
                weights: ScoreWeights::new(0.70, 0.20, 0.10),
                filter_low_quality: true,
                diversity_penalty: 0.3,
                known_skills_penalty: 0.2,
                position_bias_shuffle: true,
                max_top_similar_courses: None,
            },
            StrategyName::DiversityFocus => StrategyProfile {
                name: *self,
                weights: ScoreWeights::new(0.40, 0.30, 0.30),
                filter_low_quality: true,
                diversity_penalty: 0.5,
                known_skills_penalty: 0.1,
                position_bias_shuffle: true,
                max_top_similar_courses: Some(5),
            },
            StrategyName::PositionBiasControl => StrategyProfile {
                name: *self,
                weights: ScoreWeights::new(0.50, 0.40, 0.10),
                filter_low_quality: false,
                diversity_penalty: 0.2,
                known_skills_penalty: 0.1,
                position_bias_shuffle: true,
                max_top_similar_courses: Some(3),
            },
        }
    }
}

impl fmt::Display for StrategyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Linear weights of the base score. Scores are only comparable within one profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub coverage: f64,
    pub priority: f64,
    pub rating: f64,
}

impl ScoreWeights {
    pub const fn new(coverage: f64, priority: f64, rating: f64) -> Self {
        Self {
            coverage,
            priority,
            rating,
        }
    }
}

/// Scoring weights plus post-processing knobs of one strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyProfile {
    pub name: StrategyName,
    pub weights: ScoreWeights,
    /// Drop courses without skills or with a rating under the floor before scoring.
    pub filter_low_quality: bool,
    pub diversity_penalty: f64,
    pub known_skills_penalty: f64,
    /// Shuffle near-tied neighbours after sorting.
    pub position_bias_shuffle: bool,
    /// Cap on already-kept similar courses before a course is dropped.
    pub max_top_similar_courses: Option<usize>,
}

impl StrategyProfile {
    /// Profile by name; unknown names resolve to `basic`.
    pub fn named(name: &str) -> Self {
        StrategyName::from_name(name).profile()
    }

    pub fn with_weights(mut self, weights: ScoreWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn without_shuffle(mut self) -> Self {
        self.position_bias_shuffle = false;
        self
    }
}

impl Default for StrategyProfile {
    fn default() -> Self {
        StrategyName::Basic.profile()
    }
}
