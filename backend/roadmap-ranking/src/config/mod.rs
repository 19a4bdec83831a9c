use crate::services::skill_gap::PriorityScale;
use anyhow::{anyhow, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub ranking: RankingConfig,
    pub quality: QualityThresholds,
}

/// `ROADMAP_*` variables.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_role_catalog_path")]
    pub role_catalog_path: String,
    /// `rank` for `job_skill.json` (1 = most important), `weight` otherwise.
    #[serde(default = "default_priority_scale")]
    pub priority_scale: PriorityScale,
    #[serde(default = "default_course_catalog_path")]
    pub course_catalog_path: String,
    /// Number of ranked courses that become roadmap nodes.
    #[serde(default = "default_max_nodes")]
    pub max_nodes: usize,
    #[serde(default = "default_retrieval_limit")]
    pub retrieval_limit: usize,
    #[serde(default = "default_retrieval_timeout_ms")]
    pub retrieval_timeout_ms: u64,
}

/// `RANKING_*` variables.
#[derive(Debug, Clone, Deserialize)]
pub struct RankingConfig {
    #[serde(default = "default_rating_max")]
    pub rating_max: f64,
    /// Top-k used by evaluation.
    #[serde(default = "default_evaluation_k")]
    pub evaluation_k: usize,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    /// Scores within this distance are shuffled together.
    #[serde(default = "default_tie_epsilon")]
    pub tie_epsilon: f64,
    #[serde(default = "default_low_quality_rating_floor")]
    pub low_quality_rating_floor: f64,
    /// Seed for the tie shuffle; entropy when unset.
    #[serde(default)]
    pub shuffle_seed: Option<u64>,
}

/// `QUALITY_*` variables. Acceptance thresholds of the fallback loop.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct QualityThresholds {
    #[serde(default = "default_min_skill_gain")]
    pub min_skill_gain: f64,
    #[serde(default = "default_min_diversity")]
    pub min_diversity: f64,
    #[serde(default = "default_max_position_bias")]
    pub max_position_bias: f64,
}

fn default_service_name() -> String {
    "roadmap-ranking".to_string()
}

fn default_role_catalog_path() -> String {
    "job_skill.json".to_string()
}

fn default_priority_scale() -> PriorityScale {
    PriorityScale::Rank
}

fn default_course_catalog_path() -> String {
    "courses.json".to_string()
}

fn default_max_nodes() -> usize {
    10
}

fn default_retrieval_limit() -> usize {
    30
}

fn default_retrieval_timeout_ms() -> u64 {
    5000
}

fn default_rating_max() -> f64 {
    5.0
}

fn default_evaluation_k() -> usize {
    10
}

fn default_max_attempts() -> usize {
    5
}

fn default_tie_epsilon() -> f64 {
    0.01
}

fn default_low_quality_rating_floor() -> f64 {
    3.0
}

fn default_min_skill_gain() -> f64 {
    6.0
}

fn default_min_diversity() -> f64 {
    2.5
}

fn default_max_position_bias() -> f64 {
    4.0
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            role_catalog_path: default_role_catalog_path(),
            priority_scale: default_priority_scale(),
            course_catalog_path: default_course_catalog_path(),
            max_nodes: default_max_nodes(),
            retrieval_limit: default_retrieval_limit(),
            retrieval_timeout_ms: default_retrieval_timeout_ms(),
        }
    }
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            rating_max: default_rating_max(),
            evaluation_k: default_evaluation_k(),
            max_attempts: default_max_attempts(),
            tie_epsilon: default_tie_epsilon(),
            low_quality_rating_floor: default_low_quality_rating_floor(),
            shuffle_seed: None,
        }
    }
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            min_skill_gain: default_min_skill_gain(),
            min_diversity: default_min_diversity(),
            max_position_bias: default_max_position_bias(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            ranking: RankingConfig::default(),
            quality: QualityThresholds::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();

        Ok(Config {
            service: envy::prefixed("ROADMAP_").from_env::<ServiceConfig>()?,
            ranking: envy::prefixed("RANKING_").from_env::<RankingConfig>()?,
            quality: envy::prefixed("QUALITY_").from_env::<QualityThresholds>()?,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.ranking.rating_max <= 0.0 {
            return Err(anyhow!("RANKING_RATING_MAX must be greater than 0"));
        }
        if self.ranking.evaluation_k == 0 {
            return Err(anyhow!("RANKING_EVALUATION_K must be greater than 0"));
        }
        if self.ranking.max_attempts == 0 {
            return Err(anyhow!("RANKING_MAX_ATTEMPTS must be greater than 0"));
        }
        if self.ranking.tie_epsilon < 0.0 {
            return Err(anyhow!("RANKING_TIE_EPSILON must not be negative"));
        }
        if self.service.max_nodes == 0 {
            return Err(anyhow!("ROADMAP_MAX_NODES must be greater than 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.ranking.evaluation_k, 10);
        assert_eq!(config.quality.min_skill_gain, 6.0);
        assert_eq!(config.service.max_nodes, 10);
    }

    #[test]
    fn test_prefixed_section_parsing() {
        let vars = vec![
            ("RANKING_MAX_ATTEMPTS".to_string(), "3".to_string()),
            ("RANKING_SHUFFLE_SEED".to_string(), "42".to_string()),
        ];
        let ranking: RankingConfig = envy::prefixed("RANKING_").from_iter(vars).unwrap();
        assert_eq!(ranking.max_attempts, 3);
        assert_eq!(ranking.shuffle_seed, Some(42));
        assert_eq!(ranking.rating_max, 5.0);
    }

    #[test]
    fn test_priority_scale_parsing() {
        let service: ServiceConfig = envy::prefixed("ROADMAP_")
            .from_iter(Vec::<(String, String)>::new())
            .unwrap();
        assert_eq!(service.priority_scale, PriorityScale::Rank);

        let vars = vec![("ROADMAP_PRIORITY_SCALE".to_string(), "weight".to_string())];
        let service: ServiceConfig = envy::prefixed("ROADMAP_").from_iter(vars).unwrap();
        assert_eq!(service.priority_scale, PriorityScale::Weight);
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let mut config = Config::default();
        config.ranking.max_attempts = 0;
        assert!(config.validate().is_err());
    }
}
