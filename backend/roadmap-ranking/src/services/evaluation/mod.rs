// ============================================
// Ranking Evaluation (offline quality metrics)
// ============================================
//
// Computed over the top-k of a ranked list:
//   skill_gain      = Σ_i Σ_{s ∈ covered_i} priority(s)
//   diversity_score = H2(frequency of covered skills)
//   position_bias   = Σ_i rel_i / log2(i + 2)     (i is 0-based)
//   ndcg            = position_bias / ideal DCG
//
// where rel_i is the summed priority of entry i's covered skills.

use crate::config::QualityThresholds;
use crate::models::{EvaluationMetrics, RankedEntry, Skill};
use crate::services::ranking::StrategyName;
use crate::utils::{position_discount, round_to, shannon_entropy};
use std::collections::BTreeMap;

/// Evaluate the top-k of a ranking against a role's priority table.
pub fn evaluate_ranking(
    ranked: &[RankedEntry],
    priorities: &BTreeMap<Skill, f64>,
    k: usize,
) -> EvaluationMetrics {
    let top = &ranked[..k.min(ranked.len())];
    if top.is_empty() {
        return EvaluationMetrics::default();
    }

    let relevances: Vec<f64> = top
        .iter()
        .map(|entry| {
            entry
                .covered_skills
                .iter()
                .map(|skill| priorities.get(skill).copied().unwrap_or(0.0))
                .sum()
        })
        .collect();

    let mut frequencies: BTreeMap<&Skill, usize> = BTreeMap::new();
    for entry in top {
        for skill in &entry.covered_skills {
            *frequencies.entry(skill).or_insert(0) += 1;
        }
    }

    let skill_gain: f64 = relevances.iter().sum();
    let position_bias = discounted_gain(&relevances);

    let mut ideal = relevances.clone();
    ideal.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
    let ideal_gain = discounted_gain(&ideal);
    let ndcg = if ideal_gain > 0.0 {
        round_to(position_bias / ideal_gain, 4)
    } else {
        0.0
    };

    EvaluationMetrics {
        skill_gain,
        diversity_score: shannon_entropy(frequencies.into_values()),
        position_bias,
        ndcg,
    }
}

fn discounted_gain(relevances: &[f64]) -> f64 {
    relevances
        .iter()
        .enumerate()
        .map(|(i, rel)| rel / position_discount(i))
        .sum()
}

/// Quality checks of the fallback loop, in the order they are consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityCheck {
    SkillGain,
    Diversity,
    PositionBias,
}

impl QualityCheck {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityCheck::SkillGain => "skill_gain",
            QualityCheck::Diversity => "diversity",
            QualityCheck::PositionBias => "position_bias",
        }
    }

    /// Strategy built to fix this check.
    pub fn target_strategy(&self) -> StrategyName {
        match self {
            QualityCheck::SkillGain => StrategyName::SkillGainFocus,
            QualityCheck::Diversity => StrategyName::DiversityFocus,
            QualityCheck::PositionBias => StrategyName::PositionBiasControl,
        }
    }
}

impl QualityThresholds {
    /// First failing check, `None` when the ranking is acceptable.
    pub fn first_failing(&self, metrics: &EvaluationMetrics) -> Option<QualityCheck> {
        if metrics.skill_gain < self.min_skill_gain {
            Some(QualityCheck::SkillGain)
        } else if metrics.diversity_score < self.min_diversity {
            Some(QualityCheck::Diversity)
        } else if metrics.position_bias > self.max_position_bias {
            Some(QualityCheck::PositionBias)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{skill_set, CandidateCourse, SkillSet};

    fn entry(id: &str, covered: &[&str]) -> RankedEntry {
        RankedEntry {
            course: CandidateCourse {
                id: id.to_string(),
                title: id.to_string(),
                skills: skill_set(covered),
                rating: None,
                price: None,
                author: None,
                summary: None,
            },
            ranking_score: 0.0,
            covered_skills: skill_set(covered),
        }
    }

    fn priorities() -> BTreeMap<Skill, f64> {
        [("sql", 2.0), ("docker", 1.0), ("aws", 1.0), ("spark", 0.5)]
            .into_iter()
            .map(|(s, p)| (Skill::new(s).unwrap(), p))
            .collect()
    }

    #[test]
    fn test_empty_ranking_scores_zero() {
        let metrics = evaluate_ranking(&[], &priorities(), 10);
        assert_eq!(metrics, EvaluationMetrics::default());
    }

    #[test]
    fn test_metrics() {
        let ranked = vec![entry("a", &["sql", "docker"]), entry("b", &["aws", "sql"])];
        let metrics = evaluate_ranking(&ranked, &priorities(), 10);

        assert!((metrics.skill_gain - 6.0).abs() < 1e-9);
        // sql twice, docker and aws once: H = 1.5
        assert!((metrics.diversity_score - 1.5).abs() < 1e-9);
        // 3 / log2(2) + 3 / log2(3)
        let expected_bias = 3.0 + 3.0 / 3f64.log2();
        assert!((metrics.position_bias - expected_bias).abs() < 1e-9);
        assert_eq!(metrics.ndcg, 1.0);
    }

    #[test]
    fn test_only_top_k_counts() {
        let ranked = vec![entry("a", &["spark"]), entry("b", &["sql"])];
        let metrics = evaluate_ranking(&ranked, &priorities(), 1);

        assert!((metrics.skill_gain - 0.5).abs() < 1e-9);
        assert_eq!(metrics.diversity_score, 0.0);
    }

    #[test]
    fn test_ndcg_penalizes_bad_order() {
        let ranked = vec![entry("a", &["spark"]), entry("b", &["sql"])];
        let metrics = evaluate_ranking(&ranked, &priorities(), 10);
        assert!(metrics.ndcg < 1.0);
        assert!(metrics.ndcg > 0.0);
    }

    #[test]
    fn test_no_covered_skills() {
        let mut lonely = entry("a", &["sql"]);
        lonely.covered_skills = SkillSet::new();
        let metrics = evaluate_ranking(&[lonely], &priorities(), 10);
        assert_eq!(metrics.skill_gain, 0.0);
        assert_eq!(metrics.diversity_score, 0.0);
        assert_eq!(metrics.ndcg, 0.0);
    }

    #[test]
    fn test_first_failing_order() {
        let thresholds = QualityThresholds::default();
        let mut metrics = EvaluationMetrics {
            skill_gain: 1.0,
            diversity_score: 0.0,
            position_bias: 10.0,
            ndcg: 0.0,
        };
        assert_eq!(thresholds.first_failing(&metrics), Some(QualityCheck::SkillGain));

        metrics.skill_gain = 7.0;
        assert_eq!(thresholds.first_failing(&metrics), Some(QualityCheck::Diversity));

        metrics.diversity_score = 3.0;
        assert_eq!(thresholds.first_failing(&metrics), Some(QualityCheck::PositionBias));

        metrics.position_bias = 3.0;
        assert_eq!(thresholds.first_failing(&metrics), None);
    }
}
