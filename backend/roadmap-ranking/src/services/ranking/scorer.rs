use super::shuffle::{shuffle_ties, TieShuffler};
use super::strategy::StrategyProfile;
use crate::config::{QualityThresholds, RankingConfig};
use crate::models::{CandidateCourse, EvaluationMetrics, RankedEntry, SkillSet};
use crate::services::diversity::DiversityLayer;
use crate::services::evaluation;
use crate::services::skill_gap::{RoleCatalog, SkillGapAnalyzer};
use crate::utils::round_to;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Share of `rating_max` assumed for courses without a rating.
const DEFAULT_RATING_SHARE: f64 = 0.3;
const SCORE_PRECISION: i32 = 4;

/// Skill-gap driven course ranker.
///
/// Holds only read-only state (role catalog and tunables), so one instance
/// can serve concurrent requests. Per-user state lives in `SessionState`.
#[derive(Debug, Clone)]
pub struct CourseRanker {
    pub(super) analyzer: SkillGapAnalyzer,
    pub(super) rating_max: f64,
    pub(super) low_quality_floor: f64,
    pub(super) tie_epsilon: f64,
    pub(super) evaluation_k: usize,
    pub(super) thresholds: QualityThresholds,
}

/// Candidate with its base score, before penalties.
struct BaseScored<'a> {
    course: &'a CandidateCourse,
    covered: SkillSet,
    base: f64,
}

impl CourseRanker {
    pub fn new(catalog: Arc<RoleCatalog>) -> Self {
        let defaults = RankingConfig::default();
        Self {
            analyzer: SkillGapAnalyzer::new(catalog),
            rating_max: defaults.rating_max,
            low_quality_floor: defaults.low_quality_rating_floor,
            tie_epsilon: defaults.tie_epsilon,
            evaluation_k: defaults.evaluation_k,
            thresholds: QualityThresholds::default(),
        }
    }

    /// A non-positive or non-finite `rating_max` is ignored (the default stays).
    pub fn with_config(mut self, config: &RankingConfig) -> Self {
        if config.rating_max.is_finite() && config.rating_max > 0.0 {
            self.rating_max = config.rating_max;
        } else {
            warn!(rating_max = config.rating_max, "Ignoring invalid rating_max");
        }
        self.low_quality_floor = config.low_quality_rating_floor;
        self.tie_epsilon = config.tie_epsilon;
        self.evaluation_k = config.evaluation_k;
        self
    }

    pub fn with_thresholds(mut self, thresholds: QualityThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn analyzer(&self) -> &SkillGapAnalyzer {
        &self.analyzer
    }

    pub fn thresholds(&self) -> &QualityThresholds {
        &self.thresholds
    }

    pub fn evaluation_k(&self) -> usize {
        self.evaluation_k
    }

    /// Score, order and post-process candidates for one strategy.
    ///
    /// Penalties are applied in a single pass over the candidates pre-sorted by
    /// base score (ties keep input order): each course is compared with every
    /// course before it in that pass. The result is sorted by final score,
    /// capped on similar courses and near-tie shuffled as the profile asks.
    pub fn rank_courses(
        &self,
        courses: &[CandidateCourse],
        skill_gap: &SkillSet,
        known_skills: &SkillSet,
        role: &str,
        profile: &StrategyProfile,
        shuffler: &mut dyn TieShuffler,
    ) -> Vec<RankedEntry> {
        let priorities = self.analyzer.catalog().priorities(role);

        let mut seen: HashSet<&str> = HashSet::new();
        let pool: Vec<&CandidateCourse> = courses
            .iter()
            .filter(|course| seen.insert(course.id.as_str()))
            .filter(|course| !(profile.filter_low_quality && self.is_low_quality(course)))
            .collect();

        let mut scored: Vec<BaseScored> = pool
            .into_iter()
            .map(|course| {
                let covered: SkillSet = course.skills.intersection(skill_gap).cloned().collect();

                let coverage_score = if skill_gap.is_empty() {
                    0.0
                } else {
                    covered.len() as f64 / skill_gap.len() as f64
                };
                let priority_score = if covered.is_empty() {
                    0.0
                } else {
                    covered
                        .iter()
                        .map(|skill| priorities.get(skill).copied().unwrap_or(0.0))
                        .sum::<f64>()
                        / covered.len() as f64
                };
                let rating_score = self.rating_score(course.rating);

                let weights = &profile.weights;
                let base = weights.coverage * coverage_score
                    + weights.priority * priority_score
                    + weights.rating * rating_score;

                BaseScored {
                    course,
                    covered,
                    base,
                }
            })
            .collect();

        scored.sort_by(|a, b| b.base.partial_cmp(&a.base).unwrap_or(Ordering::Equal));

        let mut placed: Vec<&SkillSet> = Vec::with_capacity(scored.len());
        let mut ranked: Vec<RankedEntry> = Vec::with_capacity(scored.len());
        for item in &scored {
            let mut score = item.base;
            if profile.diversity_penalty > 0.0 {
                score -= profile.diversity_penalty
                    * DiversityLayer::average_overlap(&item.course.skills, &placed);
            }
            if profile.known_skills_penalty > 0.0 {
                let already_known = item.covered.intersection(known_skills).count();
                score -= profile.known_skills_penalty * already_known as f64;
            }
            placed.push(&item.course.skills);

            ranked.push(RankedEntry {
                course: item.course.clone(),
                ranking_score: round_to(score, SCORE_PRECISION),
                covered_skills: item.covered.clone(),
            });
        }

        ranked.sort_by(|a, b| {
            b.ranking_score
                .partial_cmp(&a.ranking_score)
                .unwrap_or(Ordering::Equal)
        });

        if let Some(max_similar) = profile.max_top_similar_courses {
            ranked = DiversityLayer::new(max_similar).cap_similar(ranked);
        }

        if profile.position_bias_shuffle {
            shuffle_ties(&mut ranked, self.tie_epsilon, shuffler);
        }

        debug!(
            strategy = %profile.name,
            role = %role,
            candidates = courses.len(),
            ranked = ranked.len(),
            "Courses ranked"
        );

        ranked
    }

    /// Offline metrics over the top-k of `ranked`.
    pub fn evaluate_ranking(
        &self,
        ranked: &[RankedEntry],
        role: &str,
        k: usize,
    ) -> EvaluationMetrics {
        let priorities = self.analyzer.catalog().priorities(role);
        evaluation::evaluate_ranking(ranked, &priorities, k)
    }

    fn rating_score(&self, rating: Option<f64>) -> f64 {
        let rating = rating
            .filter(|r| r.is_finite())
            .map(|r| r.clamp(0.0, self.rating_max))
            .unwrap_or(DEFAULT_RATING_SHARE * self.rating_max);
        rating / self.rating_max
    }

    /// No skills, or a known rating under the floor. Unrated courses pass.
    fn is_low_quality(&self, course: &CandidateCourse) -> bool {
        course.skills.is_empty() || course.rating.is_some_and(|r| r < self.low_quality_floor)
    }
}
