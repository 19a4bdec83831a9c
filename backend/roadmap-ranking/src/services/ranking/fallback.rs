use super::scorer::CourseRanker;
use super::shuffle::TieShuffler;
use super::strategy::StrategyName;
use crate::models::{CandidateCourse, EvaluationMetrics, RankedEntry, SkillSet};
use serde::Serialize;
use tracing::{info, warn};

/// Result of the strategy fallback loop.
#[derive(Debug, Clone, Serialize)]
pub struct FallbackOutcome {
    pub ranked: Vec<RankedEntry>,
    /// Strategy that produced `ranked`.
    pub strategy: StrategyName,
    pub metrics: EvaluationMetrics,
    pub attempts: usize,
    /// False when thresholds were never met and `ranked` is best effort.
    pub accepted: bool,
}

impl CourseRanker {
    /// Rank with `basic`, then keep switching to the strategy aimed at the
    /// first failing quality check until all checks pass or attempts run out.
    ///
    /// Never fails: the last computed ranking is returned when no strategy
    /// meets the thresholds.
    pub fn rank_with_fallback(
        &self,
        candidates: &[CandidateCourse],
        skill_gap: &SkillSet,
        known_skills: &SkillSet,
        role: &str,
        max_attempts: usize,
        shuffler: &mut dyn TieShuffler,
    ) -> FallbackOutcome {
        let mut outcome = FallbackOutcome {
            ranked: Vec::new(),
            strategy: StrategyName::Basic,
            metrics: EvaluationMetrics::default(),
            attempts: 0,
            accepted: false,
        };

        if candidates.is_empty() {
            info!(role = %role, "No candidates to rank, skipping fallback loop");
            return outcome;
        }

        let mut tried: Vec<StrategyName> = Vec::with_capacity(StrategyName::ALL.len());
        let mut strategy = StrategyName::Basic;

        for attempt in 1..=max_attempts.max(1) {
            let ranked = self.rank_courses(
                candidates,
                skill_gap,
                known_skills,
                role,
                &strategy.profile(),
                shuffler,
            );
            let metrics = self.evaluate_ranking(&ranked, role, self.evaluation_k);
            tried.push(strategy);

            let failing = self.thresholds.first_failing(&metrics);
            info!(
                attempt = attempt,
                strategy = %strategy,
                skill_gain = metrics.skill_gain,
                diversity_score = metrics.diversity_score,
                position_bias = metrics.position_bias,
                failing = failing.map(|c| c.as_str()).unwrap_or("none"),
                "Ranking attempt evaluated"
            );

            outcome = FallbackOutcome {
                ranked,
                strategy,
                metrics,
                attempts: attempt,
                accepted: failing.is_none(),
            };

            let Some(check) = failing else {
                return outcome;
            };

            let target = check.target_strategy();
            let next = if tried.contains(&target) {
                StrategyName::ALL.into_iter().find(|s| !tried.contains(s))
            } else {
                Some(target)
            };

            match next {
                Some(next) => strategy = next,
                None => break,
            }
        }

        warn!(
            role = %role,
            strategy = %outcome.strategy,
            attempts = outcome.attempts,
            "Quality thresholds not met, returning last ranking"
        );
        outcome
    }
}
