// ============================================
// Feedback Processor (用戶反饋重排)
// ============================================
//
// Maps user reactions on roadmap nodes to ranking mutations:
//
//   too_easy      -> learn the course's covered skills, drop the course
//   wrong_skills  -> drop the course and every course sharing a skill with it
//   too_hard      -> push the course 3 places later
//   bad_author    -> drop every course by the same author
//   unavailable   -> drop the course, record it in the buffer zone
//
// Node ids are resolved against the list as it was before any mutation,
// so the result does not depend on the iteration order of distinct nodes.
// When known skills changed, survivors are fully re-ranked on the new gap.

use crate::models::{FeedbackMap, FeedbackReason, RankedEntry};
use crate::services::ranking::{CourseRanker, StrategyName, TieShuffler};
use crate::services::session::SessionState;
use tracing::{debug, info, warn};

/// How many places `too_hard` moves a course down.
pub const TOO_HARD_SHIFT: usize = 3;

impl CourseRanker {
    /// Apply feedback and re-rank with `basic` when known skills changed.
    pub fn update_ranking(
        &self,
        ranked: &[RankedEntry],
        feedback: &FeedbackMap,
        state: &mut SessionState,
        role: &str,
        shuffler: &mut dyn TieShuffler,
    ) -> Vec<RankedEntry> {
        self.update_ranking_with(ranked, feedback, state, role, StrategyName::Basic, shuffler)
    }

    /// Same as `update_ranking` with a caller-chosen re-rank strategy.
    pub fn update_ranking_with(
        &self,
        ranked: &[RankedEntry],
        feedback: &FeedbackMap,
        state: &mut SessionState,
        role: &str,
        rerank_strategy: StrategyName,
        shuffler: &mut dyn TieShuffler,
    ) -> Vec<RankedEntry> {
        let mut working: Vec<RankedEntry> = ranked.to_vec();
        let mut known_changed = false;

        for (&node_id, &reason) in feedback {
            let Some(target) = ranked.get(node_id) else {
                debug!(
                    node_id = node_id,
                    len = ranked.len(),
                    "Feedback node out of bounds, skipped"
                );
                continue;
            };
            let target_id = target.course.id.as_str();

            match reason {
                FeedbackReason::TooEasy => {
                    for skill in &target.covered_skills {
                        known_changed |= state.known_skills.insert(skill.clone());
                    }
                    working.retain(|e| e.course.id != target_id);
                }
                FeedbackReason::WrongSkills => {
                    let skills = &target.course.skills;
                    working.retain(|e| {
                        e.course.id != target_id && e.course.skills.is_disjoint(skills)
                    });
                }
                FeedbackReason::TooHard => {
                    if let Some(index) = working.iter().position(|e| e.course.id == target_id) {
                        let entry = working.remove(index);
                        let to = (index + TOO_HARD_SHIFT).min(working.len());
                        working.insert(to, entry);
                    }
                }
                FeedbackReason::BadAuthor => match target.course.author.as_deref() {
                    Some(author) => working.retain(|e| e.course.author.as_deref() != Some(author)),
                    None => working.retain(|e| e.course.id != target_id),
                },
                FeedbackReason::Unavailable => {
                    working.retain(|e| e.course.id != target_id);
                    state.buffer_zone.push(target.course.clone());
                }
                FeedbackReason::Unknown => {
                    warn!(
                        node_id = node_id,
                        course_id = %target_id,
                        "Unknown feedback reason, ignored"
                    );
                }
            }
        }

        info!(
            role = %role,
            feedback = feedback.len(),
            before = ranked.len(),
            after = working.len(),
            known_changed = known_changed,
            buffer_zone = state.buffer_zone.len(),
            "Feedback applied"
        );

        if !known_changed {
            return working;
        }

        let gap = self.analyzer().compute_gap(&state.known_skills, role);
        let courses: Vec<_> = working.into_iter().map(|e| e.course).collect();
        self.rank_courses(
            &courses,
            &gap.missing_skills,
            &state.known_skills,
            role,
            &rerank_strategy.profile(),
            shuffler,
        )
    }
}
