/// Skill Gap Module
///
/// Maps a target role to its required skills and diffs them against what
/// the user already knows.
mod catalog;

pub use catalog::{PriorityScale, RequiredSkill, RoleCatalog};

use crate::models::{GapResult, SkillSet};
use std::sync::Arc;
use tracing::{debug, warn};

/// Skill gap analyzer - pure set arithmetic over the role catalog
#[derive(Debug, Clone)]
pub struct SkillGapAnalyzer {
    catalog: Arc<RoleCatalog>,
}

impl SkillGapAnalyzer {
    pub fn new(catalog: Arc<RoleCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &RoleCatalog {
        &self.catalog
    }

    pub fn required_skills(&self, role: &str) -> SkillSet {
        self.catalog.required_skills(role)
    }

    /// missing = required - user, matched = user ∩ required, extra = user - required.
    pub fn compute_gap(&self, user_skills: &SkillSet, role: &str) -> GapResult {
        if !self.catalog.contains_role(role) {
            warn!(role = %role, "Unknown role, nothing is required");
        }
        let required = self.catalog.required_skills(role);

        let gap = GapResult {
            missing_skills: required.difference(user_skills).cloned().collect(),
            matched_skills: user_skills.intersection(&required).cloned().collect(),
            extra_skills: user_skills.difference(&required).cloned().collect(),
        };

        debug!(
            role = %role,
            missing = gap.missing_skills.len(),
            matched = gap.matched_skills.len(),
            extra = gap.extra_skills.len(),
            "Skill gap computed"
        );

        gap
    }
}
