use crate::error::{RankingError, Result};
use crate::models::{Skill, SkillSet};
use crate::utils::normalize_skill;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
struct SkillEntry {
    skill: String,
    #[serde(default = "default_priority")]
    priority: f64,
}

fn default_priority() -> f64 {
    1.0
}

/// How `priority` values in a catalog document are meant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityScale {
    /// Higher value = more important, used as is.
    #[default]
    Weight,
    /// 1 = most important (`job_skill.json`); loaded as `1 / rank`.
    Rank,
}

impl PriorityScale {
    /// Convert a raw value to a weight. `None` for unusable ranks.
    fn to_weight(self, raw: f64) -> Option<f64> {
        match self {
            PriorityScale::Weight => Some(raw),
            PriorityScale::Rank if raw.is_finite() && raw > 0.0 => Some(1.0 / raw),
            PriorityScale::Rank => None,
        }
    }
}

/// Required skill of a role with its importance (higher = more important).
#[derive(Debug, Clone, PartialEq)]
pub struct RequiredSkill {
    pub skill: Skill,
    pub priority: f64,
}

/// Role -> required skills and priorities. Loaded once, shared read-only.
#[derive(Debug, Clone, Default)]
pub struct RoleCatalog {
    roles: HashMap<String, Vec<RequiredSkill>>,
    priorities: HashMap<String, BTreeMap<Skill, f64>>,
}

impl RoleCatalog {
    /// Parse the `{ role: [{"skill": .., "priority": ..}] }` document with
    /// weight-style priorities.
    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_json_with_scale(json, PriorityScale::Weight)
    }

    pub fn from_json_with_scale(json: &str, scale: PriorityScale) -> Result<Self> {
        let raw: HashMap<String, Vec<SkillEntry>> = serde_json::from_str(json)
            .map_err(|e| RankingError::Catalog(format!("invalid role catalog: {}", e)))?;

        let mut catalog = RoleCatalog::default();
        for (role, entries) in raw {
            let mut required = Vec::with_capacity(entries.len());
            for entry in entries {
                let Some(skill) = Skill::new(&entry.skill) else {
                    warn!(role = %role, label = %entry.skill, "Skipping empty skill label");
                    continue;
                };
                match scale.to_weight(entry.priority) {
                    Some(priority) => required.push(RequiredSkill { skill, priority }),
                    None => warn!(
                        role = %role,
                        skill = %skill,
                        rank = entry.priority,
                        "Skipping skill with non-positive rank"
                    ),
                }
            }
            catalog.insert_role(&role, required);
        }

        info!(roles = catalog.roles.len(), scale = ?scale, "Role catalog loaded");
        Ok(catalog)
    }

    pub fn from_path(path: impl AsRef<Path>, scale: PriorityScale) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            RankingError::Catalog(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json_with_scale(&json, scale)
    }

    /// Build a catalog where every skill has priority 1.0.
    pub fn from_required_skills<R, I, S>(roles: R) -> Self
    where
        R: IntoIterator<Item = (S, I)>,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut catalog = RoleCatalog::default();
        for (role, skills) in roles {
            let required = skills
                .into_iter()
                .filter_map(|s| Skill::new(s.as_ref()))
                .map(|skill| RequiredSkill {
                    skill,
                    priority: 1.0,
                })
                .collect();
            catalog.insert_role(role.as_ref(), required);
        }
        catalog
    }

    /// Add or replace a role. Duplicate skills keep their first priority.
    pub fn insert_role(&mut self, role: &str, required: Vec<RequiredSkill>) {
        let key = Self::role_key(role);
        let mut priorities = BTreeMap::new();
        let mut deduped = Vec::with_capacity(required.len());
        for entry in required {
            if priorities.contains_key(&entry.skill) {
                continue;
            }
            priorities.insert(entry.skill.clone(), entry.priority);
            deduped.push(entry);
        }
        self.priorities.insert(key.clone(), priorities);
        self.roles.insert(key, deduped);
    }

    /// Unknown roles require nothing.
    pub fn required_skills(&self, role: &str) -> SkillSet {
        self.roles
            .get(&Self::role_key(role))
            .map(|req| req.iter().map(|r| r.skill.clone()).collect())
            .unwrap_or_default()
    }

    /// Priority of a skill for a role, 0 when unknown.
    pub fn priority(&self, role: &str, skill: &Skill) -> f64 {
        self.priorities
            .get(&Self::role_key(role))
            .and_then(|table| table.get(skill))
            .copied()
            .unwrap_or(0.0)
    }

    /// Priority table of a role (empty for unknown roles).
    pub fn priorities(&self, role: &str) -> BTreeMap<Skill, f64> {
        self.priorities
            .get(&Self::role_key(role))
            .cloned()
            .unwrap_or_default()
    }

    pub fn contains_role(&self, role: &str) -> bool {
        self.roles.contains_key(&Self::role_key(role))
    }

    /// Every skill required by at least one role.
    pub fn all_skills(&self) -> SkillSet {
        self.roles
            .values()
            .flat_map(|req| req.iter().map(|r| r.skill.clone()))
            .collect()
    }

    fn role_key(role: &str) -> String {
        normalize_skill(role).replace(' ', "_")
    }
}
