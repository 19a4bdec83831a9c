use crate::models::{RankedEntry, SkillSet};
use tracing::debug;

/// Skill-set similarity at which two courses count as covering the same ground.
pub const SIMILAR_COURSE_THRESHOLD: f64 = 0.5;

/// Diversity Layer - skill-overlap penalties and similar-course capping
pub struct DiversityLayer {
    max_similar: usize, // kept courses allowed to resemble a new one
}

impl DiversityLayer {
    pub fn new(max_similar: usize) -> Self {
        Self { max_similar }
    }

    /// Greedy walk over a sorted list: a course survives only while fewer than
    /// `max_similar` already-kept courses are similar to it.
    pub fn cap_similar(&self, entries: Vec<RankedEntry>) -> Vec<RankedEntry> {
        let mut kept: Vec<RankedEntry> = Vec::with_capacity(entries.len());

        for entry in entries {
            let similar = kept
                .iter()
                .filter(|k| {
                    skill_similarity(&k.course.skills, &entry.course.skills)
                        >= SIMILAR_COURSE_THRESHOLD
                })
                .count();

            if similar < self.max_similar {
                kept.push(entry);
            } else {
                debug!(
                    course_id = %entry.course.id,
                    similar = similar,
                    "Dropping course, too many similar courses ahead"
                );
            }
        }

        kept
    }

    /// Mean fraction of `skills` already taught by each previously placed course.
    pub fn average_overlap(skills: &SkillSet, placed: &[&SkillSet]) -> f64 {
        if skills.is_empty() || placed.is_empty() {
            return 0.0;
        }

        let total: f64 = placed
            .iter()
            .map(|other| skills.intersection(other).count() as f64 / skills.len() as f64)
            .sum();

        total / placed.len() as f64
    }
}

/// |a ∩ b| / min(|a|, |b|), where skills match on word tokens.
pub fn skill_similarity(a: &SkillSet, b: &SkillSet) -> f64 {
    let smaller = a.len().min(b.len());
    if smaller == 0 {
        return 0.0;
    }

    let shared = a
        .iter()
        .filter(|skill| b.iter().any(|other| skill.is_similar(other)))
        .count()
        .min(smaller);

    shared as f64 / smaller as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{skill_set, CandidateCourse};

    fn entry(id: &str, skills: &[&str], score: f64) -> RankedEntry {
        RankedEntry {
            course: CandidateCourse {
                id: id.to_string(),
                title: id.to_string(),
                skills: skill_set(skills),
                rating: None,
                price: None,
                author: None,
                summary: None,
            },
            ranking_score: score,
            covered_skills: SkillSet::new(),
        }
    }

    #[test]
    fn test_skill_similarity() {
        let a = skill_set(["python", "sql"]);
        let b = skill_set(["python", "docker", "aws"]);
        assert_eq!(skill_similarity(&a, &b), 0.5);
        assert_eq!(skill_similarity(&a, &SkillSet::new()), 0.0);

        // token match: "sql databases" ~ "databases sql"
        let c = skill_set(["sql databases"]);
        let d = skill_set(["databases sql", "go"]);
        assert_eq!(skill_similarity(&c, &d), 1.0);
    }

    #[test]
    fn test_cap_similar() {
        let layer = DiversityLayer::new(1);
        let entries = vec![
            entry("a", &["python", "sql"], 0.9),
            entry("b", &["python", "pandas"], 0.8),
            entry("c", &["docker"], 0.7),
            entry("d", &["sql", "spark"], 0.6),
        ];

        let kept = layer.cap_similar(entries);
        let ids: Vec<_> = kept.iter().map(|e| e.course.id.as_str()).collect();
        // b and d each share half their skills with a
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn test_cap_similar_allows_up_to_limit() {
        let layer = DiversityLayer::new(2);
        let entries = vec![
            entry("a", &["python"], 0.9),
            entry("b", &["python"], 0.8),
            entry("c", &["python"], 0.7),
        ];

        let kept = layer.cap_similar(entries);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_average_overlap() {
        let skills = skill_set(["python", "sql"]);
        let first = skill_set(["python"]);
        let second = skill_set(["go"]);

        assert_eq!(DiversityLayer::average_overlap(&skills, &[]), 0.0);
        assert_eq!(DiversityLayer::average_overlap(&skills, &[&first]), 0.5);
        assert_eq!(DiversityLayer::average_overlap(&skills, &[&first, &second]), 0.25);
    }
}
