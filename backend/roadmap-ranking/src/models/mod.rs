use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::utils::{jaccard, normalize_skill};

/// Token overlap above which two skill labels count as the same skill
/// for similarity filtering.
pub const SKILL_SIMILARITY_THRESHOLD: f64 = 0.5;

/// Normalized skill label (lowercase, punctuation stripped, single spaces).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Skill(String);

impl Skill {
    /// Returns `None` when nothing is left after cleaning.
    pub fn new(raw: &str) -> Option<Self> {
        let normalized = normalize_skill(raw);
        if normalized.is_empty() {
            None
        } else {
            Some(Self(normalized))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn tokens(&self) -> BTreeSet<&str> {
        self.0.split_whitespace().collect()
    }

    /// Fuzzy equality on word tokens ("machine learning" ~ "learning machine").
    pub fn is_similar(&self, other: &Skill) -> bool {
        self == other || jaccard(&self.tokens(), &other.tokens()) >= SKILL_SIMILARITY_THRESHOLD
    }
}

impl fmt::Display for Skill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Skill {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Skill::new(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("empty skill label: {:?}", raw)))
    }
}

/// Ordered so that every pass over a skill set is deterministic.
pub type SkillSet = BTreeSet<Skill>;

/// Build a skill set from raw labels, dropping the ones that clean down to nothing.
pub fn skill_set<I, S>(labels: I) -> SkillSet
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    labels
        .into_iter()
        .filter_map(|label| Skill::new(label.as_ref()))
        .collect()
}

/// A retrieved learning resource, read-only input to ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateCourse {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub skills: SkillSet,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub course: CandidateCourse,
    pub ranking_score: f64,
    /// Always a subset of both the course skills and the skill gap.
    pub covered_skills: SkillSet,
}

/// Offline quality of the top-k of a ranking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    pub skill_gain: f64,
    pub diversity_score: f64,
    /// High values mean valuable skills are front-loaded.
    pub position_bias: f64,
    pub ndcg: f64,
}

/// Output of the skill gap analyzer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GapResult {
    pub missing_skills: SkillSet,
    pub matched_skills: SkillSet,
    pub extra_skills: SkillSet,
}

/// Why a user rejected a roadmap node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackReason {
    TooEasy,
    WrongSkills,
    TooHard,
    BadAuthor,
    Unavailable,
    /// Any reason code this service does not know about.
    #[serde(other)]
    Unknown,
}

impl FeedbackReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackReason::TooEasy => "too_easy",
            FeedbackReason::WrongSkills => "wrong_skills",
            FeedbackReason::TooHard => "too_hard",
            FeedbackReason::BadAuthor => "bad_author",
            FeedbackReason::Unavailable => "unavailable",
            FeedbackReason::Unknown => "unknown",
        }
    }
}

impl FromStr for FeedbackReason {
    type Err = std::convert::Infallible;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        Ok(match code.trim().to_ascii_lowercase().as_str() {
            "too_easy" => FeedbackReason::TooEasy,
            "wrong_skills" => FeedbackReason::WrongSkills,
            "too_hard" => FeedbackReason::TooHard,
            "bad_author" => FeedbackReason::BadAuthor,
            "unavailable" => FeedbackReason::Unavailable,
            _ => FeedbackReason::Unknown,
        })
    }
}

/// Roadmap position (0-based) -> reason.
pub type FeedbackMap = BTreeMap<usize, FeedbackReason>;

/// Courses users flagged as unavailable, pending removal from the catalog.
/// Append-only for the lifetime of a session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BufferZone {
    courses: Vec<CandidateCourse>,
}

impl BufferZone {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, course: CandidateCourse) {
        self.courses.push(course);
    }

    pub fn len(&self) -> usize {
        self.courses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CandidateCourse> {
        self.courses.iter()
    }

    pub fn course_ids(&self) -> Vec<&str> {
        self.courses.iter().map(|c| c.id.as_str()).collect()
    }
}

/// Input of a roadmap generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoadmapRequest {
    pub user_id: Uuid,
    pub role: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadmapRecord {
    pub roadmap_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeCreate {
    pub roadmap_id: Uuid,
    pub position: usize,
    pub title: String,
    pub resource_id: String,
    #[serde(default)]
    pub summary: String,
    pub ranking_score: f64,
    pub covered_skills: SkillSet,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub node_id: Uuid,
    pub roadmap_id: Uuid,
    pub position: usize,
    pub title: String,
    pub resource_id: String,
    #[serde(default)]
    pub summary: String,
    pub ranking_score: f64,
    pub covered_skills: SkillSet,
    pub progress: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkCreate {
    pub roadmap_id: Uuid,
    pub from_node: Uuid,
    pub to_node: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub link_id: Uuid,
    pub roadmap_id: Uuid,
    pub from_node: Uuid,
    pub to_node: Uuid,
}

/// Persisted roadmap returned to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoadmapInfo {
    pub roadmap_id: Uuid,
    pub strategy: String,
    pub metrics: EvaluationMetrics,
    pub nodes: Vec<NodeRecord>,
    pub links: Vec<LinkRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skill_normalization() {
        assert_eq!(Skill::new("  C#-Sharp ").unwrap().as_str(), "c sharp");
        assert_eq!(Skill::new("Machine   Learning!").unwrap().as_str(), "machine learning");
        assert!(Skill::new("###").is_none());
    }

    #[test]
    fn test_skill_similarity() {
        let a = Skill::new("machine learning").unwrap();
        let b = Skill::new("learning machine").unwrap();
        let c = Skill::new("machine vision systems").unwrap();
        assert!(a.is_similar(&b));
        // {machine} / {machine, learning, vision, systems} = 0.25
        assert!(!a.is_similar(&c));
    }

    #[test]
    fn test_skill_deserialize_normalizes() {
        let skills: SkillSet = serde_json::from_str(r#"["Python", "python", "SQL"]"#).unwrap();
        assert_eq!(skills, skill_set(["python", "sql"]));
    }

    #[test]
    fn test_feedback_reason_parsing() {
        assert_eq!("too_easy".parse::<FeedbackReason>().unwrap(), FeedbackReason::TooEasy);
        assert_eq!(" BAD_AUTHOR ".parse::<FeedbackReason>().unwrap(), FeedbackReason::BadAuthor);
        assert_eq!("boring".parse::<FeedbackReason>().unwrap(), FeedbackReason::Unknown);

        let map: BTreeMap<usize, FeedbackReason> =
            serde_json::from_str(r#"{"0": "too_hard", "2": "meh"}"#).unwrap();
        assert_eq!(map[&0], FeedbackReason::TooHard);
        assert_eq!(map[&2], FeedbackReason::Unknown);
    }

    #[test]
    fn test_buffer_zone_keeps_insertion_order() {
        let mut zone = BufferZone::new();
        for id in ["b", "a"] {
            zone.push(CandidateCourse {
                id: id.to_string(),
                title: id.to_string(),
                skills: SkillSet::new(),
                rating: None,
                price: None,
                author: None,
                summary: None,
            });
        }
        assert_eq!(zone.len(), 2);
        assert_eq!(zone.course_ids(), vec!["b", "a"]);
    }
}
