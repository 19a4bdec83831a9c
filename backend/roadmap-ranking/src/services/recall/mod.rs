mod static_recall;

use crate::error::Result;
use crate::models::{skill_set, CandidateCourse, SkillSet};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{info, warn};

pub use static_recall::StaticCourseRetriever;

/// 召回層: semantic search over the course catalog
#[async_trait]
pub trait CourseRetriever: Send + Sync {
    async fn search(
        &self,
        role: &str,
        query: &str,
        skills: &[String],
        limit: usize,
    ) -> Result<Vec<RetrievedRecord>>;
}

/// Skills as the catalog delivers them: a real list, or a list encoded in a
/// string (`"python, sql"`, `"['python', 'sql']"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawSkills {
    List(Vec<String>),
    Text(String),
}

impl RawSkills {
    /// Coerce into a skill set. Unparseable text yields an empty set.
    pub fn into_skill_set(self, course_id: &str) -> SkillSet {
        match self {
            RawSkills::List(labels) => skill_set(labels),
            RawSkills::Text(text) => match parse_skill_text(&text) {
                Some(labels) => skill_set(labels),
                None => {
                    warn!(
                        course_id = %course_id,
                        raw = %text,
                        "Unparseable skills, treating as empty"
                    );
                    SkillSet::new()
                }
            },
        }
    }
}

fn parse_skill_text(text: &str) -> Option<Vec<String>> {
    let text = text.trim();
    if text.is_empty() {
        return Some(Vec::new());
    }

    if !text.starts_with('[') {
        return Some(
            text.split(|c: char| c == ',' || c == ';')
                .map(|s| s.trim().to_string())
                .collect(),
        );
    }
    if !text.ends_with(']') {
        return None;
    }
    if let Ok(labels) = serde_json::from_str::<Vec<String>>(text) {
        return Some(labels);
    }

    // single-quoted list literal
    let inner = &text[1..text.len() - 1];
    let mut labels = Vec::new();
    for item in inner.split(',') {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        let unquoted = item
            .strip_prefix('\'')
            .and_then(|s| s.strip_suffix('\''))
            .or_else(|| item.strip_prefix('"').and_then(|s| s.strip_suffix('"')))?;
        labels.push(unquoted.to_string());
    }
    Some(labels)
}

/// Metadata attached to a retrieved course.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoursePayload {
    #[serde(default)]
    pub skills: Option<RawSkills>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// One search hit, as returned by the retrieval collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedRecord {
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// Similarity to the query, higher is closer.
    #[serde(default)]
    pub similarity: f64,
    #[serde(default)]
    pub payload: CoursePayload,
}

impl RetrievedRecord {
    pub fn into_candidate(self) -> CandidateCourse {
        let skills = self
            .payload
            .skills
            .map(|raw| raw.into_skill_set(&self.id))
            .unwrap_or_default();

        CandidateCourse {
            id: self.id,
            title: self.title,
            skills,
            rating: self.payload.rating,
            price: self.payload.price,
            author: self.payload.author.filter(|a| !a.trim().is_empty()),
            summary: self.payload.summary.filter(|s| !s.trim().is_empty()),
        }
    }
}

/// Normalize search hits into candidates, keeping the first hit per course id.
pub fn into_candidates(records: Vec<RetrievedRecord>) -> Vec<CandidateCourse> {
    let total = records.len();
    let mut seen: HashSet<String> = HashSet::new();
    let mut candidates = Vec::with_capacity(total);

    for record in records {
        if seen.insert(record.id.clone()) {
            candidates.push(record.into_candidate());
        }
    }

    info!(
        retrieved = total,
        unique = candidates.len(),
        "Retrieved courses normalized"
    );
    candidates
}
