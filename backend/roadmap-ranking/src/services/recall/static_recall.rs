use super::{CourseRetriever, RetrievedRecord};
use crate::error::{RankingError, Result};
use crate::utils::normalize_skill;
use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

/// Static Retrieval - 本地課程目錄
/// Keeps the catalog in memory and orders it by lexical overlap with the
/// query terms. Stands in for the vector index in the CLI and in tests.
pub struct StaticCourseRetriever {
    records: Vec<RetrievedRecord>,
}

impl StaticCourseRetriever {
    pub fn new(records: Vec<RetrievedRecord>) -> Self {
        Self { records }
    }

    /// Load a JSON array of records.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            RankingError::Retrieval(format!("cannot read {}: {}", path.display(), e))
        })?;
        let records: Vec<RetrievedRecord> = serde_json::from_str(&json)?;
        info!(courses = records.len(), path = %path.display(), "Course catalog loaded");
        Ok(Self::new(records))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Share of query terms found in the course title or skills.
    fn relevance(record: &RetrievedRecord, terms: &HashSet<String>) -> f64 {
        if terms.is_empty() {
            return 0.0;
        }

        let mut course_terms: HashSet<String> = tokens(&record.title);
        if let Some(skills) = record.payload.skills.clone() {
            for skill in skills.into_skill_set(&record.id) {
                course_terms.extend(tokens(skill.as_str()));
            }
        }

        terms.intersection(&course_terms).count() as f64 / terms.len() as f64
    }
}

fn tokens(text: &str) -> HashSet<String> {
    normalize_skill(text)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl CourseRetriever for StaticCourseRetriever {
    async fn search(
        &self,
        role: &str,
        query: &str,
        skills: &[String],
        limit: usize,
    ) -> Result<Vec<RetrievedRecord>> {
        let mut terms = tokens(&role.replace('_', " "));
        terms.extend(tokens(query));
        for skill in skills {
            terms.extend(tokens(skill));
        }

        let mut scored: Vec<(f64, &RetrievedRecord)> = self
            .records
            .iter()
            .map(|record| (Self::relevance(record, &terms), record))
            .collect();

        // stable: equally relevant courses keep catalog order
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

        let hits: Vec<RetrievedRecord> = scored
            .into_iter()
            .take(limit)
            .map(|(similarity, record)| RetrievedRecord {
                similarity,
                ..record.clone()
            })
            .collect();

        debug!(
            role = %role,
            terms = terms.len(),
            hits = hits.len(),
            "Static catalog searched"
        );

        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::recall::{CoursePayload, RawSkills};

    fn record(id: &str, title: &str, skills: &[&str]) -> RetrievedRecord {
        RetrievedRecord {
            id: id.to_string(),
            title: title.to_string(),
            similarity: 0.0,
            payload: CoursePayload {
                skills: Some(RawSkills::List(skills.iter().map(|s| s.to_string()).collect())),
                ..Default::default()
            },
        }
    }

    fn catalog() -> StaticCourseRetriever {
        StaticCourseRetriever::new(vec![
            record("1", "Cooking basics", &["knife skills"]),
            record("2", "SQL for analysts", &["sql"]),
            record("3", "Docker in practice", &["docker", "linux"]),
        ])
    }

    #[test]
    fn test_search_orders_by_overlap() {
        let hits = tokio_test::block_on(catalog().search(
            "data_engineer",
            "learn docker",
            &["linux".to_string()],
            10,
        ))
        .unwrap();

        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].id, "3");
        assert!(hits[0].similarity > hits[1].similarity);
    }

    #[tokio::test]
    async fn test_search_respects_limit() {
        let hits = catalog().search("analyst", "sql", &[], 1).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "2");
    }

    #[test]
    fn test_missing_catalog_file() {
        let result = StaticCourseRetriever::from_path("/nonexistent/courses.json");
        assert!(matches!(result, Err(RankingError::Retrieval(_))));
    }
}
