use crate::error::{RankingError, Result};
use crate::models::{LinkCreate, LinkRecord, NodeCreate, NodeRecord, RoadmapRecord};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

/// Persistence of roadmaps, nodes and links.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoadmapStore: Send + Sync {
    async fn create_roadmap(&self, user_id: Uuid) -> Result<RoadmapRecord>;
    async fn create_node(&self, node: NodeCreate) -> Result<NodeRecord>;
    async fn create_link(&self, link: LinkCreate) -> Result<LinkRecord>;
    async fn delete_roadmap(&self, roadmap_id: Uuid) -> Result<()>;
}

#[derive(Debug, Clone)]
struct StoredRoadmap {
    record: RoadmapRecord,
    nodes: Vec<NodeRecord>,
    links: Vec<LinkRecord>,
}

/// Process-local store, used by the CLI and tests.
#[derive(Debug, Default)]
pub struct InMemoryRoadmapStore {
    roadmaps: DashMap<Uuid, StoredRoadmap>,
}

impl InMemoryRoadmapStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn roadmap_count(&self) -> usize {
        self.roadmaps.len()
    }

    pub fn roadmap(&self, roadmap_id: &Uuid) -> Option<RoadmapRecord> {
        self.roadmaps.get(roadmap_id).map(|r| r.record.clone())
    }

    pub fn nodes(&self, roadmap_id: &Uuid) -> Vec<NodeRecord> {
        self.roadmaps
            .get(roadmap_id)
            .map(|r| r.nodes.clone())
            .unwrap_or_default()
    }

    pub fn links(&self, roadmap_id: &Uuid) -> Vec<LinkRecord> {
        self.roadmaps
            .get(roadmap_id)
            .map(|r| r.links.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl RoadmapStore for InMemoryRoadmapStore {
    async fn create_roadmap(&self, user_id: Uuid) -> Result<RoadmapRecord> {
        let record = RoadmapRecord {
            roadmap_id: Uuid::new_v4(),
            user_id,
            created_at: Utc::now(),
        };
        self.roadmaps.insert(
            record.roadmap_id,
            StoredRoadmap {
                record: record.clone(),
                nodes: Vec::new(),
                links: Vec::new(),
            },
        );
        Ok(record)
    }

    async fn create_node(&self, node: NodeCreate) -> Result<NodeRecord> {
        let mut roadmap = self.roadmaps.get_mut(&node.roadmap_id).ok_or_else(|| {
            RankingError::Storage(format!("roadmap {} not found", node.roadmap_id))
        })?;

        let record = NodeRecord {
            node_id: Uuid::new_v4(),
            roadmap_id: node.roadmap_id,
            position: node.position,
            title: node.title,
            resource_id: node.resource_id,
            summary: node.summary,
            ranking_score: node.ranking_score,
            covered_skills: node.covered_skills,
            progress: 0,
        };
        roadmap.nodes.push(record.clone());
        Ok(record)
    }

    async fn create_link(&self, link: LinkCreate) -> Result<LinkRecord> {
        let mut roadmap = self.roadmaps.get_mut(&link.roadmap_id).ok_or_else(|| {
            RankingError::Storage(format!("roadmap {} not found", link.roadmap_id))
        })?;

        let known = |id: Uuid| roadmap.nodes.iter().any(|n| n.node_id == id);
        if !known(link.from_node) || !known(link.to_node) {
            return Err(RankingError::Storage(format!(
                "link {} -> {} references unknown nodes",
                link.from_node, link.to_node
            )));
        }

        let record = LinkRecord {
            link_id: Uuid::new_v4(),
            roadmap_id: link.roadmap_id,
            from_node: link.from_node,
            to_node: link.to_node,
        };
        roadmap.links.push(record.clone());
        Ok(record)
    }

    async fn delete_roadmap(&self, roadmap_id: Uuid) -> Result<()> {
        self.roadmaps.remove(&roadmap_id);
        Ok(())
    }
}
