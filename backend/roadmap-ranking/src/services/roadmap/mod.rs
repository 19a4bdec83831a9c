/// Roadmap Assembly
///
/// Glues skill gap analysis, retrieval, ranking and feedback into the two
/// user-facing flows: generate a roadmap and update it from feedback.
///
/// # Workflow
/// 1. Gap between the user's skills and the role's requirements
/// 2. Retrieval bounded by the configured timeout
/// 3. Ranking with strategy fallback
/// 4. Top `max_nodes` entries persisted as nodes, linked in rank order
/// 5. Previous roadmap deleted once the new one is stored
///
/// Roadmap node `i` always maps to position `i` of the session's ranking,
/// which is how feedback node ids are resolved. Requests for one user are
/// serialized so feedback is never applied to a stale session.
mod store;

pub use store::{InMemoryRoadmapStore, RoadmapStore};

#[cfg(test)]
pub use store::MockRoadmapStore;

use crate::config::Config;
use crate::error::{RankingError, Result};
use crate::models::{
    skill_set, EvaluationMetrics, FeedbackMap, LinkCreate, LinkRecord, NodeCreate, NodeRecord,
    RankedEntry, RoadmapInfo, RoadmapRequest, SkillSet,
};
use crate::services::ranking::{CourseRanker, RandomShuffler, StrategyName};
use crate::services::recall::{into_candidates, CourseRetriever, RetrievedRecord};
use crate::services::session::{RankingSession, SessionStore};
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use uuid::Uuid;

pub struct RoadmapAssembler {
    ranker: Arc<CourseRanker>,
    retriever: Arc<dyn CourseRetriever>,
    store: Arc<dyn RoadmapStore>,
    sessions: Arc<SessionStore>,
    user_locks: DashMap<Uuid, Arc<Mutex<()>>>,
    max_nodes: usize,
    retrieval_limit: usize,
    retrieval_timeout: Duration,
    max_attempts: usize,
    shuffle_seed: Option<u64>,
}

impl RoadmapAssembler {
    pub fn new(
        ranker: Arc<CourseRanker>,
        retriever: Arc<dyn CourseRetriever>,
        store: Arc<dyn RoadmapStore>,
        sessions: Arc<SessionStore>,
        config: &Config,
    ) -> Self {
        Self {
            ranker,
            retriever,
            store,
            sessions,
            user_locks: DashMap::new(),
            max_nodes: config.service.max_nodes,
            retrieval_limit: config.service.retrieval_limit,
            retrieval_timeout: Duration::from_millis(config.service.retrieval_timeout_ms),
            max_attempts: config.ranking.max_attempts,
            shuffle_seed: config.ranking.shuffle_seed,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Every skill known to the role catalog, for skill pickers.
    pub fn all_skills(&self) -> SkillSet {
        self.ranker.analyzer().catalog().all_skills()
    }

    /// Known skills of a user, empty when the user has no session.
    pub fn known_skills(&self, user_id: &Uuid) -> SkillSet {
        self.sessions
            .get(user_id)
            .map(|s| s.state.known_skills)
            .unwrap_or_default()
    }

    /// Ids of the courses a user reported as unavailable.
    pub fn buffer_zone(&self, user_id: &Uuid) -> Vec<String> {
        self.sessions
            .get(user_id)
            .map(|s| s.state.buffer_zone.iter().map(|c| c.id.clone()).collect())
            .unwrap_or_default()
    }

    fn user_lock(&self, user_id: Uuid) -> Arc<Mutex<()>> {
        self.user_locks.entry(user_id).or_default().clone()
    }

    pub async fn generate_roadmap(&self, request: &RoadmapRequest) -> Result<RoadmapInfo> {
        let lock = self.user_lock(request.user_id);
        let _guard = lock.lock().await;

        let user_skills = skill_set(&request.skills);
        let gap = self.ranker.analyzer().compute_gap(&user_skills, &request.role);

        // a new roadmap starts a new session but keeps the unavailable courses
        let previous = self.sessions.get(&request.user_id);
        let mut session = RankingSession::new(request.user_id, &request.role, user_skills.clone());
        if let Some(previous) = &previous {
            session.state.buffer_zone = previous.state.buffer_zone.clone();
        }

        let records = self.retrieve(request).await?;
        let unavailable: HashSet<String> = session
            .state
            .buffer_zone
            .iter()
            .map(|c| c.id.clone())
            .collect();
        let candidates: Vec<_> = into_candidates(records)
            .into_iter()
            .filter(|c| !unavailable.contains(&c.id))
            .collect();

        let mut shuffler = RandomShuffler::from_seed_option(self.shuffle_seed);
        let outcome = self.ranker.rank_with_fallback(
            &candidates,
            &gap.missing_skills,
            &user_skills,
            &request.role,
            self.max_attempts,
            &mut shuffler,
        );

        if !outcome.accepted && outcome.attempts > 0 {
            warn!(
                user_id = %request.user_id,
                strategy = %outcome.strategy,
                attempts = outcome.attempts,
                "No strategy met the quality thresholds, using last ranking"
            );
        }

        let info = self
            .persist(request.user_id, &outcome.ranked, outcome.strategy, outcome.metrics)
            .await?;
        if let Some(old) = previous.and_then(|p| p.roadmap_id) {
            self.discard(old).await;
        }

        session.ranked = outcome.ranked;
        session.strategy = outcome.strategy;
        session.state.last_metrics = Some(outcome.metrics);
        session.roadmap_id = Some(info.roadmap_id);
        self.sessions.upsert(session);

        info!(
            user_id = %request.user_id,
            role = %request.role,
            missing = gap.missing_skills.len(),
            candidates = candidates.len(),
            nodes = info.nodes.len(),
            strategy = %info.strategy,
            "Roadmap generated"
        );

        Ok(info)
    }

    /// Apply feedback to the user's current ranking and replace the roadmap.
    ///
    /// When the new roadmap cannot be stored, the previous one stays in place
    /// and the session still keeps the feedback (ranking, known skills and
    /// buffer zone), so the next successful update persists it.
    pub async fn update_roadmap(
        &self,
        user_id: Uuid,
        feedback: &FeedbackMap,
    ) -> Result<RoadmapInfo> {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;

        let mut session = self
            .sessions
            .get(&user_id)
            .ok_or(RankingError::SessionNotFound(user_id))?;

        let known_before = session.state.known_skills.len();
        let mut shuffler = RandomShuffler::from_seed_option(self.shuffle_seed);
        session.ranked = self.ranker.update_ranking(
            &session.ranked,
            feedback,
            &mut session.state,
            &session.role,
            &mut shuffler,
        );
        if session.state.known_skills.len() != known_before {
            session.strategy = StrategyName::Basic;
        }

        let metrics = self.ranker.evaluate_ranking(
            &session.ranked,
            &session.role,
            self.ranker.evaluation_k(),
        );
        session.state.last_metrics = Some(metrics);
        session.touch();

        let persisted = self
            .persist(user_id, &session.ranked, session.strategy, metrics)
            .await;
        let info = match persisted {
            Ok(info) => info,
            Err(e) => {
                warn!(
                    user_id = %user_id,
                    error = %e,
                    "Roadmap not replaced, feedback kept in session"
                );
                self.sessions.upsert(session);
                return Err(e);
            }
        };

        if let Some(old) = session.roadmap_id.replace(info.roadmap_id) {
            self.discard(old).await;
        }
        self.sessions.upsert(session);

        info!(
            user_id = %user_id,
            feedback = feedback.len(),
            nodes = info.nodes.len(),
            "Roadmap updated"
        );

        Ok(info)
    }

    async fn retrieve(&self, request: &RoadmapRequest) -> Result<Vec<RetrievedRecord>> {
        let search = self.retriever.search(
            &request.role,
            &request.query,
            &request.skills,
            self.retrieval_limit,
        );

        match tokio::time::timeout(self.retrieval_timeout, search).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    role = %request.role,
                    timeout_ms = self.retrieval_timeout.as_millis() as u64,
                    "Retrieval timed out"
                );
                Err(RankingError::Timeout(format!(
                    "retrieval exceeded {} ms",
                    self.retrieval_timeout.as_millis()
                )))
            }
        }
    }

    /// Delete a replaced roadmap. A failure only leaves an orphan behind.
    async fn discard(&self, roadmap_id: Uuid) {
        if let Err(e) = self.store.delete_roadmap(roadmap_id).await {
            error!(roadmap_id = %roadmap_id, error = %e, "Failed to delete replaced roadmap");
        }
    }

    /// Store a roadmap for `ranked`. Nothing is left behind on failure.
    async fn persist(
        &self,
        user_id: Uuid,
        ranked: &[RankedEntry],
        strategy: StrategyName,
        metrics: EvaluationMetrics,
    ) -> Result<RoadmapInfo> {
        let roadmap = self.store.create_roadmap(user_id).await?;

        match self.persist_nodes(roadmap.roadmap_id, ranked).await {
            Ok((nodes, links)) => Ok(RoadmapInfo {
                roadmap_id: roadmap.roadmap_id,
                strategy: strategy.as_str().to_string(),
                metrics,
                nodes,
                links,
            }),
            Err(e) => {
                self.discard(roadmap.roadmap_id).await;
                Err(e)
            }
        }
    }

    async fn persist_nodes(
        &self,
        roadmap_id: Uuid,
        ranked: &[RankedEntry],
    ) -> Result<(Vec<NodeRecord>, Vec<LinkRecord>)> {
        let mut nodes = Vec::with_capacity(self.max_nodes.min(ranked.len()));
        for (position, entry) in ranked.iter().take(self.max_nodes).enumerate() {
            let node = self
                .store
                .create_node(NodeCreate {
                    roadmap_id,
                    position,
                    title: entry.course.title.clone(),
                    resource_id: entry.course.id.clone(),
                    summary: entry.course.summary.clone().unwrap_or_default(),
                    ranking_score: entry.ranking_score,
                    covered_skills: entry.covered_skills.clone(),
                })
                .await?;
            nodes.push(node);
        }

        let mut links = Vec::with_capacity(nodes.len().saturating_sub(1));
        for pair in nodes.windows(2) {
            let link = self
                .store
                .create_link(LinkCreate {
                    roadmap_id,
                    from_node: pair[0].node_id,
                    to_node: pair[1].node_id,
                })
                .await?;
            links.push(link);
        }

        Ok((nodes, links))
    }
}
