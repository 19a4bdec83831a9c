// ============================================
// Ranking Sessions (per-user ranking state)
// ============================================
//
// Everything the ranker mutates across requests lives here, scoped to one
// user: known skills, the unavailable-course buffer zone, last metrics and
// the current ranked list backing the user's roadmap.

use crate::models::{BufferZone, EvaluationMetrics, RankedEntry, SkillSet};
use crate::services::ranking::StrategyName;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

/// Mutable state the feedback processor works on.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub known_skills: SkillSet,
    pub buffer_zone: BufferZone,
    pub last_metrics: Option<EvaluationMetrics>,
}

impl SessionState {
    pub fn new(known_skills: SkillSet) -> Self {
        Self {
            known_skills,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct RankingSession {
    pub user_id: Uuid,
    pub role: String,
    pub state: SessionState,
    /// Current ranking; roadmap node i is `ranked[i]`.
    pub ranked: Vec<RankedEntry>,
    pub strategy: StrategyName,
    pub roadmap_id: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

impl RankingSession {
    pub fn new(user_id: Uuid, role: &str, known_skills: SkillSet) -> Self {
        Self {
            user_id,
            role: role.to_string(),
            state: SessionState::new(known_skills),
            ranked: Vec::new(),
            strategy: StrategyName::Basic,
            roadmap_id: None,
            updated_at: Utc::now(),
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Concurrent map of user id -> session.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<Uuid, RankingSession>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, user_id: &Uuid) -> Option<RankingSession> {
        self.sessions.get(user_id).map(|s| s.value().clone())
    }

    pub fn upsert(&self, session: RankingSession) {
        debug!(user_id = %session.user_id, ranked = session.ranked.len(), "Session stored");
        self.sessions.insert(session.user_id, session);
    }

    pub fn remove(&self, user_id: &Uuid) -> Option<RankingSession> {
        self.sessions.remove(user_id).map(|(_, s)| s)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::skill_set;

    #[test]
    fn test_sessions_are_isolated_per_user() {
        let store = SessionStore::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        store.upsert(RankingSession::new(alice, "data_engineer", skill_set(["python"])));
        store.upsert(RankingSession::new(bob, "data_analyst", SkillSet::new()));

        let mut session = store.get(&alice).unwrap();
        session.state.known_skills.insert(crate::models::Skill::new("sql").unwrap());
        store.upsert(session);

        assert_eq!(store.len(), 2);
        assert_eq!(store.get(&alice).unwrap().state.known_skills, skill_set(["python", "sql"]));
        assert!(store.get(&bob).unwrap().state.known_skills.is_empty());

        assert!(store.remove(&bob).is_some());
        assert!(store.get(&bob).is_none());
    }
}
