use roadmap_ranking::{
    models::{skill_set, FeedbackMap, FeedbackReason, RoadmapRequest, Skill},
    services::ranking::{NoShuffle, StrategyName},
    services::recall::{into_candidates, RetrievedRecord},
    Config, CourseRanker, InMemoryRoadmapStore, RankingError, RoadmapAssembler, RoleCatalog,
    SessionStore, StaticCourseRetriever,
};
use std::sync::Arc;
use uuid::Uuid;

const ROLES: &str = r#"{
    "data_engineer": [
        {"skill": "Python", "priority": 0.9},
        {"skill": "SQL", "priority": 0.8},
        {"skill": "Docker", "priority": 0.5},
        {"skill": "Apache Spark", "priority": 0.7},
        {"skill": "Airflow", "priority": 0.4}
    ]
}"#;

const COURSES: &str = r#"[
    {
        "id": "c1",
        "title": "Python for Data",
        "payload": {"skills": ["python", "pandas"], "rating": 4.7, "author": "Ann Lee"}
    },
    {
        "id": "c2",
        "title": "SQL Deep Dive",
        "payload": {"skills": "sql, postgres", "rating": 4.5, "author": "Bob Ray"}
    },
    {
        "id": "c3",
        "title": "Spark at Scale",
        "payload": {
            "skills": "['apache spark', 'python']",
            "rating": 4.2,
            "author": "Ann Lee",
            "summary": "Batch and streaming jobs on Spark"
        }
    },
    {
        "id": "c4",
        "title": "Docker Basics",
        "payload": {"skills": ["docker"], "rating": 3.9, "author": "Cid Moe"}
    },
    {
        "id": "c5",
        "title": "Airflow Pipelines",
        "payload": {"skills": ["airflow", "python"], "author": "Dee Fox"}
    },
    {
        "id": "c6",
        "title": "Watercolor Painting",
        "payload": {"skills": ["painting"], "rating": 4.9, "author": "Eve Hart"}
    }
]"#;

fn catalog() -> Arc<RoleCatalog> {
    Arc::new(RoleCatalog::from_json(ROLES).expect("valid role catalog"))
}

fn records() -> Vec<RetrievedRecord> {
    serde_json::from_str(COURSES).expect("valid course catalog")
}

fn assembler(store: Arc<InMemoryRoadmapStore>) -> RoadmapAssembler {
    let mut config = Config::default();
    config.ranking.shuffle_seed = Some(42);

    let ranker = CourseRanker::new(catalog())
        .with_config(&config.ranking)
        .with_thresholds(config.quality);

    RoadmapAssembler::new(
        Arc::new(ranker),
        Arc::new(StaticCourseRetriever::new(records())),
        store,
        Arc::new(SessionStore::new()),
        &config,
    )
}

fn request(user_id: Uuid) -> RoadmapRequest {
    RoadmapRequest {
        user_id,
        role: "data_engineer".to_string(),
        skills: vec!["SQL".to_string()],
        query: "data engineering".to_string(),
    }
}

#[test]
fn test_ranking_orders_by_gap_coverage() {
    let ranker = CourseRanker::new(catalog());
    let candidates = into_candidates(records());
    let known = skill_set(["sql"]);
    let gap = ranker.analyzer().compute_gap(&known, "data_engineer");

    assert_eq!(
        gap.missing_skills,
        skill_set(["python", "apache spark", "docker", "airflow"])
    );

    let ranked = ranker.rank_courses(
        &candidates,
        &gap.missing_skills,
        &known,
        "data_engineer",
        &StrategyName::Basic.profile(),
        &mut NoShuffle,
    );

    assert_eq!(ranked.len(), 6);
    // spark + python covers the most weighted gap
    assert_eq!(ranked[0].course.id, "c3");
    assert_eq!(ranked[0].covered_skills, skill_set(["apache spark", "python"]));
    // off-role course only earns its rating share
    let painting = ranked.iter().find(|e| e.course.id == "c6").unwrap();
    assert!(painting.covered_skills.is_empty());
    assert_eq!(ranked.last().unwrap().course.id, "c2");
    for pair in ranked.windows(2) {
        assert!(pair[0].ranking_score >= pair[1].ranking_score);
    }
}

#[tokio::test]
async fn test_generate_then_feedback_flow() {
    let store = Arc::new(InMemoryRoadmapStore::new());
    let assembler = assembler(store.clone());
    let user_id = Uuid::new_v4();

    let roadmap = assembler.generate_roadmap(&request(user_id)).await.unwrap();
    assert!(!roadmap.nodes.is_empty());
    assert_eq!(roadmap.links.len(), roadmap.nodes.len() - 1);
    assert!(StrategyName::ALL
        .iter()
        .any(|s| s.as_str() == roadmap.strategy));
    assert_eq!(store.nodes(&roadmap.roadmap_id).len(), roadmap.nodes.len());
    let spark = roadmap.nodes.iter().find(|n| n.resource_id == "c3").unwrap();
    assert_eq!(spark.summary, "Batch and streaming jobs on Spark");

    // learn whatever node 0 teaches
    let first = roadmap.nodes[0].clone();
    let feedback: FeedbackMap = [(0, FeedbackReason::TooEasy)].into_iter().collect();
    let updated = assembler.update_roadmap(user_id, &feedback).await.unwrap();

    assert!(updated.nodes.iter().all(|n| n.resource_id != first.resource_id));
    let known = assembler.known_skills(&user_id);
    assert!(first.covered_skills.iter().all(|s| known.contains(s)));
    assert!(known.contains(&Skill::new("sql").unwrap()));
    assert!(store.roadmap(&roadmap.roadmap_id).is_none());

    // drop everything by the author of the new node 0
    let session = assembler.sessions().get(&user_id).unwrap();
    let author = session.ranked[0].course.author.clone();
    let feedback: FeedbackMap = [(0, FeedbackReason::BadAuthor)].into_iter().collect();
    let after_author = assembler.update_roadmap(user_id, &feedback).await.unwrap();

    let session = assembler.sessions().get(&user_id).unwrap();
    assert!(session.ranked.iter().all(|e| e.course.author != author));
    assert_eq!(after_author.nodes.len(), session.ranked.len().min(10));
    assert_eq!(store.roadmap_count(), 1);
}

#[tokio::test]
async fn test_unavailable_courses_stay_out() {
    let store = Arc::new(InMemoryRoadmapStore::new());
    let assembler = assembler(store);
    let user_id = Uuid::new_v4();

    let roadmap = assembler.generate_roadmap(&request(user_id)).await.unwrap();
    let gone = roadmap.nodes[0].resource_id.clone();

    let feedback: FeedbackMap = [(0, FeedbackReason::Unavailable)].into_iter().collect();
    assembler.update_roadmap(user_id, &feedback).await.unwrap();
    assert_eq!(assembler.buffer_zone(&user_id), vec![gone.clone()]);

    let regenerated = assembler.generate_roadmap(&request(user_id)).await.unwrap();
    assert!(regenerated.nodes.iter().all(|n| n.resource_id != gone));
}

#[tokio::test]
async fn test_update_requires_session() {
    let assembler = assembler(Arc::new(InMemoryRoadmapStore::new()));
    let result = assembler.update_roadmap(Uuid::new_v4(), &FeedbackMap::new()).await;
    assert!(matches!(result, Err(RankingError::SessionNotFound(_))));
}

#[test]
fn test_all_skills_from_catalog() {
    let assembler = assembler(Arc::new(InMemoryRoadmapStore::new()));
    let skills = assembler.all_skills();
    assert_eq!(skills.len(), 5);
    assert!(skills.contains(&Skill::new("Apache Spark").unwrap()));
}
