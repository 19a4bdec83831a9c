pub mod diversity;
pub mod evaluation;
pub mod feedback;
pub mod ranking;
pub mod recall;
pub mod roadmap;
pub mod session;
pub mod skill_gap;

pub use diversity::DiversityLayer;
pub use evaluation::{evaluate_ranking, QualityCheck};
pub use ranking::{CourseRanker, FallbackOutcome, StrategyName, StrategyProfile};
pub use recall::{CourseRetriever, StaticCourseRetriever};
pub use roadmap::{InMemoryRoadmapStore, RoadmapAssembler, RoadmapStore};
pub use session::{RankingSession, SessionState, SessionStore};
pub use skill_gap::{RoleCatalog, SkillGapAnalyzer};
