pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use config::Config;
pub use error::{RankingError, Result};
pub use services::{
    CourseRanker, CourseRetriever, InMemoryRoadmapStore, RoadmapAssembler, RoadmapStore,
    RoleCatalog, SessionStore, SkillGapAnalyzer, StaticCourseRetriever,
};
