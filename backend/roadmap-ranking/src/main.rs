use anyhow::Context;
use roadmap_ranking::{
    models::RoadmapRequest, Config, CourseRanker, InMemoryRoadmapStore, RoadmapAssembler,
    RoleCatalog, SessionStore, StaticCourseRetriever,
};
use std::io::Read;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing (stderr, stdout carries the roadmap)
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    // Load config
    let config = Config::from_env().context("Failed to load config")?;
    config.validate()?;

    info!("Starting {}", config.service.service_name);

    // Load catalogs
    let catalog = Arc::new(RoleCatalog::from_path(
        &config.service.role_catalog_path,
        config.service.priority_scale,
    )?);
    let retriever = Arc::new(StaticCourseRetriever::from_path(
        &config.service.course_catalog_path,
    )?);

    let ranker = CourseRanker::new(catalog)
        .with_config(&config.ranking)
        .with_thresholds(config.quality);

    let assembler = RoadmapAssembler::new(
        Arc::new(ranker),
        retriever,
        Arc::new(InMemoryRoadmapStore::new()),
        Arc::new(SessionStore::new()),
        &config,
    );

    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("Failed to read request from stdin")?;
    let request: RoadmapRequest =
        serde_json::from_str(&input).context("Invalid roadmap request")?;

    let roadmap = assembler.generate_roadmap(&request).await?;
    println!("{}", serde_json::to_string_pretty(&roadmap)?);

    Ok(())
}
