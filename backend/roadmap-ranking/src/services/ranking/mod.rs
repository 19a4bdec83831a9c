/// Ranking Module
///
/// Turns retrieved candidates into an ordered, scored course list for a
/// user's skill gap.
///
/// # Architecture
/// - **Strategy Layer**: named weight profiles plus post-processing knobs
/// - **Scoring Layer**: coverage / priority / rating scoring with diversity
///   and known-skill penalties
/// - **Fallback Layer**: re-ranks with other strategies until the offline
///   quality checks pass
///
/// # Workflow
/// 1. Optionally drop low-quality candidates
/// 2. Base score every candidate against the skill gap
/// 3. Apply penalties in base-score order, round, sort
/// 4. Cap similar courses and shuffle near ties (strategy-dependent)
/// 5. Evaluate the top-k and fall back to another strategy if needed
mod fallback;
mod scorer;
pub mod shuffle;
pub mod strategy;

pub use fallback::FallbackOutcome;
pub use scorer::CourseRanker;
pub use shuffle::{shuffle_ties, NoShuffle, RandomShuffler, TieShuffler};
pub use strategy::{ScoreWeights, StrategyName, StrategyProfile};
