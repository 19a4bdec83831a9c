use crate::models::RankedEntry;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Absorbs float noise left after rounding scores to 4 places.
const SCORE_TOLERANCE: f64 = 1e-9;

/// Source of randomness for the near-tie shuffle.
pub trait TieShuffler: Send {
    fn shuffle(&mut self, bucket: &mut [RankedEntry]);
}

/// Leaves every bucket untouched. Used for reproducible orderings.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoShuffle;

impl TieShuffler for NoShuffle {
    fn shuffle(&mut self, _bucket: &mut [RankedEntry]) {}
}

#[derive(Debug)]
pub struct RandomShuffler {
    rng: StdRng,
}

impl Default for RandomShuffler {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomShuffler {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Seeded when a seed is configured, entropy otherwise.
    pub fn from_seed_option(seed: Option<u64>) -> Self {
        seed.map(Self::with_seed).unwrap_or_default()
    }
}

impl TieShuffler for RandomShuffler {
    fn shuffle(&mut self, bucket: &mut [RankedEntry]) {
        bucket.shuffle(&mut self.rng);
    }
}

/// Shuffle runs of adjacent entries whose score is within `epsilon` of the
/// run's first entry. Entries never leave their run.
pub fn shuffle_ties(entries: &mut [RankedEntry], epsilon: f64, shuffler: &mut dyn TieShuffler) {
    let mut start = 0;
    while start < entries.len() {
        let anchor = entries[start].ranking_score;
        let mut end = start + 1;
        while end < entries.len()
            && (anchor - entries[end].ranking_score).abs() <= epsilon + SCORE_TOLERANCE
        {
            end += 1;
        }

        if end - start > 1 {
            shuffler.shuffle(&mut entries[start..end]);
        }
        start = end;
    }
}
