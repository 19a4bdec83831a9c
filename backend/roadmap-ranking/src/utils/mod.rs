// Utility functions for roadmap-ranking

use std::collections::BTreeSet;

/// Clean a free-text skill label into its canonical form.
///
/// Lowercases, drops `#`, turns `-` into a space, strips every other
/// non-word character and collapses whitespace.
pub fn normalize_skill(raw: &str) -> String {
    let lowered = raw.to_lowercase().replace('#', "").replace('-', " ");
    let cleaned: String = lowered
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '_')
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Round to a fixed number of decimal places.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// |a ∩ b| / |a ∪ b|, 0 for two empty sets.
pub fn jaccard<T: Ord>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// Base-2 Shannon entropy of a frequency distribution.
pub fn shannon_entropy<I>(counts: I) -> f64
where
    I: IntoIterator<Item = usize>,
{
    let counts: Vec<usize> = counts.into_iter().filter(|c| *c > 0).collect();
    let total: usize = counts.iter().sum();
    if total == 0 {
        return 0.0;
    }

    counts
        .iter()
        .map(|&c| {
            let p = c as f64 / total as f64;
            -p * p.log2()
        })
        .sum()
}

/// Logarithmic position discount used by DCG-style metrics.
pub fn position_discount(index: usize) -> f64 {
    ((index + 2) as f64).log2()
}
