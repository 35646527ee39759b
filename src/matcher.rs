//! Best-fit tile search under a squared per-channel color metric.
//!
//! Pure functions with no shared state: multiple workers call [`best_fit`]
//! concurrently against the same immutable palette slice.

use crate::feature::FeatureVector;

/// Squared color distance between two feature vectors, abandoned early.
///
/// Accumulates squared per-channel differences and returns as soon as the
/// partial sum exceeds `bail`. The early return value is only ever compared
/// against `bail` by the caller, so abandoning a candidate never changes
/// which index [`best_fit`] selects.
pub fn diff_within(a: &FeatureVector, b: &FeatureVector, bail: u64) -> u64 {
    debug_assert_eq!(a.len(), b.len());

    let mut diff: u64 = 0;
    for (&x, &y) in a.values().iter().zip(b.values().iter()) {
        let d = x as i32 - y as i32;
        diff += (d * d) as u64;
        if diff > bail {
            return diff;
        }
    }
    diff
}

/// Index of the palette entry closest to `query`.
///
/// Linear scan with a running minimum; ties keep the first candidate
/// encountered, so palette order decides. Returns `None` when the palette
/// is empty.
pub fn best_fit(query: &FeatureVector, palette_features: &[FeatureVector]) -> Option<usize> {
    let mut best_index = None;
    let mut min_diff = u64::MAX;

    for (index, candidate) in palette_features.iter().enumerate() {
        let diff = diff_within(query, candidate, min_diff);
        if diff < min_diff {
            min_diff = diff;
            best_index = Some(index);
        }
    }

    best_index
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Full distance with no early exit, for equivalence checks.
    fn brute_force_diff(a: &FeatureVector, b: &FeatureVector) -> u64 {
        a.values()
            .iter()
            .zip(b.values().iter())
            .map(|(&x, &y)| {
                let d = x as i32 - y as i32;
                (d * d) as u64
            })
            .sum()
    }

    fn brute_force_best_fit(query: &FeatureVector, palette: &[FeatureVector]) -> Option<usize> {
        let mut best = None;
        let mut min = u64::MAX;
        for (i, candidate) in palette.iter().enumerate() {
            let diff = brute_force_diff(query, candidate);
            if diff < min {
                min = diff;
                best = Some(i);
            }
        }
        best
    }

    /// Deterministic pseudo-random byte stream (LCG) for palette data.
    fn random_vector(len: usize, seed: &mut u64) -> FeatureVector {
        let mut values = Vec::with_capacity(len);
        for _ in 0..len {
            *seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            values.push((*seed >> 33) as u8);
        }
        FeatureVector::from_raw(values)
    }

    #[test]
    fn test_empty_palette_is_no_match() {
        let query = FeatureVector::from_raw(vec![1, 2, 3]);
        assert_eq!(best_fit(&query, &[]), None);
    }

    #[test]
    fn test_exact_self_match() {
        let query = FeatureVector::from_raw(vec![42, 17, 250]);
        let palette = vec![query.clone()];
        assert_eq!(best_fit(&query, &palette), Some(0));
        assert_eq!(diff_within(&query, &palette[0], u64::MAX), 0);
    }

    #[test]
    fn test_red_query_prefers_red_tile() {
        // Palette: pure red and pure green; query is near-red
        let red = FeatureVector::from_raw(vec![255, 0, 0]);
        let green = FeatureVector::from_raw(vec![0, 255, 0]);
        let query = FeatureVector::from_raw(vec![250, 10, 5]);
        assert_eq!(best_fit(&query, &[red.clone(), green]), Some(0));
        assert_eq!(diff_within(&query, &red, u64::MAX), 25 + 100 + 25);
    }

    #[test]
    fn test_tie_break_keeps_first() {
        let a = FeatureVector::from_raw(vec![10, 10, 10]);
        let query = FeatureVector::from_raw(vec![0, 0, 0]);
        // Two identical candidates: the earlier index wins
        assert_eq!(best_fit(&query, &[a.clone(), a]), Some(0));
    }

    #[test]
    fn test_bail_out_returns_partial_sum_above_bound() {
        let a = FeatureVector::from_raw(vec![255, 255, 255]);
        let b = FeatureVector::from_raw(vec![0, 0, 0]);
        let diff = diff_within(&a, &b, 100);
        assert!(diff > 100);
        // Abandoned after the first channel already exceeded the bound
        assert_eq!(diff, 255 * 255);
    }

    #[test]
    fn test_bail_out_matches_brute_force() {
        let mut seed = 0x9e3779b97f4a7c15;
        for palette_size in [1usize, 2, 7, 64] {
            let palette: Vec<FeatureVector> =
                (0..palette_size).map(|_| random_vector(75, &mut seed)).collect();
            for _ in 0..20 {
                let query = random_vector(75, &mut seed);
                assert_eq!(
                    best_fit(&query, &palette),
                    brute_force_best_fit(&query, &palette),
                    "bail-out changed the result for palette size {}",
                    palette_size
                );
            }
        }
    }

    #[test]
    fn test_distance_is_order_independent_of_bail() {
        let mut seed = 7;
        let a = random_vector(48, &mut seed);
        let b = random_vector(48, &mut seed);
        let full = brute_force_diff(&a, &b);
        // A bound at least as large as the full distance never truncates
        assert_eq!(diff_within(&a, &b, full), full);
        assert_eq!(diff_within(&a, &b, u64::MAX), full);
    }
}
