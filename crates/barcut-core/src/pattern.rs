//! Cutting pattern enumeration for a single stock length.

use crate::error::OptimizeError;

/// One way to cut a single bar: how many pieces of each demand length it
/// yields, and what is left over.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pattern {
    /// Piece count per demand length, aligned with the demand order
    pub counts: Vec<u64>,
    /// Offcut left on the bar
    pub waste: u64,
}

impl Pattern {
    /// Total length of the pieces cut by this pattern.
    pub fn used_length(&self, demand_lengths: &[u64]) -> u64 {
        self.counts
            .iter()
            .zip(demand_lengths)
            .map(|(count, length)| count * length)
            .sum()
    }
}

/// Every non-empty combination of demand lengths that fits in `stock_length`.
///
/// # Panics
///
/// Panics if any demand length is zero. Use [`generate_patterns_bounded`]
/// for unvalidated lengths.
pub fn generate_patterns(stock_length: u64, demand_lengths: &[u64]) -> Vec<Pattern> {
    let mut patterns = Vec::new();
    let mut counts = vec![0; demand_lengths.len()];
    // usize::MAX cannot be exceeded, so the enumeration always completes
    let _ = enumerate(stock_length, demand_lengths, 0, stock_length, &mut counts, &mut patterns, usize::MAX);
    patterns
}

/// Like [`generate_patterns`] but fails once more than `limit` patterns exist.
/// A zero demand length is reported as invalid input.
pub fn generate_patterns_bounded(
    stock_length: u64,
    demand_lengths: &[u64],
    limit: usize,
) -> Result<Vec<Pattern>, OptimizeError> {
    if let Some(index) = demand_lengths.iter().position(|&length| length == 0) {
        return Err(OptimizeError::invalid(format!(
            "demand length at position {} must be positive",
            index
        )));
    }
    let mut patterns = Vec::new();
    let mut counts = vec![0; demand_lengths.len()];
    enumerate(stock_length, demand_lengths, 0, stock_length, &mut counts, &mut patterns, limit)
        .map_err(|()| OptimizeError::TooManyPatterns {
            stock_length,
            limit,
        })?;
    Ok(patterns)
}

/// Depth-first walk over count vectors. Position `index` takes every count
/// from zero to what still fits, so the first length varies slowest.
fn enumerate(
    stock_length: u64,
    demand_lengths: &[u64],
    index: usize,
    remaining: u64,
    counts: &mut Vec<u64>,
    patterns: &mut Vec<Pattern>,
    limit: usize,
) -> Result<(), ()> {
    if index == demand_lengths.len() {
        // The all-zero vector cuts nothing
        if remaining < stock_length {
            if patterns.len() >= limit {
                return Err(());
            }
            patterns.push(Pattern {
                counts: counts.clone(),
                waste: remaining,
            });
        }
        return Ok(());
    }

    let length = demand_lengths[index];
    let max_count = remaining / length;
    for count in 0..=max_count {
        counts[index] = count;
        enumerate(
            stock_length,
            demand_lengths,
            index + 1,
            remaining - count * length,
            counts,
            patterns,
            limit,
        )?;
    }
    counts[index] = 0;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    /// Brute force over the full bounded product, for comparison.
    fn brute_force(stock_length: u64, lengths: &[u64]) -> HashSet<Vec<u64>> {
        let mut out = HashSet::new();
        let bounds: Vec<u64> = lengths.iter().map(|l| stock_length / l).collect();
        let mut counts = vec![0u64; lengths.len()];
        loop {
            let total: u64 = counts.iter().zip(lengths).map(|(c, l)| c * l).sum();
            if total > 0 && total <= stock_length {
                out.insert(counts.clone());
            }
            let mut i = 0;
            loop {
                if i == counts.len() {
                    return out;
                }
                if counts[i] < bounds[i] {
                    counts[i] += 1;
                    break;
                }
                counts[i] = 0;
                i += 1;
            }
        }
    }

    #[test]
    fn test_small_enumeration() {
        let patterns = generate_patterns(10, &[3, 4]);
        let counts: Vec<Vec<u64>> = patterns.iter().map(|p| p.counts.clone()).collect();

        assert_eq!(
            counts,
            vec![
                vec![0, 1],
                vec![0, 2],
                vec![1, 0],
                vec![1, 1],
                vec![2, 0],
                vec![2, 1],
                vec![3, 0],
            ]
        );
        assert_eq!(patterns[5].waste, 0);
        assert_eq!(patterns[6].waste, 1);
    }

    #[test]
    fn test_completeness_against_brute_force() {
        for (stock, lengths) in [
            (6000, vec![1000, 1500]),
            (100, vec![7, 13, 31]),
            (50, vec![60, 10]),
            (24, vec![5, 5, 12]),
        ] {
            let patterns = generate_patterns(stock, &lengths);
            let generated: Vec<Vec<u64>> = patterns.iter().map(|p| p.counts.clone()).collect();
            let unique: HashSet<Vec<u64>> = generated.iter().cloned().collect();

            assert_eq!(unique.len(), generated.len(), "duplicate pattern for stock {}", stock);
            assert_eq!(unique, brute_force(stock, &lengths), "stock {}", stock);
        }
    }

    #[test]
    fn test_waste_correctness() {
        let lengths = [700, 1100, 2300];
        for pattern in generate_patterns(6000, &lengths) {
            let used = pattern.used_length(&lengths);
            assert!(used > 0);
            assert_eq!(pattern.waste + used, 6000);
        }
    }

    #[test]
    fn test_no_demand_lengths() {
        assert!(generate_patterns(6000, &[]).is_empty());
    }

    #[test]
    fn test_all_lengths_too_long() {
        assert!(generate_patterns(6000, &[7000, 6001]).is_empty());
    }

    #[test]
    fn test_exact_fit_has_zero_waste() {
        let patterns = generate_patterns(6000, &[6000]);
        assert_eq!(patterns, vec![Pattern { counts: vec![1], waste: 0 }]);
    }

    #[test]
    fn test_bounded_generation() {
        let all = generate_patterns(100, &[7, 13, 31]);
        let ok = generate_patterns_bounded(100, &[7, 13, 31], all.len()).unwrap();
        assert_eq!(ok, all);

        let err = generate_patterns_bounded(100, &[7, 13, 31], all.len() - 1);
        assert_eq!(
            err,
            Err(OptimizeError::TooManyPatterns {
                stock_length: 100,
                limit: all.len() - 1,
            })
        );
    }

    #[test]
    fn test_bounded_rejects_zero_length() {
        let result = generate_patterns_bounded(6000, &[1000, 0], 100);
        assert!(matches!(result, Err(OptimizeError::InvalidInput(msg)) if msg.contains("position 1")));
    }

    #[test]
    #[should_panic]
    fn test_unbounded_zero_length_panics() {
        generate_patterns(6000, &[0]);
    }
}
