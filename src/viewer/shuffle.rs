//! Shuffle permutations for the viewer

use rand::Rng;
use rand::seq::SliceRandom;

/// Uniform random permutation of `0..len` with `anchor` moved to slot 0.
///
/// Not reproducible across calls; the only fixed property is that the
/// anchor comes first. An out-of-range anchor leaves the order untouched.
pub fn shuffled_indices<R: Rng + ?Sized>(len: usize, anchor: usize, rng: &mut R) -> Vec<usize> {
    let mut permutation: Vec<usize> = (0..len).collect();
    permutation.shuffle(rng);

    if let Some(slot) = permutation.iter().position(|&i| i == anchor) {
        permutation.swap(0, slot);
    }
    permutation
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_is_permutation_with_anchor_first() {
        let mut rng = StdRng::seed_from_u64(42);
        for anchor in 0..12 {
            let permutation = shuffled_indices(12, anchor, &mut rng);
            assert_eq!(permutation[0], anchor);

            let mut sorted = permutation.clone();
            sorted.sort_unstable();
            assert_eq!(sorted, (0..12).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_degenerate_lengths() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(shuffled_indices(0, 0, &mut rng).is_empty());
        assert_eq!(shuffled_indices(1, 0, &mut rng), vec![0]);
    }

    #[test]
    fn test_successive_shuffles_differ() {
        let mut rng = StdRng::seed_from_u64(9);
        let first = shuffled_indices(20, 5, &mut rng);
        let second = shuffled_indices(20, 5, &mut rng);
        assert_ne!(first, second);
    }

    #[test]
    fn test_works_with_thread_rng() {
        let permutation = shuffled_indices(8, 7, &mut rand::rng());
        assert_eq!(permutation[0], 7);
        assert_eq!(permutation.len(), 8);
    }
}
