//! Deterministic per-round input streams.

use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;

/// RNG for one round's input generation.
///
/// The stream is keyed by `seed * 1000 + round - offset`, where `offset` is
/// the perturbation trigger round (zero before any perturbation). Re-running
/// an episode with the same seed therefore reproduces identical inputs, and
/// a perturbation at round R changes the draws from round R onward only.
pub fn round_rng(seed: u64, round: u64, offset: u64) -> ChaCha12Rng {
    let stream = seed
        .wrapping_mul(1000)
        .wrapping_add(round)
        .wrapping_sub(offset);
    ChaCha12Rng::seed_from_u64(stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn same_key_yields_identical_draws() {
        let mut a = round_rng(7, 3, 0);
        let mut b = round_rng(7, 3, 0);
        let left: Vec<i64> = (0..8).map(|_| a.gen_range(0..1000)).collect();
        let right: Vec<i64> = (0..8).map(|_| b.gen_range(0..1000)).collect();
        assert_eq!(left, right);
    }

    #[test]
    fn offset_shifts_the_stream() {
        let mut plain = round_rng(7, 5, 0);
        let mut offset = round_rng(7, 5, 2);
        let left: Vec<i64> = (0..8).map(|_| plain.gen_range(0..1000)).collect();
        let right: Vec<i64> = (0..8).map(|_| offset.gen_range(0..1000)).collect();
        assert_ne!(left, right);
    }
}
