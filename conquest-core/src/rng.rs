//! Seeded pseudorandom source
//!
//! All randomness in a match flows through one `GameRng`. The reference mode
//! is MT19937 with key-expansion (`init_by_array`) seeding, and its integer,
//! float and shuffle primitives are built the same way as the most widely
//! deployed MT19937 front-end, so a seed reproduces that generator's output
//! stream exactly. The ChaCha mode exists only for comparison runs.

use std::fmt;

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

// ============================================================================
// MT19937
// ============================================================================

const N: usize = 624;
const M: usize = 397;
const MATRIX_A: u32 = 0x9908_B0DF;
const UPPER_MASK: u32 = 0x8000_0000;
const LOWER_MASK: u32 = 0x7FFF_FFFF;

/// 2^26, weight of the high part of a 53-bit float draw
const FLOAT_HIGH_SCALE: f64 = 67_108_864.0;
/// 2^53
const FLOAT_DENOMINATOR: f64 = 9_007_199_254_740_992.0;

/// MT19937 32-bit word generator
#[derive(Clone)]
pub struct MersenneTwister {
    state: [u32; N],
    index: usize,
}

impl MersenneTwister {
    /// Seed from a single word (key expansion over `[seed]`)
    pub fn new(seed: u32) -> Self {
        Self::from_key(&[seed])
    }

    /// Seed by key expansion; an empty key behaves like `[0]`
    pub fn from_key(key: &[u32]) -> Self {
        let mut mt = Self {
            state: [0; N],
            index: N,
        };
        mt.init_by_array(if key.is_empty() { &[0] } else { key });
        mt
    }

    fn init_genrand(&mut self, seed: u32) {
        self.state[0] = seed;
        for i in 1..N {
            let prev = self.state[i - 1];
            self.state[i] = 1_812_433_253u32
                .wrapping_mul(prev ^ (prev >> 30))
                .wrapping_add(i as u32);
        }
        self.index = N;
    }

    fn init_by_array(&mut self, key: &[u32]) {
        self.init_genrand(19_650_218);

        let mut i = 1;
        let mut j = 0;
        for _ in 0..N.max(key.len()) {
            let prev = self.state[i - 1];
            self.state[i] = (self.state[i] ^ (prev ^ (prev >> 30)).wrapping_mul(1_664_525))
                .wrapping_add(key[j])
                .wrapping_add(j as u32);
            i += 1;
            j += 1;
            if i >= N {
                self.state[0] = self.state[N - 1];
                i = 1;
            }
            if j >= key.len() {
                j = 0;
            }
        }

        for _ in 0..N - 1 {
            let prev = self.state[i - 1];
            self.state[i] = (self.state[i] ^ (prev ^ (prev >> 30)).wrapping_mul(1_566_083_941))
                .wrapping_sub(i as u32);
            i += 1;
            if i >= N {
                self.state[0] = self.state[N - 1];
                i = 1;
            }
        }

        // MSB is 1, assuring a non-zero initial array
        self.state[0] = 0x8000_0000;
        self.index = N;
    }

    fn twist(&mut self) {
        for i in 0..N {
            let y = (self.state[i] & UPPER_MASK) | (self.state[(i + 1) % N] & LOWER_MASK);
            let mag = if y & 1 == 1 { MATRIX_A } else { 0 };
            self.state[i] = self.state[(i + M) % N] ^ (y >> 1) ^ mag;
        }
        self.index = 0;
    }

    /// Next tempered 32-bit word
    pub fn next_word(&mut self) -> u32 {
        if self.index >= N {
            self.twist();
        }
        let mut y = self.state[self.index];
        self.index += 1;

        y ^= y >> 11;
        y ^= (y << 7) & 0x9D2C_5680;
        y ^= (y << 15) & 0xEFC6_0000;
        y ^= y >> 18;
        y
    }
}

impl fmt::Debug for MersenneTwister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MersenneTwister")
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

impl RngCore for MersenneTwister {
    fn next_u32(&mut self) -> u32 {
        self.next_word()
    }

    fn next_u64(&mut self) -> u64 {
        let low = u64::from(self.next_word());
        let high = u64::from(self.next_word());
        (high << 32) | low
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.next_word().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

// ============================================================================
// GAME RNG
// ============================================================================

/// Generator algorithm backing a `GameRng`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RngMode {
    /// Bit-reproducible MT19937 stream
    #[default]
    Reference,
    /// ChaCha8 stream, for comparison only
    ChaCha,
}

#[derive(Clone, Debug)]
enum Engine {
    Reference(MersenneTwister),
    ChaCha(ChaCha8Rng),
}

impl Engine {
    fn build(mode: RngMode, seed: u32) -> Self {
        match mode {
            RngMode::Reference => Engine::Reference(MersenneTwister::new(seed)),
            RngMode::ChaCha => Engine::ChaCha(ChaCha8Rng::seed_from_u64(u64::from(seed))),
        }
    }
}

/// Match-scoped pseudorandom source
///
/// The argument checks on the draw methods guard against caller bugs, not
/// game situations, so violating them panics.
#[derive(Clone, Debug)]
pub struct GameRng {
    engine: Engine,
    last_seed: u32,
}

impl GameRng {
    /// Reference-mode generator
    pub fn new(seed: u32) -> Self {
        Self::with_mode(seed, RngMode::Reference)
    }

    pub fn with_mode(seed: u32, mode: RngMode) -> Self {
        Self {
            engine: Engine::build(mode, seed),
            last_seed: seed,
        }
    }

    /// Generator seeded from OS entropy; `last_seed` reports the draw
    pub fn from_entropy(mode: RngMode) -> Self {
        Self::with_mode(rand::random(), mode)
    }

    /// Reset the stream from a seed, keeping the current mode
    pub fn seed(&mut self, seed: u32) {
        self.last_seed = seed;
        self.engine = Engine::build(self.mode(), seed);
    }

    /// Seed the current stream started from
    pub fn last_seed(&self) -> u32 {
        self.last_seed
    }

    pub fn mode(&self) -> RngMode {
        match self.engine {
            Engine::Reference(_) => RngMode::Reference,
            Engine::ChaCha(_) => RngMode::ChaCha,
        }
    }

    /// Switch algorithm; the new stream restarts from the last seed
    pub fn set_mode(&mut self, mode: RngMode) {
        self.engine = Engine::build(mode, self.last_seed);
    }

    // ========================================================================
    // PRIMITIVES
    // ========================================================================

    /// Unsigned value of exactly `k` random bits
    ///
    /// # Panics
    /// Panics if `k` is outside `1..=32`
    pub fn bounded_uint(&mut self, k: u32) -> u32 {
        assert!((1..=32).contains(&k), "bounded_uint: k must be in 1..=32, got {k}");

        match &mut self.engine {
            Engine::Reference(mt) => {
                let mut accum: u64 = 0;
                let mut bits = 0;
                while bits < k {
                    accum = (accum << 32) | u64::from(mt.next_word());
                    bits += 32;
                }
                (accum >> (bits - k)) as u32
            }
            Engine::ChaCha(rng) => rng.next_u32() >> (32 - k),
        }
    }

    /// Uniform value in `[0, n)` by rejection sampling
    ///
    /// Draws `bounded_uint(bit_length(n))` until the draw is below `n`. Even
    /// `n == 1` consumes draws, as the reference stream does.
    ///
    /// # Panics
    /// Panics if `n == 0`
    pub fn bounded_int(&mut self, n: u32) -> u32 {
        assert!(n > 0, "bounded_int: n must be positive");

        if let Engine::ChaCha(rng) = &mut self.engine {
            return rng.gen_range(0..n);
        }

        let k = u32::BITS - n.leading_zeros();
        loop {
            let r = self.bounded_uint(k);
            if r < n {
                return r;
            }
        }
    }

    /// Uniform value in `[low, high]`
    ///
    /// # Panics
    /// Panics if `high < low` or the range spans all of `i32`
    pub fn int_in_range(&mut self, low: i32, high: i32) -> i32 {
        assert!(high >= low, "int_in_range: high ({high}) must be >= low ({low})");

        if let Engine::ChaCha(rng) = &mut self.engine {
            return rng.gen_range(low..=high);
        }

        let width = u32::try_from(i64::from(high) - i64::from(low) + 1)
            .unwrap_or_else(|_| panic!("int_in_range: range {low}..={high} is too wide"));
        (i64::from(low) + i64::from(self.bounded_int(width))) as i32
    }

    /// Float in `[0, 1)` with 53 bits of precision
    pub fn uniform01(&mut self) -> f64 {
        match &mut self.engine {
            Engine::Reference(mt) => {
                let a = mt.next_word() >> 5;
                let b = mt.next_word() >> 6;
                (f64::from(a) * FLOAT_HIGH_SCALE + f64::from(b)) / FLOAT_DENOMINATOR
            }
            Engine::ChaCha(rng) => rng.gen::<f64>(),
        }
    }

    /// In-place Fisher-Yates, indices visited in descending order
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.bounded_int((i + 1) as u32) as usize;
            items.swap(i, j);
        }
    }

    /// Uniformly chosen element, `None` for an empty slice
    pub fn choice<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let index = self.bounded_int(items.len() as u32) as usize;
        items.get(index)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mt19937_reference_vector() {
        // First outputs of init_by_array({0x123, 0x234, 0x345, 0x456})
        let mut mt = MersenneTwister::from_key(&[0x123, 0x234, 0x345, 0x456]);
        let words: Vec<u32> = (0..5).map(|_| mt.next_word()).collect();
        assert_eq!(words, vec![1067595299, 955945823, 477289528, 4107218783, 4228976476]);
    }

    #[test]
    fn test_seed_42_words() {
        let mut rng = GameRng::new(42);
        let words: Vec<u32> = (0..5).map(|_| rng.bounded_uint(32)).collect();
        assert_eq!(words, vec![2746317213, 478163327, 107420369, 3184935163, 1181241943]);
    }

    #[test]
    fn test_seed_0_words() {
        let mut rng = GameRng::new(0);
        let words: Vec<u32> = (0..3).map(|_| rng.bounded_uint(32)).collect();
        assert_eq!(words, vec![3626764237, 1654615998, 3255389356]);
    }

    #[test]
    fn test_bounded_uint_keeps_top_bits() {
        let mut rng = GameRng::new(7);
        assert_eq!(rng.bounded_uint(5), 10);
        assert_eq!(rng.bounded_uint(17), 124238);
        assert_eq!(rng.bounded_uint(32), 647892279);
    }

    #[test]
    fn test_uniform01_reference() {
        let mut rng = GameRng::new(42);
        assert_eq!(rng.uniform01(), 0.6394267984578837);
        assert_eq!(rng.uniform01(), 0.025010755222666936);
        assert_eq!(rng.uniform01(), 0.27502931836911926);
    }

    #[test]
    fn test_dice_reference() {
        let mut rng = GameRng::new(42);
        let rolls: Vec<i32> = (0..10).map(|_| rng.int_in_range(1, 6)).collect();
        assert_eq!(rolls, vec![6, 1, 1, 6, 3, 2, 2, 2, 6, 1]);
    }

    #[test]
    fn test_bounded_int_reference() {
        let mut rng = GameRng::new(42);
        let draws: Vec<u32> = (0..10).map(|_| rng.bounded_int(10)).collect();
        assert_eq!(draws, vec![1, 0, 4, 3, 3, 2, 1, 8, 1, 9]);
    }

    #[test]
    fn test_bounded_int_one_consumes_draws() {
        let mut rng = GameRng::new(42);
        assert_eq!(rng.bounded_int(1), 0);
        // Two words were rejected/accepted; the stream continues at the third
        assert_eq!(rng.bounded_uint(32), 107420369);
    }

    #[test]
    fn test_shuffle_reference() {
        let mut rng = GameRng::new(42);
        let mut items: Vec<u32> = (0..10).collect();
        rng.shuffle(&mut items);
        assert_eq!(items, vec![7, 3, 2, 8, 5, 6, 9, 4, 0, 1]);
    }

    #[test]
    fn test_shuffle_is_permutation() {
        let mut rng = GameRng::new(1234);
        for len in 0..40 {
            let mut items: Vec<usize> = (0..len).collect();
            rng.shuffle(&mut items);
            assert_eq!(items.len(), len);
            let mut sorted = items.clone();
            sorted.sort_unstable();
            assert_eq!(sorted, (0..len).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_same_seed_same_sequence_per_mode() {
        for mode in [RngMode::Reference, RngMode::ChaCha] {
            let mut a = GameRng::with_mode(99, mode);
            let mut b = GameRng::with_mode(99, mode);
            for _ in 0..500 {
                assert_eq!(a.bounded_int(1000), b.bounded_int(1000));
            }
        }
    }

    #[test]
    fn test_entropy_seed_is_replayable() {
        for mode in [RngMode::Reference, RngMode::ChaCha] {
            let mut fresh = GameRng::from_entropy(mode);
            let mut replay = GameRng::with_mode(fresh.last_seed(), mode);
            assert_eq!(fresh.mode(), mode);
            for _ in 0..20 {
                assert_eq!(fresh.bounded_uint(32), replay.bounded_uint(32));
            }
        }
    }

    #[test]
    fn test_set_mode_reseeds_from_last_seed() {
        let mut rng = GameRng::new(5);
        let _ = rng.bounded_uint(32);
        rng.set_mode(RngMode::ChaCha);
        assert_eq!(rng.mode(), RngMode::ChaCha);

        let mut fresh = GameRng::with_mode(5, RngMode::ChaCha);
        assert_eq!(rng.bounded_uint(32), fresh.bounded_uint(32));

        rng.set_mode(RngMode::Reference);
        let mut reference = GameRng::new(5);
        assert_eq!(rng.bounded_uint(32), reference.bounded_uint(32));
        assert_eq!(rng.last_seed(), 5);
    }

    #[test]
    fn test_bounded_int_in_range() {
        for mode in [RngMode::Reference, RngMode::ChaCha] {
            let mut rng = GameRng::with_mode(2024, mode);
            for n in [1, 2, 3, 5, 6, 7, 10, 42, 100, 1 << 20, u32::MAX] {
                for _ in 0..10_000 {
                    assert!(rng.bounded_int(n) < n);
                }
            }
        }
    }

    #[test]
    fn test_power_of_two_uniformity() {
        let mut rng = GameRng::new(31337);
        let mut buckets = [0u32; 4];
        for _ in 0..10_000 {
            buckets[rng.bounded_int(4) as usize] += 1;
        }
        // Expected 2500 per bucket, standard deviation ~43
        for count in buckets {
            assert!((2250..=2750).contains(&count), "bucket count {count}");
        }
    }

    #[test]
    fn test_int_in_range_bounds() {
        let mut rng = GameRng::new(3);
        for _ in 0..1000 {
            let v = rng.int_in_range(-3, 3);
            assert!((-3..=3).contains(&v));
        }
        assert_eq!(rng.int_in_range(9, 9), 9);
    }

    #[test]
    fn test_choice() {
        let mut rng = GameRng::new(42);
        let empty: [u8; 0] = [];
        assert!(rng.choice(&empty).is_none());
        let items = ["a", "b", "c"];
        for _ in 0..100 {
            assert!(items.contains(rng.choice(&items).unwrap()));
        }
    }

    #[test]
    fn test_rng_core_words_match() {
        let mut mt = MersenneTwister::new(42);
        assert_eq!(mt.next_u32(), 2746317213);
        let mut bytes = [0u8; 6];
        mt.fill_bytes(&mut bytes);
        assert_eq!(&bytes[..4], &478163327u32.to_le_bytes());
    }

    #[test]
    #[should_panic(expected = "k must be in 1..=32")]
    fn test_bounded_uint_zero_bits_panics() {
        GameRng::new(1).bounded_uint(0);
    }

    #[test]
    #[should_panic(expected = "k must be in 1..=32")]
    fn test_bounded_uint_too_many_bits_panics() {
        GameRng::new(1).bounded_uint(33);
    }

    #[test]
    #[should_panic(expected = "n must be positive")]
    fn test_bounded_int_zero_panics() {
        GameRng::new(1).bounded_int(0);
    }

    #[test]
    #[should_panic(expected = "must be >= low")]
    fn test_int_in_range_inverted_panics() {
        GameRng::new(1).int_in_range(5, 4);
    }
}
