//! Answer Selection RNG
//!
//! Xorshift128+ generator used to draw answers from the word lists.
//! Seeded per round, so a round's sequence of answers is reproducible
//! from its seed.

use serde::{Serialize, Deserialize};
use sha2::{Sha256, Digest};

/// Seeded PRNG using the Xorshift128+ algorithm.
///
/// # Example
///
/// ```
/// use hangman::core::rng::RoundRng;
///
/// let mut a = RoundRng::new(12345);
/// let mut b = RoundRng::new(12345);
/// assert_eq!(a.next_u64(), b.next_u64());
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoundRng {
    state: [u64; 2],
}

impl RoundRng {
    /// Create a new RNG from a 64-bit seed.
    ///
    /// SplitMix64 expands the seed so that weak seeds (0, 1, 2...) still
    /// produce well-mixed state.
    pub fn new(seed: u64) -> Self {
        let mut s = seed;
        let state0 = splitmix64(&mut s);
        let state1 = splitmix64(&mut s);

        // Xorshift is stuck forever on an all-zero state
        let state = if state0 == 0 && state1 == 0 {
            [1, 1]
        } else {
            [state0, state1]
        };

        Self { state }
    }

    /// Create the RNG for the `round_number`-th round of a session.
    pub fn for_round(session_id: &[u8; 16], round_number: u32) -> Self {
        Self::new(derive_round_seed(session_id, round_number))
    }

    /// Generate the next 64-bit random value.
    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        let s0 = self.state[0];
        let mut s1 = self.state[1];
        let result = s0.wrapping_add(s1);

        s1 ^= s0;
        self.state[0] = s0.rotate_left(24) ^ s1 ^ (s1 << 16);
        self.state[1] = s1.rotate_left(37);

        result
    }

    /// Generate a uniformly distributed index in `[0, len)`.
    ///
    /// Returns `None` when `len` is zero. Uses rejection sampling so every
    /// index is equally likely regardless of `len`.
    pub fn next_index(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        let len = len as u64;
        let zone = u64::MAX - (u64::MAX % len);
        loop {
            let value = self.next_u64();
            if value < zone {
                return Some((value % len) as usize);
            }
        }
    }

    /// Select a random element from a slice.
    pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        self.next_index(slice.len()).map(|idx| &slice[idx])
    }
}

/// SplitMix64 step for seed initialization.
#[inline]
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

/// Derive a round seed from the owning session and the round's ordinal.
///
/// Distinct sessions, and distinct rounds within one session, get
/// unrelated seeds.
pub fn derive_round_seed(session_id: &[u8; 16], round_number: u32) -> u64 {
    let mut hasher = Sha256::new();

    hasher.update(b"HANGMAN_ROUND_SEED_V1");
    hasher.update(session_id);
    hasher.update(round_number.to_le_bytes());

    let hash = hasher.finalize();

    let mut seed = [0u8; 8];
    seed.copy_from_slice(&hash[0..8]);
    u64::from_le_bytes(seed)
}

// =============================================================================
// TESTS
// =============================================================================
