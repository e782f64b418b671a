//! Seedable Xorshift64 generator used for every random draw in a scene.
//!
//! Field jitter, initial particle placement and the per-tick reset lottery
//! all pull from an explicitly owned `Xorshift64`, so a fixed seed replays
//! a scene exactly.

/// Xorshift64 deterministic PRNG with shifts (13, 7, 17).
///
/// A seed of 0 is the all-zeros fixed point of the algorithm and is
/// replaced by a non-zero fallback.
#[derive(Debug, Clone)]
pub struct Xorshift64 {
    state: u64,
}

impl Xorshift64 {
    const FALLBACK_SEED: u64 = 0x5EED_DEAD_BEEF_CAFE;

    /// Creates a generator from `seed` (0 is remapped to a fixed fallback).
    pub fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { Self::FALLBACK_SEED } else { seed },
        }
    }

    /// Advances the state and returns the next 64-bit value.
    pub fn next_u64(&mut self) -> u64 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        self.state
    }

    /// Uniform f64 in [0, 1) built from the upper 53 bits.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform f64 in [min, max).
    pub fn next_range(&mut self, min: f64, max: f64) -> f64 {
        min + self.next_f64() * (max - min)
    }

    /// Uniform f64 in [-range/2, range/2), centred on zero.
    ///
    /// Used to place particles anywhere inside a viewport of extent `range`.
    pub fn next_spread(&mut self, range: f64) -> f64 {
        self.next_range(-range * 0.5, range * 0.5)
    }

    /// Returns `true` with probability `p`. `p <= 0` never fires, `p >= 1` always does.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Derives an independent generator for a separate consumer.
    ///
    /// The child is seeded from this generator's next output mixed with
    /// `stream`, so two forks with different streams never share a sequence.
    pub fn fork(&mut self, stream: u64) -> Self {
        Self::new(self.next_u64() ^ stream.wrapping_mul(0x9E37_79B9_7F4A_7C15))
    }
}
