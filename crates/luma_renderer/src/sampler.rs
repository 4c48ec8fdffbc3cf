//! Deterministic, stateless random sampling.
//!
//! Every stochastic decision in the renderer draws from a [`Sampler`], a
//! 32-bit PCG stream whose whole state is a single `u32`. The state is
//! derived from pixel coordinates, pass index and a base seed, so any pixel
//! of any pass can be reproduced in isolation, independent of tiling or
//! thread scheduling. A sampler is owned by exactly one task and is never
//! shared across threads.

use luma_math::Vec3;
use rand::RngCore;

/// Upper bound on rejection-sampling attempts.
///
/// The chance of 64 consecutive rejections is below 1e-20 for the unit ball
/// and below 1e-40 for the unit disk. When it happens anyway the helper
/// returns a fixed fallback value instead of looping forever.
pub const MAX_REJECTION_ATTEMPTS: u32 = 64;

const PCG_MULTIPLIER: u32 = 747_796_405;
const PCG_INCREMENT: u32 = 2_891_336_453;

/// PCG output permutation (RXS-M-XS) applied to a state word.
#[inline]
fn pcg_permute(state: u32) -> u32 {
    let word = ((state >> ((state >> 28) + 4)) ^ state).wrapping_mul(277_803_737);
    (word >> 22) ^ word
}

/// Stateless PCG hash: one LCG step followed by the output permutation.
#[inline]
pub fn pcg_hash(input: u32) -> u32 {
    pcg_permute(input.wrapping_mul(PCG_MULTIPLIER).wrapping_add(PCG_INCREMENT))
}

/// Advance `seed` and return a uniform float in `[0, 1)` with the new seed.
///
/// This is a pure function: the same seed always yields the same pair.
#[inline]
pub fn next(seed: u32) -> (f32, u32) {
    let state = seed.wrapping_mul(PCG_MULTIPLIER).wrapping_add(PCG_INCREMENT);
    (to_unit_f32(pcg_permute(state)), state)
}

/// Map the top 24 bits of `bits` to `[0, 1)`.
#[inline]
fn to_unit_f32(bits: u32) -> f32 {
    (bits >> 8) as f32 * (1.0 / 16_777_216.0)
}

/// A small PCG generator owned by one rendering task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sampler {
    state: u32,
}

impl Sampler {
    /// Create a sampler from a raw seed.
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Seed for a pixel in a given pass.
    ///
    /// Each input is folded in through the hash so neighbouring pixels and
    /// consecutive passes start from decorrelated states.
    pub fn for_pixel(x: u32, y: u32, pass_index: u32, base_seed: u32) -> Self {
        let mut h = pcg_hash(base_seed);
        h = pcg_hash(h ^ pass_index);
        h = pcg_hash(h ^ y);
        h = pcg_hash(h ^ x.wrapping_mul(0x9E37_79B9));
        Self::new(h)
    }

    /// Current state, usable to resume the stream later.
    pub fn state(&self) -> u32 {
        self.state
    }

    /// Uniform float in `[0, 1)`.
    #[inline]
    pub fn next_f32(&mut self) -> f32 {
        let (value, state) = next(self.state);
        self.state = state;
        value
    }

    /// Uniform float in `[min, max)`.
    #[inline]
    pub fn range(&mut self, min: f32, max: f32) -> f32 {
        min + (max - min) * self.next_f32()
    }

    /// Uniform integer in `[lo, hi]` (inclusive). Returns `lo` if `hi < lo`.
    pub fn int_range(&mut self, lo: i32, hi: i32) -> i32 {
        if hi <= lo {
            return lo;
        }
        let span = (hi as i64 - lo as i64 + 1) as f64;
        let offset = (self.next_f32() as f64 * span) as i64;
        (lo as i64 + offset).min(hi as i64) as i32
    }

    /// Vector with each component uniform in `[min, max)`.
    pub fn vec3(&mut self, min: f32, max: f32) -> Vec3 {
        Vec3::new(
            self.range(min, max),
            self.range(min, max),
            self.range(min, max),
        )
    }

    /// Point in the square `[-0.5, 0.5)²` (pixel jitter). Z is 0.
    pub fn in_unit_square(&mut self) -> Vec3 {
        Vec3::new(self.next_f32() - 0.5, self.next_f32() - 0.5, 0.0)
    }

    /// Point inside the unit disk in the XY plane (defocus sampling).
    ///
    /// Falls back to the disk center after [`MAX_REJECTION_ATTEMPTS`].
    pub fn in_unit_disk(&mut self) -> Vec3 {
        for _ in 0..MAX_REJECTION_ATTEMPTS {
            let p = Vec3::new(self.range(-1.0, 1.0), self.range(-1.0, 1.0), 0.0);
            if p.length_squared() < 1.0 {
                return p;
            }
        }
        Vec3::ZERO
    }

    /// Unit vector drawn uniformly by rejection inside the unit ball.
    ///
    /// Falls back to `+Z` after [`MAX_REJECTION_ATTEMPTS`].
    pub fn unit_vector(&mut self) -> Vec3 {
        for _ in 0..MAX_REJECTION_ATTEMPTS {
            let p = self.vec3(-1.0, 1.0);
            let len_sq = p.length_squared();
            if 1e-12 < len_sq && len_sq <= 1.0 {
                return p / len_sq.sqrt();
            }
        }
        Vec3::Z
    }

    fn next_state(&mut self) -> u32 {
        self.state = self
            .state
            .wrapping_mul(PCG_MULTIPLIER)
            .wrapping_add(PCG_INCREMENT);
        pcg_permute(self.state)
    }
}

impl RngCore for Sampler {
    fn next_u32(&mut self) -> u32 {
        self.next_state()
    }

    fn next_u64(&mut self) -> u64 {
        let lo = self.next_state() as u64;
        let hi = self.next_state() as u64;
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.next_state().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}
