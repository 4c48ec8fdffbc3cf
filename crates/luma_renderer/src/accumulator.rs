//! Progressive accumulation buffer.
//!
//! Each pixel holds a linear RGBA running mean together with the number of
//! samples folded into it. A pass contributes its per-pixel average with a
//! weight proportional to the samples it traced, so splitting the same
//! samples across more passes yields the same estimate.

use crate::{Color, RenderError, RenderResult, TileResult};
use luma_math::{Interval, Vec4};

/// Sum of the valid samples one pixel received in one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PassSample {
    pub sum: Color,
    /// Number of valid samples in `sum`
    pub count: u32,
}

impl PassSample {
    pub fn new(sum: Color, count: u32) -> Self {
        Self { sum, count }
    }

    /// Add one sample.
    #[inline]
    pub fn add(&mut self, color: Color) {
        self.sum += color;
        self.count += 1;
    }

    /// Per-component average clamped to `clamp`, or `None` without samples.
    pub fn average(&self, clamp: Interval) -> Option<Color> {
        if self.count == 0 {
            return None;
        }
        let avg = self.sum / self.count as f32;
        Some(Color::new(
            clamp.clamp(avg.x),
            clamp.clamp(avg.y),
            clamp.clamp(avg.z),
        ))
    }
}

/// Apply gamma correction (gamma = 2.0).
#[inline]
pub fn linear_to_gamma(linear: f32) -> f32 {
    if linear > 0.0 {
        linear.sqrt()
    } else {
        0.0
    }
}

/// Convert a linear accumulator value to a displayable color.
///
/// Non-finite color channels become 0 and a non-finite alpha becomes 1.
/// Everything is clamped to `[0, 1]` and the color channels are gamma
/// encoded.
pub fn tone_map(linear: Vec4) -> Vec4 {
    let channel = |c: f32| {
        let c = if c.is_finite() { c } else { 0.0 };
        linear_to_gamma(Interval::UNIT.clamp(c))
    };
    let alpha = if linear.w.is_finite() { linear.w } else { 1.0 };

    Vec4::new(
        channel(linear.x),
        channel(linear.y),
        channel(linear.z),
        Interval::UNIT.clamp(alpha),
    )
}

/// Persistent per-pixel accumulator for progressive rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct AccumulationBuffer {
    width: u32,
    height: u32,
    /// Linear RGBA running means, row-major
    pixels: Vec<Vec4>,
    /// Samples folded into each pixel so far
    samples: Vec<u32>,
}

impl AccumulationBuffer {
    /// Create a new buffer filled with transparent black.
    pub fn new(width: u32, height: u32) -> Self {
        let len = (width as usize) * (height as usize);
        Self {
            width,
            height,
            pixels: vec![Vec4::ZERO; len],
            samples: vec![0; len],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Linear RGBA values in row-major order.
    pub fn pixels(&self) -> &[Vec4] {
        &self.pixels
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height)
            .then(|| (y as usize) * (self.width as usize) + x as usize)
    }

    /// Linear value at `(x, y)`.
    pub fn get(&self, x: u32, y: u32) -> Option<Vec4> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    /// Samples accumulated at `(x, y)`.
    pub fn sample_count(&self, x: u32, y: u32) -> u32 {
        self.index(x, y).map_or(0, |i| self.samples[i])
    }

    /// Fold one pass into the pixel at `(x, y)`.
    ///
    /// The first contribution replaces the pixel; later ones are blended
    /// with weight `pass.count / total_samples`. Passes without valid
    /// samples and out-of-range pixels leave the buffer untouched. Returns
    /// the new linear value.
    pub fn accumulate(
        &mut self,
        x: u32,
        y: u32,
        pass: &PassSample,
        clamp: Interval,
    ) -> Option<Vec4> {
        let i = self.index(x, y)?;
        let Some(average) = pass.average(clamp) else {
            return Some(self.pixels[i]);
        };
        let current = average.extend(1.0);

        let previous_samples = self.samples[i];
        let total = previous_samples.saturating_add(pass.count);
        let blended = if previous_samples == 0 {
            current
        } else {
            let w = pass.count as f32 / total as f32;
            self.pixels[i] * (1.0 - w) + current * w
        };

        self.pixels[i] = blended;
        self.samples[i] = total;
        Some(blended)
    }

    /// Fold a rendered tile into the buffer.
    pub fn commit(&mut self, result: &TileResult, clamp: Interval) -> RenderResult<()> {
        let tile = &result.tile;
        let fits = tile.x.checked_add(tile.width).is_some_and(|r| r <= self.width)
            && tile.y.checked_add(tile.height).is_some_and(|b| b <= self.height);
        if !fits {
            return Err(RenderError::TileOutOfBounds {
                index: tile.index,
                x: tile.x,
                y: tile.y,
                width: self.width,
                height: self.height,
            });
        }

        let expected = tile.pixel_count();
        if result.samples.len() != expected {
            return Err(RenderError::TileSizeMismatch {
                index: tile.index,
                expected,
                actual: result.samples.len(),
            });
        }

        for (pixel, (x, y)) in result.samples.iter().zip(tile.pixels()) {
            self.accumulate(x, y, pixel, clamp);
        }
        Ok(())
    }

    /// Display color at `(x, y)`.
    pub fn display_color(&self, x: u32, y: u32) -> Option<Vec4> {
        self.get(x, y).map(tone_map)
    }

    /// Convert to RGBA bytes (for display or saving).
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.pixels.len() * 4);
        for pixel in &self.pixels {
            let c = tone_map(*pixel);
            bytes.extend_from_slice(&[
                (255.0 * c.x) as u8,
                (255.0 * c.y) as u8,
                (255.0 * c.z) as u8,
                (255.0 * c.w) as u8,
            ]);
        }
        bytes
    }

    /// Forget all accumulated samples.
    pub fn reset(&mut self) {
        self.pixels.fill(Vec4::ZERO);
        self.samples.fill(0);
    }
}
