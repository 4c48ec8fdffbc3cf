//! Render configuration.

use crate::{Color, RenderError, RenderResult};
use luma_math::{Interval, Vec3};
use serde::{Deserialize, Serialize};

/// Hard ceiling on path length, applied whatever depth is requested.
pub const MAX_DEPTH_CEILING: u32 = 10;

/// Default tile edge in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 32;

/// What the integrator computes per sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShadingMode {
    /// Full Monte Carlo light transport.
    #[default]
    PathTraced,
    /// First-hit surface normal mapped to `0.5 * (n + 1)`.
    Normals,
}

/// Vertical blend used for rays that leave the scene.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkyGradient {
    /// Color looking straight down.
    pub horizon: Color,
    /// Color looking straight up.
    pub zenith: Color,
}

impl SkyGradient {
    /// Radiance arriving from `direction`.
    pub fn sample(&self, direction: Vec3) -> Color {
        let unit_direction = direction.normalize_or_zero();
        let a = 0.5 * (unit_direction.y + 1.0);
        self.horizon * (1.0 - a) + self.zenith * a
    }
}

impl Default for SkyGradient {
    fn default() -> Self {
        Self {
            horizon: Color::new(1.0, 1.0, 1.0),
            zenith: Color::new(0.5, 0.7, 1.0),
        }
    }
}

/// Render configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Samples traced per pixel in each pass
    pub samples_per_pass: u32,
    /// Number of passes a full progressive run schedules
    pub total_passes: u32,
    /// Maximum ray bounce depth (clamped to [`MAX_DEPTH_CEILING`])
    pub max_depth: u32,
    /// Tile edge in pixels
    pub tile_size: u32,
    /// Base seed mixed into every pixel's sampler
    pub seed: u32,
    pub mode: ShadingMode,
    pub sky: SkyGradient,
    /// Upper bound applied to each pass average to suppress fireflies
    pub firefly_clamp: f32,
    /// Build a BVH over the scene instead of testing every primitive
    pub use_bvh: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 450,
            samples_per_pass: 4,
            total_passes: 64,
            max_depth: MAX_DEPTH_CEILING,
            tile_size: DEFAULT_TILE_SIZE,
            seed: 0,
            mode: ShadingMode::PathTraced,
            sky: SkyGradient::default(),
            firefly_clamp: 10.0,
            use_bvh: true,
        }
    }
}

impl RenderConfig {
    /// Check the settings that would make a render meaningless.
    pub fn validate(&self) -> RenderResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(RenderError::InvalidResolution {
                width: self.width,
                height: self.height,
            });
        }
        if self.samples_per_pass == 0 {
            return Err(RenderError::ZeroSamples);
        }
        if self.tile_size == 0 {
            return Err(RenderError::ZeroTileSize);
        }
        Ok(())
    }

    /// Bounce limit actually used by the integrator.
    pub fn effective_max_depth(&self) -> u32 {
        self.max_depth.min(MAX_DEPTH_CEILING)
    }

    /// Range each pass average is clamped to.
    ///
    /// A non-finite or negative ceiling falls back to the default of 10.
    pub fn sample_clamp(&self) -> Interval {
        let max = if self.firefly_clamp.is_finite() && self.firefly_clamp > 0.0 {
            self.firefly_clamp
        } else {
            10.0
        };
        Interval::new(0.0, max)
    }

    /// Aspect ratio (width / height).
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}
