//! Path integrator.
//!
//! Walks one camera ray through the scene, bounce by bounce, multiplying
//! the path throughput by each scatter's attenuation until the path escapes
//! to the sky, reaches a light, is absorbed, or runs out of depth.

use crate::{Color, RenderConfig, Sampler, Scene, ShadingMode, SkyGradient, MAX_DEPTH_CEILING};
use luma_math::{Interval, Ray};

/// Per-pass integrator settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceSettings {
    pub max_depth: u32,
    pub mode: ShadingMode,
    pub sky: SkyGradient,
}

impl TraceSettings {
    /// Create settings, clamping `max_depth` to [`MAX_DEPTH_CEILING`].
    pub fn new(max_depth: u32, mode: ShadingMode, sky: SkyGradient) -> Self {
        Self {
            max_depth: max_depth.min(MAX_DEPTH_CEILING),
            mode,
            sky,
        }
    }
}

impl From<&RenderConfig> for TraceSettings {
    fn from(config: &RenderConfig) -> Self {
        Self::new(config.max_depth, config.mode, config.sky)
    }
}

impl Default for TraceSettings {
    fn default() -> Self {
        Self::from(&RenderConfig::default())
    }
}

/// Why a path stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Escaped the scene and picked up the sky.
    Miss,
    /// Hit an emissive surface.
    Emission,
    /// Shaded directly from the first hit without scattering.
    Shaded,
    /// A material absorbed the ray.
    Absorbed,
    /// Bounce budget used up; contributes nothing.
    DepthExhausted,
}

/// Outcome of tracing one path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathResult {
    /// Radiance carried back to the camera
    pub radiance: Color,
    /// Throughput at the moment the path ended
    pub throughput: Color,
    /// Number of surface interactions plus the final miss or light lookup
    pub bounces: u32,
    pub termination: Termination,
}

/// Trace a single path starting at `ray`.
pub fn trace_path(
    ray: Ray,
    scene: &Scene,
    settings: &TraceSettings,
    sampler: &mut Sampler,
) -> PathResult {
    let max_depth = settings.max_depth.min(MAX_DEPTH_CEILING);
    let mut ray = ray;
    let mut throughput = Color::ONE;

    for depth in 0..max_depth {
        let bounces = depth + 1;
        ray.interval = Interval::new(Ray::T_MIN, f32::INFINITY);

        let Some(rec) = scene.hit(&ray) else {
            return PathResult {
                radiance: throughput * settings.sky.sample(ray.direction),
                throughput,
                bounces,
                termination: Termination::Miss,
            };
        };

        if settings.mode == ShadingMode::Normals {
            return PathResult {
                radiance: 0.5 * (rec.normal + Color::ONE),
                throughput,
                bounces,
                termination: Termination::Shaded,
            };
        }

        if let Some(emitted) = rec.material.emission() {
            return PathResult {
                radiance: throughput * emitted,
                throughput,
                bounces,
                termination: Termination::Emission,
            };
        }

        match rec.material.scatter(&ray, &rec, sampler) {
            Some(scatter) => {
                throughput *= scatter.attenuation;
                ray = scatter.ray;
            }
            None => {
                return PathResult {
                    radiance: Color::ZERO,
                    throughput: Color::ZERO,
                    bounces,
                    termination: Termination::Absorbed,
                };
            }
        }
    }

    PathResult {
        radiance: Color::ZERO,
        throughput,
        bounces: max_depth,
        termination: Termination::DepthExhausted,
    }
}

/// Radiance seen along `ray`.
#[inline]
pub fn ray_color(
    ray: Ray,
    scene: &Scene,
    settings: &TraceSettings,
    sampler: &mut Sampler,
) -> Color {
    trace_path(ray, scene, settings, sampler).radiance
}
