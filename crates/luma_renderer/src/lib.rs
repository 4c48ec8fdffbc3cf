//! Luma renderer - progressive Monte Carlo path tracing
//!
//! Renders a scene of spheres and quads into a linear accumulation buffer,
//! one pass at a time. Each pass traces a few samples per pixel, tiles are
//! rendered in parallel, and pass averages are blended into a running
//! per-pixel mean that converges as passes accumulate.
//!
//! All randomness comes from a stateless PCG stream seeded per pixel and
//! pass, so a render is reproducible regardless of tiling or thread count.

mod accumulator;
mod bvh;
mod camera;
mod config;
mod error;
mod hittable;
mod integrator;
mod material;
mod primitive;
mod quad;
mod renderer;
mod sampler;
mod scene;
mod sphere;
mod tile;

pub use accumulator::{linear_to_gamma, tone_map, AccumulationBuffer, PassSample};
pub use bvh::{Bvh, BvhNode, BvhStats, TRAVERSAL_STACK_SIZE};
pub use camera::{generate_ray, Camera, CameraUniforms};
pub use config::{RenderConfig, ShadingMode, SkyGradient, DEFAULT_TILE_SIZE, MAX_DEPTH_CEILING};
pub use error::{RenderError, RenderResult};
pub use hittable::{HitRecord, Hittable};
pub use integrator::{ray_color, trace_path, PathResult, Termination, TraceSettings};
pub use material::{reflectance, Color, Material, Scatter};
pub use primitive::Primitive;
pub use quad::Quad;
pub use renderer::{render_pixel_pass, PassStats, ProgressiveRenderer};
pub use sampler::{next, pcg_hash, Sampler, MAX_REJECTION_ATTEMPTS};
pub use scene::Scene;
pub use sphere::Sphere;
pub use tile::{generate_tiles, render_tile, Tile, TileResult};

/// Re-export Vec3 and common math types from luma_math
pub use luma_math::{Aabb, Interval, Ray, Vec3, Vec4};
