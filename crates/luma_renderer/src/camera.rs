//! Camera and per-dispatch ray generation uniforms.

use crate::{RenderConfig, Sampler, Tile};
use bytemuck::{Pod, Zeroable};
use luma_math::{Ray, Vec3};

/// Camera for generating rays into the scene.
///
/// A builder over position and lens settings. Ray generation itself only
/// reads the flat [`CameraUniforms`] record derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub image_width: u32,
    pub image_height: u32,

    // Camera positioning
    look_from: Vec3,
    look_at: Vec3,
    vup: Vec3,

    // Lens settings
    vfov: f32,          // Vertical field of view in degrees
    defocus_angle: f32, // Variation angle of rays through each pixel
    focus_dist: f32,    // Distance from camera to plane of perfect focus
}

impl Camera {
    /// Create a new camera with default settings.
    pub fn new() -> Self {
        Self {
            image_width: 800,
            image_height: 450,
            look_from: Vec3::new(0.0, 0.0, 0.0),
            look_at: Vec3::new(0.0, 0.0, -1.0),
            vup: Vec3::new(0.0, 1.0, 0.0),
            vfov: 90.0,
            defocus_angle: 0.0,
            focus_dist: 1.0,
        }
    }

    /// Set image resolution.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.image_width = width;
        self.image_height = height;
        self
    }

    /// Set camera position.
    pub fn with_position(mut self, look_from: Vec3, look_at: Vec3, vup: Vec3) -> Self {
        self.look_from = look_from;
        self.look_at = look_at;
        self.vup = vup;
        self
    }

    /// Set lens settings.
    pub fn with_lens(mut self, vfov: f32, defocus_angle: f32, focus_dist: f32) -> Self {
        self.vfov = vfov;
        self.defocus_angle = defocus_angle;
        self.focus_dist = focus_dist;
        self
    }

    /// Orthonormal basis `(u, v, w)`: right, up, and backwards.
    ///
    /// Degenerate inputs (look-from equal to look-at, or `vup` parallel to
    /// the view direction) fall back to an arbitrary but valid basis.
    fn basis(&self) -> (Vec3, Vec3, Vec3) {
        let w = (self.look_from - self.look_at).normalize_or_zero();
        let w = if w == Vec3::ZERO { Vec3::Z } else { w };

        let u = self.vup.cross(w).normalize_or_zero();
        let u = if u == Vec3::ZERO {
            w.any_orthonormal_vector()
        } else {
            u
        };

        (u, w.cross(u), w)
    }

    /// Derive the uniforms for pass 0 over the whole image.
    pub fn uniforms(&self, config: &RenderConfig) -> CameraUniforms {
        let width = self.image_width.max(1);
        let height = self.image_height.max(1);
        let center = self.look_from;
        let (u, v, w) = self.basis();

        // Calculate viewport dimensions
        let theta = self.vfov.to_radians();
        let h = (theta / 2.0).tan();
        let viewport_height = 2.0 * h * self.focus_dist;
        let viewport_width = viewport_height * (width as f32 / height as f32);

        // Calculate viewport vectors
        let viewport_u = viewport_width * u;
        let viewport_v = -viewport_height * v;

        // Calculate pixel delta vectors
        let pixel_delta_u = viewport_u / width as f32;
        let pixel_delta_v = viewport_v / height as f32;

        // Calculate upper left pixel location
        let viewport_upper_left =
            center - self.focus_dist * w - viewport_u / 2.0 - viewport_v / 2.0;
        let pixel00 = viewport_upper_left + 0.5 * (pixel_delta_u + pixel_delta_v);

        // Calculate defocus disk basis vectors
        let defocus_radius = self.focus_dist * (self.defocus_angle / 2.0).to_radians().tan();

        CameraUniforms {
            pixel00,
            pixel_delta_u,
            pixel_delta_v,
            center,
            defocus_disk_u: u * defocus_radius,
            defocus_disk_v: v * defocus_radius,
            defocus_angle: self.defocus_angle,
            samples_per_pass: config.samples_per_pass,
            max_depth: config.effective_max_depth(),
            pass_index: 0,
            total_passes: config.total_passes,
            image_width: self.image_width,
            image_height: self.image_height,
            tile_origin: [0, 0],
            tile_size: [self.image_width, self.image_height],
            seed: config.seed,
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable per-dispatch record consumed by ray generation.
///
/// Plain old data with no padding, so it can be uploaded as-is.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct CameraUniforms {
    /// Center of pixel (0, 0)
    pub pixel00: Vec3,
    pub pixel_delta_u: Vec3,
    pub pixel_delta_v: Vec3,
    /// Camera center (ray origin without defocus)
    pub center: Vec3,
    pub defocus_disk_u: Vec3,
    pub defocus_disk_v: Vec3,
    /// Zero disables depth of field
    pub defocus_angle: f32,
    pub samples_per_pass: u32,
    pub max_depth: u32,
    pub pass_index: u32,
    pub total_passes: u32,
    pub image_width: u32,
    pub image_height: u32,
    pub tile_origin: [u32; 2],
    pub tile_size: [u32; 2],
    pub seed: u32,
}

impl CameraUniforms {
    /// Copy of these uniforms for another pass.
    pub fn for_pass(mut self, pass_index: u32) -> Self {
        self.pass_index = pass_index;
        self
    }

    /// Copy of these uniforms restricted to `tile`.
    pub fn with_tile(mut self, tile: &Tile) -> Self {
        self.tile_origin = [tile.x, tile.y];
        self.tile_size = [tile.width, tile.height];
        self
    }

    /// True if the pixel is inside both the image and the tile rectangle.
    pub fn covers(&self, x: u32, y: u32) -> bool {
        let [tx, ty] = self.tile_origin;
        let [tw, th] = self.tile_size;
        x < self.image_width
            && y < self.image_height
            && x >= tx
            && y >= ty
            && x - tx < tw
            && y - ty < th
    }
}

/// Camera rays shorter than this before normalization are discarded.
const MIN_DIRECTION_LENGTH_SQUARED: f32 = 1e-12;

/// Generate a camera ray for pixel `(px, py)`.
///
/// The sample point is jittered inside the pixel footprint and the origin
/// is drawn from the defocus disk when the defocus angle is non-zero.
/// Returns `None` if the resulting direction is degenerate or non-finite.
pub fn generate_ray(
    px: u32,
    py: u32,
    uniforms: &CameraUniforms,
    sampler: &mut Sampler,
) -> Option<Ray> {
    let offset = sampler.in_unit_square();

    let pixel_sample = uniforms.pixel00
        + ((px as f32) + offset.x) * uniforms.pixel_delta_u
        + ((py as f32) + offset.y) * uniforms.pixel_delta_v;

    let origin = if uniforms.defocus_angle <= 0.0 {
        uniforms.center
    } else {
        let p = sampler.in_unit_disk();
        uniforms.center + p.x * uniforms.defocus_disk_u + p.y * uniforms.defocus_disk_v
    };

    // Checked before normalizing, which would scale a tiny direction back up
    let direction = pixel_sample - origin;
    if !direction.is_finite() || direction.length_squared() <= MIN_DIRECTION_LENGTH_SQUARED {
        return None;
    }

    let ray = Ray::new(origin, direction.normalize());
    ray.is_valid().then_some(ray)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> RenderConfig {
        RenderConfig {
            width: 100,
            height: 100,
            ..Default::default()
        }
    }

    #[test]
    fn test_uniforms_layout() {
        assert_eq!(std::mem::size_of::<CameraUniforms>(), 120);
        let uniforms = Camera::new().uniforms(&config());
        assert_eq!(bytemuck::bytes_of(&uniforms).len(), 120);
    }

    #[test]
    fn test_camera_basis() {
        let camera = Camera::new()
            .with_resolution(800, 600)
            .with_position(
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(0.0, 0.0, -1.0),
                Vec3::new(0.0, 1.0, 0.0),
            )
            .with_lens(90.0, 0.0, 1.0);

        let (u, v, w) = camera.basis();
        assert!((w - Vec3::Z).length() < 0.001);
        assert!((u - Vec3::X).length() < 0.001);
        assert!((v - Vec3::Y).length() < 0.001);
    }

    #[test]
    fn test_camera_ray_direction() {
        let camera = Camera::new()
            .with_resolution(100, 100)
            .with_position(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), Vec3::Y)
            .with_lens(90.0, 0.0, 1.0);
        let uniforms = camera.uniforms(&config());
        let mut sampler = Sampler::new(42);

        // Center ray should point roughly towards -Z
        let ray = generate_ray(50, 50, &uniforms, &mut sampler).unwrap();
        assert!(ray.direction.z < -0.99);
        assert!((ray.direction.length() - 1.0).abs() < 1e-5);
        assert_eq!(ray.origin, Vec3::ZERO);
        assert_eq!(ray.interval, Ray::DEFAULT_INTERVAL);

        // Top-left pixel points up and to the left
        let ray = generate_ray(0, 0, &uniforms, &mut sampler).unwrap();
        assert!(ray.direction.x < 0.0 && ray.direction.y > 0.0);
    }

    #[test]
    fn test_defocus_origin_stays_on_disk() {
        let camera = Camera::new()
            .with_resolution(100, 100)
            .with_position(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y)
            .with_lens(40.0, 10.0, 5.0);
        let uniforms = camera.uniforms(&config());
        let radius = 5.0 * (5.0f32).to_radians().tan();
        let mut sampler = Sampler::new(7);

        let mut moved = 0;
        for _ in 0..100 {
            let ray = generate_ray(50, 50, &uniforms, &mut sampler).unwrap();
            let offset = ray.origin - uniforms.center;
            assert!(offset.length() <= radius + 1e-4);
            assert!(offset.z.abs() < 1e-5);
            if offset.length() > 1e-4 {
                moved += 1;
            }
        }
        assert!(moved > 90);
    }

    #[test]
    fn test_degenerate_camera_still_produces_rays() {
        let camera = Camera::new()
            .with_resolution(10, 10)
            .with_position(Vec3::ONE, Vec3::ONE, Vec3::Y);
        let uniforms = camera.uniforms(&config());
        assert!(uniforms.pixel00.is_finite());
        assert!(generate_ray(5, 5, &uniforms, &mut Sampler::new(1)).is_some());

        // vup parallel to the view direction
        let camera = Camera::new().with_position(Vec3::ZERO, -Vec3::Y, Vec3::Y);
        let uniforms = camera.uniforms(&config());
        assert!(uniforms.pixel_delta_u.is_finite());
        assert!(uniforms.pixel_delta_u.length() > 0.0);
    }

    #[test]
    fn test_non_finite_uniforms_yield_no_ray() {
        let mut uniforms = Camera::new().uniforms(&config());
        uniforms.pixel_delta_u = Vec3::splat(f32::NAN);
        assert!(generate_ray(1, 1, &uniforms, &mut Sampler::new(3)).is_none());
    }

    #[test]
    fn test_near_zero_direction_yields_no_ray() {
        let mut uniforms = Camera::new().uniforms(&config());
        uniforms.center = Vec3::ZERO;
        uniforms.pixel00 = Vec3::new(0.0, 0.0, -1e-9);
        uniforms.pixel_delta_u = Vec3::ZERO;
        uniforms.pixel_delta_v = Vec3::ZERO;
        uniforms.defocus_angle = 0.0;

        let mut sampler = Sampler::new(5);
        for _ in 0..8 {
            assert!(generate_ray(0, 0, &uniforms, &mut sampler).is_none());
        }

        // A short but resolvable direction still normalizes
        uniforms.pixel00 = Vec3::new(0.0, 0.0, -1e-3);
        let ray = generate_ray(0, 0, &uniforms, &mut sampler).unwrap();
        assert!((ray.direction - -Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn test_tile_coverage() {
        let uniforms = Camera::new()
            .with_resolution(64, 64)
            .uniforms(&config())
            .for_pass(3)
            .with_tile(&Tile::new(16, 32, 16, 16, 0));

        assert_eq!(uniforms.pass_index, 3);
        assert!(uniforms.covers(16, 32));
        assert!(uniforms.covers(31, 47));
        assert!(!uniforms.covers(32, 47));
        assert!(!uniforms.covers(15, 40));
    }
}
