//! Progressive renderer.
//!
//! Each pass traces `samples_per_pass` paths through every pixel, tiles in
//! parallel, and folds the per-pixel averages into the accumulation buffer.
//! Passes run in sequence and cancellation is observed between them.

use crate::{
    generate_ray, generate_tiles, ray_color, render_tile, AccumulationBuffer, Camera,
    CameraUniforms, PassSample, RenderConfig, RenderError, RenderResult, Sampler, Scene, Tile,
    TileResult, TraceSettings, MAX_DEPTH_CEILING,
};
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Trace one pass worth of samples for pixel `(x, y)`.
///
/// The sampler is seeded from the pixel coordinates, the pass index and the
/// base seed only, so the result does not depend on how the image is tiled.
/// Samples whose camera ray is invalid are left out of the count. Pixels
/// outside the uniforms' tile rectangle get an empty sample.
pub fn render_pixel_pass(
    x: u32,
    y: u32,
    uniforms: &CameraUniforms,
    scene: &Scene,
    settings: &TraceSettings,
) -> PassSample {
    let mut pass = PassSample::default();
    if !uniforms.covers(x, y) {
        return pass;
    }

    let mut sampler = Sampler::for_pixel(x, y, uniforms.pass_index, uniforms.seed);
    for _ in 0..uniforms.samples_per_pass {
        if let Some(ray) = generate_ray(x, y, uniforms, &mut sampler) {
            pass.add(ray_color(ray, scene, settings, &mut sampler));
        }
    }
    pass
}

/// Summary of one rendered pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassStats {
    pub pass_index: u32,
    /// Valid samples traced across the image
    pub samples: u64,
    /// Samples dropped because their camera ray was invalid
    pub skipped: u64,
    pub duration: Duration,
}

/// Drives successive passes into a persistent accumulation buffer.
#[derive(Debug, Clone)]
pub struct ProgressiveRenderer {
    config: RenderConfig,
    settings: TraceSettings,
    buffer: AccumulationBuffer,
    tiles: Vec<Tile>,
    passes_done: u32,
}

impl ProgressiveRenderer {
    /// Create a renderer for a validated configuration.
    pub fn new(config: RenderConfig) -> RenderResult<Self> {
        config.validate()?;
        if config.max_depth > MAX_DEPTH_CEILING {
            log::warn!(
                "max_depth {} exceeds the ceiling, clamping to {}",
                config.max_depth,
                MAX_DEPTH_CEILING
            );
        }

        let tiles = generate_tiles(config.width, config.height, config.tile_size);
        log::debug!(
            "Renderer {}x{}: {} tiles of {}px",
            config.width,
            config.height,
            tiles.len(),
            config.tile_size
        );

        Ok(Self {
            settings: TraceSettings::from(&config),
            buffer: AccumulationBuffer::new(config.width, config.height),
            tiles,
            passes_done: 0,
            config,
        })
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn buffer(&self) -> &AccumulationBuffer {
        &self.buffer
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn passes_done(&self) -> u32 {
        self.passes_done
    }

    /// True once `total_passes` passes have been accumulated.
    pub fn is_complete(&self) -> bool {
        self.passes_done >= self.config.total_passes
    }

    /// Discard accumulated samples, e.g. after the camera or scene changed.
    pub fn reset(&mut self) {
        self.buffer.reset();
        self.passes_done = 0;
    }

    /// Render and accumulate the next pass.
    pub fn render_pass(&mut self, scene: &Scene, camera: &Camera) -> RenderResult<PassStats> {
        if camera.image_width != self.config.width || camera.image_height != self.config.height {
            return Err(RenderError::ResolutionMismatch {
                camera_width: camera.image_width,
                camera_height: camera.image_height,
                width: self.config.width,
                height: self.config.height,
            });
        }

        let start = Instant::now();
        let pass_index = self.passes_done;
        let uniforms = camera.uniforms(&self.config).for_pass(pass_index);
        let settings = self.settings;

        let results: Vec<TileResult> = self
            .tiles
            .par_iter()
            .map(|tile| render_tile(tile, &uniforms, scene, &settings))
            .collect();

        let clamp = self.config.sample_clamp();
        let mut samples = 0u64;
        for result in &results {
            samples += result.samples.iter().map(|s| s.count as u64).sum::<u64>();
            self.buffer.commit(result, clamp)?;
        }
        self.passes_done += 1;

        let expected = self.config.width as u64
            * self.config.height as u64
            * self.config.samples_per_pass as u64;
        let stats = PassStats {
            pass_index,
            samples,
            skipped: expected.saturating_sub(samples),
            duration: start.elapsed(),
        };
        log::debug!(
            "Pass {} done in {:.1?}: {} samples, {} skipped",
            stats.pass_index,
            stats.duration,
            stats.samples,
            stats.skipped
        );
        Ok(stats)
    }

    /// Render passes until `total_passes` is reached or `cancel` is set.
    ///
    /// The flag is checked before each pass; a pass that has started always
    /// completes. Returns the number of passes rendered by this call.
    pub fn render(
        &mut self,
        scene: &Scene,
        camera: &Camera,
        cancel: &AtomicBool,
    ) -> RenderResult<u32> {
        self.render_with_progress(scene, camera, cancel, |_| {})
    }

    /// Like [`render`](Self::render), calling `on_pass` after every
    /// accumulated pass.
    pub fn render_with_progress<F>(
        &mut self,
        scene: &Scene,
        camera: &Camera,
        cancel: &AtomicBool,
        mut on_pass: F,
    ) -> RenderResult<u32>
    where
        F: FnMut(&PassStats),
    {
        let start = Instant::now();
        let first = self.passes_done;
        log::info!(
            "Rendering {}x{}, {} passes of {} spp, {} primitives",
            self.config.width,
            self.config.height,
            self.config.total_passes.saturating_sub(first),
            self.config.samples_per_pass,
            scene.len()
        );

        while !self.is_complete() {
            if cancel.load(Ordering::Relaxed) {
                log::info!("Render cancelled after {} passes", self.passes_done);
                break;
            }
            let stats = self.render_pass(scene, camera)?;
            on_pass(&stats);
        }

        let rendered = self.passes_done - first;
        log::info!("Rendered {} passes in {:.2?}", rendered, start.elapsed());
        Ok(rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Color, Material, Primitive, Quad, ShadingMode, Sphere};
    use luma_math::{Vec3, Vec4};

    fn small_scene() -> Scene {
        let primitives: Vec<Primitive> = vec![
            Sphere::new(
                Vec3::new(0.0, -100.5, -1.0),
                100.0,
                Material::diffuse(Color::new(0.8, 0.8, 0.0)),
            )
            .into(),
            Sphere::new(
                Vec3::new(0.0, 0.0, -1.2),
                0.5,
                Material::diffuse(Color::new(0.1, 0.2, 0.5)),
            )
            .into(),
            Sphere::new(Vec3::new(-1.0, 0.0, -1.0), 0.5, Material::dielectric(1.5)).into(),
            Sphere::new(
                Vec3::new(1.0, 0.0, -1.0),
                0.5,
                Material::metallic(Color::new(0.8, 0.6, 0.2), 0.3),
            )
            .into(),
            Quad::new(
                Vec3::new(-0.5, 1.0, -1.5),
                Vec3::X,
                Vec3::Z,
                Material::emissive(Color::ONE, 4.0),
            )
            .into(),
        ];
        Scene::with_bvh(primitives, 0)
    }

    fn config(width: u32, height: u32, tile_size: u32) -> RenderConfig {
        RenderConfig {
            width,
            height,
            samples_per_pass: 2,
            total_passes: 3,
            max_depth: 5,
            tile_size,
            seed: 17,
            ..Default::default()
        }
    }

    #[test]
    fn test_result_independent_of_tiling() {
        let scene = small_scene();
        let camera = Camera::new().with_resolution(24, 16);

        let mut coarse = ProgressiveRenderer::new(config(24, 16, 16)).unwrap();
        let mut fine = ProgressiveRenderer::new(config(24, 16, 4)).unwrap();
        for _ in 0..2 {
            coarse.render_pass(&scene, &camera).unwrap();
            fine.render_pass(&scene, &camera).unwrap();
        }

        assert_eq!(coarse.buffer(), fine.buffer());
    }

    #[test]
    fn test_pixel_pass_is_reproducible() {
        let scene = small_scene();
        let cfg = config(24, 16, 8);
        let uniforms = Camera::new().with_resolution(24, 16).uniforms(&cfg).for_pass(2);
        let settings = TraceSettings::from(&cfg);

        let a = render_pixel_pass(5, 7, &uniforms, &scene, &settings);
        let b = render_pixel_pass(5, 7, &uniforms, &scene, &settings);
        assert_eq!(a, b);
        assert_eq!(a.count, 2);

        let next = render_pixel_pass(5, 7, &uniforms.for_pass(3), &scene, &settings);
        assert_ne!(a, next);
    }

    #[test]
    fn test_pixel_outside_tile_gets_nothing() {
        let cfg = config(8, 8, 4);
        let uniforms = Camera::new()
            .with_resolution(8, 8)
            .uniforms(&cfg)
            .with_tile(&Tile::new(0, 0, 4, 4, 0));
        let settings = TraceSettings::from(&cfg);
        let sample = render_pixel_pass(6, 6, &uniforms, &Scene::default(), &settings);
        assert_eq!(sample, PassSample::default());
    }

    #[test]
    fn test_full_render_and_sample_counts() {
        let scene = small_scene();
        let camera = Camera::new().with_resolution(12, 8);
        let mut renderer = ProgressiveRenderer::new(config(12, 8, 5)).unwrap();

        let rendered = renderer.render(&scene, &camera, &AtomicBool::new(false)).unwrap();
        assert_eq!(rendered, 3);
        assert!(renderer.is_complete());

        let buffer = renderer.buffer();
        for y in 0..8 {
            for x in 0..12 {
                assert_eq!(buffer.sample_count(x, y), 6);
                let pixel = buffer.get(x, y).unwrap();
                assert!(pixel.is_finite());
                assert!(pixel.min_element() >= 0.0 && pixel.max_element() <= 10.0);
            }
        }

        // Already complete: nothing more to do
        assert_eq!(renderer.render(&scene, &camera, &AtomicBool::new(false)).unwrap(), 0);
    }

    #[test]
    fn test_progress_reports_every_pass() {
        let camera = Camera::new().with_resolution(6, 4);
        let mut renderer = ProgressiveRenderer::new(config(6, 4, 4)).unwrap();

        let mut reported = Vec::new();
        let rendered = renderer
            .render_with_progress(&small_scene(), &camera, &AtomicBool::new(false), |stats| {
                reported.push((stats.pass_index, stats.samples, stats.skipped))
            })
            .unwrap();

        assert_eq!(rendered, 3);
        assert_eq!(reported, vec![(0, 48, 0), (1, 48, 0), (2, 48, 0)]);
    }

    #[test]
    fn test_empty_scene_converges_to_sky() {
        let camera = Camera::new().with_resolution(6, 4);
        let mut renderer = ProgressiveRenderer::new(config(6, 4, 4)).unwrap();
        let stats = renderer.render_pass(&Scene::default(), &camera).unwrap();
        assert_eq!(stats.samples, 6 * 4 * 2);
        assert_eq!(stats.skipped, 0);

        // Every sample is exactly the sky along its own jittered direction,
        // so each pixel lies between the horizon and zenith colors.
        let sky = renderer.config().sky;
        for pixel in renderer.buffer().pixels() {
            assert_eq!(pixel.w, 1.0);
            for c in 0..3 {
                let lo = sky.horizon[c].min(sky.zenith[c]);
                let hi = sky.horizon[c].max(sky.zenith[c]);
                assert!(pixel[c] >= lo - 1e-6 && pixel[c] <= hi + 1e-6);
            }
        }
    }

    #[test]
    fn test_cancel_before_first_pass() {
        let mut renderer = ProgressiveRenderer::new(config(8, 8, 4)).unwrap();
        let camera = Camera::new().with_resolution(8, 8);

        let rendered = renderer.render(&small_scene(), &camera, &AtomicBool::new(true)).unwrap();
        assert_eq!(rendered, 0);
        assert_eq!(renderer.passes_done(), 0);
        assert!(renderer.buffer().pixels().iter().all(|p| *p == Vec4::ZERO));
    }

    #[test]
    fn test_resume_after_interruption_matches_uninterrupted() {
        let scene = small_scene();
        let camera = Camera::new().with_resolution(10, 6);

        let mut straight = ProgressiveRenderer::new(config(10, 6, 4)).unwrap();
        straight.render(&scene, &camera, &AtomicBool::new(false)).unwrap();

        let mut resumed = ProgressiveRenderer::new(config(10, 6, 4)).unwrap();
        resumed.render_pass(&scene, &camera).unwrap();
        resumed.render(&scene, &camera, &AtomicBool::new(false)).unwrap();

        assert_eq!(straight.buffer(), resumed.buffer());
    }

    #[test]
    fn test_resolution_mismatch() {
        let mut renderer = ProgressiveRenderer::new(config(8, 8, 4)).unwrap();
        let camera = Camera::new().with_resolution(16, 8);
        assert!(matches!(
            renderer.render_pass(&Scene::default(), &camera),
            Err(RenderError::ResolutionMismatch { camera_width: 16, .. })
        ));
    }

    #[test]
    fn test_invalid_camera_samples_are_not_counted() {
        let scene = small_scene();
        let cfg = RenderConfig {
            samples_per_pass: 3,
            ..config(4, 4, 4)
        };
        let settings = TraceSettings::from(&cfg);
        let uniforms = Camera::new().with_resolution(4, 4).uniforms(&cfg);
        let tile = Tile::new(0, 0, 4, 4, 0);
        let clamp = cfg.sample_clamp();

        let mut buffer = AccumulationBuffer::new(4, 4);
        buffer.commit(&render_tile(&tile, &uniforms, &scene, &settings), clamp).unwrap();
        let before = buffer.clone();
        assert_eq!(before.sample_count(1, 2), 3);

        let mut broken = uniforms.for_pass(1);
        broken.pixel_delta_u = Vec3::splat(f32::NAN);
        let pass = render_pixel_pass(1, 2, &broken, &scene, &settings);
        assert_eq!(pass.count, 0);
        assert_eq!(pass.sum, Color::ZERO);

        buffer.commit(&render_tile(&tile, &broken, &scene, &settings), clamp).unwrap();
        assert_eq!(buffer, before);
        assert_eq!(buffer.sample_count(1, 2), 3);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let bad = RenderConfig {
            height: 0,
            ..Default::default()
        };
        assert!(ProgressiveRenderer::new(bad).is_err());
    }

    #[test]
    fn test_reset_starts_over() {
        let camera = Camera::new().with_resolution(4, 4);
        let mut renderer = ProgressiveRenderer::new(config(4, 4, 4)).unwrap();
        renderer.render_pass(&Scene::default(), &camera).unwrap();
        renderer.reset();

        assert_eq!(renderer.passes_done(), 0);
        assert_eq!(renderer.buffer().sample_count(0, 0), 0);
    }

    #[test]
    fn test_normals_mode_renders() {
        let sphere = Sphere::new(Vec3::new(0.0, 0.0, -1.0), 0.5, Material::diffuse(Color::ONE));
        let scene = Scene::new(vec![sphere.into()]);
        let cfg = RenderConfig {
            mode: ShadingMode::Normals,
            total_passes: 1,
            ..config(41, 41, 8)
        };
        let mut renderer = ProgressiveRenderer::new(cfg).unwrap();
        renderer.render_pass(&scene, &Camera::new().with_resolution(41, 41)).unwrap();

        let center = renderer.buffer().get(20, 20).unwrap();
        assert!((center.truncate() - Vec3::new(0.5, 0.5, 1.0)).abs().max_element() < 0.05);
    }
}
