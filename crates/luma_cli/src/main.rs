use anyhow::{Context, Result};
use clap::Parser;
use luma_renderer::{ProgressiveRenderer, RenderConfig, Scene};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

mod cli;
mod scenes;

use cli::{Args, SceneKind};

fn load_config(path: &Path) -> Result<RenderConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse config {}", path.display()))
}

/// Set `cancel` once `limit` has elapsed.
fn spawn_timer(limit: Duration, cancel: Arc<AtomicBool>) {
    std::thread::spawn(move || {
        std::thread::sleep(limit);
        cancel.store(true, Ordering::Relaxed);
    });
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_default_env()
        .filter_level(args.log_level.into())
        .init();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => RenderConfig::default(),
    };
    args.apply(&mut config);

    let demo = match args.scene {
        SceneKind::Cornell => scenes::cornell_box(config.width, config.height),
        SceneKind::Spheres => scenes::sphere_field(config.width, config.height, config.seed),
    };
    // The scene's own environment unless a config file chose one
    if args.config.is_none() {
        config.sky = demo.sky;
    }

    if args.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let mut scene = Scene::new(demo.primitives);
    if config.use_bvh {
        let start = Instant::now();
        scene.build_bvh(config.seed);
        log::info!("Built BVH over {} primitives in {:?}", scene.len(), start.elapsed());
    }
    log::info!("Scene bounds: {:?}, {} lights", scene.bounding_box(), scene.light_count());

    let mut renderer =
        ProgressiveRenderer::new(config.clone()).context("Invalid render configuration")?;

    let cancel = Arc::new(AtomicBool::new(false));
    if let Some(seconds) = args.time_limit {
        let limit = Duration::try_from_secs_f32(seconds).context("Invalid time limit")?;
        spawn_timer(limit, Arc::clone(&cancel));
    }

    let total_passes = config.total_passes;
    renderer.render_with_progress(&scene, &demo.camera, &cancel, |stats| {
        log::info!(
            "Pass {}/{} in {:.2?} ({} samples, {} skipped)",
            stats.pass_index + 1,
            total_passes,
            stats.duration,
            stats.samples,
            stats.skipped
        );
    })?;
    if !renderer.is_complete() {
        log::warn!("Time limit reached, stopping after {} passes", renderer.passes_done());
    }

    let buffer = renderer.buffer();
    image::save_buffer(
        &args.output,
        &buffer.to_rgba8(),
        buffer.width(),
        buffer.height(),
        image::ColorType::Rgba8,
    )
    .with_context(|| format!("Failed to write {}", args.output.display()))?;
    log::info!("Saved {}", args.output.display());

    Ok(())
}
