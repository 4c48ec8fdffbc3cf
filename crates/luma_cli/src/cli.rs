use clap::{Parser, ValueEnum};
use log::LevelFilter;
use luma_renderer::{RenderConfig, ShadingMode};
use std::path::PathBuf;

/// Log levels selectable from the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Built-in demo scenes
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SceneKind {
    /// Closed box of quads lit by a ceiling panel, with three spheres
    Cornell,
    /// Ground plane covered in small random spheres
    Spheres,
}

/// Shading modes exposed on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Path,
    Normals,
}

impl From<ModeArg> for ShadingMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Path => ShadingMode::PathTraced,
            ModeArg::Normals => ShadingMode::Normals,
        }
    }
}

/// Command line arguments
#[derive(Debug, Parser)]
#[command(name = "luma")]
#[command(about = "Progressive Monte Carlo path tracer")]
pub struct Args {
    /// JSON render configuration; command line flags override its fields
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Demo scene to render
    #[arg(long, value_enum, default_value = "cornell")]
    pub scene: SceneKind,

    /// Image width in pixels
    #[arg(long)]
    pub width: Option<u32>,

    /// Image height in pixels
    #[arg(long)]
    pub height: Option<u32>,

    /// Number of progressive passes
    #[arg(short, long)]
    pub passes: Option<u32>,

    /// Samples per pixel in each pass
    #[arg(short, long)]
    pub samples: Option<u32>,

    /// Maximum bounce depth
    #[arg(long)]
    pub max_depth: Option<u32>,

    /// Tile edge in pixels
    #[arg(long)]
    pub tile_size: Option<u32>,

    /// Base seed for sampling and scene generation
    #[arg(long)]
    pub seed: Option<u32>,

    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Test every primitive instead of building a BVH
    #[arg(long)]
    pub no_bvh: bool,

    /// Stop after this many seconds, finishing the pass in flight
    #[arg(long)]
    pub time_limit: Option<f32>,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    pub print_config: bool,

    /// Output PNG path
    #[arg(short, long, default_value = "luma.png")]
    pub output: PathBuf,

    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,
}

impl Args {
    /// Overlay the flags that were given onto `config`.
    pub fn apply(&self, config: &mut RenderConfig) {
        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(height) = self.height {
            config.height = height;
        }
        if let Some(passes) = self.passes {
            config.total_passes = passes;
        }
        if let Some(samples) = self.samples {
            config.samples_per_pass = samples;
        }
        if let Some(max_depth) = self.max_depth {
            config.max_depth = max_depth;
        }
        if let Some(tile_size) = self.tile_size {
            config.tile_size = tile_size;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(mode) = self.mode {
            config.mode = mode.into();
        }
        if self.no_bvh {
            config.use_bvh = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let args = Args::parse_from([
            "luma", "--width", "64", "--passes", "3", "--mode", "normals", "--no-bvh",
        ]);
        let mut config = RenderConfig::default();
        args.apply(&mut config);

        assert_eq!(config.width, 64);
        assert_eq!(config.height, RenderConfig::default().height);
        assert_eq!(config.total_passes, 3);
        assert_eq!(config.mode, ShadingMode::Normals);
        assert!(!config.use_bvh);
        assert_eq!(args.scene, SceneKind::Cornell);
    }

    #[test]
    fn test_defaults_leave_config_alone() {
        let args = Args::parse_from(["luma", "--scene", "spheres"]);
        let mut config = RenderConfig {
            width: 320,
            ..Default::default()
        };
        args.apply(&mut config);

        assert_eq!(config.width, 320);
        assert_eq!(args.scene, SceneKind::Spheres);
    }
}
