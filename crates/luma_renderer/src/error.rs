//! Errors raised by the renderer.
//!
//! Only misconfiguration surfaces as an error. Degenerate geometry and
//! non-finite values are handled locally and never abort a render.

use thiserror::Error;

/// Errors that can occur while setting up or committing a render.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("invalid resolution {width}x{height}")]
    InvalidResolution { width: u32, height: u32 },

    #[error("samples per pass must be at least 1")]
    ZeroSamples,

    #[error("tile size must be at least 1")]
    ZeroTileSize,

    #[error("camera is {camera_width}x{camera_height} but the render is {width}x{height}")]
    ResolutionMismatch {
        camera_width: u32,
        camera_height: u32,
        width: u32,
        height: u32,
    },

    #[error("tile {index} at ({x}, {y}) does not fit inside the {width}x{height} image")]
    TileOutOfBounds {
        index: usize,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },

    #[error("tile {index} carries {actual} pixels, expected {expected}")]
    TileSizeMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },
}

/// Result type for render operations.
pub type RenderResult<T> = Result<T, RenderError>;
