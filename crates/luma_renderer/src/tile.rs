//! Tile-based work division.
//!
//! Divides the image into tiles that can be rendered independently and in
//! parallel using rayon.

use crate::renderer::render_pixel_pass;
use crate::{CameraUniforms, PassSample, Scene, TraceSettings};

/// A rectangular region of the image to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    /// X coordinate of tile's top-left corner
    pub x: u32,
    /// Y coordinate of tile's top-left corner
    pub y: u32,
    /// Width of the tile in pixels
    pub width: u32,
    /// Height of the tile in pixels
    pub height: u32,
    /// Index of this tile in the render order
    pub index: usize,
}

impl Tile {
    /// Create a new tile.
    pub fn new(x: u32, y: u32, width: u32, height: u32, index: usize) -> Self {
        Self { x, y, width, height, index }
    }

    /// Get the total number of pixels in this tile.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Pixel coordinates covered by the tile, row-major.
    pub fn pixels(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        (self.y..self.y + self.height)
            .flat_map(move |y| (self.x..self.x + self.width).map(move |x| (x, y)))
    }

    /// The part of this tile inside a `width x height` image, if any.
    pub fn clip(&self, width: u32, height: u32) -> Option<Tile> {
        if self.x >= width || self.y >= height {
            return None;
        }
        let w = self.width.min(width - self.x);
        let h = self.height.min(height - self.y);
        (w > 0 && h > 0).then(|| Tile::new(self.x, self.y, w, h, self.index))
    }
}

/// Generate tiles for an image, sorted in spiral order from center.
///
/// Tiles closer to the center are rendered first, so the most visually
/// important part of the image converges early.
pub fn generate_tiles(width: u32, height: u32, tile_size: u32) -> Vec<Tile> {
    let tile_size = tile_size.max(1);
    let mut tiles = Vec::new();
    let mut index = 0;

    // Generate grid of tiles
    let mut y = 0;
    while y < height {
        let mut x = 0;
        while x < width {
            let tw = tile_size.min(width - x);
            let th = tile_size.min(height - y);
            tiles.push(Tile::new(x, y, tw, th, index));
            index += 1;
            x = x.saturating_add(tile_size);
        }
        y = y.saturating_add(tile_size);
    }

    sort_spiral(&mut tiles, width, height);

    // Update indices after sorting
    for (i, tile) in tiles.iter_mut().enumerate() {
        tile.index = i;
    }

    tiles
}

/// Sort tiles by distance from image center.
fn sort_spiral(tiles: &mut [Tile], width: u32, height: u32) {
    let center_x = width as f32 / 2.0;
    let center_y = height as f32 / 2.0;

    let distance = |t: &Tile| {
        let cx = t.x as f32 + t.width as f32 / 2.0;
        let cy = t.y as f32 + t.height as f32 / 2.0;
        (cx - center_x).powi(2) + (cy - center_y).powi(2)
    };

    tiles.sort_by(|a, b| distance(a).total_cmp(&distance(b)));
}

/// Result of rendering one tile for one pass.
#[derive(Debug, Clone, PartialEq)]
pub struct TileResult {
    /// The tile that was rendered
    pub tile: Tile,
    /// Per-pixel pass samples in row-major order
    pub samples: Vec<PassSample>,
}

/// Render one pass of a single tile.
///
/// The tile is clipped to the image first; pixels outside it are skipped.
pub fn render_tile(
    tile: &Tile,
    uniforms: &CameraUniforms,
    scene: &Scene,
    settings: &TraceSettings,
) -> TileResult {
    let Some(tile) = tile.clip(uniforms.image_width, uniforms.image_height) else {
        return TileResult {
            tile: Tile::new(tile.x, tile.y, 0, 0, tile.index),
            samples: Vec::new(),
        };
    };

    let uniforms = uniforms.with_tile(&tile);
    let samples = tile
        .pixels()
        .map(|(x, y)| render_pixel_pass(x, y, &uniforms, scene, settings))
        .collect();

    TileResult { tile, samples }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Camera, RenderConfig};

    #[test]
    fn test_generate_tiles_exact_fit() {
        let tiles = generate_tiles(128, 128, 64);
        assert_eq!(tiles.len(), 4); // 2x2 grid

        // Total pixels should equal image size
        let total_pixels: usize = tiles.iter().map(|t| t.pixel_count()).sum();
        assert_eq!(total_pixels, 128 * 128);
    }

    #[test]
    fn test_generate_tiles_partial_fit() {
        let tiles = generate_tiles(100, 100, 64);
        assert_eq!(tiles.len(), 4); // 2x2 grid with partial tiles

        // Total pixels should equal image size
        let total_pixels: usize = tiles.iter().map(|t| t.pixel_count()).sum();
        assert_eq!(total_pixels, 100 * 100);
    }

    #[test]
    fn test_every_pixel_covered_once() {
        let (width, height) = (37, 23);
        let mut hits = vec![0u32; (width * height) as usize];
        for tile in generate_tiles(width, height, 8) {
            for (x, y) in tile.pixels() {
                hits[(y * width + x) as usize] += 1;
            }
        }
        assert!(hits.iter().all(|&h| h == 1));
    }

    #[test]
    fn test_spiral_order() {
        let tiles = generate_tiles(192, 192, 64);
        assert_eq!(tiles.len(), 9); // 3x3 grid

        // First tile should be the center one
        let first = &tiles[0];
        assert_eq!(first.x, 64);
        assert_eq!(first.y, 64);
        assert!(tiles.iter().enumerate().all(|(i, t)| t.index == i));
    }

    #[test]
    fn test_clip() {
        let tile = Tile::new(60, 10, 16, 16, 3);
        assert_eq!(tile.clip(64, 20), Some(Tile::new(60, 10, 4, 10, 3)));
        assert_eq!(tile.clip(60, 20), None);
        assert_eq!(tile.clip(100, 100), Some(tile));
    }

    #[test]
    fn test_render_tile_skips_outside_pixels() {
        let config = RenderConfig {
            width: 8,
            height: 8,
            samples_per_pass: 1,
            ..Default::default()
        };
        let uniforms = Camera::new().with_resolution(8, 8).uniforms(&config);
        let scene = Scene::default();
        let settings = TraceSettings::from(&config);

        let result = render_tile(&Tile::new(4, 4, 8, 8, 0), &uniforms, &scene, &settings);
        assert_eq!(result.tile, Tile::new(4, 4, 4, 4, 0));
        assert_eq!(result.samples.len(), 16);
        assert!(result.samples.iter().all(|s| s.count == 1));

        let result = render_tile(&Tile::new(8, 0, 4, 4, 1), &uniforms, &scene, &settings);
        assert!(result.samples.is_empty());
        assert_eq!(result.tile.pixel_count(), 0);
    }
}
