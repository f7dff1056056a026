//! Terminal preview of generated codes.
//!
//! Each character cell shows two vertically stacked samples using the upper
//! and lower half-block characters, so a cell covers a square patch of the
//! image on a typical 2:1 terminal font.

use crate::codec::BarcodeImage;

const UPPER_HALF: char = '▀';
const LOWER_HALF: char = '▄';
const FULL_BLOCK: char = '█';

/// Luma at or below this is a dark sample.
const DARK_THRESHOLD: u8 = 127;

/// How to fit the preview into the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Maximum output width in characters
    pub max_width: u16,
    /// Maximum output height in characters
    pub max_height: u16,
    /// Draw dark modules as filled blocks (for light terminals)
    pub invert: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            max_width: 80,
            max_height: 40,
            invert: false,
        }
    }
}

/// Sample grid size (columns, rows of samples) that fits the options while
/// keeping the image's aspect ratio. Never upscales.
pub fn grid_dimensions(img_width: u32, img_height: u32, opts: &RenderOptions) -> (u32, u32) {
    if img_width == 0 || img_height == 0 || opts.max_width == 0 || opts.max_height == 0 {
        return (0, 0);
    }

    let max_cols = (opts.max_width as u32).min(img_width);
    let max_rows = (opts.max_height as u32 * 2).min(img_height);
    let aspect = img_width as f32 / img_height as f32;

    // Try fitting to max width first
    let rows = (max_cols as f32 / aspect).round() as u32;
    if rows <= max_rows && rows > 0 {
        (max_cols, rows)
    } else {
        let cols = ((max_rows as f32 * aspect).round() as u32).clamp(1, max_cols);
        (cols, max_rows.max(1))
    }
}

/// Downsample a luma buffer to a `cols` x `rows` grid by averaging the
/// pixels under each cell.
pub fn downsample(gray: &[u8], img_width: u32, img_height: u32, cols: u32, rows: u32) -> Vec<u8> {
    if cols == 0 || rows == 0 || img_width == 0 || img_height == 0 || gray.is_empty() {
        return Vec::new();
    }

    let cell_w = img_width as f32 / cols as f32;
    let cell_h = img_height as f32 / rows as f32;
    let mut result = Vec::with_capacity((cols * rows) as usize);

    for cy in 0..rows {
        for cx in 0..cols {
            let start_x = (cx as f32 * cell_w) as u32;
            let end_x = (((cx + 1) as f32 * cell_w) as u32).max(start_x + 1);
            let start_y = (cy as f32 * cell_h) as u32;
            let end_y = (((cy + 1) as f32 * cell_h) as u32).max(start_y + 1);

            let mut sum = 0u32;
            let mut count = 0u32;
            for py in start_y..end_y.min(img_height) {
                for px in start_x..end_x.min(img_width) {
                    if let Some(&v) = gray.get((py * img_width + px) as usize) {
                        sum += v as u32;
                        count += 1;
                    }
                }
            }

            // Missing pixels read as light, matching the quiet zone
            result.push(if count > 0 { (sum / count) as u8 } else { 255 });
        }
    }

    result
}

/// Render a generated code as lines of half-block characters.
pub fn render(image: &BarcodeImage, opts: &RenderOptions) -> Vec<String> {
    let (cols, rows) = grid_dimensions(image.width(), image.height(), opts);
    let grid = downsample(image.pixels(), image.width(), image.height(), cols, rows);
    if grid.is_empty() {
        return Vec::new();
    }

    let filled = |sample: u8| {
        let dark = sample <= DARK_THRESHOLD;
        // On a dark terminal the light modules are the ones we draw
        dark == opts.invert
    };

    let mut lines = Vec::with_capacity(rows.div_ceil(2) as usize);
    for pair in (0..rows).step_by(2) {
        let mut line = String::with_capacity(cols as usize * 3);
        for x in 0..cols {
            let top = filled(grid[(pair * cols + x) as usize]);
            let bottom = if pair + 1 < rows {
                filled(grid[((pair + 1) * cols + x) as usize])
            } else {
                // Odd row count: pad the last row with the background
                !opts.invert
            };
            line.push(match (top, bottom) {
                (true, true) => FULL_BLOCK,
                (true, false) => UPPER_HALF,
                (false, true) => LOWER_HALF,
                (false, false) => ' ',
            });
        }
        lines.push(line);
    }
    lines
}
