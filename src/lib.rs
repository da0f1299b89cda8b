//! Turn photographs into bead mosaics.
//!
//! A decoded RGBA buffer at board resolution goes in; every pixel comes out
//! snapped to a craft-bead color, together with how many beads of each color
//! the board needs. Faces and eyes get a larger share of the color budget
//! than the background.

pub mod beads;
pub mod color;
pub mod edges;
pub mod error;
pub mod matcher;
pub mod options;
pub mod palette_builder;
pub mod preprocess;
pub mod quantizer;
pub mod regions;
pub mod subject;
pub mod wasm;

use image::RgbaImage;
use serde::Serialize;

pub use beads::{BeadEntry, BeadPalette};
pub use error::MosaicError;
pub use matcher::{ColorMatcher, MonochromeMatcher, NearestBeadMatcher, PixelMatcher};
pub use options::{MatchStrategy, MosaicOptions, ReductionLevel, ReductionMode};
pub use quantizer::ColorCounts;

/// Outcome of one mosaic conversion.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MosaicResult {
    /// Recolored board, same size as the input.
    #[serde(skip)]
    pub image: RgbaImage,
    /// Bead names the palette stage settled on.
    pub palette: Vec<&'static str>,
    pub color_counts: ColorCounts,
}

/// Convert `img` with the default bead table for the chosen strategy.
///
/// Clustering and monochrome output use the 19-color standard table; the
/// threshold strategy uses the Hama table.
pub fn quantize_image(img: &RgbaImage, options: &MosaicOptions) -> Result<MosaicResult, MosaicError> {
    let beads = match options.strategy {
        MatchStrategy::Threshold if options.mode != ReductionMode::Bw => BeadPalette::hama(),
        _ => BeadPalette::standard(),
    };
    quantize_image_with(img, options, beads)
}

/// Convert `img` against an explicit bead table.
pub fn quantize_image_with(
    img: &RgbaImage,
    options: &MosaicOptions,
    beads: &BeadPalette,
) -> Result<MosaicResult, MosaicError> {
    let num_colors = options.mode.num_colors();
    let work = if options.preprocess {
        preprocess::preprocess(img, num_colors)
    } else {
        img.clone()
    };

    let (palette, (image, color_counts)) = if num_colors == 2 {
        let palette = palette_builder::create_optimized_palette(&work, num_colors, beads)?;
        let matcher = MonochromeMatcher::new(beads)?;
        (palette, quantizer::quantize(&work, &matcher, beads)?)
    } else {
        match options.strategy {
            MatchStrategy::Clustering => {
                let palette = palette_builder::create_optimized_palette(&work, num_colors, beads)?;
                let matcher = NearestBeadMatcher::new(beads);
                (palette, quantizer::quantize(&work, &matcher, beads)?)
            }
            MatchStrategy::Threshold => {
                let matcher = ColorMatcher::new(beads, options.mode.matcher_level());
                let palette = matcher.active_beads().iter().map(|e| e.name).collect();
                (palette, quantizer::quantize(&work, &matcher, beads)?)
            }
        }
    };

    log::debug!(
        "{}x{} board, mode {}, {} beads in palette, {} used",
        img.width(),
        img.height(),
        options.mode,
        palette.len(),
        color_counts.len()
    );

    Ok(MosaicResult { image, palette, color_counts })
}

/// Convert a raw RGBA byte buffer of `width` x `height` pixels.
pub fn quantize_raw(
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    options: &MosaicOptions,
) -> Result<MosaicResult, MosaicError> {
    let len = pixels.len();
    let expected = (width as usize).checked_mul(height as usize).and_then(|n| n.checked_mul(4));
    if expected != Some(len) {
        return Err(MosaicError::BufferSize { width, height, len });
    }
    let img = RgbaImage::from_raw(width, height, pixels).ok_or(MosaicError::BufferSize { width, height, len })?;
    quantize_image(&img, options)
}

/// Decode an encoded image and resize it to a `board_w` x `board_h` board
/// without smoothing.
pub fn load_board(input: &[u8], board_w: u32, board_h: u32) -> Result<RgbaImage, MosaicError> {
    let img = image::load_from_memory(input)?;
    Ok(image::imageops::resize(
        &img.to_rgba8(),
        board_w,
        board_h,
        image::imageops::FilterType::Nearest,
    ))
}

/// Decode an image, resize it to a `board_w` x `board_h` board without
/// smoothing, convert it and PNG-encode the result. With `output_size` the
/// board is scaled up (nearest neighbour) so its longest side matches it.
#[cfg(feature = "native-bin")]
pub fn mosaic_bytes(
    input: &[u8],
    board_w: u32,
    board_h: u32,
    output_size: Option<u32>,
    options: &MosaicOptions,
) -> anyhow::Result<(Vec<u8>, MosaicResult)> {
    use anyhow::Context;
    use image::imageops::{self, FilterType};
    use image::{DynamicImage, ImageFormat};

    let board = load_board(input, board_w, board_h)?;
    let result = quantize_image(&board, options)?;

    let rendered = match output_size {
        Some(size) => {
            let ratio = size as f32 / board_w.max(board_h) as f32;
            let w = ((board_w as f32) * ratio).round().max(1.0) as u32;
            let h = ((board_h as f32) * ratio).round().max(1.0) as u32;
            imageops::resize(&result.image, w, h, FilterType::Nearest)
        }
        None => result.image.clone(),
    };

    let mut buf = Vec::new();
    DynamicImage::ImageRgba8(rendered)
        .write_to(&mut std::io::Cursor::new(&mut buf), ImageFormat::Png)
        .context("PNG encode error")?;

    Ok((buf, result))
}
