use image::{GrayImage, Luma, RgbaImage};

/// Gradient magnitude above which a pixel counts as an edge.
pub const EDGE_THRESHOLD: f64 = 30.0;

pub const EDGE: u8 = 255;

const SOBEL_X: [[f64; 3]; 3] = [[-1.0, 0.0, 1.0], [-2.0, 0.0, 2.0], [-1.0, 0.0, 1.0]];
const SOBEL_Y: [[f64; 3]; 3] = [[-1.0, -2.0, -1.0], [0.0, 0.0, 0.0], [1.0, 2.0, 1.0]];

/// Binary Sobel edge map of `img`: `EDGE` where the gradient of the channel
/// mean exceeds [`EDGE_THRESHOLD`], 0 elsewhere. The one-pixel border is
/// always 0.
pub fn detect_edges(img: &RgbaImage) -> GrayImage {
    let (w, h) = img.dimensions();
    let mut edges = GrayImage::new(w, h);
    if w < 3 || h < 3 {
        return edges;
    }

    // Channel mean per pixel, computed once.
    let luma: Vec<f64> = img
        .pixels()
        .map(|p| (p[0] as f64 + p[1] as f64 + p[2] as f64) / 3.0)
        .collect();

    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let mut gx = 0.0;
            let mut gy = 0.0;
            for (ky, (row_x, row_y)) in SOBEL_X.iter().zip(SOBEL_Y.iter()).enumerate() {
                let yy = (y + ky as u32 - 1) as usize;
                for kx in 0..3 {
                    let xx = (x + kx as u32 - 1) as usize;
                    let val = luma[yy * w as usize + xx];
                    gx += val * row_x[kx];
                    gy += val * row_y[kx];
                }
            }

            if (gx * gx + gy * gy).sqrt() > EDGE_THRESHOLD {
                edges.put_pixel(x, y, Luma([EDGE]));
            }
        }
    }

    edges
}
