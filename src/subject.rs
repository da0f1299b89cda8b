use image::GrayImage;

/// Half-size of the square window in which edges are counted.
pub const DENSITY_RADIUS: i64 = 5;
/// A pixel is subject when strictly more edges than this fall in its window.
pub const DENSITY_THRESHOLD: usize = 3;
/// Half-size of the dilation neighbourhood.
pub const DILATION_RADIUS: i64 = 3;

/// Binary subject/background mask, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubjectMask {
    width: u32,
    height: u32,
    bits: Vec<bool>,
}

impl SubjectMask {
    pub fn empty(width: u32, height: u32) -> Self {
        SubjectMask { width, height, bits: vec![false; (width * height) as usize] }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[inline]
    pub fn is_subject(&self, x: u32, y: u32) -> bool {
        self.bits[(y * self.width + x) as usize]
    }

    /// Flat row-major view.
    pub fn as_slice(&self) -> &[bool] {
        &self.bits
    }

    pub fn count(&self) -> usize {
        self.bits.iter().filter(|b| **b).count()
    }

    /// True if any set pixel lies in the clipped square of `radius` around (x, y).
    fn any_within(&self, x: u32, y: u32, radius: i64) -> bool {
        square(x, y, radius, self.width, self.height).any(|(nx, ny)| self.is_subject(nx, ny))
    }
}

/// Coordinates of the square of `radius` around (x, y), clipped to the image.
fn square(x: u32, y: u32, radius: i64, width: u32, height: u32) -> impl Iterator<Item = (u32, u32)> {
    let x0 = (x as i64 - radius).max(0) as u32;
    let y0 = (y as i64 - radius).max(0) as u32;
    let x1 = (x as i64 + radius).min(width as i64 - 1) as u32;
    let y1 = (y as i64 + radius).min(height as i64 - 1) as u32;
    (y0..=y1).flat_map(move |ny| (x0..=x1).map(move |nx| (nx, ny)))
}

/// Mark pixels surrounded by dense edges as subject, then dilate the result.
pub fn identify_subject(edges: &GrayImage) -> SubjectMask {
    let (w, h) = edges.dimensions();
    let mut dense = SubjectMask::empty(w, h);

    for y in 0..h {
        for x in 0..w {
            let count = square(x, y, DENSITY_RADIUS, w, h)
                .filter(|&(nx, ny)| edges.get_pixel(nx, ny)[0] > 0)
                .count();
            dense.bits[(y * w + x) as usize] = count > DENSITY_THRESHOLD;
        }
    }

    let mut dilated = SubjectMask::empty(w, h);
    for y in 0..h {
        for x in 0..w {
            dilated.bits[(y * w + x) as usize] = dense.any_within(x, y, DILATION_RADIUS);
        }
    }

    log::debug!("subject mask: {} of {} pixels", dilated.count(), w * h);
    dilated
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn edgeless_image_is_all_background() {
        let edges = GrayImage::new(20, 15);
        let mask = identify_subject(&edges);
        assert_eq!(mask.count(), 0);
        assert_eq!(mask.dimensions(), (20, 15));
    }

    #[test]
    fn sparse_edges_stay_background() {
        let mut edges = GrayImage::new(30, 30);
        // Three edges in one window never exceed the threshold.
        edges.put_pixel(10, 10, Luma([255]));
        edges.put_pixel(11, 10, Luma([255]));
        edges.put_pixel(12, 10, Luma([255]));
        assert_eq!(identify_subject(&edges).count(), 0);
    }

    #[test]
    fn dense_cluster_is_marked_and_dilated() {
        let mut edges = GrayImage::new(40, 40);
        for x in 18..22 {
            edges.put_pixel(x, 20, Luma([255]));
        }
        let mask = identify_subject(&edges);
        assert!(mask.is_subject(20, 20));
        // Pixels within x 16..=23, y 15..=25 see all four edges;
        // dilation adds 3 more.
        assert!(mask.is_subject(20, 28));
        assert!(!mask.is_subject(20, 29));
        assert!(!mask.is_subject(0, 0));
    }

    #[test]
    fn windows_are_clipped_at_the_border() {
        let mut edges = GrayImage::new(6, 6);
        for x in 0..4 {
            edges.put_pixel(x, 0, Luma([255]));
        }
        let mask = identify_subject(&edges);
        assert!(mask.is_subject(0, 0));
        assert!(mask.is_subject(5, 5));
    }
}
