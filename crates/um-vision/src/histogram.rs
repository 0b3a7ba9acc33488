use image::RgbaImage;

const HUE_BINS: usize = 50;
const SATURATION_BINS: usize = 60;
/// 8-bit hue range, degrees halved
const HUE_RANGE: f64 = 180.0;
const SATURATION_RANGE: f64 = 256.0;

/// 2D hue/saturation histogram, min-max normalized to 0..1.
#[derive(Debug, Clone, PartialEq)]
pub struct HsHistogram {
    bins: Vec<f64>,
}

impl HsHistogram {
    /// Build the histogram from the RGB channels. Alpha is ignored.
    pub fn from_image(image: &RgbaImage) -> Self {
        let mut bins = vec![0.0; HUE_BINS * SATURATION_BINS];

        for px in image.pixels() {
            let (h, s) = hue_saturation(px[0], px[1], px[2]);
            let hb = ((h as f64 * HUE_BINS as f64 / HUE_RANGE) as usize).min(HUE_BINS - 1);
            let sb = ((s as f64 * SATURATION_BINS as f64 / SATURATION_RANGE) as usize)
                .min(SATURATION_BINS - 1);
            bins[hb * SATURATION_BINS + sb] += 1.0;
        }

        normalize_min_max(&mut bins);
        Self { bins }
    }

    /// Bhattacharyya distance, 0 for identical distributions, 1 for disjoint ones.
    pub fn bhattacharyya(&self, other: &HsHistogram) -> f64 {
        let s1: f64 = self.bins.iter().sum();
        let s2: f64 = other.bins.iter().sum();
        let overlap: f64 = self
            .bins
            .iter()
            .zip(&other.bins)
            .map(|(a, b)| (a * b).sqrt())
            .sum();

        let denom = (s1 * s2).sqrt();
        let scale = if denom > f64::EPSILON { 1.0 / denom } else { 1.0 };
        (1.0 - overlap * scale).max(0.0).sqrt()
    }
}

/// Distance between the color distributions of two images.
pub fn compare_histograms(a: &RgbaImage, b: &RgbaImage) -> f64 {
    HsHistogram::from_image(a).bhattacharyya(&HsHistogram::from_image(b))
}

/// 8-bit HSV conversion: hue in 0..180, saturation in 0..=255.
fn hue_saturation(r: u8, g: u8, b: u8) -> (u8, u8) {
    let (r, g, b) = (r as f64, g as f64, b as f64);
    let v = r.max(g).max(b);
    let min = r.min(g).min(b);
    let diff = v - min;

    let s = if v > 0.0 { 255.0 * diff / v } else { 0.0 };
    if diff == 0.0 {
        return (0, s.round() as u8);
    }

    let mut h = if v == r {
        60.0 * (g - b) / diff
    } else if v == g {
        120.0 + 60.0 * (b - r) / diff
    } else {
        240.0 + 60.0 * (r - g) / diff
    };
    if h < 0.0 {
        h += 360.0;
    }

    let h = (h / 2.0).round() as u32 % 180;
    (h as u8, s.round() as u8)
}

fn normalize_min_max(bins: &mut [f64]) {
    let min = bins.iter().copied().fold(f64::INFINITY, f64::min);
    let max = bins.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    for v in bins.iter_mut() {
        *v = if range > 0.0 { (*v - min) / range } else { 0.0 };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_hue_saturation() {
        assert_eq!(hue_saturation(255, 0, 0), (0, 255));
        assert_eq!(hue_saturation(0, 255, 0), (60, 255));
        assert_eq!(hue_saturation(0, 0, 255), (120, 255));
        assert_eq!(hue_saturation(128, 128, 128), (0, 0));
        assert_eq!(hue_saturation(0, 0, 0), (0, 0));
    }

    #[test]
    fn test_identical_images_have_zero_distance() {
        let img = RgbaImage::from_fn(20, 20, |x, y| Rgba([(x * 12) as u8, (y * 12) as u8, 60, 255]));
        assert!(compare_histograms(&img, &img) < 1e-9);
    }

    #[test]
    fn test_disjoint_colors_have_max_distance() {
        let red = RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255]));
        let blue = RgbaImage::from_pixel(10, 10, Rgba([0, 0, 255, 255]));
        let d = compare_histograms(&red, &blue);
        assert!((d - 1.0).abs() < 1e-9, "distance was {}", d);
    }

    #[test]
    fn test_alpha_is_ignored() {
        let opaque = RgbaImage::from_pixel(10, 10, Rgba([10, 200, 30, 255]));
        let clear = RgbaImage::from_pixel(10, 10, Rgba([10, 200, 30, 0]));
        assert!(compare_histograms(&opaque, &clear) < 1e-9);
    }

    #[test]
    fn test_similar_closer_than_different() {
        let a = RgbaImage::from_fn(10, 10, |x, _| {
            if x < 5 { Rgba([200, 20, 20, 255]) } else { Rgba([20, 20, 200, 255]) }
        });
        let b = RgbaImage::from_fn(10, 10, |x, _| {
            if x < 6 { Rgba([200, 20, 20, 255]) } else { Rgba([20, 20, 200, 255]) }
        });
        let c = RgbaImage::from_pixel(10, 10, Rgba([20, 200, 20, 255]));
        assert!(compare_histograms(&a, &b) < compare_histograms(&a, &c));
    }
}
