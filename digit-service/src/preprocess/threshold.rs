use image::{GrayImage, Luma};

const WHITE: u8 = 255;
const BLACK: u8 = 0;

/// Fixed cutoff of the clean-up pass that follows the Otsu binarization.
const CLEANUP_THRESHOLD: u8 = 240;

/// Result of [`binarize`]: a strictly 0/255 image with a white digit.
#[derive(Debug, Clone)]
pub struct Binarized {
    pub image: GrayImage,
    /// Otsu cutoff picked for the source image.
    pub threshold: u8,
    /// Whether the polarity had to be flipped to keep the digit white.
    pub inverted: bool,
}

impl Binarized {
    pub fn foreground_pixels(&self) -> usize {
        count_white(&self.image)
    }
}

/// Otsu's method over the 256-bin histogram.
///
/// Returns the level `t` maximising between-class variance with the dark
/// class being `[0, t]`. Ties keep the lowest level; a single-valued image
/// yields 0.
pub fn otsu_threshold(gray: &GrayImage) -> u8 {
    let mut hist = [0u64; 256];
    for p in gray.pixels() {
        hist[p.0[0] as usize] += 1;
    }

    let total: u64 = hist.iter().sum();
    if total == 0 {
        return 0;
    }
    let total = total as f64;
    let sum_all: f64 = hist
        .iter()
        .enumerate()
        .map(|(level, &count)| level as f64 * count as f64)
        .sum();

    let mut best_threshold = 0u8;
    let mut best_variance = 0.0f64;
    let mut weight_dark = 0.0f64;
    let mut sum_dark = 0.0f64;

    for (level, &count) in hist.iter().enumerate() {
        weight_dark += count as f64;
        sum_dark += level as f64 * count as f64;

        let weight_light = total - weight_dark;
        if weight_dark == 0.0 || weight_light == 0.0 {
            continue;
        }

        let mean_dark = sum_dark / weight_dark;
        let mean_light = (sum_all - sum_dark) / weight_light;
        let between = weight_dark * weight_light * (mean_dark - mean_light).powi(2);

        if between > best_variance {
            best_variance = between;
            best_threshold = level as u8;
        }
    }

    best_threshold
}

/// Turn a grayscale drawing into a white-on-black binary image.
///
/// Pixels above the Otsu level become black and the rest white, which makes
/// dark ink on a light canvas white. If white then covers more than half the
/// image the drawing was light-on-dark, and the result is flipped.
pub fn binarize(gray: &GrayImage) -> Binarized {
    let threshold = otsu_threshold(gray);

    let mut image = map_pixels(gray, |p| if p > threshold { BLACK } else { WHITE });

    let white = count_white(&image);
    let total = (image.width() as usize) * (image.height() as usize);
    let inverted = white * 2 > total;
    if inverted {
        image = map_pixels(&image, |p| WHITE - p);
    }

    let image = map_pixels(&image, |p| if p > CLEANUP_THRESHOLD { WHITE } else { BLACK });

    Binarized {
        image,
        threshold,
        inverted,
    }
}

fn map_pixels(src: &GrayImage, f: impl Fn(u8) -> u8) -> GrayImage {
    GrayImage::from_fn(src.width(), src.height(), |x, y| {
        Luma([f(src.get_pixel(x, y).0[0])])
    })
}

fn count_white(img: &GrayImage) -> usize {
    img.pixels().filter(|p| p.0[0] == WHITE).count()
}
