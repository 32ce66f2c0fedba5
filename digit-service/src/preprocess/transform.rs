use super::{ModelInput, MNIST_SIDE};
use image::{imageops, imageops::FilterType, GrayImage};

/// Scale to the 28x28 MNIST grid with bilinear filtering.
pub fn resize(img: &GrayImage) -> GrayImage {
    if img.dimensions() == (MNIST_SIDE, MNIST_SIDE) {
        return img.clone();
    }
    imageops::resize(img, MNIST_SIDE, MNIST_SIDE, FilterType::Triangle)
}

/// Map 0..=255 intensities onto `[0.0, 1.0]`. Non-28x28 images are resized first.
pub fn normalize(img: &GrayImage) -> ModelInput {
    let img = resize(img);
    let pixels = img.pixels().map(|p| f32::from(p.0[0]) / 255.0).collect();
    ModelInput::from_pixels(pixels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocess::INPUT_LEN;
    use image::Luma;

    #[test]
    fn resize_targets_mnist_grid() {
        let img = GrayImage::from_pixel(300, 150, Luma([255]));
        let out = resize(&img);
        assert_eq!(out.dimensions(), (28, 28));
        assert!(out.pixels().all(|p| p.0[0] == 255));
    }

    #[test]
    fn normalize_scales_into_unit_range() {
        let img = GrayImage::from_fn(28, 28, |x, _| Luma([if x < 14 { 0 } else { 255 }]));
        let input = normalize(&img);

        assert_eq!(input.as_slice().len(), INPUT_LEN);
        assert_eq!(input.as_slice()[0], 0.0);
        assert_eq!(input.as_slice()[27], 1.0);
        assert_eq!(input.lit_pixels(), 14 * 28);
    }

    #[test]
    fn normalize_keeps_row_major_order() {
        let mut img = GrayImage::new(28, 28);
        img.put_pixel(3, 1, Luma([255]));
        let input = normalize(&img);
        assert_eq!(input.as_slice()[28 + 3], 1.0);
        assert_eq!(input.lit_pixels(), 1);
    }
}
