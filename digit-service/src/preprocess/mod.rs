//! Image preprocessing: browser data URL in, MNIST-shaped tensor data out.
//!
//! The chain is strictly linear:
//! decode the data URL, decode the image to grayscale, binarize with Otsu,
//! resize to 28x28 and scale to `[0, 1]`.

pub mod decode;
pub mod threshold;
pub mod transform;

pub use decode::{decode_data_url, decode_image};
pub use threshold::{binarize, otsu_threshold, Binarized};
pub use transform::{normalize, resize};

use image::GrayImage;
use thiserror::Error;

/// Side length of the square images the model was trained on.
pub const MNIST_SIDE: u32 = 28;

/// Number of values in one model input.
pub const INPUT_LEN: usize = (MNIST_SIDE * MNIST_SIDE) as usize;

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("image payload is empty")]
    MissingPayload,

    #[error("malformed data URL: {0}")]
    MalformedDataUrl(String),

    #[error("invalid base64 payload: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("unsupported or corrupt image: {0}")]
    UnsupportedImage(String),

    #[error("image is {width}x{height}, larger than the {max}px limit")]
    ImageTooLarge { width: u32, height: u32, max: u32 },

    #[error("image contains no drawing")]
    EmptyImage,
}

#[derive(Debug, Clone)]
pub struct PreprocessOptions {
    pub max_image_dimension: u32,
    pub reject_blank: bool,
}

impl Default for PreprocessOptions {
    fn default() -> Self {
        Self {
            max_image_dimension: 2048,
            reject_blank: true,
        }
    }
}

/// A 28x28 single-channel image scaled to `[0.0, 1.0]`, row-major.
///
/// White strokes on a black background, the layout of MNIST.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInput {
    pixels: Vec<f32>,
}

impl ModelInput {
    /// All-black input.
    pub fn zeros() -> Self {
        Self {
            pixels: vec![0.0; INPUT_LEN],
        }
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.pixels
    }

    /// Number of pixels with any ink.
    pub fn lit_pixels(&self) -> usize {
        self.pixels.iter().filter(|&&p| p > 0.0).count()
    }

    pub(crate) fn from_pixels(pixels: Vec<f32>) -> Self {
        debug_assert_eq!(pixels.len(), INPUT_LEN);
        Self { pixels }
    }
}

/// Run the whole chain on the `image` field of a predict request.
pub fn preprocess(payload: &str, options: &PreprocessOptions) -> Result<ModelInput, PreprocessError> {
    let bytes = decode_data_url(payload)?;
    let gray = decode_image(&bytes, options.max_image_dimension)?;
    let binarized = binarize(&gray);

    tracing::debug!(
        width = gray.width(),
        height = gray.height(),
        threshold = binarized.threshold,
        inverted = binarized.inverted,
        foreground = binarized.foreground_pixels(),
        "Binarized drawing"
    );

    if options.reject_blank && binarized.foreground_pixels() == 0 {
        return Err(PreprocessError::EmptyImage);
    }

    let resized: GrayImage = resize(&binarized.image);
    Ok(normalize(&resized))
}
