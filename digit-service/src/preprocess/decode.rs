use super::PreprocessError;
use base64::{engine::general_purpose::STANDARD, Engine};
use image::{DynamicImage, GrayImage, ImageError, ImageReader, Limits, Luma};
use std::io::Cursor;

/// Extract and decode the base64 body of a data URL.
///
/// `data:image/png;base64,<payload>` and bare base64 are both accepted.
pub fn decode_data_url(payload: &str) -> Result<Vec<u8>, PreprocessError> {
    let payload = payload.trim();
    if payload.is_empty() {
        return Err(PreprocessError::MissingPayload);
    }

    let encoded = if payload.starts_with("data:") {
        let (header, body) = payload.split_once(',').ok_or_else(|| {
            PreprocessError::MalformedDataUrl("missing ',' after the media type".to_string())
        })?;
        if !header.ends_with(";base64") {
            return Err(PreprocessError::MalformedDataUrl(format!(
                "expected a base64 data URL, got '{header}'"
            )));
        }
        body
    } else {
        payload
    };

    // Line-wrapped base64 is common when the payload is pasted by hand.
    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    if compact.is_empty() {
        return Err(PreprocessError::MissingPayload);
    }

    Ok(STANDARD.decode(compact)?)
}

/// Decode image bytes of any supported format into 8-bit grayscale.
pub fn decode_image(bytes: &[u8], max_dimension: u32) -> Result<GrayImage, PreprocessError> {
    let mut reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| PreprocessError::UnsupportedImage(e.to_string()))?;

    if reader.format().is_none() {
        return Err(PreprocessError::UnsupportedImage(
            "unrecognised image format".to_string(),
        ));
    }

    let mut limits = Limits::default();
    limits.max_image_width = Some(max_dimension);
    limits.max_image_height = Some(max_dimension);
    reader.limits(limits);

    let image = reader.decode().map_err(|e| match e {
        ImageError::Limits(_) => too_large(bytes, max_dimension),
        other => PreprocessError::UnsupportedImage(other.to_string()),
    })?;

    Ok(to_luma(&image))
}

/// Report the real dimensions when the decoder refused the image on size.
fn too_large(bytes: &[u8], max: u32) -> PreprocessError {
    let (width, height) = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()
        .and_then(|r| r.into_dimensions().ok())
        .unwrap_or((0, 0));
    PreprocessError::ImageTooLarge { width, height, max }
}

/// ITU-R 601-2 luma, `L = R*299/1000 + G*587/1000 + B*114/1000`, alpha ignored.
fn to_luma(image: &DynamicImage) -> GrayImage {
    let rgb = image.to_rgb8();
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        let l = (u32::from(r) * 19595 + u32::from(g) * 38470 + u32::from(b) * 7471 + 0x8000) >> 16;
        Luma([l as u8])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocess::fixtures::{drawn_one, png_bytes};
    use image::{Rgba, RgbaImage};

    #[test]
    fn strips_data_url_header() {
        let bytes = decode_data_url("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(bytes, b"hello");
    }

    #[test]
    fn accepts_bare_base64() {
        assert_eq!(decode_data_url("aGVs\nbG8=").unwrap(), b"hello");
    }

    #[test]
    fn data_url_without_comma_is_malformed() {
        let err = decode_data_url("data:image/png;base64").unwrap_err();
        assert!(matches!(err, PreprocessError::MalformedDataUrl(_)));
    }

    #[test]
    fn non_base64_data_url_is_malformed() {
        let err = decode_data_url("data:text/plain,hello").unwrap_err();
        assert!(matches!(err, PreprocessError::MalformedDataUrl(_)));
    }

    #[test]
    fn empty_payloads_are_missing() {
        assert!(matches!(
            decode_data_url("   ").unwrap_err(),
            PreprocessError::MissingPayload
        ));
        assert!(matches!(
            decode_data_url("data:image/png;base64,").unwrap_err(),
            PreprocessError::MissingPayload
        ));
    }

    #[test]
    fn decodes_png_to_grayscale() {
        let gray = decode_image(&png_bytes(drawn_one(100)), 2048).unwrap();
        assert_eq!(gray.dimensions(), (100, 100));
        assert_eq!(gray.get_pixel(0, 0).0, [255]);
        assert_eq!(gray.get_pixel(50, 50).0, [0]);
    }

    #[test]
    fn luma_uses_601_weights() {
        let red = RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 255]));
        let gray = decode_image(&png_bytes(red), 2048).unwrap();
        // 255 * 0.299 = 76.2
        assert_eq!(gray.get_pixel(0, 0).0, [76]);
    }

    #[test]
    fn oversized_image_is_refused() {
        let err = decode_image(&png_bytes(drawn_one(120)), 64).unwrap_err();
        match err {
            PreprocessError::ImageTooLarge { width, height, max } => {
                assert_eq!((width, height, max), (120, 120, 64));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn random_bytes_are_unsupported() {
        let err = decode_image(b"definitely not an image", 2048).unwrap_err();
        assert!(matches!(err, PreprocessError::UnsupportedImage(_)));
    }
}
