//! Turns raw upload bytes into the fixed-shape input tensor the classifier
//! expects: RGB, 256x256, values in `[0, 1]`, with a leading batch dimension.

use image::{
    error::{ParameterError, ParameterErrorKind},
    imageops::{self, FilterType},
    ImageError,
};

use crate::error::ClassifyError;

pub const IMAGE_SIZE: u32 = 256;
pub const CHANNELS: u64 = 3;

/// NHWC shape of a single-image batch.
pub const INPUT_SHAPE: [u64; 4] = [1, IMAGE_SIZE as u64, IMAGE_SIZE as u64, CHANNELS];

#[derive(Debug, Clone, PartialEq)]
pub struct PreprocessedImage {
    pixels: Vec<f32>,
}

impl PreprocessedImage {
    pub fn shape(&self) -> [u64; 4] {
        INPUT_SHAPE
    }

    /// Row-major pixel data, `R, G, B` interleaved.
    pub fn pixels(&self) -> &[f32] {
        &self.pixels
    }
}

pub fn preprocess(bytes: &[u8]) -> Result<PreprocessedImage, ClassifyError> {
    let rgb = image::load_from_memory(bytes)?.to_rgb8();
    if rgb.width() == 0 || rgb.height() == 0 {
        return Err(ImageError::Parameter(ParameterError::from_kind(
            ParameterErrorKind::DimensionMismatch,
        ))
        .into());
    }

    // Stretch to the square input; aspect ratio is not preserved.
    let resized = imageops::resize(&rgb, IMAGE_SIZE, IMAGE_SIZE, FilterType::CatmullRom);
    let pixels = resized
        .into_raw()
        .into_iter()
        .map(|c| f32::from(c) / 255.0)
        .collect();

    Ok(PreprocessedImage { pixels })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{encode, solid_rgb};
    use image::{DynamicImage, GrayImage, ImageOutputFormat, Luma, Rgba, RgbaImage};

    const INPUT_LEN: usize = (IMAGE_SIZE * IMAGE_SIZE) as usize * CHANNELS as usize;

    #[test]
    fn png_becomes_batched_unit_range_tensor() {
        let bytes = encode(&solid_rgb(100, 100, [255, 0, 51]), ImageOutputFormat::Png);
        let tensor = preprocess(&bytes).unwrap();

        assert_eq!(tensor.shape(), [1, 256, 256, 3]);
        assert_eq!(tensor.pixels().len(), INPUT_LEN);
        assert!(tensor.pixels().iter().all(|v| (0.0..=1.0).contains(v)));
        assert_eq!(&tensor.pixels()[..3], &[1.0, 0.0, 0.2]);
    }

    #[test]
    fn non_square_input_is_stretched_to_square() {
        let bytes = encode(&solid_rgb(640, 90, [10, 20, 30]), ImageOutputFormat::Png);
        assert_eq!(preprocess(&bytes).unwrap().pixels().len(), INPUT_LEN);
    }

    #[test]
    fn grayscale_is_expanded_to_three_channels() {
        let gray = DynamicImage::ImageLuma8(GrayImage::from_pixel(32, 32, Luma([255])));
        let bytes = encode(&gray, ImageOutputFormat::Png);
        let tensor = preprocess(&bytes).unwrap();

        assert_eq!(tensor.pixels().len(), INPUT_LEN);
        assert!(tensor.pixels().iter().all(|&v| v == 1.0));
    }

    #[test]
    fn alpha_channel_is_dropped() {
        let rgba = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([0, 255, 0, 0])));
        let tensor = preprocess(&encode(&rgba, ImageOutputFormat::Png)).unwrap();

        assert_eq!(tensor.pixels().len(), INPUT_LEN);
        assert_eq!(&tensor.pixels()[..3], &[0.0, 1.0, 0.0]);
    }

    #[test]
    fn jpeg_is_accepted() {
        let bytes = encode(&solid_rgb(50, 70, [128, 128, 128]), ImageOutputFormat::Jpeg(90));
        assert_eq!(preprocess(&bytes).unwrap().pixels().len(), INPUT_LEN);
    }

    #[test]
    fn same_bytes_give_same_tensor() {
        let bytes = encode(&solid_rgb(31, 17, [1, 2, 3]), ImageOutputFormat::Png);
        assert_eq!(preprocess(&bytes).unwrap(), preprocess(&bytes).unwrap());
    }

    #[test]
    fn non_image_bytes_fail_to_decode() {
        let err = preprocess(b"definitely not an image").unwrap_err();
        assert!(matches!(err, ClassifyError::Decode(_)));
        assert!(!err.to_string().is_empty());
    }

    #[test]
    fn truncated_png_fails_to_decode() {
        let bytes = encode(&solid_rgb(100, 100, [9, 9, 9]), ImageOutputFormat::Png);
        assert!(preprocess(&bytes[..bytes.len() / 2]).is_err());
    }

    #[test]
    fn empty_upload_fails_to_decode() {
        assert!(preprocess(&[]).is_err());
    }
}
