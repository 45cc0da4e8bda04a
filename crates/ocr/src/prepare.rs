use std::io::Cursor;

use image::{imageops, DynamicImage, Rgb, RgbImage};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PrepareError {
    #[error("failed to decode uploaded image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("failed to encode prepared image: {0}")]
    Encode(String),
}

/// 3×3 sharpen convolution, kernel −2 everywhere with a 32 center,
/// pre-divided by 16.
const SHARPEN_KERNEL: [f32; 9] = [
    -0.125, -0.125, -0.125,
    -0.125, 2.0, -0.125,
    -0.125, -0.125, -0.125,
];

const CONTRAST_FACTOR: f32 = 2.0;

/// The enhanced upload, kept in both pixel and wire form: the RGB buffer is
/// what the page displays, the JPEG bytes are what goes to text detection.
#[derive(Debug)]
pub struct Prepared {
    pub image: RgbImage,
    pub jpeg: Vec<u8>,
}

/// Decode the uploaded bytes and run the fixed enhancement chain:
/// force 3-channel RGB → sharpen → contrast ×2 → JPEG re-encode.
/// Deterministic: the same input bytes always produce the same JPEG bytes.
pub fn prepare_from_bytes(data: &[u8]) -> Result<Prepared, PrepareError> {
    let rgb = image::load_from_memory(data)?.to_rgb8();
    let sharpened = imageops::filter3x3(&rgb, &SHARPEN_KERNEL);
    let enhanced = enhance_contrast(&sharpened, CONTRAST_FACTOR);
    let jpeg = encode_jpeg(&enhanced)?;
    Ok(Prepared {
        image: enhanced,
        jpeg,
    })
}

/// Contrast enhancement around the mean luminance:
/// `out = mean + (in − mean) × factor`, clamped per channel.
fn enhance_contrast(img: &RgbImage, factor: f32) -> RgbImage {
    let (w, h) = img.dimensions();
    let pixel_count = w as u64 * h as u64;
    if pixel_count == 0 {
        return img.clone();
    }

    // Mean of the ITU-R 601-2 luma over the whole image.
    let sum: f64 = img
        .pixels()
        .map(|p| (299.0 * f64::from(p[0]) + 587.0 * f64::from(p[1]) + 114.0 * f64::from(p[2])) / 1000.0)
        .sum();
    let mean = (sum / pixel_count as f64 + 0.5).floor() as f32;

    let stretch = |c: u8| -> u8 {
        (mean + (f32::from(c) - mean) * factor)
            .round()
            .clamp(0.0, 255.0) as u8
    };

    RgbImage::from_fn(w, h, |x, y| {
        let p = img.get_pixel(x, y);
        Rgb([stretch(p[0]), stretch(p[1]), stretch(p[2])])
    })
}

fn encode_jpeg(img: &RgbImage) -> Result<Vec<u8>, PrepareError> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img.clone())
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Jpeg)
        .map_err(|e| PrepareError::Encode(e.to_string()))?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::ImageBuffer;

    fn png_bytes(img: RgbImage) -> Vec<u8> {
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    fn checker(width: u32, height: u32) -> RgbImage {
        ImageBuffer::from_fn(width, height, |x, y| {
            if (x + y) % 2 == 0 {
                Rgb([200u8, 200, 200])
            } else {
                Rgb([60u8, 60, 60])
            }
        })
    }

    #[test]
    fn preparation_is_deterministic() {
        let data = png_bytes(checker(16, 16));
        let a = prepare_from_bytes(&data).unwrap();
        let b = prepare_from_bytes(&data).unwrap();
        assert_eq!(a.jpeg, b.jpeg);
    }

    #[test]
    fn output_is_wellformed_jpeg() {
        let data = png_bytes(checker(16, 16));
        let prepared = prepare_from_bytes(&data).unwrap();
        // JPEG SOI marker.
        assert_eq!(&prepared.jpeg[..2], &[0xFF, 0xD8]);
        // Lossy, but must decode again.
        let reloaded = image::load_from_memory(&prepared.jpeg).unwrap();
        assert_eq!(reloaded.width(), 16);
        assert_eq!(reloaded.height(), 16);
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let err = prepare_from_bytes(b"definitely not an image").unwrap_err();
        assert!(matches!(err, PrepareError::Decode(_)));
    }

    #[test]
    fn contrast_widens_spread_around_the_mean() {
        let img: RgbImage = ImageBuffer::from_fn(2, 1, |x, _| {
            if x == 0 {
                Rgb([100u8, 100, 100])
            } else {
                Rgb([150u8, 150, 150])
            }
        });
        let out = enhance_contrast(&img, 2.0);
        let lo = out.get_pixel(0, 0)[0];
        let hi = out.get_pixel(1, 0)[0];
        assert!(hi - lo > 50, "spread was {}", hi - lo);
    }

    #[test]
    fn contrast_clamps_at_channel_bounds() {
        let img: RgbImage = ImageBuffer::from_fn(2, 1, |x, _| {
            if x == 0 {
                Rgb([10u8, 10, 10])
            } else {
                Rgb([245u8, 245, 245])
            }
        });
        let out = enhance_contrast(&img, 2.0);
        assert_eq!(out.get_pixel(0, 0)[0], 0);
        assert_eq!(out.get_pixel(1, 0)[0], 255);
    }

    #[test]
    fn empty_image_is_returned_untouched() {
        let img: RgbImage = ImageBuffer::new(0, 0);
        let out = enhance_contrast(&img, 2.0);
        assert_eq!(out.dimensions(), (0, 0));
    }
}
