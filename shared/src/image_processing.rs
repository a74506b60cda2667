use crate::error::TransformError;
use crate::params::TransformSpec;
use base64::{engine::general_purpose::STANDARD, Engine};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilterType, PngEncoder};
use image::imageops::FilterType;
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use std::io::Cursor;

/// Re-encoded thumbnail ready to be placed in a response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformResult {
    /// Standard base64 of the encoded image
    pub encoded_payload: String,
    /// Length of the encoded image before base64
    pub byte_size: usize,
}

/// Decode, orient, shrink and re-encode an image in its own format.
///
/// Takes the fetched bytes by value and drops them once the pixels are decoded;
/// the decoded image is consumed by the encoder.
pub fn transform_image(bytes: Vec<u8>, spec: &TransformSpec) -> Result<TransformResult, TransformError> {
    let (max_width, max_height) = bounding_box(spec)?;

    let (image, format) = decode_oriented(&bytes)?;
    drop(bytes);

    let (width, height) = fit_within(image.width(), image.height(), max_width, max_height);
    let image = if (width, height) == (image.width(), image.height()) {
        image
    } else {
        tracing::debug!(
            "Resizing {}x{} to {}x{}",
            image.width(),
            image.height(),
            width,
            height
        );
        image.resize_exact(width, height, FilterType::Lanczos3)
    };

    let encoded = encode(image, format, jpeg_quality(spec.quality))?;
    let byte_size = encoded.len();

    Ok(TransformResult {
        encoded_payload: STANDARD.encode(&encoded),
        byte_size,
    })
}

/// Decode with the sniffed format and bake the EXIF orientation into the pixels.
fn decode_oriented(bytes: &[u8]) -> Result<(DynamicImage, ImageFormat), TransformError> {
    let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    let format = reader.format().ok_or(TransformError::UnknownFormat)?;

    let mut decoder = reader.into_decoder().map_err(TransformError::Decode)?;
    let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);

    let mut image = DynamicImage::from_decoder(decoder).map_err(TransformError::Decode)?;
    image.apply_orientation(orientation);

    Ok((image, format))
}

/// Largest size that keeps the aspect ratio and fits inside `max_width`x`max_height`.
/// Never enlarges.
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width <= max_width && height <= max_height {
        return (width, height);
    }

    let ratio = f64::min(
        max_width as f64 / width as f64,
        max_height as f64 / height as f64,
    );
    let scaled = |side: u32, max: u32| ((side as f64 * ratio).round() as u32).clamp(1, max);

    (scaled(width, max_width), scaled(height, max_height))
}

fn bounding_box(spec: &TransformSpec) -> Result<(u32, u32), TransformError> {
    if spec.width <= 0 || spec.height <= 0 {
        return Err(TransformError::InvalidBounds {
            width: spec.width,
            height: spec.height,
        });
    }
    let saturate = |side: i64| u32::try_from(side).unwrap_or(u32::MAX);
    Ok((saturate(spec.width), saturate(spec.height)))
}

fn jpeg_quality(quality: i64) -> u8 {
    quality.clamp(1, 100) as u8
}

/// Encode without metadata, so the orientation tag is gone from the output.
fn encode(image: DynamicImage, format: ImageFormat, quality: u8) -> Result<Vec<u8>, TransformError> {
    let mut buf = Vec::new();

    match format {
        ImageFormat::Jpeg => {
            let image = match image {
                DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => image,
                other => DynamicImage::ImageRgb8(other.to_rgb8()),
            };
            let encoder = JpegEncoder::new_with_quality(&mut buf, quality);
            image.write_with_encoder(encoder).map_err(TransformError::Encode)?;
        }
        ImageFormat::Png => {
            // quality has no meaning for PNG; spend the effort on compression instead
            let encoder =
                PngEncoder::new_with_quality(&mut buf, CompressionType::Best, PngFilterType::Adaptive);
            image.write_with_encoder(encoder).map_err(TransformError::Encode)?;
        }
        other => {
            image
                .write_to(&mut Cursor::new(&mut buf), other)
                .map_err(TransformError::Encode)?;
        }
    }

    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn gradient(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
        }))
    }

    fn encoded(image: &DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut buf = Vec::new();
        image.write_to(&mut Cursor::new(&mut buf), format).unwrap();
        buf
    }

    fn decode_result(result: &TransformResult) -> (Vec<u8>, DynamicImage) {
        let bytes = STANDARD.decode(&result.encoded_payload).unwrap();
        let image = image::load_from_memory(&bytes).unwrap();
        (bytes, image)
    }

    /// Splice an EXIF APP1 segment carrying only an orientation tag after the SOI marker.
    fn with_exif_orientation(jpeg: &[u8], orientation: u8) -> Vec<u8> {
        let mut app1 = vec![0xFF, 0xE1, 0x00, 0x22];
        app1.extend_from_slice(b"Exif\0\0");
        app1.extend_from_slice(&[b'M', b'M', 0x00, 0x2A, 0x00, 0x00, 0x00, 0x08]);
        app1.extend_from_slice(&[0x00, 0x01]);
        app1.extend_from_slice(&[0x01, 0x12, 0x00, 0x03, 0x00, 0x00, 0x00, 0x01]);
        app1.extend_from_slice(&[0x00, orientation, 0x00, 0x00]);
        app1.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);

        let mut out = jpeg[..2].to_vec();
        out.extend_from_slice(&app1);
        out.extend_from_slice(&jpeg[2..]);
        out
    }

    #[test]
    fn test_fit_within() {
        // Landscape bound by width
        assert_eq!(fit_within(3000, 2000, 200, 200), (200, 133));
        // Portrait bound by height
        assert_eq!(fit_within(2000, 3000, 200, 200), (133, 200));
        // Already fits, never upscaled
        assert_eq!(fit_within(100, 50, 1080, 1080), (100, 50));
        // Only one side over the bound
        assert_eq!(fit_within(1200, 300, 1080, 1080), (1080, 270));
        // Extreme ratio keeps at least one pixel
        assert_eq!(fit_within(10_000, 1, 100, 100), (100, 1));
    }

    #[test]
    fn test_fit_within_preserves_aspect_ratio() {
        for (w, h, bw, bh) in [(3000, 2000, 200, 200), (1024, 768, 300, 500), (640, 1280, 1000, 90)] {
            let (tw, th) = fit_within(w, h, bw, bh);
            assert!(tw <= bw && th <= bh);
            let original = w as f64 / h as f64;
            let thumb = tw as f64 / th as f64;
            // one pixel of rounding on the short side
            let tolerance = original / (th.min(tw) as f64).max(1.0) + 0.01;
            assert!((original - thumb).abs() <= tolerance, "{w}x{h} -> {tw}x{th}");
        }
    }

    #[test]
    fn test_jpeg_is_resized_and_stays_jpeg() {
        let source = encoded(&gradient(300, 200), ImageFormat::Jpeg);
        let spec = TransformSpec { width: 100, height: 100, quality: 70 };

        let result = transform_image(source, &spec).unwrap();
        let (bytes, image) = decode_result(&result);

        assert_eq!(result.byte_size, bytes.len());
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
        assert_eq!((image.width(), image.height()), (100, 67));
    }

    #[test]
    fn test_png_stays_png() {
        let source = encoded(&gradient(64, 32), ImageFormat::Png);
        let spec = TransformSpec { width: 16, height: 16, quality: 80 };

        let result = transform_image(source, &spec).unwrap();
        let (bytes, image) = decode_result(&result);

        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Png);
        assert_eq!((image.width(), image.height()), (16, 8));
    }

    #[test]
    fn test_small_image_is_not_enlarged() {
        let source = encoded(&gradient(40, 30), ImageFormat::Png);
        let result = transform_image(source, &TransformSpec::default()).unwrap();
        let (_, image) = decode_result(&result);
        assert_eq!((image.width(), image.height()), (40, 30));
    }

    #[test]
    fn test_lower_quality_gives_smaller_jpeg() {
        let source = encoded(&gradient(256, 256), ImageFormat::Jpeg);
        let low = transform_image(source.clone(), &TransformSpec { quality: 10, ..Default::default() }).unwrap();
        let high = transform_image(source, &TransformSpec { quality: 95, ..Default::default() }).unwrap();
        assert!(low.byte_size < high.byte_size);
    }

    #[test]
    fn test_out_of_range_quality_is_clamped() {
        assert_eq!(jpeg_quality(-20), 1);
        assert_eq!(jpeg_quality(0), 1);
        assert_eq!(jpeg_quality(80), 80);
        assert_eq!(jpeg_quality(500), 100);

        let source = encoded(&gradient(32, 32), ImageFormat::Jpeg);
        assert!(transform_image(source, &TransformSpec { quality: 1000, ..Default::default() }).is_ok());
    }

    #[test]
    fn test_exif_orientation_is_applied() {
        // Orientation 6 means the stored pixels need a 90 degree clockwise turn
        let source = with_exif_orientation(&encoded(&gradient(40, 20), ImageFormat::Jpeg), 6);

        let result = transform_image(source, &TransformSpec::default()).unwrap();
        let (_, image) = decode_result(&result);
        assert_eq!((image.width(), image.height()), (20, 40));
    }

    #[test]
    fn test_non_positive_bounds_are_rejected() {
        let source = encoded(&gradient(10, 10), ImageFormat::Png);
        let err = transform_image(source, &TransformSpec { width: 0, height: 100, quality: 80 }).unwrap_err();
        assert!(matches!(err, TransformError::InvalidBounds { width: 0, height: 100 }));
    }

    #[test]
    fn test_huge_bounds_saturate() {
        let spec = TransformSpec { width: i64::MAX, height: 5_000_000_000, quality: 80 };
        assert_eq!(bounding_box(&spec).unwrap(), (u32::MAX, u32::MAX));
    }

    #[test]
    fn test_garbage_bytes_fail() {
        let result = transform_image(b"definitely not an image".to_vec(), &TransformSpec::default());
        assert!(matches!(result, Err(TransformError::UnknownFormat)));

        // Right magic number, truncated body
        let mut truncated = encoded(&gradient(64, 64), ImageFormat::Jpeg);
        truncated.truncate(40);
        assert!(transform_image(truncated, &TransformSpec::default()).is_err());
    }
}
