//! In-process image service backed by the `image` crate.

use super::params::TransformParams;
use super::service::{AssetService, TransformError};
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageOutputFormat};
use std::io::Cursor;

/// Quality used for JPEG output when none is requested.
pub const DEFAULT_JPEG_QUALITY: u8 = 80;

const NAME: &str = "local";

/// Decodes, optionally downsizes, and re-encodes raster images.
///
/// Images are never upscaled. SVG input is returned unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalImageService;

impl LocalImageService {
    pub fn new() -> Self {
        Self
    }
}

impl AssetService for LocalImageService {
    fn name(&self) -> &str {
        NAME
    }

    fn transform(&self, asset: &[u8], params: &TransformParams) -> Result<Vec<u8>, TransformError> {
        if is_svg(asset) {
            return Ok(asset.to_vec());
        }

        let source_format = image::guess_format(asset)
            .map_err(|e| TransformError::new(NAME, format!("unrecognised image data: {}", e)))?;
        let decoded = image::load_from_memory_with_format(asset, source_format)
            .map_err(|e| TransformError::new(NAME, format!("failed to decode: {}", e)))?;

        let resized = resize(decoded, params.width, params.height);

        encode(&resized, output_format(params, source_format), params.quality)
    }
}

fn is_svg(asset: &[u8]) -> bool {
    let head = &asset[..asset.len().min(256)];
    let text = String::from_utf8_lossy(head);
    let trimmed = text.trim_start();
    trimmed.starts_with("<svg") || (trimmed.starts_with("<?xml") && text.contains("<svg"))
}

fn resize(img: DynamicImage, width: Option<u32>, height: Option<u32>) -> DynamicImage {
    let (w, h) = img.dimensions();
    match (width, height) {
        (Some(tw), Some(th)) if tw < w || th < h => img.resize(tw.min(w), th.min(h), FilterType::Lanczos3),
        (Some(tw), None) if tw < w => {
            let th = ((h as u64 * tw as u64) / w as u64).max(1) as u32;
            img.resize_exact(tw, th, FilterType::Lanczos3)
        }
        (None, Some(th)) if th < h => {
            let tw = ((w as u64 * th as u64) / h as u64).max(1) as u32;
            img.resize_exact(tw, th, FilterType::Lanczos3)
        }
        _ => img,
    }
}

fn encode(
    img: &DynamicImage,
    format: image::ImageFormat,
    quality: Option<u8>,
) -> Result<Vec<u8>, TransformError> {
    let mut out = Cursor::new(Vec::new());
    let result = if format == image::ImageFormat::Jpeg {
        let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
        rgb.write_to(&mut out, ImageOutputFormat::Jpeg(quality.unwrap_or(DEFAULT_JPEG_QUALITY)))
    } else {
        img.write_to(&mut out, ImageOutputFormat::from(format))
    };
    result.map_err(|e| TransformError::new(NAME, format!("failed to encode as {:?}: {}", format, e)))?;
    Ok(out.into_inner())
}

/// Output format for a request, falling back to the source encoding.
pub fn output_format(params: &TransformParams, source: image::ImageFormat) -> image::ImageFormat {
    params.format.map(image::ImageFormat::from).unwrap_or(source)
}
