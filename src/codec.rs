use std::io::Cursor;
use std::path::Path;

use image::imageops::FilterType;
use image::{ColorType, DynamicImage, ImageBuffer, ImageFormat};

use crate::buffer::PixelBuffer;
use crate::error::{EngineError, Result};

/// Scales within this distance of 1.0 are written without resampling.
const SCALE_EPSILON: f64 = 0.001;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Png,
    Jpeg,
    Tiff,
    Bmp,
}

impl ExportFormat {
    pub fn label(&self) -> &'static str {
        match self {
            ExportFormat::Png => "PNG",
            ExportFormat::Jpeg => "JPEG",
            ExportFormat::Tiff => "TIFF",
            ExportFormat::Bmp => "BMP",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpg",
            ExportFormat::Tiff => "tiff",
            ExportFormat::Bmp => "bmp",
        }
    }

    pub fn image_format(&self) -> ImageFormat {
        match self {
            ExportFormat::Png => ImageFormat::Png,
            ExportFormat::Jpeg => ImageFormat::Jpeg,
            ExportFormat::Tiff => ImageFormat::Tiff,
            ExportFormat::Bmp => ImageFormat::Bmp,
        }
    }

    /// Pick a format from the file extension, case-insensitively.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "png" => Some(ExportFormat::Png),
            "jpg" | "jpeg" => Some(ExportFormat::Jpeg),
            "tif" | "tiff" => Some(ExportFormat::Tiff),
            "bmp" => Some(ExportFormat::Bmp),
            _ => None,
        }
    }
}

/// Decode an encoded image (any format the `image` crate can guess).
pub fn decode(bytes: &[u8]) -> Result<PixelBuffer> {
    let img = image::load_from_memory(bytes)?;
    from_dynamic(img)
}

/// Convert to an 8-bit buffer, keeping gray/color and alpha as they are.
pub fn from_dynamic(img: DynamicImage) -> Result<PixelBuffer> {
    let (width, height) = (img.width() as usize, img.height() as usize);
    let (channels, data) = match img.color() {
        ColorType::L8 | ColorType::L16 => (1, img.into_luma8().into_raw()),
        ColorType::La8 | ColorType::La16 => (2, img.into_luma_alpha8().into_raw()),
        color if color.has_alpha() => (4, img.into_rgba8().into_raw()),
        _ => (3, img.into_rgb8().into_raw()),
    };
    PixelBuffer::from_raw(width, height, channels, data)
}

pub fn to_dynamic(buffer: &PixelBuffer) -> Result<DynamicImage> {
    let (w, h) = (buffer.width() as u32, buffer.height() as u32);
    let data = buffer.as_raw().to_vec();
    let img = match buffer.channels() {
        1 => ImageBuffer::from_raw(w, h, data).map(DynamicImage::ImageLuma8),
        2 => ImageBuffer::from_raw(w, h, data).map(DynamicImage::ImageLumaA8),
        3 => ImageBuffer::from_raw(w, h, data).map(DynamicImage::ImageRgb8),
        4 => ImageBuffer::from_raw(w, h, data).map(DynamicImage::ImageRgba8),
        _ => None,
    };
    img.ok_or_else(|| {
        EngineError::config(format!(
            "cannot build an image from a {}x{}x{} buffer",
            buffer.width(),
            buffer.height(),
            buffer.channels()
        ))
    })
}

/// Encode into memory.
pub fn encode(buffer: &PixelBuffer, format: ExportFormat) -> Result<Vec<u8>> {
    let img = prepare_for(to_dynamic(buffer)?, format);
    let mut cursor = Cursor::new(Vec::new());
    img.write_to(&mut cursor, format.image_format())?;
    Ok(cursor.into_inner())
}

/// Write `buffer` to `path`, format chosen by extension, resampled by `scale`.
pub fn save(buffer: &PixelBuffer, path: &Path, scale: f64) -> Result<()> {
    if !(scale > 0.0) || !scale.is_finite() {
        return Err(EngineError::config(format!(
            "save scale must be positive, got {scale}"
        )));
    }
    let format = ExportFormat::from_path(path).ok_or_else(|| {
        EngineError::config(format!("unsupported output extension: {}", path.display()))
    })?;

    let mut img = to_dynamic(buffer)?;
    if (scale - 1.0).abs() >= SCALE_EPSILON {
        let w = ((img.width() as f64 * scale).round() as u32).max(1);
        let h = ((img.height() as f64 * scale).round() as u32).max(1);
        log::debug!(
            "resampling {}x{} -> {w}x{h} before save",
            img.width(),
            img.height()
        );
        img = img.resize_exact(w, h, FilterType::Triangle);
    }
    prepare_for(img, format).save_with_format(path, format.image_format())?;
    log::info!("saved {} to {}", format.label(), path.display());
    Ok(())
}

/// JPEG and BMP encoders reject alpha; flatten it away for them.
fn prepare_for(img: DynamicImage, format: ExportFormat) -> DynamicImage {
    let drops_alpha = matches!(format, ExportFormat::Jpeg | ExportFormat::Bmp);
    if !drops_alpha || !img.color().has_alpha() {
        return img;
    }
    match img.color() {
        ColorType::La8 => DynamicImage::ImageLuma8(img.into_luma8()),
        _ => DynamicImage::ImageRgb8(img.into_rgb8()),
    }
}
