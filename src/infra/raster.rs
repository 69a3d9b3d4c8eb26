//! PNG encoding with a physical-resolution (`pHYs`) chunk.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::RgbaImage;
use thiserror::Error;

const METERS_PER_INCH: f64 = 0.0254;

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("failed to create `{}`: {source}", path.display())]
    Create {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("png encoding failed: {0}")]
    Png(#[from] png::EncodingError),
}

/// Pixels per meter for a dots-per-inch value, as stored in `pHYs`.
pub fn dpi_to_ppm(dpi: u32) -> u32 {
    (f64::from(dpi) / METERS_PER_INCH).round() as u32
}

/// Write `image` as an 8-bit RGBA PNG tagged with `dpi`.
pub fn write_png(image: &RgbaImage, dpi: u32, path: &Path) -> Result<(), EncodeError> {
    let file = File::create(path).map_err(|source| EncodeError::Create {
        path: path.to_path_buf(),
        source,
    })?;

    let mut encoder = png::Encoder::new(BufWriter::new(file), image.width(), image.height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let ppm = dpi_to_ppm(dpi);
    encoder.set_pixel_dims(Some(png::PixelDimensions {
        xppu: ppm,
        yppu: ppm,
        unit: png::Unit::Meter,
    }));

    let mut writer = encoder.write_header()?;
    writer.write_image_data(image.as_raw())?;
    writer.finish()?;
    Ok(())
}
