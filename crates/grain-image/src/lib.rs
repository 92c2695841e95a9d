//! Rasterizing scalar fields through colormaps and writing them to disk.
//!
//! # Example
//!
//! ```ignore
//! use rhizome_grain_image::{ExportOptions, export_png, unique_path};
//!
//! let path = unique_path("out", "texture", "png")?;
//! export_png(&field, &colormap, &path, &ExportOptions::default())?;
//! ```

use std::path::{Path, PathBuf};

use image::RgbaImage;
use thiserror::Error;

use rhizome_grain_color::{Colormap, Rgb};
use rhizome_grain_field::ScalarField;

/// Errors that can occur when writing textures.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Encoding or writing the image failed.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// Filesystem error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// File extension is empty.
    #[error("file extension must not be empty")]
    EmptyExtension,

    /// Field is larger than an image can hold.
    #[error("field of {height}x{width} exceeds image size limits")]
    TooLarge {
        /// Number of rows.
        height: usize,
        /// Number of columns.
        width: usize,
    },
}

/// How field values are turned into colormap queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    /// Stretch the field to its own min/max before lookup.
    pub autoscale: bool,
    /// Interpolate between colormap entries instead of picking the nearest.
    pub interpolate: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            autoscale: true,
            interpolate: false,
        }
    }
}

impl ExportOptions {
    /// Sets whether values are stretched to the field's range.
    pub fn with_autoscale(mut self, autoscale: bool) -> Self {
        self.autoscale = autoscale;
        self
    }

    /// Sets whether colormap lookups interpolate.
    pub fn with_interpolation(mut self, interpolate: bool) -> Self {
        self.interpolate = interpolate;
        self
    }
}

/// Maps every sample through `colormap` into an opaque RGBA image.
///
/// With autoscaling a constant field maps to the colormap's first entry.
pub fn colorize(
    field: &ScalarField,
    colormap: &Colormap,
    options: &ExportOptions,
) -> Result<RgbaImage, ExportError> {
    let too_large = || ExportError::TooLarge {
        height: field.height(),
        width: field.width(),
    };
    let width = u32::try_from(field.width()).map_err(|_| too_large())?;
    let height = u32::try_from(field.height()).map_err(|_| too_large())?;

    let (min, max) = field.min_max();
    let range = max - min;
    let to_unit = |v: f32| -> f32 {
        if !options.autoscale {
            v
        } else if range > 0.0 {
            (v - min) / range
        } else {
            0.0
        }
    };
    let lookup = |t: f32| -> Rgb {
        if options.interpolate {
            colormap.sample(t)
        } else {
            colormap.sample_nearest(t)
        }
    };

    let mut img_buf = RgbaImage::new(width, height);
    for (pixel, &v) in img_buf.pixels_mut().zip(field.values()) {
        let [r, g, b] = lookup(to_unit(v)).to_rgb8();
        *pixel = image::Rgba([r, g, b, 255]);
    }

    Ok(img_buf)
}

/// Colorizes `field` and writes it as a PNG to `path`.
pub fn export_png<P: AsRef<Path>>(
    field: &ScalarField,
    colormap: &Colormap,
    path: P,
    options: &ExportOptions,
) -> Result<(), ExportError> {
    let img_buf = colorize(field, colormap, options)?;
    img_buf.save_with_format(path, image::ImageFormat::Png)?;
    Ok(())
}

/// Returns the first `<dir>/<base>_<n>.<ext>` (n = 1, 2, ...) that does not exist.
pub fn unique_path<P: AsRef<Path>>(dir: P, base: &str, ext: &str) -> Result<PathBuf, ExportError> {
    let ext = ext.trim_start_matches('.');
    if ext.is_empty() {
        return Err(ExportError::EmptyExtension);
    }

    let dir = dir.as_ref();
    let mut n = 1u64;
    loop {
        let candidate = dir.join(format!("{base}_{n}.{ext}"));
        if !candidate.try_exists()? {
            return Ok(candidate);
        }
        n += 1;
    }
}
