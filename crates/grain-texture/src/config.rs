//! Tunable parameters and random source configuration.

use std::ops::RangeInclusive;
use std::path::Path;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use rhizome_grain_color::{DEFAULT_SAMPLES, MAX_RANDOM_COLORS};
use rhizome_grain_field::{BlurParameter, Shape};
use rhizome_grain_noise::PerlinField;

use crate::TextureError;

/// Parameters of a texture run.
///
/// Every field has a default, so a JSON file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureConfig {
    /// Output field dimensions used by [`TexturePipeline::generate`].
    ///
    /// [`TexturePipeline::generate`]: crate::TexturePipeline::generate
    pub shape: Shape,
    /// Perlin coordinate divisor.
    pub perlin_scale: f32,
    /// Fewest Voronoi seed points.
    pub min_points: usize,
    /// Most Voronoi seed points.
    pub max_points: usize,
    /// Fewest gradient colors.
    pub min_colors: usize,
    /// Most gradient colors.
    pub max_colors: usize,
    /// Colormap lookup table size.
    pub colormap_samples: usize,
    /// Lower bound of the blur sigma, as a fraction of the smaller dimension.
    /// Both bounds lie in `[0, 1]`.
    pub blur_fraction_min: f32,
    /// Upper bound of the blur sigma, as a fraction of the smaller dimension.
    pub blur_fraction_max: f32,
    /// Stage sub-seeds are drawn from `0..=sub_seed_max`.
    pub sub_seed_max: u64,
}

impl Default for TextureConfig {
    fn default() -> Self {
        Self {
            shape: Shape::default(),
            perlin_scale: PerlinField::DEFAULT_SCALE,
            min_points: 5,
            max_points: 50,
            min_colors: 1,
            max_colors: MAX_RANDOM_COLORS,
            colormap_samples: DEFAULT_SAMPLES,
            blur_fraction_min: *BlurParameter::DEFAULT_FRACTION.start(),
            blur_fraction_max: *BlurParameter::DEFAULT_FRACTION.end(),
            sub_seed_max: 100,
        }
    }
}

impl TextureConfig {
    /// Parses a JSON config and validates it.
    pub fn from_json_str(json: &str) -> Result<Self, TextureError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a JSON config file and validates it.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TextureError> {
        Self::from_json_str(&std::fs::read_to_string(path)?)
    }

    /// Sets the output dimensions.
    pub fn with_shape(mut self, shape: Shape) -> Self {
        self.shape = shape;
        self
    }

    /// Checks every size, count and range.
    pub fn validate(&self) -> Result<(), TextureError> {
        validate_shape(self.shape)?;
        if !self.perlin_scale.is_finite() || self.perlin_scale <= 0.0 {
            return Err(TextureError::out_of_range(
                "perlin_scale",
                format!("must be finite and > 0, got {}", self.perlin_scale),
            ));
        }
        check_count_range("points", self.min_points, self.max_points)?;
        check_count_range("colors", self.min_colors, self.max_colors)?;
        if self.colormap_samples == 0 {
            return Err(TextureError::out_of_range(
                "colormap_samples",
                "must be at least 1",
            ));
        }
        let (lo, hi) = (self.blur_fraction_min, self.blur_fraction_max);
        if !lo.is_finite() || !hi.is_finite() || lo < 0.0 || lo > hi || hi > 1.0 {
            return Err(TextureError::out_of_range(
                "blur_fraction",
                format!("need 0 <= min <= max <= 1, got {lo}..={hi}"),
            ));
        }
        Ok(())
    }

    pub(crate) fn point_range(&self) -> RangeInclusive<usize> {
        self.min_points..=self.max_points
    }

    pub(crate) fn color_range(&self) -> RangeInclusive<usize> {
        self.min_colors..=self.max_colors
    }

    pub(crate) fn blur_range(&self) -> RangeInclusive<f32> {
        self.blur_fraction_min..=self.blur_fraction_max
    }
}

/// Rejects empty shapes and shapes too large to hold as a field.
pub(crate) fn validate_shape(shape: Shape) -> Result<Shape, TextureError> {
    shape
        .validate()
        .map_err(|err| TextureError::out_of_range("shape", err.to_string()))
}

fn check_count_range(name: &'static str, min: usize, max: usize) -> Result<(), TextureError> {
    if min == 0 || min > max {
        return Err(TextureError::out_of_range(
            name,
            format!("need 1 <= min <= max, got {min}..={max}"),
        ));
    }
    Ok(())
}

/// Where a run's randomness comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RngConfig {
    /// Master seed; `None` seeds from the operating system.
    pub seed: Option<u64>,
}

impl RngConfig {
    /// A reproducible source.
    pub fn seeded(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }

    /// A fresh, unreproducible source.
    pub fn unseeded() -> Self {
        Self { seed: None }
    }

    /// Builds the master generator for one run.
    pub fn to_rng(self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}
