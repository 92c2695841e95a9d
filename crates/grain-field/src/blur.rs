//! Separable Gaussian smoothing.

use std::ops::RangeInclusive;

use rand::Rng;
use rayon::prelude::*;

use crate::{FieldError, ScalarField, Shape};

/// Kernel half-width in standard deviations.
pub const TRUNCATE: f32 = 4.0;

/// Builds a normalized 1D Gaussian kernel of radius `floor(TRUNCATE * sigma + 0.5)`.
///
/// A zero sigma yields the identity kernel `[1.0]`. A sigma whose kernel
/// length cannot be addressed is rejected like a negative one.
pub fn gaussian_kernel(sigma: f32) -> Result<Vec<f32>, FieldError> {
    if !sigma.is_finite() || sigma < 0.0 {
        return Err(FieldError::InvalidSigma(sigma));
    }
    // Float to int casts saturate, so an oversized radius shows up as overflow below.
    let radius = (TRUNCATE as f64 * sigma as f64 + 0.5) as usize;
    if radius == 0 {
        return Ok(vec![1.0]);
    }
    let taps = radius
        .checked_mul(2)
        .and_then(|n| n.checked_add(1))
        .filter(|&n| n <= isize::MAX as usize / std::mem::size_of::<f64>())
        .ok_or(FieldError::InvalidSigma(sigma))?;

    let denom = 2.0 * sigma as f64 * sigma as f64;
    let mut kernel: Vec<f64> = (0..taps)
        .map(|i| {
            let x = i as f64 - radius as f64;
            (-x * x / denom).exp()
        })
        .collect();
    let sum: f64 = kernel.iter().sum();
    for w in &mut kernel {
        *w /= sum;
    }

    Ok(kernel.into_iter().map(|w| w as f32).collect())
}

/// Reflects an out-of-range index back into `0..n` (`d c b a | a b c d | d c b a`).
#[inline]
fn reflect(i: isize, n: usize) -> usize {
    let period = 2 * n as isize;
    let m = i.rem_euclid(period);
    if m < n as isize {
        m as usize
    } else {
        (period - 1 - m) as usize
    }
}

/// Blurs a field with an isotropic Gaussian of standard deviation `sigma`.
///
/// Runs a horizontal then a vertical pass with reflected borders, so the
/// output has the same shape as the input.
pub fn gaussian_blur(field: &ScalarField, sigma: f32) -> Result<ScalarField, FieldError> {
    let kernel = gaussian_kernel(sigma)?;
    if kernel.len() == 1 {
        return Ok(field.clone());
    }

    let Shape { height, width } = field.shape();
    let radius = kernel.len() / 2;

    // Horizontal pass
    let mut temp = vec![0.0f32; field.shape().len()];
    temp.par_chunks_mut(width)
        .zip(field.values().par_chunks(width))
        .for_each(|(out, src)| {
            let padded: Vec<f32> = (0..width + 2 * radius)
                .map(|i| src[reflect(i as isize - radius as isize, width)])
                .collect();
            for (x, o) in out.iter_mut().enumerate() {
                *o = kernel
                    .iter()
                    .zip(&padded[x..x + kernel.len()])
                    .map(|(w, v)| w * v)
                    .sum();
            }
        });

    // Vertical pass
    let mut values = vec![0.0f32; field.shape().len()];
    values
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, out)| {
            for (k, &w) in kernel.iter().enumerate() {
                let sy = reflect(y as isize + k as isize - radius as isize, height);
                let src = &temp[sy * width..(sy + 1) * width];
                for (o, &v) in out.iter_mut().zip(src) {
                    *o += w * v;
                }
            }
        });

    ScalarField::from_data(values, field.shape())
}

// ============================================================================
// Blur parameter
// ============================================================================

/// A blur radius scaled to the field size.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlurParameter {
    /// Fraction of the smaller field dimension.
    pub fraction: f32,
    /// Resulting standard deviation in pixels.
    pub sigma: f32,
}

impl BlurParameter {
    /// Default range the fraction is drawn from.
    pub const DEFAULT_FRACTION: RangeInclusive<f32> = 0.06..=0.10;

    /// Sigma for an explicit fraction of `shape`'s smaller dimension.
    pub fn from_fraction(shape: Shape, fraction: f32) -> Self {
        Self {
            fraction,
            sigma: fraction * shape.min_dim() as f32,
        }
    }

    /// Draws the fraction uniformly from `fractions`.
    pub fn random<R: Rng>(shape: Shape, fractions: RangeInclusive<f32>, rng: &mut R) -> Self {
        Self::from_fraction(shape, rng.random_range(fractions))
    }

    /// Applies the blur to `field`.
    pub fn apply(&self, field: &ScalarField) -> Result<ScalarField, FieldError> {
        gaussian_blur(field, self.sigma)
    }
}
