//! Colors, gradients and colormaps for texture synthesis.
//!
//! Provides an 8-bit-backed RGB color, evenly spaced gradients, a discretized
//! [`Colormap`] lookup table, and random gradient generation.
//!
//! ```
//! use rhizome_grain_color::{Rgb, build_colormap};
//!
//! let cmap = build_colormap(&[Rgb::BLACK, Rgb::WHITE], 1024).unwrap();
//! let mid = cmap.sample(0.5);
//! assert!((mid.r - 0.5).abs() < 1e-6);
//! ```

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

/// Errors from colormap construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ColorError {
    /// No colors were supplied.
    #[error("gradient needs at least one color")]
    EmptyGradient,
    /// The lookup table would have no entries.
    #[error("colormap sample count must be at least 1")]
    ZeroSamples,
}

// ============================================================================
// Rgb
// ============================================================================

/// Display RGB color (0-1 range per channel, interpolated as stored).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rgb {
    /// Red channel (0-1).
    pub r: f32,
    /// Green channel (0-1).
    pub g: f32,
    /// Blue channel (0-1).
    pub b: f32,
}

impl Rgb {
    /// Black (0, 0, 0).
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0);
    /// White (1, 1, 1).
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0);
    /// Red (1, 0, 0).
    pub const RED: Self = Self::new(1.0, 0.0, 0.0);
    /// Green (0, 1, 0).
    pub const GREEN: Self = Self::new(0.0, 1.0, 0.0);
    /// Blue (0, 0, 1).
    pub const BLUE: Self = Self::new(0.0, 0.0, 1.0);

    /// Creates a new RGB color.
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Creates from 8-bit channels.
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
    }

    /// Creates from a hex color code (e.g., 0xFF5500).
    pub fn from_hex(hex: u32) -> Self {
        Self::from_rgb8(
            ((hex >> 16) & 0xFF) as u8,
            ((hex >> 8) & 0xFF) as u8,
            (hex & 0xFF) as u8,
        )
    }

    /// Converts to 8-bit channels, rounding to nearest.
    pub fn to_rgb8(self) -> [u8; 3] {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b)]
    }

    /// Converts to hex color code.
    pub fn to_hex(self) -> u32 {
        let [r, g, b] = self.to_rgb8();
        ((r as u32) << 16) | ((g as u32) << 8) | b as u32
    }

    /// Creates from a Vec3.
    pub fn from_vec3(v: Vec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }

    /// Converts to Vec3.
    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.r, self.g, self.b)
    }

    /// Linear interpolation between two colors.
    pub fn lerp(self, other: Self, t: f32) -> Self {
        let (a, b) = (self.to_vec3(), other.to_vec3());
        Self::from_vec3(a + (b - a) * t)
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:06x}", self.to_hex())
    }
}

// ============================================================================
// Gradients
// ============================================================================

/// A color stop in a gradient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
    /// Position in the gradient (0-1).
    pub position: f32,
    /// Color at this position.
    pub color: Rgb,
}

impl ColorStop {
    /// Creates a new color stop.
    pub fn new(position: f32, color: Rgb) -> Self {
        Self { position, color }
    }
}

/// A piecewise-linear gradient over evenly spaced color stops.
#[derive(Debug, Clone, PartialEq)]
pub struct Gradient {
    stops: Vec<ColorStop>,
}

impl Gradient {
    /// Places `colors` at evenly spaced positions in [0, 1], in order.
    pub fn from_colors(colors: &[Rgb]) -> Result<Self, ColorError> {
        match colors {
            [] => Err(ColorError::EmptyGradient),
            [only] => Ok(Self {
                stops: vec![ColorStop::new(0.0, *only)],
            }),
            _ => {
                let step = 1.0 / (colors.len() - 1) as f32;
                let stops = colors
                    .iter()
                    .enumerate()
                    .map(|(i, &c)| ColorStop::new(i as f32 * step, c))
                    .collect();
                Ok(Self { stops })
            }
        }
    }

    /// Samples the gradient at position t (clamped to 0-1).
    pub fn sample(&self, t: f32) -> Rgb {
        let first = self.stops[0];
        let last = self.stops[self.stops.len() - 1];
        let t = t.clamp(0.0, 1.0);

        if t <= first.position {
            return first.color;
        }
        if t >= last.position {
            return last.color;
        }

        // First stop strictly above t; stops are sorted and t is inside the range.
        let upper = self.stops.partition_point(|s| s.position <= t);
        let lo = self.stops[upper - 1];
        let hi = self.stops[upper];

        let range = hi.position - lo.position;
        let local_t = if range > 0.0 {
            (t - lo.position) / range
        } else {
            0.0
        };

        lo.color.lerp(hi.color, local_t)
    }

    /// The color stops.
    pub fn stops(&self) -> &[ColorStop] {
        &self.stops
    }

    /// Returns the number of stops.
    pub fn len(&self) -> usize {
        self.stops.len()
    }

    /// Always false; a gradient holds at least one stop.
    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }
}

// ============================================================================
// Colormap
// ============================================================================

/// Default number of lookup table entries.
pub const DEFAULT_SAMPLES: usize = 1024;

/// A gradient discretized into a lookup table.
///
/// Entry `i` holds the gradient sampled at `i / (n - 1)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Colormap {
    table: Vec<Rgb>,
}

impl Colormap {
    /// Discretizes `gradient` into `n_samples` entries.
    pub fn from_gradient(gradient: &Gradient, n_samples: usize) -> Result<Self, ColorError> {
        if n_samples == 0 {
            return Err(ColorError::ZeroSamples);
        }
        let denom = (n_samples - 1).max(1) as f32;
        let table = (0..n_samples)
            .map(|i| gradient.sample(i as f32 / denom))
            .collect();
        Ok(Self { table })
    }

    /// Looks up `t` (clamped to 0-1), interpolating between adjacent entries.
    pub fn sample(&self, t: f32) -> Rgb {
        let last = self.table.len() - 1;
        let pos = t.clamp(0.0, 1.0) * last as f32;
        let i = (pos.floor() as usize).min(last);
        let j = (i + 1).min(last);
        self.table[i].lerp(self.table[j], pos - i as f32)
    }

    /// Looks up the entry `min(floor(t * n), n - 1)` without interpolation.
    pub fn sample_nearest(&self, t: f32) -> Rgb {
        let n = self.table.len();
        let i = (t.clamp(0.0, 1.0) * n as f32) as usize;
        self.table[i.min(n - 1)]
    }

    /// The lookup table.
    pub fn table(&self) -> &[Rgb] {
        &self.table
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Always false; a colormap holds at least one entry.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// Builds a colormap from evenly spaced `colors` with `n_samples` entries.
pub fn build_colormap(colors: &[Rgb], n_samples: usize) -> Result<Colormap, ColorError> {
    Colormap::from_gradient(&Gradient::from_colors(colors)?, n_samples)
}

// ============================================================================
// Random gradients
// ============================================================================

/// Largest number of colors drawn for a random gradient.
pub const MAX_RANDOM_COLORS: usize = 40;

/// Draws `1..=MAX_RANDOM_COLORS` independent uniform 24-bit colors.
pub fn random_colors<R: Rng>(rng: &mut R) -> Vec<Rgb> {
    random_colors_in(1..=MAX_RANDOM_COLORS, rng)
}

/// Draws a color count from `count`, then that many uniform 24-bit colors.
pub fn random_colors_in<R: Rng>(count: std::ops::RangeInclusive<usize>, rng: &mut R) -> Vec<Rgb> {
    let n = rng.random_range(count);
    (0..n)
        .map(|_| Rgb::from_hex(rng.random_range(0..=0xFF_FFFF)))
        .collect()
}

/// Draws a random color sequence, seeded if `seed` is given.
pub fn generate_colors(seed: Option<u64>) -> Vec<Rgb> {
    match seed {
        Some(seed) => random_colors(&mut StdRng::seed_from_u64(seed)),
        None => random_colors(&mut rand::rng()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Rgb, b: Rgb) -> bool {
        (a.r - b.r).abs() < 1e-5 && (a.g - b.g).abs() < 1e-5 && (a.b - b.b).abs() < 1e-5
    }

    #[test]
    fn test_hex_roundtrip() {
        for hex in [0x000000, 0xFF5500, 0x123456, 0xFFFFFF] {
            assert_eq!(Rgb::from_hex(hex).to_hex(), hex);
        }
        assert_eq!(Rgb::from_hex(0xFF5500).to_string(), "#ff5500");
    }

    #[test]
    fn test_empty_gradient_rejected() {
        assert_eq!(Gradient::from_colors(&[]), Err(ColorError::EmptyGradient));
        assert_eq!(build_colormap(&[], 16), Err(ColorError::EmptyGradient));
        assert_eq!(build_colormap(&[Rgb::RED], 0), Err(ColorError::ZeroSamples));
    }

    #[test]
    fn test_single_color_is_constant() {
        let color = Rgb::from_hex(0x3366CC);
        let cmap = build_colormap(&[color], DEFAULT_SAMPLES).unwrap();
        for i in 0..=20 {
            let t = i as f32 / 20.0;
            assert_eq!(cmap.sample(t), color);
            assert_eq!(cmap.sample_nearest(t), color);
        }
    }

    #[test]
    fn test_two_color_endpoints_and_midpoint() {
        let c0 = Rgb::from_hex(0x102030);
        let c1 = Rgb::from_hex(0xF0E0D0);
        let cmap = build_colormap(&[c0, c1], DEFAULT_SAMPLES).unwrap();

        assert!(close(cmap.sample(0.0), c0));
        assert!(close(cmap.sample(1.0), c1));
        assert!(close(cmap.sample(0.5), c0.lerp(c1, 0.5)));
        assert!(close(cmap.sample_nearest(0.0), c0));
        assert!(close(cmap.sample_nearest(1.0), c1));
    }

    #[test]
    fn test_gradient_stops_evenly_spaced() {
        let colors = [Rgb::RED, Rgb::GREEN, Rgb::BLUE, Rgb::WHITE, Rgb::BLACK];
        let grad = Gradient::from_colors(&colors).unwrap();
        let positions: Vec<f32> = grad.stops().iter().map(|s| s.position).collect();
        assert_eq!(positions, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert!(grad.stops().iter().zip(&colors).all(|(s, c)| s.color == *c));
        assert_eq!(grad.len(), 5);
    }

    #[test]
    fn test_gradient_multi_stop_order() {
        let grad = Gradient::from_colors(&[Rgb::RED, Rgb::GREEN, Rgb::BLUE]).unwrap();
        assert!(close(grad.sample(0.0), Rgb::RED));
        assert!(close(grad.sample(0.5), Rgb::GREEN));
        assert!(close(grad.sample(1.0), Rgb::BLUE));
        assert!(close(grad.sample(0.25), Rgb::new(0.5, 0.5, 0.0)));

        let reversed = Gradient::from_colors(&[Rgb::BLUE, Rgb::GREEN, Rgb::RED]).unwrap();
        assert!(close(reversed.sample(0.0), Rgb::BLUE));
    }

    #[test]
    fn test_colormap_clamps_queries() {
        let cmap = build_colormap(&[Rgb::BLACK, Rgb::WHITE], 8).unwrap();
        assert_eq!(cmap.len(), 8);
        assert_eq!(cmap.sample(-3.0), Rgb::BLACK);
        assert_eq!(cmap.sample(7.0), Rgb::WHITE);
    }

    #[test]
    fn test_generate_colors_seeded_is_repeatable() {
        let a = generate_colors(Some(1));
        let b = generate_colors(Some(1));
        assert_eq!(a, b);
        assert!((1..=MAX_RANDOM_COLORS).contains(&a.len()));
    }

    #[test]
    fn test_random_colors_counts() {
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..50 {
            let colors = random_colors(&mut rng);
            assert!((1..=MAX_RANDOM_COLORS).contains(&colors.len()));
            for c in colors {
                assert_eq!(Rgb::from_hex(c.to_hex()), c);
            }
        }
        let fixed = random_colors_in(3..=3, &mut rng);
        assert_eq!(fixed.len(), 3);
    }
}
