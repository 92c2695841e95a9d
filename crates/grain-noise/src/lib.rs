//! Noise field generators for procedural textures.
//!
//! Two generators share the [`FieldGenerator`] trait:
//!
//! - [`PerlinField`] - gradient noise over a shuffled [`PermutationTable`]
//! - [`VoronoiField`] - distance to the nearest of a set of [`SeedPoints`]
//!
//! Both return raw (unnormalized) [`ScalarField`]s.
//!
//! ```
//! use rhizome_grain_noise::{FieldGenerator, PerlinField};
//! use rhizome_grain_field::Shape;
//!
//! let noise = PerlinField::with_seed(42).generate(Shape::new(8, 8)).unwrap();
//! assert_eq!(noise.shape(), Shape::new(8, 8));
//! ```

use glam::UVec2;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use thiserror::Error;

pub use rhizome_grain_field::{FieldError, ScalarField, Shape};

/// Errors from noise generation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NoiseError {
    /// A Voronoi field needs at least one seed point.
    #[error("voronoi noise needs at least one seed point")]
    NoPoints,

    /// Perlin scale must be finite and positive.
    #[error("perlin scale must be finite and > 0, got {0}")]
    InvalidScale(f32),

    /// The requested shape is unusable.
    #[error(transparent)]
    Field(#[from] FieldError),
}

/// Something that fills a field of a given shape.
pub trait FieldGenerator {
    /// Generates a raw field of `shape`.
    fn generate(&self, shape: Shape) -> Result<ScalarField, NoiseError>;
}

// =============================================================================
// Permutation table
// =============================================================================

/// A shuffled permutation of `0..=255`, stored twice so that
/// `perm[perm[x] + y + 1]` never needs to wrap.
#[derive(Clone, PartialEq, Eq)]
pub struct PermutationTable {
    perm: [u8; 512],
    seed: Option<u64>,
}

impl PermutationTable {
    /// Shuffles the identity permutation with a generator seeded from `seed`.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::from_rng(&mut StdRng::seed_from_u64(seed))
        }
    }

    /// Shuffles the identity permutation with `rng`.
    pub fn from_rng<R: Rng>(rng: &mut R) -> Self {
        let mut base: [u8; 256] = std::array::from_fn(|i| i as u8);
        base.shuffle(rng);
        Self::from_permutation(base)
    }

    /// Wraps an explicit permutation.
    pub fn from_permutation(base: [u8; 256]) -> Self {
        let perm = std::array::from_fn(|i| base[i & 255]);
        Self { perm, seed: None }
    }

    /// The seed the table was shuffled from, if known.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Looks up entry `i` (0..512).
    #[inline]
    pub fn get(&self, i: usize) -> u8 {
        self.perm[i]
    }

    /// Hash of lattice corner (x, y), both already masked to 0..=256.
    #[inline]
    fn hash(&self, x: usize, y: usize) -> u8 {
        self.perm[self.perm[x] as usize + y]
    }
}

impl std::fmt::Debug for PermutationTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermutationTable")
            .field("seed", &self.seed)
            .field("head", &&self.perm[..8])
            .finish_non_exhaustive()
    }
}

#[inline]
fn fade(t: f32) -> f32 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + t * (b - a)
}

/// Dot product of offset (x, y) with one of four diagonal gradients picked by `hash & 3`.
#[inline]
fn grad(hash: u8, x: f32, y: f32) -> f32 {
    let h = hash & 3;
    let (u, v) = if h < 2 { (x, y) } else { (y, x) };
    (if h & 1 == 0 { u } else { -u }) + (if h & 2 == 0 { v } else { -v })
}

// =============================================================================
// Perlin
// =============================================================================

/// 2D Perlin (gradient) noise over a whole field.
///
/// Pixel (row, col) samples lattice coordinate `(col / scale, row / scale)`,
/// so larger scales give smaller features. Output is unnormalized, roughly in
/// [-1, 1], and exactly 0 on lattice points.
#[derive(Debug, Clone, PartialEq)]
pub struct PerlinField {
    table: PermutationTable,
    /// Coordinate divisor.
    pub scale: f32,
}

impl PerlinField {
    /// Default coordinate divisor.
    pub const DEFAULT_SCALE: f32 = 10.0;

    /// Largest permutation seed drawn by [`PerlinField::random`].
    pub const MAX_RANDOM_SEED: u64 = 100;

    /// Creates Perlin noise over `table` with the default scale.
    pub fn new(table: PermutationTable) -> Self {
        Self {
            table,
            scale: Self::DEFAULT_SCALE,
        }
    }

    /// Creates Perlin noise whose permutation is shuffled from `seed`.
    pub fn with_seed(seed: u64) -> Self {
        Self::new(PermutationTable::from_seed(seed))
    }

    /// Creates Perlin noise with a permutation seed drawn from `0..=MAX_RANDOM_SEED`.
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Self::with_seed(rng.random_range(0..=Self::MAX_RANDOM_SEED))
    }

    /// Sets the coordinate divisor.
    pub fn scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// The permutation table in use.
    pub fn table(&self) -> &PermutationTable {
        &self.table
    }

    /// Samples the noise at lattice coordinate (x, y).
    pub fn sample(&self, x: f32, y: f32) -> f32 {
        let x0 = x.floor();
        let y0 = y.floor();
        let xi = (x0 as i64 & 255) as usize;
        let yi = (y0 as i64 & 255) as usize;

        let xf = x - x0;
        let yf = y - y0;

        let u = fade(xf);
        let v = fade(yf);

        let p = &self.table;
        let n00 = grad(p.hash(xi, yi), xf, yf);
        let n01 = grad(p.hash(xi, yi + 1), xf, yf - 1.0);
        let n11 = grad(p.hash(xi + 1, yi + 1), xf - 1.0, yf - 1.0);
        let n10 = grad(p.hash(xi + 1, yi), xf - 1.0, yf);

        let x1 = lerp(n00, n10, u);
        let x2 = lerp(n01, n11, u);
        lerp(x1, x2, v)
    }
}

impl FieldGenerator for PerlinField {
    fn generate(&self, shape: Shape) -> Result<ScalarField, NoiseError> {
        let shape = shape.validate()?;
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(NoiseError::InvalidScale(self.scale));
        }

        let mut values = vec![0.0f32; shape.len()];
        values
            .par_chunks_mut(shape.width)
            .enumerate()
            .for_each(|(row, out)| {
                let y = row as f32 / self.scale;
                for (col, o) in out.iter_mut().enumerate() {
                    *o = self.sample(col as f32 / self.scale, y);
                }
            });

        Ok(ScalarField::from_data(values, shape)?)
    }
}

// =============================================================================
// Voronoi
// =============================================================================

/// Seed sites for Voronoi noise; `x` is the column and `y` the row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedPoints(Vec<UVec2>);

impl SeedPoints {
    /// Wraps explicit points.
    pub fn new(points: Vec<UVec2>) -> Result<Self, NoiseError> {
        if points.is_empty() {
            return Err(NoiseError::NoPoints);
        }
        Ok(Self(points))
    }

    /// Draws `count` points uniformly inside `shape`. Duplicates are kept.
    pub fn random<R: Rng>(shape: Shape, count: usize, rng: &mut R) -> Result<Self, NoiseError> {
        let shape = validate_site_extent(shape)?;
        if count == 0 {
            return Err(NoiseError::NoPoints);
        }
        let points = (0..count)
            .map(|_| {
                UVec2::new(
                    rng.random_range(0..shape.width as u32),
                    rng.random_range(0..shape.height as u32),
                )
            })
            .collect();
        Ok(Self(points))
    }

    /// The points.
    pub fn points(&self) -> &[UVec2] {
        &self.0
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; a point set holds at least one point.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Euclidean distance from each pixel to its nearest seed point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoronoiField {
    points: SeedPoints,
}

impl VoronoiField {
    /// Creates Voronoi noise over `points`.
    pub fn new(points: SeedPoints) -> Self {
        Self { points }
    }

    /// Creates Voronoi noise over `count` random points inside `shape`.
    pub fn random<R: Rng>(shape: Shape, count: usize, rng: &mut R) -> Result<Self, NoiseError> {
        Ok(Self::new(SeedPoints::random(shape, count, rng)?))
    }

    /// The seed points.
    pub fn points(&self) -> &SeedPoints {
        &self.points
    }

    /// Distance from (col, row) to the nearest seed point.
    pub fn nearest_distance(&self, col: u32, row: u32) -> f32 {
        self.points
            .points()
            .iter()
            .map(|p| squared_distance(col, row, *p))
            .fold(f32::INFINITY, f32::min)
            .sqrt()
    }
}

/// Sites and pixels are addressed with `u32` coordinates.
fn validate_site_extent(shape: Shape) -> Result<Shape, NoiseError> {
    let shape = shape.validate()?;
    if u32::try_from(shape.height).is_err() || u32::try_from(shape.width).is_err() {
        return Err(FieldError::TooLarge {
            height: shape.height,
            width: shape.width,
        }
        .into());
    }
    Ok(shape)
}

#[inline]
fn squared_distance(col: u32, row: u32, p: UVec2) -> f32 {
    let dx = col as f32 - p.x as f32;
    let dy = row as f32 - p.y as f32;
    dx * dx + dy * dy
}

impl FieldGenerator for VoronoiField {
    fn generate(&self, shape: Shape) -> Result<ScalarField, NoiseError> {
        let shape = validate_site_extent(shape)?;

        let mut values = vec![0.0f32; shape.len()];
        values
            .par_chunks_mut(shape.width)
            .enumerate()
            .for_each(|(row, out)| {
                for (col, o) in out.iter_mut().enumerate() {
                    *o = self.nearest_distance(col as u32, row as u32);
                }
            });

        Ok(ScalarField::from_data(values, shape)?)
    }
}

// =============================================================================
// Tests
// =============================================================================
