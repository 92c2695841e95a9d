//! Dense 2D scalar fields for texture synthesis.
//!
//! A [`ScalarField`] is a row-major grid of `f32` samples. Noise generators
//! produce them, the [`normalize`] pass rescales them to [0, 1] and
//! [`gaussian_blur`] softens them before colorization.
//!
//! # Example
//!
//! ```
//! use rhizome_grain_field::{Shape, ScalarField, gaussian_blur, normalize};
//!
//! let field = ScalarField::from_fn(Shape::new(16, 16), |row, col| (row * col) as f32).unwrap();
//! let norm = normalize(&field);
//! assert_eq!(norm.min_max(), (0.0, 1.0));
//!
//! let soft = gaussian_blur(&norm, 1.5).unwrap();
//! assert_eq!(soft.shape(), norm.shape());
//! ```

mod blur;

pub use blur::{BlurParameter, TRUNCATE, gaussian_blur, gaussian_kernel};

use thiserror::Error;

/// Errors raised when constructing or filtering fields.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldError {
    /// One of the dimensions is zero.
    #[error("field dimensions must be non-zero, got {height}x{width}")]
    ZeroDimension {
        /// Number of rows.
        height: usize,
        /// Number of columns.
        width: usize,
    },

    /// Sample buffer does not match the requested shape.
    #[error("field data has {got} samples but shape needs {expected}")]
    LengthMismatch {
        /// Samples required by the shape.
        expected: usize,
        /// Samples actually supplied.
        got: usize,
    },

    /// The sample count does not fit in memory addressing.
    #[error("field of {height}x{width} samples is too large")]
    TooLarge {
        /// Number of rows.
        height: usize,
        /// Number of columns.
        width: usize,
    },

    /// Blur standard deviation is negative, not finite, or too wide for a kernel.
    #[error("blur sigma must be finite, >= 0 and small enough to build a kernel, got {0}")]
    InvalidSigma(f32),
}

// ============================================================================
// Shape
// ============================================================================

/// Dimensions of a field, in rows (height) and columns (width).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Shape {
    /// Number of rows.
    pub height: usize,
    /// Number of columns.
    pub width: usize,
}

impl Shape {
    /// Creates a shape of `height` rows by `width` columns.
    pub const fn new(height: usize, width: usize) -> Self {
        Self { height, width }
    }

    /// Creates a square shape.
    pub const fn square(size: usize) -> Self {
        Self::new(size, size)
    }

    /// Total number of samples, or `None` if the product overflows.
    pub const fn checked_len(&self) -> Option<usize> {
        self.height.checked_mul(self.width)
    }

    /// Total number of samples. Only meaningful for a validated shape.
    pub const fn len(&self) -> usize {
        self.height * self.width
    }

    /// Returns true if either dimension is zero.
    pub const fn is_empty(&self) -> bool {
        self.height == 0 || self.width == 0
    }

    /// The smaller of the two dimensions.
    pub fn min_dim(&self) -> usize {
        self.height.min(self.width)
    }

    /// Returns the shape unchanged if both dimensions are non-zero and an
    /// `f32` buffer of `len()` samples can be addressed.
    pub fn validate(self) -> Result<Self, FieldError> {
        let Self { height, width } = self;
        if self.is_empty() {
            return Err(FieldError::ZeroDimension { height, width });
        }
        self.checked_len()
            .and_then(|n| n.checked_mul(std::mem::size_of::<f32>()))
            .filter(|&bytes| bytes <= isize::MAX as usize)
            .map(|_| self)
            .ok_or(FieldError::TooLarge { height, width })
    }
}

impl Default for Shape {
    fn default() -> Self {
        Self::square(4096)
    }
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.height, self.width)
    }
}

// ============================================================================
// ScalarField
// ============================================================================

/// A 2D grid of scalar samples in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarField {
    values: Vec<f32>,
    shape: Shape,
}

impl ScalarField {
    /// Creates a zero-filled field.
    pub fn new(shape: Shape) -> Result<Self, FieldError> {
        Self::filled(shape, 0.0)
    }

    /// Creates a field where every sample is `value`.
    pub fn filled(shape: Shape, value: f32) -> Result<Self, FieldError> {
        let shape = shape.validate()?;
        Ok(Self {
            values: vec![value; shape.len()],
            shape,
        })
    }

    /// Wraps existing row-major samples.
    pub fn from_data(values: Vec<f32>, shape: Shape) -> Result<Self, FieldError> {
        let shape = shape.validate()?;
        if values.len() != shape.len() {
            return Err(FieldError::LengthMismatch {
                expected: shape.len(),
                got: values.len(),
            });
        }
        Ok(Self { values, shape })
    }

    /// Builds a field by evaluating `f(row, col)` for every sample.
    pub fn from_fn<F: FnMut(usize, usize) -> f32>(
        shape: Shape,
        mut f: F,
    ) -> Result<Self, FieldError> {
        let shape = shape.validate()?;
        let mut values = Vec::with_capacity(shape.len());
        for row in 0..shape.height {
            for col in 0..shape.width {
                values.push(f(row, col));
            }
        }
        Ok(Self { values, shape })
    }

    /// Returns the field dimensions.
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.shape.height
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.shape.width
    }

    /// Gets the sample at (row, col), or `None` outside the grid.
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row < self.shape.height && col < self.shape.width {
            Some(self.values[row * self.shape.width + col])
        } else {
            None
        }
    }

    /// Sets the sample at (row, col). Out-of-range writes are ignored.
    pub fn set(&mut self, row: usize, col: usize, value: f32) {
        if row < self.shape.height && col < self.shape.width {
            self.values[row * self.shape.width + col] = value;
        }
    }

    /// Returns the raw samples.
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Iterates over rows as slices.
    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        self.values.chunks_exact(self.shape.width)
    }

    /// Smallest and largest sample.
    pub fn min_max(&self) -> (f32, f32) {
        self.values
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            })
    }

    /// Returns true if no sample is NaN or infinite.
    pub fn is_finite(&self) -> bool {
        self.values.iter().all(|v| v.is_finite())
    }

    /// Applies `f` to every sample.
    pub fn map<F: Fn(f32) -> f32>(&self, f: F) -> Self {
        Self {
            values: self.values.iter().map(|&v| f(v)).collect(),
            shape: self.shape,
        }
    }
}

// ============================================================================
// Normalization
// ============================================================================

/// Rescales a field so its smallest sample becomes 0 and its largest 1.
///
/// A constant field has no range to stretch; it maps to all zeros.
pub fn normalize(field: &ScalarField) -> ScalarField {
    let (min, max) = field.min_max();
    let range = max - min;

    if range > 0.0 && range.is_finite() {
        field.map(|v| (v - min) / range)
    } else {
        tracing::warn!(
            shape = %field.shape(),
            value = min,
            "degenerate field, normalizing to zeros"
        );
        field.map(|_| 0.0)
    }
}

// ============================================================================
// Tests
// ============================================================================
