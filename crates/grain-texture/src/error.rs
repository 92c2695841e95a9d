//! Error types for texture generation.

use rhizome_grain_color::ColorError;
use rhizome_grain_field::FieldError;
use rhizome_grain_noise::NoiseError;
use thiserror::Error;

/// Errors that abort a texture run before any output is produced.
#[derive(Debug, Error)]
pub enum TextureError {
    /// The noise kind is neither `perlin` nor `voronoi`.
    #[error("invalid noise kind {0:?}, expected \"perlin\" or \"voronoi\"")]
    InvalidNoiseKind(String),

    /// A size, count or range parameter is unusable.
    #[error("parameter `{name}` out of range: {reason}")]
    ParameterOutOfRange {
        /// Parameter name as it appears in the config.
        name: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// Field construction or filtering failed.
    #[error(transparent)]
    Field(#[from] FieldError),

    /// Noise generation failed.
    #[error(transparent)]
    Noise(#[from] NoiseError),

    /// Colormap construction failed.
    #[error(transparent)]
    Color(#[from] ColorError),

    /// Config could not be parsed.
    #[error("invalid config: {0}")]
    Config(#[from] serde_json::Error),

    /// Config could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl TextureError {
    pub(crate) fn out_of_range(name: &'static str, reason: impl Into<String>) -> Self {
        Self::ParameterOutOfRange {
            name,
            reason: reason.into(),
        }
    }
}
