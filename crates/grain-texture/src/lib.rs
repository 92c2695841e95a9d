//! Procedural noise textures.
//!
//! Generates a Perlin or Voronoi field, normalizes it to [0, 1], blurs it by a
//! size-relative Gaussian and pairs it with a random colormap. Encoding the
//! result is left to the caller (see `rhizome-grain-image`).
//!
//! ```
//! use rhizome_grain_texture::{NoiseKind, RngConfig, Shape, TextureConfig, TexturePipeline};
//!
//! let pipeline = TexturePipeline::new(TextureConfig::default()).unwrap();
//! let texture = pipeline
//!     .run(NoiseKind::Voronoi, Shape::new(32, 32), &RngConfig::seeded(7))
//!     .unwrap();
//! assert_eq!(texture.field.shape(), Shape::new(32, 32));
//! ```
//!
//! Every stochastic choice draws from the run's own generator, so runs with
//! the same seed are identical and concurrent runs never share state.

mod config;
mod error;

pub use config::{RngConfig, TextureConfig};
pub use error::TextureError;
pub use rhizome_grain_color::{Colormap, Rgb};
pub use rhizome_grain_field::{BlurParameter, ScalarField, Shape};

use std::str::FromStr;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span};

use config::validate_shape;
use rhizome_grain_color::{build_colormap, random_colors_in};
use rhizome_grain_field::normalize;
use rhizome_grain_noise::{FieldGenerator, PerlinField, SeedPoints, VoronoiField};

// ============================================================================
// Noise kind
// ============================================================================

/// Which noise family to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoiseKind {
    /// Gradient noise.
    Perlin,
    /// Nearest-seed distance field.
    Voronoi,
}

impl NoiseKind {
    /// Lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            NoiseKind::Perlin => "perlin",
            NoiseKind::Voronoi => "voronoi",
        }
    }
}

impl FromStr for NoiseKind {
    type Err = TextureError;

    /// Case-insensitive; surrounding whitespace is not stripped.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("perlin") {
            Ok(NoiseKind::Perlin)
        } else if s.eq_ignore_ascii_case("voronoi") {
            Ok(NoiseKind::Voronoi)
        } else {
            Err(TextureError::InvalidNoiseKind(s.to_string()))
        }
    }
}

impl std::fmt::Display for NoiseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Output
// ============================================================================

/// Every random draw made during a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextureRecipe {
    /// Noise family.
    pub kind: NoiseKind,
    /// Field dimensions.
    pub shape: Shape,
    /// Perlin permutation seed or Voronoi point seed.
    pub noise_seed: u64,
    /// Voronoi seed point count.
    pub point_count: Option<usize>,
    /// Seed the gradient colors were drawn from.
    pub gradient_seed: u64,
    /// Gradient colors, in interpolation order.
    pub colors: Vec<Rgb>,
    /// Seed the blur fraction was drawn from.
    pub blur_seed: u64,
    /// Blur applied to the normalized field.
    pub blur: BlurParameter,
}

/// A finished texture: blurred field plus the colormap to render it with.
#[derive(Debug, Clone)]
pub struct Texture {
    /// Normalized then blurred field.
    pub field: ScalarField,
    /// Colormap to look field values up in.
    pub colormap: Colormap,
    /// How the texture was made.
    pub recipe: TextureRecipe,
}

// ============================================================================
// Pipeline
// ============================================================================

/// Generates textures from a validated [`TextureConfig`].
#[derive(Debug, Clone)]
pub struct TexturePipeline {
    config: TextureConfig,
}

impl TexturePipeline {
    /// Validates `config` and wraps it.
    pub fn new(config: TextureConfig) -> Result<Self, TextureError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The pipeline parameters.
    pub fn config(&self) -> &TextureConfig {
        &self.config
    }

    /// Runs at the configured [`TextureConfig::shape`].
    pub fn generate(&self, kind: NoiseKind, rng: &RngConfig) -> Result<Texture, TextureError> {
        self.run(kind, self.config.shape, rng)
    }

    /// Parses `kind` and runs; an unknown kind fails before anything is generated.
    pub fn run_named(
        &self,
        kind: &str,
        shape: Shape,
        rng: &RngConfig,
    ) -> Result<Texture, TextureError> {
        let kind = kind.parse()?;
        self.run(kind, shape, rng)
    }

    /// Runs with a master generator built from `rng`.
    pub fn run(
        &self,
        kind: NoiseKind,
        shape: Shape,
        rng: &RngConfig,
    ) -> Result<Texture, TextureError> {
        self.run_with_rng(kind, shape, &mut rng.to_rng())
    }

    /// Runs with an explicit master generator.
    pub fn run_with_rng<R: Rng>(
        &self,
        kind: NoiseKind,
        shape: Shape,
        rng: &mut R,
    ) -> Result<Texture, TextureError> {
        let shape = validate_shape(shape)?;
        let _span = info_span!("texture", %kind, %shape).entered();
        let cfg = &self.config;

        let noise_seed = self.sub_seed(rng);
        let (raw, point_count) = match kind {
            NoiseKind::Perlin => {
                debug!(seed = noise_seed, scale = cfg.perlin_scale, "perlin noise");
                let noise = PerlinField::with_seed(noise_seed).scale(cfg.perlin_scale);
                (noise.generate(shape)?, None)
            }
            NoiseKind::Voronoi => {
                let count = rng.random_range(cfg.point_range());
                debug!(seed = noise_seed, points = count, "voronoi noise");
                let mut point_rng = StdRng::seed_from_u64(noise_seed);
                let points = SeedPoints::random(shape, count, &mut point_rng)?;
                (VoronoiField::new(points).generate(shape)?, Some(count))
            }
        };
        let normalized = normalize(&raw);

        let gradient_seed = self.sub_seed(rng);
        let colors = random_colors_in(
            cfg.color_range(),
            &mut StdRng::seed_from_u64(gradient_seed),
        );
        let colormap = build_colormap(&colors, cfg.colormap_samples)?;
        debug!(seed = gradient_seed, colors = colors.len(), "gradient");

        let blur_seed = self.sub_seed(rng);
        let blur = BlurParameter::random(
            shape,
            cfg.blur_range(),
            &mut StdRng::seed_from_u64(blur_seed),
        );
        debug!(seed = blur_seed, sigma = blur.sigma, "blur");
        let field = blur.apply(&normalized)?;

        info!(colors = colors.len(), sigma = blur.sigma, "texture generated");

        Ok(Texture {
            field,
            colormap,
            recipe: TextureRecipe {
                kind,
                shape,
                noise_seed,
                point_count,
                gradient_seed,
                colors,
                blur_seed,
                blur,
            },
        })
    }

    fn sub_seed<R: Rng>(&self, rng: &mut R) -> u64 {
        rng.random_range(0..=self.config.sub_seed_max)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline() -> TexturePipeline {
        TexturePipeline::new(TextureConfig::default()).unwrap()
    }

    #[test]
    fn test_noise_kind_parse() {
        assert_eq!("perlin".parse::<NoiseKind>().unwrap(), NoiseKind::Perlin);
        assert_eq!("PERLIN".parse::<NoiseKind>().unwrap(), NoiseKind::Perlin);
        assert_eq!("Voronoi".parse::<NoiseKind>().unwrap(), NoiseKind::Voronoi);
        assert!(matches!(
            "simplex".parse::<NoiseKind>(),
            Err(TextureError::InvalidNoiseKind(s)) if s == "simplex"
        ));
        assert_eq!(NoiseKind::Voronoi.to_string(), "voronoi");
    }

    #[test]
    fn test_invalid_kind_aborts() {
        let result = pipeline().run_named("banana", Shape::new(8, 8), &RngConfig::seeded(1));
        assert!(matches!(result, Err(TextureError::InvalidNoiseKind(s)) if s == "banana"));
    }

    #[test]
    fn test_zero_shape_rejected() {
        let result = pipeline().run(NoiseKind::Perlin, Shape::new(0, 8), &RngConfig::seeded(1));
        assert!(matches!(
            result,
            Err(TextureError::ParameterOutOfRange { name: "shape", .. })
        ));
    }

    #[test]
    fn test_oversized_shape_rejected() {
        let huge = Shape::new(usize::MAX / 2, 3);
        for kind in [NoiseKind::Perlin, NoiseKind::Voronoi] {
            let result = pipeline().run(kind, huge, &RngConfig::seeded(1));
            assert!(matches!(
                result,
                Err(TextureError::ParameterOutOfRange { name: "shape", .. })
            ));
        }
        assert!(matches!(
            TextureConfig::default().with_shape(huge).validate(),
            Err(TextureError::ParameterOutOfRange { name: "shape", .. })
        ));
    }

    #[test]
    fn test_generate_uses_configured_shape() {
        let config = TextureConfig::default().with_shape(Shape::new(12, 20));
        let p = TexturePipeline::new(config).unwrap();
        let texture = p.generate(NoiseKind::Perlin, &RngConfig::seeded(4)).unwrap();
        assert_eq!(texture.field.shape(), Shape::new(12, 20));
        let explicit = p
            .run(NoiseKind::Perlin, Shape::new(12, 20), &RngConfig::seeded(4))
            .unwrap();
        assert_eq!(texture.field, explicit.field);
    }

    #[test]
    fn test_perlin_run_in_unit_range() {
        let texture = pipeline()
            .run(NoiseKind::Perlin, Shape::new(24, 16), &RngConfig::seeded(5))
            .unwrap();
        assert_eq!(texture.field.shape(), Shape::new(24, 16));
        assert!(texture.field.is_finite());
        assert!(
            texture
                .field
                .values()
                .iter()
                .all(|&v| (-1e-5..=1.0 + 1e-5).contains(&v))
        );

        let recipe = &texture.recipe;
        assert_eq!(recipe.kind, NoiseKind::Perlin);
        assert_eq!(recipe.point_count, None);
        assert!(recipe.noise_seed <= 100 && recipe.gradient_seed <= 100 && recipe.blur_seed <= 100);
        assert!((1..=40).contains(&recipe.colors.len()));
        assert!((0.06 * 16.0..=0.10 * 16.0).contains(&recipe.blur.sigma));
        assert_eq!(texture.colormap.len(), 1024);
    }

    #[test]
    fn test_voronoi_run_draws_point_count() {
        let texture = pipeline()
            .run(NoiseKind::Voronoi, Shape::new(20, 20), &RngConfig::seeded(9))
            .unwrap();
        let count = texture.recipe.point_count.unwrap();
        assert!((5..=50).contains(&count));
    }

    #[test]
    fn test_seeded_runs_repeat() {
        let p = pipeline();
        for kind in [NoiseKind::Perlin, NoiseKind::Voronoi] {
            let a = p.run(kind, Shape::new(16, 16), &RngConfig::seeded(42)).unwrap();
            let b = p.run(kind, Shape::new(16, 16), &RngConfig::seeded(42)).unwrap();
            assert_eq!(a.field, b.field);
            assert_eq!(a.colormap, b.colormap);
            assert_eq!(a.recipe, b.recipe);
        }
    }

    #[test]
    fn test_gradient_matches_seeded_colors() {
        let texture = pipeline()
            .run(NoiseKind::Perlin, Shape::new(8, 8), &RngConfig::seeded(3))
            .unwrap();
        let expected = rhizome_grain_color::generate_colors(Some(texture.recipe.gradient_seed));
        assert_eq!(texture.recipe.colors, expected);
    }

    #[test]
    fn test_config_validation() {
        let bad = TextureConfig {
            min_points: 10,
            max_points: 5,
            ..TextureConfig::default()
        };
        assert!(matches!(
            TexturePipeline::new(bad),
            Err(TextureError::ParameterOutOfRange { name: "points", .. })
        ));

        let bad = TextureConfig {
            colormap_samples: 0,
            ..TextureConfig::default()
        };
        assert!(bad.validate().is_err());

        let bad = TextureConfig {
            blur_fraction_min: 0.2,
            blur_fraction_max: 0.1,
            ..TextureConfig::default()
        };
        assert!(bad.validate().is_err());

        let bad = TextureConfig::default().with_shape(Shape::new(4, 0));
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_blur_fraction_bounded_by_one() {
        let bad = TextureConfig {
            blur_fraction_min: 1e30,
            blur_fraction_max: 1e30,
            ..TextureConfig::default()
        };
        assert!(matches!(
            TexturePipeline::new(bad),
            Err(TextureError::ParameterOutOfRange { name: "blur_fraction", .. })
        ));

        let whole = TextureConfig {
            shape: Shape::new(6, 6),
            blur_fraction_min: 1.0,
            blur_fraction_max: 1.0,
            ..TextureConfig::default()
        };
        let texture = TexturePipeline::new(whole)
            .unwrap()
            .generate(NoiseKind::Voronoi, &RngConfig::seeded(1))
            .unwrap();
        assert_eq!(texture.recipe.blur.sigma, 6.0);
        assert!(texture.field.is_finite());
    }

    #[test]
    fn test_config_from_partial_json() {
        let config = TextureConfig::from_json_str(
            r#"{ "shape": { "height": 64, "width": 32 }, "max_colors": 3 }"#,
        )
        .unwrap();
        assert_eq!(config.shape, Shape::new(64, 32));
        assert_eq!(config.max_colors, 3);
        assert_eq!(config.perlin_scale, 10.0);
        assert_eq!(config.colormap_samples, 1024);

        assert!(matches!(
            TextureConfig::from_json_str(r#"{ "min_colors": 0 }"#),
            Err(TextureError::ParameterOutOfRange { name: "colors", .. })
        ));
        assert!(matches!(
            TextureConfig::from_json_str("{ not json"),
            Err(TextureError::Config(_))
        ));
    }

    #[test]
    fn test_rng_config() {
        assert_eq!(RngConfig::default(), RngConfig::unseeded());
        let mut a = RngConfig::seeded(8).to_rng();
        let mut b = RngConfig::seeded(8).to_rng();
        assert_eq!(a.random::<u64>(), b.random::<u64>());
    }
}
