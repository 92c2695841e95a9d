//! Generates a procedural noise texture and writes it as a PNG.
//!
//! Run from repo root:
//!   `cargo run -p rhizome-grain-cli`                              - prompts for the noise kind
//!   `cargo run -p rhizome-grain-cli -- -n voronoi -s 7`           - reproducible Voronoi texture
//!   `cargo run -p rhizome-grain-cli -- --config grain.json -o out` - custom parameters
//!
//! Set `RUST_LOG=debug` (or pass `-v`) to see every random draw.

use std::error::Error;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, ValueHint};
use tracing::info;
use tracing_subscriber::EnvFilter;

use rhizome_grain_image::{ExportOptions, export_png, unique_path};
use rhizome_grain_texture::{NoiseKind, RngConfig, TextureConfig, TextureError, TexturePipeline};

type DynError = Box<dyn Error>;

const PROMPT: &str = "Do you want Perlin or Voronoi noise ? (Perlin/Voronoi): ";

#[derive(Parser, Debug)]
#[command(
    name = "grain",
    author,
    version,
    about = "Procedural Perlin/Voronoi texture generator"
)]
struct Cli {
    /// Noise kind, `perlin` or `voronoi` (asked interactively when omitted)
    #[arg(short, long)]
    noise: Option<String>,

    /// Master seed; the same seed reproduces the same texture
    #[arg(short, long)]
    seed: Option<u64>,

    /// JSON file with texture parameters
    #[arg(long, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Output width in pixels (overrides the config)
    #[arg(long)]
    width: Option<usize>,

    /// Output height in pixels (overrides the config)
    #[arg(long)]
    height: Option<usize>,

    /// Perlin coordinate divisor (overrides the config)
    #[arg(long)]
    scale: Option<f32>,

    /// Directory the texture is written to
    #[arg(short, long, default_value = ".", value_hint = ValueHint::DirPath)]
    output_dir: PathBuf,

    /// File name prefix; files are named `<basename>_<n>.png`
    #[arg(long, default_value = "texture")]
    basename: String,

    /// Print every random draw of the run as JSON
    #[arg(long)]
    print_recipe: bool,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match try_main(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<TextureError>() {
                Some(TextureError::InvalidNoiseKind(_)) => {
                    eprintln!("Invalid choice. Please enter 'Perlin' or 'Voronoi'.")
                }
                _ => eprintln!("error: {err}"),
            }
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn try_main(cli: &Cli) -> Result<(), DynError> {
    let pipeline = TexturePipeline::new(load_config(cli)?)?;

    let choice = match &cli.noise {
        Some(noise) => noise.trim().to_string(),
        None => prompt(PROMPT)?,
    };
    let kind: NoiseKind = choice.parse()?;

    info!(%kind, shape = %pipeline.config().shape, "generating texture");
    let texture = pipeline.generate(kind, &RngConfig { seed: cli.seed })?;

    std::fs::create_dir_all(&cli.output_dir)?;
    let path = unique_path(&cli.output_dir, &cli.basename, "png")?;
    export_png(
        &texture.field,
        &texture.colormap,
        &path,
        &ExportOptions::default(),
    )?;

    if cli.print_recipe {
        println!("{}", serde_json::to_string_pretty(&texture.recipe)?);
    }
    println!("The image has been saved here: {}", path.display());
    Ok(())
}

/// Reads the config file, if any, and applies command-line overrides.
fn load_config(cli: &Cli) -> Result<TextureConfig, TextureError> {
    let mut config = match &cli.config {
        Some(path) => TextureConfig::from_file(path)?,
        None => TextureConfig::default(),
    };
    if let Some(width) = cli.width {
        config.shape.width = width;
    }
    if let Some(height) = cli.height {
        config.shape.height = height;
    }
    if let Some(scale) = cli.scale {
        config.perlin_scale = scale;
    }
    Ok(config)
}

fn prompt(question: &str) -> io::Result<String> {
    let mut stdout = io::stdout();
    stdout.write_all(question.as_bytes())?;
    stdout.flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(answer.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rhizome_grain_texture::Shape;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_overrides_apply() {
        let cli = Cli::try_parse_from([
            "grain", "-n", "Perlin", "--width", "128", "--height", "64", "--scale", "4",
        ])
        .unwrap();
        let config = load_config(&cli).unwrap();
        assert_eq!(config.shape, Shape::new(64, 128));
        assert_eq!(config.perlin_scale, 4.0);
        assert_eq!(cli.noise.as_deref(), Some("Perlin"));
        assert_eq!(cli.basename, "texture");
    }

    #[test]
    fn test_config_file_then_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grain.json");
        std::fs::write(&path, r#"{ "shape": { "height": 10, "width": 20 } }"#).unwrap();

        let args: Vec<std::ffi::OsString> = vec![
            "grain".into(),
            "--config".into(),
            path.into_os_string(),
            "--height".into(),
            "30".into(),
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        let config = load_config(&cli).unwrap();
        assert_eq!(config.shape, Shape::new(30, 20));
    }

    #[test]
    fn test_oversized_dimensions_rejected() {
        let huge = (usize::MAX / 2).to_string();
        let cli = Cli::try_parse_from(["grain", "--width", huge.as_str(), "--height", "3"]).unwrap();
        let config = load_config(&cli).unwrap();
        assert!(matches!(
            TexturePipeline::new(config),
            Err(TextureError::ParameterOutOfRange { name: "shape", .. })
        ));
    }

    #[test]
    fn test_missing_config_file() {
        let cli = Cli::try_parse_from(["grain", "--config", "/nonexistent/grain.json"]).unwrap();
        assert!(matches!(load_config(&cli), Err(TextureError::Io(_))));
    }
}
