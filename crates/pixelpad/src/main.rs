mod image_io;
mod script;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use pixelpad_config::AppConfig;
use pixelpad_core::EditorSession;

use crate::script::Step;

/// Applies reversible color adjustments to an image.
#[derive(Parser, Debug)]
#[command(name = "pixelpad", version, about)]
struct Cli {
    /// Image to edit (PNG or JPEG).
    input: PathBuf,

    /// Where to write the result. Defaults to `<input>-edited.<format>`.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Edit step, repeatable: brightness=N, contrast=N, saturation=N, hue=DEG,
    /// rgb=R,G,B, auto-enhance, undo, redo, seal, group=LABEL, end-group.
    #[arg(short = 's', long = "step", value_name = "STEP")]
    steps: Vec<Step>,

    /// Config file to use instead of the default location.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the history as JSON after running the steps.
    #[arg(long)]
    describe: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(AppConfig::config_path);
    let config = AppConfig::load_or_create(&config_path);

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting pixelpad with config {}", config_path.display());

    let buffer = image_io::load(&cli.input)?;
    let (width, height) = buffer.dimensions();
    tracing::info!("Loaded {} ({width}x{height})", cli.input.display());

    let mut session = EditorSession::with_settings(buffer, &config.history);
    script::run(&mut session, &cli.steps)?;

    let output = cli
        .output
        .unwrap_or_else(|| image_io::default_output_path(&cli.input, &config.default_output_format));
    image_io::save(&output, &session.snapshot())?;
    tracing::info!("Wrote {}", output.display());

    if cli.describe {
        let json = serde_json::to_string_pretty(&session.summaries())
            .context("serialize history summaries")?;
        println!("{json}");
    }

    Ok(())
}
