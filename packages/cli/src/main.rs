#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for rendering choropleth layers to `GeoJSON`.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use choropleth_map_classify::Classifier;
use choropleth_map_fetch::ArcgisSource;
use choropleth_map_layer::registry::{all_presets, find_preset, load_config};
use choropleth_map_layer::values::{DEFAULT_CODE_COLUMN, DEFAULT_SCORE_COLUMN};
use choropleth_map_layer::{GeoJsonMap, LayerAssembler, ValueTable};
use choropleth_map_models::ChoroplethConfig;
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "choropleth_map", about = "Choropleth map layer renderer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the bundled presets
    Presets,
    /// Fetch geometry, style it, and write the layer as `GeoJSON`
    Render {
        #[command(flatten)]
        input: Input,
        /// Output `GeoJSON` path
        #[arg(long)]
        out: PathBuf,
        /// Override the configured batch size
        #[arg(long)]
        batch_size: Option<usize>,
    },
    /// Print the class breakpoints and colors for a value table
    Breaks {
        #[command(flatten)]
        input: Input,
    },
}

#[derive(Args)]
struct Input {
    /// Bundled preset id (see `presets`)
    #[arg(long, conflicts_with = "config", required_unless_present = "config")]
    preset: Option<String>,
    /// Path to a TOML layer configuration
    #[arg(long)]
    config: Option<PathBuf>,
    /// Values file (`.csv` or `.json`); defaults to the preset's bundled values
    #[arg(long)]
    values: Option<PathBuf>,
    /// CSV column holding region identifiers
    #[arg(long, default_value = DEFAULT_CODE_COLUMN)]
    code_column: String,
    /// CSV column holding values
    #[arg(long, default_value = DEFAULT_SCORE_COLUMN)]
    score_column: String,
}

impl Input {
    fn resolve(&self) -> Result<(ChoroplethConfig, ValueTable), Box<dyn std::error::Error>> {
        let load_values =
            |path: &Path| ValueTable::load(path, &self.code_column, &self.score_column);

        if let Some(id) = &self.preset {
            let preset = find_preset(id)?;
            let table = match &self.values {
                Some(path) => load_values(path)?,
                None => preset.values()?,
            };
            return Ok((preset.config, table));
        }

        let path = self.config.as_deref().ok_or("Either --preset or --config is required")?;
        let config = load_config(path)?;
        let values = self
            .values
            .as_deref()
            .ok_or("--values is required with --config")?;
        Ok((config, load_values(values)?))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Presets => {
            let presets = all_presets();
            println!("{:<34} NAME", "ID");
            println!("{}", "-".repeat(70));
            for preset in &presets {
                println!("{:<34} {}", preset.config.id(), preset.config.name());
            }
        }
        Commands::Render {
            input,
            out,
            batch_size,
        } => {
            let (mut config, table) = input.resolve()?;
            if let Some(size) = batch_size {
                config.batch_size = size;
            }

            let client = reqwest::Client::builder()
                .user_agent(concat!("choropleth_map/", env!("CARGO_PKG_VERSION")))
                .build()?;
            let source = Arc::new(ArcgisSource::new(client, config.endpoint.clone()));
            let assembler = LayerAssembler::new(config, source)?;

            let start = Instant::now();
            let mut map = GeoJsonMap::new();
            let load = assembler.load(&mut map, Arc::new(table))?;
            let report = load.completion.wait().await;

            let collection = map.render()?;
            std::fs::write(&out, serde_json::to_string(&collection)?)?;

            log::info!(
                "Wrote {} features to {} in {:.1}s",
                collection.features.len(),
                out.display(),
                start.elapsed().as_secs_f64()
            );
            println!("{report}");
            for batch in report.failed() {
                println!("  batch {} failed ({} regions)", batch.index, batch.ids.len());
            }
        }
        Commands::Breaks { input } => {
            let (config, table) = input.resolve()?;
            let classifier = Classifier::new(table.values(), config.palette.as_slice())?;

            println!(
                "{}: {} regions, {} with values",
                config.id(),
                table.len(),
                table.values().count()
            );
            for (i, entry) in classifier.legend().iter().enumerate() {
                let lower = entry
                    .lower
                    .map_or_else(|| "-inf".to_string(), |v| format!("{v}"));
                println!("  class {i}: ({lower}, {}] {}", entry.upper, entry.color);
            }
        }
    }

    Ok(())
}
