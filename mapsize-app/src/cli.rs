use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use mapsize_experiment::ExperimentConfig;

#[derive(Parser, Debug)]
#[command(name = "mapsize")]
#[command(about = "Map size judgment experiment: reference map, altered map, bigger or smaller?")]
pub struct Cli {
    /// JSON file overriding presentation constants (sizes, timings, keys, trial count)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Map image shown as the stimulus
    #[arg(long, default_value = "assets/us-map.png")]
    pub map: PathBuf,

    /// TrueType font for the text screens
    #[arg(long, default_value = "assets/DejaVuSans.ttf")]
    pub font: PathBuf,

    /// Directory the results CSV is written to
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Run in a window instead of borderless fullscreen
    #[arg(long)]
    pub windowed: bool,
}

/// Everything the app needs, resolved from the command line.
#[derive(Debug, Clone)]
pub struct Settings {
    pub experiment: ExperimentConfig,
    pub map: PathBuf,
    pub font: PathBuf,
    pub output_dir: PathBuf,
    pub fullscreen: bool,
}

impl Cli {
    pub fn into_settings(self) -> Result<Settings> {
        let experiment = match &self.config {
            Some(path) => ExperimentConfig::load(path)
                .with_context(|| format!("loading experiment config {}", path.display()))?,
            None => ExperimentConfig::default(),
        };
        Ok(Settings {
            experiment,
            map: self.map,
            font: self.font,
            output_dir: self.output_dir,
            fullscreen: !self.windowed,
        })
    }
}
