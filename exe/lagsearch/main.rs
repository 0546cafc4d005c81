mod app_config;

use std::{error::Error, path::PathBuf};

use app_config::AppConfig;
use clap::{Args, Parser, Subcommand};
use lagsearch::{subcommands, utils, Activation, HyperParameters, Settings};
use tracing::info;

#[derive(Parser)]
#[command(version, about = "Random search over lag/lead forecasting networks")]
struct Cli {
  #[command(subcommand)]
  command: Command,
}

#[derive(Args)]
struct Common {
  /// Comma-separated series of numbers
  #[arg(short, long, value_name = "PATH")]
  series: PathBuf,
  /// YAML file with setting overrides
  #[arg(short, long, value_name = "PATH")]
  config: Option<PathBuf>,
  /// Seed for every random choice; entropy when omitted
  #[arg(long, value_name = "INT")]
  seed: Option<u64>,
  /// Trials per configuration
  #[arg(long, value_name = "INT")]
  experiments: Option<usize>,
  /// Training time of one trial in milliseconds
  #[arg(long, value_name = "MS")]
  max_training_ms: Option<u64>,
  /// Progress measurement interval in milliseconds
  #[arg(long, value_name = "MS")]
  measurement_ms: Option<u64>,
  /// tanh or sigmoid
  #[arg(long)]
  activation: Option<Activation>,
  #[arg(long)]
  margin: Option<f64>,
}

impl Common {
  fn settings(&self) -> Result<Settings, Box<dyn Error>> {
    let file = match &self.config {
      Some(path) => AppConfig::from_file(path)?,
      None => AppConfig::default(),
    };
    let cli = AppConfig {
      experiments: self.experiments,
      max_training_ms: self.max_training_ms,
      measurement_ms: self.measurement_ms,
      activation: self.activation,
      margin: self.margin,
      ..AppConfig::default()
    };
    let settings = file.merge(cli).into_settings();
    settings.validate()?;
    Ok(settings)
  }
}

#[derive(Subcommand)]
enum Command {
  /// Sample and evaluate configurations until interrupted
  Search {
    #[command(flatten)]
    common: Common,
    /// Stop after this many configurations
    #[arg(long, value_name = "INT")]
    max_configurations: Option<usize>,
    /// Rewrite the ranked statistics here as JSON after every configuration
    #[arg(long, value_name = "PATH")]
    statistics: Option<PathBuf>,
  },
  /// Evaluate one configuration; unset fields are sampled
  Single {
    #[command(flatten)]
    common: Common,
    #[arg(long)]
    lag: Option<usize>,
    #[arg(long)]
    lead: Option<usize>,
    /// Hidden layer sizes, e.g. 8,4
    #[arg(long, value_delimiter = ',')]
    hidden: Option<Vec<usize>>,
    /// Fraction of windows used for training
    #[arg(long)]
    training: Option<f64>,
  },
}

fn main() -> Result<(), Box<dyn Error>> {
  utils::init_logging()?;
  let args = Cli::parse();

  match args.command {
    Command::Search {
      common,
      max_configurations,
      statistics,
    } => {
      let settings = common.settings()?;
      let app = subcommands::Search::new(
        &common.series,
        settings,
        common.seed,
        max_configurations,
        statistics.as_deref(),
      )?;
      let table = app.run()?;
      if let Some((parameters, error)) = table.best() {
        info!(%parameters, mean_test_error = error, "best configuration");
      }
    }
    Command::Single {
      common,
      lag,
      lead,
      hidden,
      training,
    } => {
      let settings = common.settings()?;
      let parameters = explicit_parameters(lag, lead, hidden, training)?;
      let app = subcommands::Single::new(&common.series, settings, common.seed, parameters)?;
      app.run()?;
    }
  }
  Ok(())
}

/// All four fields or none.
fn explicit_parameters(
  lag: Option<usize>,
  lead: Option<usize>,
  hidden: Option<Vec<usize>>,
  training: Option<f64>,
) -> Result<Option<HyperParameters>, Box<dyn Error>> {
  match (lag, lead, hidden, training) {
    (None, None, None, None) => Ok(None),
    (Some(lag_length), Some(lead_length), Some(hidden_layer_sizes), Some(training_fraction)) => {
      Ok(Some(HyperParameters {
        lag_length,
        lead_length,
        hidden_layer_sizes,
        training_fraction,
      }))
    }
    _ => Err("--lag, --lead, --hidden and --training must be given together".into()),
  }
}
