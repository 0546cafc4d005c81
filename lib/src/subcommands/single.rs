use std::path::Path;

use itertools::Itertools;
use tracing::info;

use crate::{
  config::Settings,
  experiment::Experiment,
  model::FeedForwardBuilder,
  params::HyperParameters,
  series::read_series,
  Result,
};

/// Result of evaluating one configuration.
#[derive(Debug, Clone)]
pub struct SingleOutcome {
  pub parameters: HyperParameters,
  pub mean_test_error: f64,
  pub forecast: Vec<f64>,
}

/// One configuration, sampled or given, evaluated over the configured number of trials.
/// Any failure ends the run.
pub struct Single {
  series: Vec<f64>,
  settings: Settings,
  seed: Option<u64>,
  parameters: Option<HyperParameters>,
}

impl Single {
  pub fn new(
    series_path: &Path,
    settings: Settings,
    seed: Option<u64>,
    parameters: Option<HyperParameters>,
  ) -> Result<Self> {
    Ok(Self::from_series(read_series(series_path)?, settings, seed, parameters))
  }

  pub fn from_series(
    series: Vec<f64>,
    settings: Settings,
    seed: Option<u64>,
    parameters: Option<HyperParameters>,
  ) -> Self {
    Self {
      series,
      settings,
      seed,
      parameters,
    }
  }

  pub fn run(self) -> Result<SingleOutcome> {
    self.settings.validate()?;
    let mut rng = super::make_rng(self.seed);
    let parameters = match self.parameters {
      Some(parameters) => parameters,
      None => self.settings.search_space.randomize(self.series.len(), &mut rng)?,
    };
    println!("Parameters: {parameters}");

    let builder = FeedForwardBuilder::new(self.settings.activation);
    let mut experiment = Experiment::new(
      parameters.clone(),
      &self.series,
      builder,
      &self.settings,
      &mut rng,
    )?;
    let mean_test_error = experiment.run(self.settings.experiment_count, &mut rng)?;
    let forecast = experiment.forecast()?;
    info!(%parameters, mean_test_error, "single configuration finished");
    println!("Average Error: {mean_test_error}");
    println!("Forecast: [{}]", forecast.iter().join(", "));

    Ok(SingleOutcome {
      parameters,
      mean_test_error,
      forecast,
    })
  }
}
