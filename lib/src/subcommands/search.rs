use std::path::{Path, PathBuf};

use itertools::Itertools;

use crate::{
  config::Settings,
  model::FeedForwardBuilder,
  search::{SearchDriver, StatisticsTable, StepOutcome},
  series::read_series,
  Result,
};

/// Endless random search over one series.
pub struct Search {
  series: Vec<f64>,
  settings: Settings,
  seed: Option<u64>,
  max_configurations: Option<usize>,
  statistics_path: Option<PathBuf>,
}

impl Search {
  pub fn new(
    series_path: &Path,
    settings: Settings,
    seed: Option<u64>,
    max_configurations: Option<usize>,
    statistics_path: Option<&Path>,
  ) -> Result<Self> {
    Ok(Self::from_series(read_series(series_path)?, settings, seed, max_configurations)
      .with_statistics_path(statistics_path))
  }

  pub fn from_series(
    series: Vec<f64>,
    settings: Settings,
    seed: Option<u64>,
    max_configurations: Option<usize>,
  ) -> Self {
    Self {
      series,
      settings,
      seed,
      max_configurations,
      statistics_path: None,
    }
  }

  fn with_statistics_path(mut self, path: Option<&Path>) -> Self {
    self.statistics_path = path.map(PathBuf::from);
    self
  }

  /// Returns only when `max_configurations` configurations were tried.
  pub fn run(self) -> Result<StatisticsTable> {
    let mut rng = super::make_rng(self.seed);
    let builder = FeedForwardBuilder::new(self.settings.activation);
    let mut driver = SearchDriver::new(self.series, builder, self.settings)?;
    if let Some(path) = self.statistics_path {
      driver = driver.with_statistics_path(path);
    }

    driver.run(&mut rng, self.max_configurations, print_outcome)?;
    Ok(driver.table().clone())
  }
}

fn print_outcome(outcome: &StepOutcome) {
  match outcome {
    StepOutcome::Recorded {
      parameters,
      mean_test_error,
      forecast,
    } => {
      println!("Parameters: {parameters}");
      println!("Average Error: {mean_test_error}");
      println!("Forecast: [{}]", forecast.iter().join(", "));
    }
    StepOutcome::Discarded { parameters, reason } => {
      println!("Parameters: {parameters}");
      println!("Discarded: {reason}");
    }
  }
}
