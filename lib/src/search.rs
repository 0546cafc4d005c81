use std::{
  collections::{HashMap, HashSet},
  path::{Path, PathBuf},
};

use rand::Rng;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::{
  config::Settings, experiment::Experiment, model::NetworkBuilder, params::HyperParameters,
  utils::serialize_to_file, Result,
};

/// Mean testing error per configuration. Keys are unique.
#[derive(Debug, Clone, Default)]
pub struct StatisticsTable {
  entries: HashMap<HyperParameters, f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatisticsEntry<'a> {
  pub parameters: &'a HyperParameters,
  pub mean_test_error: f64,
}

impl StatisticsTable {
  pub fn insert(&mut self, parameters: HyperParameters, mean_test_error: f64) -> Option<f64> {
    self.entries.insert(parameters, mean_test_error)
  }

  pub fn get(&self, parameters: &HyperParameters) -> Option<f64> {
    self.entries.get(parameters).copied()
  }

  pub fn contains(&self, parameters: &HyperParameters) -> bool {
    self.entries.contains_key(parameters)
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Lowest mean error recorded so far.
  pub fn best(&self) -> Option<(&HyperParameters, f64)> {
    self
      .entries
      .iter()
      .map(|(parameters, error)| (parameters, *error))
      .min_by(|a, b| a.1.total_cmp(&b.1))
  }

  /// All entries, best first.
  pub fn ranked(&self) -> Vec<StatisticsEntry<'_>> {
    let mut entries: Vec<StatisticsEntry<'_>> = self
      .entries
      .iter()
      .map(|(parameters, error)| StatisticsEntry {
        parameters,
        mean_test_error: *error,
      })
      .collect();
    entries.sort_by(|a, b| a.mean_test_error.total_cmp(&b.mean_test_error));
    entries
  }

  pub fn save(&self, path: &Path) -> Result<()> {
    serialize_to_file(path, &self.ranked())
  }
}

/// What happened to one sampled configuration.
#[derive(Debug, Clone)]
pub enum StepOutcome {
  Recorded {
    parameters: HyperParameters,
    mean_test_error: f64,
    forecast: Vec<f64>,
  },
  Discarded {
    parameters: HyperParameters,
    reason: String,
  },
}

/// Samples unseen configurations, evaluates them and keeps the statistics.
///
/// Configurations that fail are remembered separately and never sampled again, and never
/// enter the statistics.
pub struct SearchDriver<B: NetworkBuilder + Clone> {
  series: Vec<f64>,
  builder: B,
  settings: Settings,
  table: StatisticsTable,
  rejected: HashSet<HyperParameters>,
  statistics_path: Option<PathBuf>,
}

impl<B: NetworkBuilder + Clone> SearchDriver<B> {
  pub fn new(series: Vec<f64>, builder: B, settings: Settings) -> Result<Self> {
    settings.validate()?;
    Ok(Self {
      series,
      builder,
      settings,
      table: StatisticsTable::default(),
      rejected: HashSet::new(),
      statistics_path: None,
    })
  }

  /// Rewrites the table as JSON at `path` after every recorded configuration.
  pub fn with_statistics_path(mut self, path: PathBuf) -> Self {
    self.statistics_path = Some(path);
    self
  }

  pub fn table(&self) -> &StatisticsTable {
    &self.table
  }

  pub fn rejected(&self) -> &HashSet<HyperParameters> {
    &self.rejected
  }

  /// Draws until the configuration is neither recorded nor rejected.
  pub fn next_parameters<R: Rng>(&self, rng: &mut R) -> Result<HyperParameters> {
    loop {
      let parameters = self.settings.search_space.randomize(self.series.len(), rng)?;
      if !self.table.contains(&parameters) && !self.rejected.contains(&parameters) {
        return Ok(parameters);
      }
    }
  }

  /// Evaluates one configuration. Only sampling errors are returned; a failing experiment
  /// is reported as [`StepOutcome::Discarded`].
  pub fn step<R: Rng>(&mut self, rng: &mut R) -> Result<StepOutcome> {
    let parameters = self.next_parameters(rng)?;
    info!(%parameters, "sampled configuration");
    match self.evaluate(parameters.clone(), rng) {
      Ok((mean_test_error, forecast)) => {
        self.table.insert(parameters.clone(), mean_test_error);
        info!(%parameters, mean_test_error, ?forecast, "configuration recorded");
        if let Some((best, best_error)) = self.table.best() {
          info!(
            parameters = %best,
            mean_test_error = best_error,
            configurations = self.table.len(),
            "best so far"
          );
        }
        if let Some(path) = &self.statistics_path {
          if let Err(error) = self.table.save(path) {
            warn!(%error, "cannot write statistics");
          }
        }
        Ok(StepOutcome::Recorded {
          parameters,
          mean_test_error,
          forecast,
        })
      }
      Err(error) => {
        warn!(%parameters, %error, "configuration discarded");
        self.rejected.insert(parameters.clone());
        Ok(StepOutcome::Discarded {
          parameters,
          reason: error.to_string(),
        })
      }
    }
  }

  /// Runs up to `limit` steps, handing every outcome to `observe`. Without a limit this
  /// never returns.
  #[instrument(skip_all, fields(series = self.series.len()))]
  pub fn run<R, F>(&mut self, rng: &mut R, limit: Option<usize>, mut observe: F) -> Result<()>
  where
    R: Rng,
    F: FnMut(&StepOutcome),
  {
    let mut tried = 0;
    while limit.map_or(true, |limit| tried < limit) {
      let outcome = self.step(rng)?;
      observe(&outcome);
      tried += 1;
    }
    Ok(())
  }

  fn evaluate<R: Rng>(&self, parameters: HyperParameters, rng: &mut R) -> Result<(f64, Vec<f64>)> {
    let mut experiment = Experiment::new(
      parameters,
      &self.series,
      self.builder.clone(),
      &self.settings,
      rng,
    )?;
    let mean = experiment.run(self.settings.experiment_count, rng)?;
    let forecast = experiment.forecast()?;
    Ok((mean, forecast))
  }
}
