use std::time::Duration;

use serde::Serialize;

use crate::{model::Activation, params::SearchSpace, training::TrainingLoop, Error, Result};

/// Trials per configuration.
pub const NUMBER_OF_EXPERIMENTS: usize = 30;

/// Upper bound on the training time of one trial.
pub const MAX_TRAINING_MILLISECONDS: u64 = 10_000;

/// How often training progress is measured.
pub const SINGLE_MEASUREMENT_MILLISECONDS: u64 = 100;

/// Distance kept from each activation saturation bound when normalizing.
pub const NORMALIZATION_MARGIN: f64 = 0.1;

/// Every tunable of an experiment. `Default` holds the compiled-in values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settings {
  pub experiment_count: usize,
  pub time_budget: Duration,
  pub measurement_interval: Duration,
  pub activation: Activation,
  pub margin: f64,
  pub search_space: SearchSpace,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      experiment_count: NUMBER_OF_EXPERIMENTS,
      time_budget: Duration::from_millis(MAX_TRAINING_MILLISECONDS),
      measurement_interval: Duration::from_millis(SINGLE_MEASUREMENT_MILLISECONDS),
      activation: Activation::default(),
      margin: NORMALIZATION_MARGIN,
      search_space: SearchSpace::default(),
    }
  }
}

impl Settings {
  pub fn validate(&self) -> Result<()> {
    if self.experiment_count == 0 {
      return Err(Error::NoTrials);
    }
    let (low, high) = self.activation.saturation_bounds();
    if !(0.0..(high - low) / 2.0).contains(&self.margin) {
      return Err(Error::InvalidSettings(format!(
        "margin {} must be in [0, {}) for {:?}",
        self.margin,
        (high - low) / 2.0,
        self.activation
      )));
    }
    self.search_space.validate()
  }

  pub fn training_loop(&self) -> TrainingLoop {
    TrainingLoop::new(self.time_budget, self.measurement_interval)
  }
}
