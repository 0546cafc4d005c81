use std::{path::Path, time::Duration};

use lagsearch::{Activation, Error, SearchSpace, Settings};
use serde::Deserialize;

/// Overrides for [`Settings`]. Also defines the config file format (Option fields can be omitted).
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
  /// Trials per configuration
  pub experiments: Option<usize>,
  /// Training time of one trial
  pub max_training_ms: Option<u64>,
  /// Progress measurement interval
  pub measurement_ms: Option<u64>,
  pub activation: Option<Activation>,
  /// Distance kept from the activation saturation bounds
  pub margin: Option<f64>,
  pub min_hidden_number: Option<usize>,
  pub max_hidden_number: Option<usize>,
  pub min_hidden_length: Option<usize>,
  pub max_hidden_length: Option<usize>,
}

impl AppConfig {
  pub fn from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path).map_err(|source| Error::Io {
      path: path.to_path_buf(),
      source,
    })?;
    Ok(serde_yaml::from_str(&content)?)
  }

  // merge configs where the second overwrites the first
  pub fn merge(self, other: Self) -> Self {
    Self {
      experiments: other.experiments.or(self.experiments),
      max_training_ms: other.max_training_ms.or(self.max_training_ms),
      measurement_ms: other.measurement_ms.or(self.measurement_ms),
      activation: other.activation.or(self.activation),
      margin: other.margin.or(self.margin),
      min_hidden_number: other.min_hidden_number.or(self.min_hidden_number),
      max_hidden_number: other.max_hidden_number.or(self.max_hidden_number),
      min_hidden_length: other.min_hidden_length.or(self.min_hidden_length),
      max_hidden_length: other.max_hidden_length.or(self.max_hidden_length),
    }
  }

  /// Compiled-in defaults with every set field replaced.
  pub fn into_settings(self) -> Settings {
    let defaults = Settings::default();
    let space = defaults.search_space;
    Settings {
      experiment_count: self.experiments.unwrap_or(defaults.experiment_count),
      time_budget: self
        .max_training_ms
        .map_or(defaults.time_budget, Duration::from_millis),
      measurement_interval: self
        .measurement_ms
        .map_or(defaults.measurement_interval, Duration::from_millis),
      activation: self.activation.unwrap_or(defaults.activation),
      margin: self.margin.unwrap_or(defaults.margin),
      search_space: SearchSpace {
        min_hidden_number: self.min_hidden_number.unwrap_or(space.min_hidden_number),
        max_hidden_number: self.max_hidden_number.unwrap_or(space.max_hidden_number),
        min_hidden_length: self.min_hidden_length.unwrap_or(space.min_hidden_length),
        max_hidden_length: self.max_hidden_length.unwrap_or(space.max_hidden_length),
      },
    }
  }
}
