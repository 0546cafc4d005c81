use std::{
  fmt,
  hash::{Hash, Hasher},
};

use itertools::Itertools;
use rand::Rng;
use serde::Serialize;

use crate::{Error, Result};

pub const MIN_HIDDEN_NUMBER: usize = 1;
pub const MAX_HIDDEN_NUMBER: usize = 10;
pub const MIN_HIDDEN_LENGTH: usize = 1;
pub const MAX_HIDDEN_LENGTH: usize = 100;

/// One point of the search space.
///
/// Used as a map key, so equality and hashing are structural. The training fraction is
/// compared through its bit pattern.
#[derive(Debug, Clone, Serialize)]
pub struct HyperParameters {
  pub lag_length: usize,
  pub lead_length: usize,
  pub hidden_layer_sizes: Vec<usize>,
  pub training_fraction: f64,
}

impl HyperParameters {
  pub fn testing_fraction(&self) -> f64 {
    1.0 - self.training_fraction
  }

  /// Checks the configuration against a series of `series_len` values.
  pub fn validate(&self, series_len: usize) -> Result<()> {
    if self.lag_length == 0
      || self.lead_length == 0
      || self.lag_length + self.lead_length >= series_len
    {
      return Err(Error::InvalidSample {
        lag: self.lag_length,
        lead: self.lead_length,
        len: series_len,
      });
    }
    if self.hidden_layer_sizes.iter().any(|&size| size == 0) {
      return Err(Error::InvalidSearchSpace(format!(
        "hidden layer sizes must be positive, got {:?}",
        self.hidden_layer_sizes
      )));
    }
    if !(0.0..1.0).contains(&self.training_fraction) {
      return Err(Error::InvalidSearchSpace(format!(
        "training fraction {} is outside [0, 1)",
        self.training_fraction
      )));
    }
    Ok(())
  }
}

impl PartialEq for HyperParameters {
  fn eq(&self, other: &Self) -> bool {
    self.lag_length == other.lag_length
      && self.lead_length == other.lead_length
      && self.hidden_layer_sizes == other.hidden_layer_sizes
      && self.training_fraction.to_bits() == other.training_fraction.to_bits()
  }
}

impl Eq for HyperParameters {}

impl Hash for HyperParameters {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.lag_length.hash(state);
    self.lead_length.hash(state);
    self.hidden_layer_sizes.hash(state);
    self.training_fraction.to_bits().hash(state);
  }
}

fn percent(fraction: f64) -> i64 {
  (100.0 * fraction + 0.5) as i64
}

impl fmt::Display for HyperParameters {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "[lag={}, lead={}, hidden=[{}], training={}%, testing={}%]",
      self.lag_length,
      self.lead_length,
      self.hidden_layer_sizes.iter().join(", "),
      percent(self.training_fraction),
      percent(self.testing_fraction())
    )
  }
}

/// Bounds for the randomly drawn hidden layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SearchSpace {
  pub min_hidden_number: usize,
  pub max_hidden_number: usize,
  pub min_hidden_length: usize,
  pub max_hidden_length: usize,
}

impl Default for SearchSpace {
  fn default() -> Self {
    Self {
      min_hidden_number: MIN_HIDDEN_NUMBER,
      max_hidden_number: MAX_HIDDEN_NUMBER,
      min_hidden_length: MIN_HIDDEN_LENGTH,
      max_hidden_length: MAX_HIDDEN_LENGTH,
    }
  }
}

impl SearchSpace {
  pub fn validate(&self) -> Result<()> {
    if self.min_hidden_number == 0 || self.min_hidden_number > self.max_hidden_number {
      return Err(Error::InvalidSearchSpace(format!(
        "hidden layer count bounds {}..={} are invalid",
        self.min_hidden_number, self.max_hidden_number
      )));
    }
    if self.min_hidden_length == 0 || self.min_hidden_length > self.max_hidden_length {
      return Err(Error::InvalidSearchSpace(format!(
        "hidden layer size bounds {}..={} are invalid",
        self.min_hidden_length, self.max_hidden_length
      )));
    }
    Ok(())
  }

  /// Draws a configuration that fits a series of `series_len` values.
  ///
  /// Lag and lead are drawn independently from `1..=series_len` and redrawn until
  /// `lag + lead < series_len`. The draw order (lag, lead, training fraction, layer count,
  /// layer sizes) is fixed so a seeded generator reproduces the same configurations.
  pub fn randomize<R: Rng + ?Sized>(
    &self,
    series_len: usize,
    rng: &mut R,
  ) -> Result<HyperParameters> {
    if series_len < 3 {
      return Err(Error::SeriesTooShort(series_len));
    }
    self.validate()?;

    let (lag_length, lead_length) = loop {
      let lag = rng.gen_range(1..=series_len);
      let lead = rng.gen_range(1..=series_len);
      if lag + lead < series_len {
        break (lag, lead);
      }
    };
    let training_fraction: f64 = rng.gen();
    let count = rng.gen_range(self.min_hidden_number..=self.max_hidden_number);
    let hidden_layer_sizes = (0..count)
      .map(|_| rng.gen_range(self.min_hidden_length..=self.max_hidden_length))
      .collect();

    Ok(HyperParameters {
      lag_length,
      lead_length,
      hidden_layer_sizes,
      training_fraction,
    })
  }
}
