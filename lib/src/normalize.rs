use itertools::{Itertools, MinMaxResult};

use crate::{model::Activation, Error, Result};

/// Linear map between a source range and a target range, usable in both directions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalizer {
  source_low: f64,
  source_high: f64,
  target_low: f64,
  target_high: f64,
}

impl Normalizer {
  pub fn fit(source_low: f64, source_high: f64, target_low: f64, target_high: f64) -> Result<Self> {
    if source_high == source_low {
      return Err(Error::DegenerateRange {
        low: source_low,
        high: source_high,
      });
    }
    if target_high == target_low {
      return Err(Error::DegenerateRange {
        low: target_low,
        high: target_high,
      });
    }
    Ok(Self {
      source_low,
      source_high,
      target_low,
      target_high,
    })
  }

  /// Fits the series min/max onto the activation's saturation bounds, pulled inward by `margin`
  /// on both sides so unseen extremes still land inside the non-saturated region.
  pub fn for_series(series: &[f64], activation: Activation, margin: f64) -> Result<Self> {
    let (low, high) = match series.iter().copied().minmax_by(f64::total_cmp) {
      MinMaxResult::MinMax(low, high) => (low, high),
      MinMaxResult::OneElement(value) => (value, value),
      MinMaxResult::NoElements => return Err(Error::EmptyDataset),
    };
    let (target_low, target_high) = activation.saturation_bounds();
    Self::fit(low, high, target_low + margin, target_high - margin)
  }

  pub fn forward(&self, x: f64) -> f64 {
    self.target_low
      + (self.target_high - self.target_low) * (x - self.source_low)
        / (self.source_high - self.source_low)
  }

  pub fn inverse(&self, y: f64) -> f64 {
    self.source_low
      + (self.source_high - self.source_low) * (y - self.target_low)
        / (self.target_high - self.target_low)
  }

  pub fn forward_all(&self, values: &[f64]) -> Vec<f64> {
    values.iter().map(|&x| self.forward(x)).collect()
  }

  pub fn inverse_all(&self, values: &[f64]) -> Vec<f64> {
    values.iter().map(|&y| self.inverse(y)).collect()
  }

  pub fn target_range(&self) -> (f64, f64) {
    (self.target_low, self.target_high)
  }
}
