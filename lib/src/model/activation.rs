use serde::{Deserialize, Serialize};

/// Saturating nonlinearity applied on every non-input layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
  #[default]
  Tanh,
  Sigmoid,
}

impl Activation {
  pub fn apply(self, x: f64) -> f64 {
    match self {
      Activation::Tanh => x.tanh(),
      Activation::Sigmoid => 1.0 / (1.0 + (-x).exp()),
    }
  }

  /// Derivative expressed through the already activated output `y`.
  pub fn derivative_from_output(self, y: f64) -> f64 {
    match self {
      Activation::Tanh => 1.0 - y * y,
      Activation::Sigmoid => y * (1.0 - y),
    }
  }

  /// The asymptotic `(low, high)` outputs.
  pub fn saturation_bounds(self) -> (f64, f64) {
    (self.apply(f64::NEG_INFINITY), self.apply(f64::INFINITY))
  }
}

impl std::str::FromStr for Activation {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "tanh" => Ok(Activation::Tanh),
      "sigmoid" => Ok(Activation::Sigmoid),
      other => Err(format!("unknown activation {other:?}, expected tanh or sigmoid")),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn saturation_bounds() {
    assert_eq!(Activation::Tanh.saturation_bounds(), (-1.0, 1.0));
    assert_eq!(Activation::Sigmoid.saturation_bounds(), (0.0, 1.0));
  }

  #[test]
  fn derivative_matches_finite_difference() {
    for activation in [Activation::Tanh, Activation::Sigmoid] {
      for x in [-1.5, -0.2, 0.0, 0.7] {
        let h = 1e-6;
        let numeric = (activation.apply(x + h) - activation.apply(x - h)) / (2.0 * h);
        let analytic = activation.derivative_from_output(activation.apply(x));
        assert!((numeric - analytic).abs() < 1e-6, "{activation:?} at {x}");
      }
    }
  }

  #[test]
  fn parses_names() {
    assert_eq!("TANH".parse::<Activation>(), Ok(Activation::Tanh));
    assert!("relu".parse::<Activation>().is_err());
  }
}
