mod activation;
pub mod feed_forward;

pub use activation::Activation;
pub use feed_forward::{FeedForward, FeedForwardBuilder};

use rand::RngCore;
use tracing::debug;

use crate::{params::HyperParameters, window::Example, Error, Result};

/// What the search needs from a trainable network. Anything gradient based fits behind it.
pub trait Network {
  /// Replaces every weight with a fresh random value.
  fn initialize_weights(&mut self, rng: &mut dyn RngCore);

  /// One optimizer iteration over `set`. Returns the error measured during the iteration.
  fn train_step(&mut self, set: &[Example]) -> Result<f64>;

  /// Mean squared error over `set`. The set must not be empty.
  fn evaluate(&self, set: &[Example]) -> Result<f64>;

  /// Forward pass only.
  fn predict(&self, window: &[f64]) -> Result<Vec<f64>>;
}

/// Creates the network for a configuration: `lag_length` inputs, one layer per hidden size,
/// `lead_length` outputs.
pub trait NetworkBuilder {
  type Network: Network;

  fn build(&self, params: &HyperParameters) -> Result<Self::Network>;
}

/// The network of one experiment. Rebuilt on every `initialize`.
pub struct ForecastModel<B: NetworkBuilder> {
  builder: B,
  params: HyperParameters,
  network: Option<B::Network>,
}

impl<B: NetworkBuilder> ForecastModel<B> {
  pub fn new(builder: B, params: HyperParameters) -> Self {
    Self {
      builder,
      params,
      network: None,
    }
  }

  pub fn params(&self) -> &HyperParameters {
    &self.params
  }

  pub fn is_initialized(&self) -> bool {
    self.network.is_some()
  }

  /// Builds a fresh network with random weights and runs a throwaway step on an empty
  /// dataset, so one-time setup cost does not land inside the timed training.
  pub fn initialize(&mut self, rng: &mut dyn RngCore) -> Result<()> {
    let mut network = self.builder.build(&self.params)?;
    network.initialize_weights(rng);
    if let Err(error) = network.train_step(&[]) {
      debug!(%error, "warm-up step failed, ignoring");
    }
    self.network = Some(network);
    Ok(())
  }

  pub fn train_step(&mut self, set: &[Example]) -> Result<f64> {
    self.network.as_mut().ok_or(Error::Uninitialized)?.train_step(set)
  }

  pub fn evaluate(&self, set: &[Example]) -> Result<f64> {
    self.network.as_ref().ok_or(Error::Uninitialized)?.evaluate(set)
  }

  pub fn predict(&self, window: &[f64]) -> Result<Vec<f64>> {
    self.network.as_ref().ok_or(Error::Uninitialized)?.predict(window)
  }
}

#[cfg(test)]
pub(crate) mod testing {
  use std::{
    cell::{Cell, RefCell},
    rc::Rc,
  };

  use super::*;

  /// Network double. Each `build` takes the next scripted evaluation result; an `Err`
  /// makes every evaluation of that network fail.
  #[derive(Clone, Default)]
  pub(crate) struct ScriptedBuilder {
    pub errors: Rc<RefCell<Vec<std::result::Result<f64, String>>>>,
    pub builds: Rc<Cell<usize>>,
    pub steps: Rc<Cell<usize>>,
  }

  impl ScriptedBuilder {
    pub(crate) fn new(errors: Vec<std::result::Result<f64, String>>) -> Self {
      Self {
        errors: Rc::new(RefCell::new(errors)),
        ..Self::default()
      }
    }
  }

  pub(crate) struct ScriptedNetwork {
    error: std::result::Result<f64, String>,
    lead_length: usize,
    steps: Rc<Cell<usize>>,
  }

  impl NetworkBuilder for ScriptedBuilder {
    type Network = ScriptedNetwork;

    fn build(&self, params: &HyperParameters) -> Result<ScriptedNetwork> {
      self.builds.set(self.builds.get() + 1);
      let mut errors = self.errors.borrow_mut();
      let error = if errors.is_empty() { Ok(0.5) } else { errors.remove(0) };
      Ok(ScriptedNetwork {
        error,
        lead_length: params.lead_length,
        steps: self.steps.clone(),
      })
    }
  }

  impl Network for ScriptedNetwork {
    fn initialize_weights(&mut self, _rng: &mut dyn RngCore) {}

    fn train_step(&mut self, set: &[Example]) -> Result<f64> {
      if set.is_empty() {
        return Err(Error::EmptyDataset);
      }
      self.steps.set(self.steps.get() + 1);
      Ok(0.5)
    }

    fn evaluate(&self, set: &[Example]) -> Result<f64> {
      if set.is_empty() {
        return Err(Error::EmptyDataset);
      }
      self.error.clone().map_err(Error::OptimizerFailure)
    }

    fn predict(&self, window: &[f64]) -> Result<Vec<f64>> {
      let last = window.last().copied().unwrap_or(0.0);
      Ok(vec![last; self.lead_length])
    }
  }
}
