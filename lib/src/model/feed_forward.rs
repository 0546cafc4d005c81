//! Fully connected perceptron trained with resilient propagation (iRPROP-).
//!
//! Every non-input layer has a bias and the same activation. Training is full batch: one
//! `train_step` accumulates the gradient over the whole set, then adapts each weight by its
//! own step size, using only the sign of the gradient.

use rand::{Rng, RngCore};

use super::{Activation, Network, NetworkBuilder};
use crate::{params::HyperParameters, window::Example, Error, Result};

const ETA_PLUS: f64 = 1.2;
const ETA_MINUS: f64 = 0.5;
const DELTA_INITIAL: f64 = 0.1;
const DELTA_MIN: f64 = 1e-6;
const DELTA_MAX: f64 = 50.0;

/// Weights between two layers, row-major `outputs x (inputs + 1)`, bias in the last column.
#[derive(Debug, Clone)]
struct Layer {
  inputs: usize,
  outputs: usize,
  weights: Vec<f64>,
}

impl Layer {
  fn new(inputs: usize, outputs: usize) -> Self {
    Self {
      inputs,
      outputs,
      weights: vec![0.0; outputs * (inputs + 1)],
    }
  }

  fn stride(&self) -> usize {
    self.inputs + 1
  }

  fn forward(&self, input: &[f64], activation: Activation, output: &mut Vec<f64>) {
    output.clear();
    let stride = self.stride();
    for row in self.weights.chunks_exact(stride) {
      let (w, bias) = row.split_at(self.inputs);
      let net: f64 = w.iter().zip(input).map(|(w, x)| w * x).sum::<f64>() + bias[0];
      output.push(activation.apply(net));
    }
  }
}

#[derive(Debug, Clone)]
pub struct FeedForward {
  activation: Activation,
  layers: Vec<Layer>,
  // per weight optimizer state, same layout as the layers
  deltas: Vec<Vec<f64>>,
  previous_gradients: Vec<Vec<f64>>,
}

impl FeedForward {
  /// `widths` lists every layer including input and output.
  pub fn new(widths: &[usize], activation: Activation) -> Result<Self> {
    if widths.len() < 2 || widths.iter().any(|&w| w == 0) {
      return Err(Error::InvalidSearchSpace(format!(
        "cannot build a network with layer widths {widths:?}"
      )));
    }
    let layers: Vec<Layer> = widths.windows(2).map(|w| Layer::new(w[0], w[1])).collect();
    let deltas = layers.iter().map(|l| vec![DELTA_INITIAL; l.weights.len()]).collect();
    let previous_gradients = layers.iter().map(|l| vec![0.0; l.weights.len()]).collect();
    Ok(Self {
      activation,
      layers,
      deltas,
      previous_gradients,
    })
  }

  pub fn input_width(&self) -> usize {
    self.layers[0].inputs
  }

  pub fn output_width(&self) -> usize {
    self.layers[self.layers.len() - 1].outputs
  }

  pub fn weight_count(&self) -> usize {
    self.layers.iter().map(|l| l.weights.len()).sum()
  }

  fn check_input(&self, window: &[f64]) -> Result<()> {
    if window.len() != self.input_width() {
      return Err(Error::ShapeMismatch {
        expected: self.input_width(),
        got: window.len(),
      });
    }
    Ok(())
  }

  fn check_example(&self, example: &Example) -> Result<()> {
    self.check_input(&example.lag)?;
    if example.lead.len() != self.output_width() {
      return Err(Error::ShapeMismatch {
        expected: self.output_width(),
        got: example.lead.len(),
      });
    }
    Ok(())
  }

  /// Outputs of every layer, input first.
  fn activations(&self, window: &[f64]) -> Vec<Vec<f64>> {
    let mut activations = Vec::with_capacity(self.layers.len() + 1);
    activations.push(window.to_vec());
    for layer in &self.layers {
      let mut output = Vec::with_capacity(layer.outputs);
      layer.forward(&activations[activations.len() - 1], self.activation, &mut output);
      activations.push(output);
    }
    activations
  }

  /// Accumulates dE/dw over `set` into `gradients` and returns the squared error sum.
  fn accumulate_gradients(&self, set: &[Example], gradients: &mut [Vec<f64>]) -> Result<f64> {
    let mut squared_error = 0.0;
    for example in set {
      self.check_example(example)?;
      let activations = self.activations(&example.lag);
      let output = &activations[activations.len() - 1];

      let mut deltas: Vec<f64> = output
        .iter()
        .zip(&example.lead)
        .map(|(&actual, &ideal)| {
          squared_error += (actual - ideal) * (actual - ideal);
          (actual - ideal) * self.activation.derivative_from_output(actual)
        })
        .collect();

      for (index, layer) in self.layers.iter().enumerate().rev() {
        let input = &activations[index];
        let stride = layer.stride();
        let layer_gradients = &mut gradients[index];
        for (o, delta) in deltas.iter().enumerate() {
          let row = &mut layer_gradients[o * stride..(o + 1) * stride];
          for (i, x) in input.iter().enumerate() {
            row[i] += delta * x;
          }
          row[layer.inputs] += delta;
        }
        if index == 0 {
          break;
        }
        deltas = (0..layer.inputs)
          .map(|i| {
            let back: f64 = deltas
              .iter()
              .enumerate()
              .map(|(o, delta)| delta * layer.weights[o * stride + i])
              .sum();
            back * self.activation.derivative_from_output(input[i])
          })
          .collect();
      }
    }
    Ok(squared_error)
  }

  fn update_weights(&mut self, gradients: &[Vec<f64>]) {
    for (index, layer) in self.layers.iter_mut().enumerate() {
      let deltas = &mut self.deltas[index];
      let previous = &mut self.previous_gradients[index];
      for (w, weight) in layer.weights.iter_mut().enumerate() {
        let gradient = gradients[index][w];
        let change = gradient * previous[w];
        if change > 0.0 {
          deltas[w] = (deltas[w] * ETA_PLUS).min(DELTA_MAX);
        } else if change < 0.0 {
          deltas[w] = (deltas[w] * ETA_MINUS).max(DELTA_MIN);
          previous[w] = 0.0;
          continue;
        }
        if gradient != 0.0 {
          *weight -= gradient.signum() * deltas[w];
        }
        previous[w] = gradient;
      }
    }
  }

  fn mean_squared_error(&self, squared_error: f64, examples: usize) -> f64 {
    squared_error / (examples * self.output_width()) as f64
  }
}

impl Network for FeedForward {
  fn initialize_weights(&mut self, rng: &mut dyn RngCore) {
    for layer in &mut self.layers {
      for weight in &mut layer.weights {
        *weight = rng.gen_range(-1.0..1.0);
      }
    }
    for deltas in &mut self.deltas {
      deltas.iter_mut().for_each(|d| *d = DELTA_INITIAL);
    }
    for previous in &mut self.previous_gradients {
      previous.iter_mut().for_each(|g| *g = 0.0);
    }
  }

  fn train_step(&mut self, set: &[Example]) -> Result<f64> {
    if set.is_empty() {
      return Err(Error::EmptyDataset);
    }
    let mut gradients: Vec<Vec<f64>> =
      self.layers.iter().map(|l| vec![0.0; l.weights.len()]).collect();
    let squared_error = self.accumulate_gradients(set, &mut gradients)?;
    let error = self.mean_squared_error(squared_error, set.len());
    if !error.is_finite() {
      return Err(Error::OptimizerFailure(format!("training error became {error}")));
    }
    self.update_weights(&gradients);
    Ok(error)
  }

  fn evaluate(&self, set: &[Example]) -> Result<f64> {
    if set.is_empty() {
      return Err(Error::EmptyDataset);
    }
    let mut squared_error = 0.0;
    for example in set {
      self.check_example(example)?;
      let output = self.predict(&example.lag)?;
      squared_error += output
        .iter()
        .zip(&example.lead)
        .map(|(a, b)| (a - b) * (a - b))
        .sum::<f64>();
    }
    let error = self.mean_squared_error(squared_error, set.len());
    if !error.is_finite() {
      return Err(Error::OptimizerFailure(format!("evaluation error became {error}")));
    }
    Ok(error)
  }

  fn predict(&self, window: &[f64]) -> Result<Vec<f64>> {
    self.check_input(window)?;
    let mut activations = self.activations(window);
    Ok(activations.pop().unwrap_or_default())
  }
}

/// Builds a [`FeedForward`] network for each configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeedForwardBuilder {
  pub activation: Activation,
}

impl FeedForwardBuilder {
  pub fn new(activation: Activation) -> Self {
    Self { activation }
  }
}

impl NetworkBuilder for FeedForwardBuilder {
  type Network = FeedForward;

  fn build(&self, params: &HyperParameters) -> Result<FeedForward> {
    let mut widths = Vec::with_capacity(params.hidden_layer_sizes.len() + 2);
    widths.push(params.lag_length);
    widths.extend_from_slice(&params.hidden_layer_sizes);
    widths.push(params.lead_length);
    FeedForward::new(&widths, self.activation)
  }
}

#[cfg(test)]
mod tests {
  use rand::{rngs::StdRng, SeedableRng};

  use super::*;

  fn xor_like() -> Vec<Example> {
    [(-0.8, -0.8, -0.8), (-0.8, 0.8, 0.8), (0.8, -0.8, 0.8), (0.8, 0.8, -0.8)]
      .iter()
      .map(|&(a, b, y)| Example {
        lag: vec![a, b],
        lead: vec![y],
      })
      .collect()
  }

  #[test]
  fn builder_uses_configuration_widths() {
    let params = HyperParameters {
      lag_length: 4,
      lead_length: 2,
      hidden_layer_sizes: vec![3, 5],
      training_fraction: 0.5,
    };
    let network = FeedForwardBuilder::default().build(&params).unwrap();
    assert_eq!(network.input_width(), 4);
    assert_eq!(network.output_width(), 2);
    assert_eq!(network.weight_count(), 3 * 5 + 5 * 4 + 2 * 6);
  }

  #[test]
  fn rejects_zero_width_layers() {
    assert!(matches!(
      FeedForward::new(&[2, 0, 1], Activation::Tanh),
      Err(Error::InvalidSearchSpace(_))
    ));
    assert!(matches!(
      FeedForward::new(&[2], Activation::Tanh),
      Err(Error::InvalidSearchSpace(_))
    ));
  }

  #[test]
  fn predict_checks_shape() {
    let network = FeedForward::new(&[2, 3, 1], Activation::Tanh).unwrap();
    assert!(matches!(
      network.predict(&[1.0]),
      Err(Error::ShapeMismatch { expected: 2, got: 1 })
    ));
    assert_eq!(network.predict(&[0.1, 0.2]).unwrap().len(), 1);
  }

  #[test]
  fn empty_sets_are_refused() {
    let mut network = FeedForward::new(&[2, 3, 1], Activation::Tanh).unwrap();
    assert!(matches!(network.train_step(&[]), Err(Error::EmptyDataset)));
    assert!(matches!(network.evaluate(&[]), Err(Error::EmptyDataset)));
  }

  #[test]
  fn training_reduces_error() {
    let set = xor_like();
    let mut network = FeedForward::new(&[2, 6, 1], Activation::Tanh).unwrap();
    network.initialize_weights(&mut StdRng::seed_from_u64(11));
    let before = network.evaluate(&set).unwrap();
    for _ in 0..500 {
      network.train_step(&set).unwrap();
    }
    let after = network.evaluate(&set).unwrap();
    assert!(after < before, "{after} should be below {before}");
  }

  #[test]
  fn same_seed_same_weights() {
    let mut a = FeedForward::new(&[3, 4, 2], Activation::Sigmoid).unwrap();
    let mut b = a.clone();
    a.initialize_weights(&mut StdRng::seed_from_u64(5));
    b.initialize_weights(&mut StdRng::seed_from_u64(5));
    assert_eq!(a.predict(&[0.1, 0.2, 0.3]).unwrap(), b.predict(&[0.1, 0.2, 0.3]).unwrap());
  }
}
