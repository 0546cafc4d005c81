use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::info;

use crate::{
  model::{ForecastModel, NetworkBuilder},
  window::Example,
  Result,
};

/// Bias corrected exponential moving average of the training error.
#[derive(Debug, Clone)]
pub struct ExponentialAverage {
  beta: f64,
  moment: f64,
  pub value: f64,
  t: i32,
}

impl ExponentialAverage {
  pub fn new(beta: f64) -> Self {
    ExponentialAverage {
      beta,
      moment: 0.,
      value: 0.,
      t: 0,
    }
  }

  pub fn update(&mut self, value: f64) {
    self.t = self.t.saturating_add(1);
    self.moment = self.beta * self.moment + (1. - self.beta) * value;
    self.value = self.moment / (1. - self.beta.powi(self.t));
  }
}

/// One measurement taken after a measurement interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Progress {
  /// Length of the interval that just ended. Never shorter than the configured interval.
  pub interval: Duration,
  /// Time since the timed part of training started.
  pub elapsed: Duration,
  /// Optimizer iterations so far, the warm-up step excluded.
  pub epochs: u64,
  pub training_error: f64,
  pub smoothed_error: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TrainingReport {
  pub final_error: f64,
  pub epochs: u64,
  pub progress: Vec<Progress>,
}

/// Trains for a wall-clock budget and measures throughput at a fixed interval.
///
/// The clock is only checked between optimizer steps, so a run can overshoot the budget by
/// up to one step.
#[derive(Debug, Clone, Copy)]
pub struct TrainingLoop {
  pub time_budget: Duration,
  pub measurement_interval: Duration,
}

impl TrainingLoop {
  pub fn new(time_budget: Duration, measurement_interval: Duration) -> Self {
    Self {
      time_budget,
      measurement_interval,
    }
  }

  pub fn run<B: NetworkBuilder>(
    &self,
    model: &mut ForecastModel<B>,
    training_set: &[Example],
  ) -> Result<TrainingReport> {
    let mut error = model.train_step(training_set)?;
    let mut smoothed = ExponentialAverage::new(0.9);
    smoothed.update(error);

    let mut report = TrainingReport::default();
    let started = Instant::now();
    while started.elapsed() < self.time_budget {
      let tick = Instant::now();
      loop {
        error = model.train_step(training_set)?;
        smoothed.update(error);
        report.epochs += 1;
        if tick.elapsed() >= self.measurement_interval {
          break;
        }
      }
      let progress = Progress {
        interval: tick.elapsed(),
        elapsed: started.elapsed(),
        epochs: report.epochs,
        training_error: error,
        smoothed_error: smoothed.value,
      };
      info!(
        interval_ms = progress.interval.as_millis() as u64,
        elapsed_ms = progress.elapsed.as_millis() as u64,
        epochs = progress.epochs,
        error = progress.training_error,
        smoothed = progress.smoothed_error,
        "training progress"
      );
      report.progress.push(progress);
    }
    report.final_error = error;
    Ok(report)
  }
}

#[cfg(test)]
mod tests {
  use std::{
    io::Write,
    sync::{Arc, Mutex},
  };

  use approx::assert_relative_eq;
  use rand::{rngs::StdRng, SeedableRng};

  use super::*;
  use crate::{model::testing::ScriptedBuilder, params::HyperParameters};

  fn model(builder: ScriptedBuilder) -> ForecastModel<ScriptedBuilder> {
    let params = HyperParameters {
      lag_length: 1,
      lead_length: 1,
      hidden_layer_sizes: vec![1],
      training_fraction: 0.5,
    };
    let mut model = ForecastModel::new(builder, params);
    model.initialize(&mut StdRng::seed_from_u64(0)).unwrap();
    model
  }

  fn set() -> Vec<Example> {
    vec![Example {
      lag: vec![0.1],
      lead: vec![0.2],
    }]
  }

  #[test]
  fn zero_budget_runs_only_the_warm_up_step() {
    let builder = ScriptedBuilder::default();
    let mut model = model(builder.clone());
    let report = TrainingLoop::new(Duration::ZERO, Duration::from_millis(10))
      .run(&mut model, &set())
      .unwrap();
    assert_eq!(builder.steps.get(), 1);
    assert_eq!(report.epochs, 0);
    assert!(report.progress.is_empty());
    assert_relative_eq!(report.final_error, 0.5);
  }

  #[test]
  fn budget_is_split_into_measured_intervals() {
    let builder = ScriptedBuilder::default();
    let mut model = model(builder.clone());
    let interval = Duration::from_millis(5);
    let report = TrainingLoop::new(Duration::from_millis(30), interval)
      .run(&mut model, &set())
      .unwrap();
    assert!(!report.progress.is_empty());
    assert!(report.progress.iter().all(|p| p.interval >= interval));
    assert!(report.progress.windows(2).all(|w| w[0].epochs < w[1].epochs));
    let last = report.progress[report.progress.len() - 1];
    assert_eq!(last.epochs, report.epochs);
    assert!(last.elapsed >= interval);
    assert_eq!(builder.steps.get() as u64, report.epochs + 1);
  }

  #[derive(Clone, Default)]
  struct Captured(Arc<Mutex<Vec<u8>>>);

  impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
      self.0.lock().unwrap().extend_from_slice(buf);
      Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
      Ok(())
    }
  }

  #[test]
  fn progress_is_visible_at_the_default_level() {
    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
      .compact()
      .with_ansi(false)
      .with_max_level(tracing::Level::INFO)
      .with_writer(move || writer.clone())
      .finish();
    tracing::subscriber::with_default(subscriber, || {
      let mut model = model(ScriptedBuilder::default());
      TrainingLoop::new(Duration::from_millis(3), Duration::from_millis(1))
        .run(&mut model, &set())
        .unwrap();
    });
    let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
    assert!(output.contains("training progress"), "{output}");
    assert!(output.contains("epochs="), "{output}");
  }

  #[test]
  fn empty_training_set_fails() {
    let mut model = model(ScriptedBuilder::default());
    assert!(TrainingLoop::new(Duration::ZERO, Duration::ZERO)
      .run(&mut model, &[])
      .is_err());
  }

  #[test]
  fn average_of_constant_is_constant() {
    let mut average = ExponentialAverage::new(0.9);
    for _ in 0..5 {
      average.update(2.0);
    }
    assert_relative_eq!(average.value, 2.0, epsilon = 1e-12);
  }
}
