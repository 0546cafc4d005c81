use rand::Rng;
use tracing::{debug, info, instrument};

use crate::{
  config::Settings,
  model::{ForecastModel, NetworkBuilder},
  normalize::Normalizer,
  params::HyperParameters,
  training::{TrainingLoop, TrainingReport},
  window::Dataset,
  Error, Result,
};

/// Errors of one initialize, train, evaluate cycle.
#[derive(Debug, Clone)]
pub struct TrialOutcome {
  pub training_error: f64,
  pub testing_error: f64,
  pub report: TrainingReport,
}

/// One configuration applied to one series.
///
/// The dataset (and therefore the train/test split) is built once in `new` and reused by
/// every trial. Each trial starts from a freshly initialized network.
pub struct Experiment<B: NetworkBuilder> {
  normalizer: Normalizer,
  normalized: Vec<f64>,
  dataset: Dataset,
  model: ForecastModel<B>,
  training: TrainingLoop,
}

impl<B: NetworkBuilder> Experiment<B> {
  pub fn new<R: Rng>(
    params: HyperParameters,
    series: &[f64],
    builder: B,
    settings: &Settings,
    rng: &mut R,
  ) -> Result<Self> {
    params.validate(series.len())?;
    let normalizer = Normalizer::for_series(series, settings.activation, settings.margin)?;
    let normalized = normalizer.forward_all(series);
    let dataset = Dataset::build(&normalized, &params, rng)?;
    debug!(
      training = dataset.training_set.len(),
      testing = dataset.testing_set.len(),
      "built dataset"
    );
    Ok(Self {
      normalizer,
      normalized,
      dataset,
      model: ForecastModel::new(builder, params),
      training: settings.training_loop(),
    })
  }

  pub fn params(&self) -> &HyperParameters {
    self.model.params()
  }

  pub fn dataset(&self) -> &Dataset {
    &self.dataset
  }

  #[instrument(level = "debug", skip_all)]
  pub fn run_trial<R: Rng>(&mut self, rng: &mut R) -> Result<TrialOutcome> {
    self.model.initialize(rng)?;
    let report = self.training.run(&mut self.model, &self.dataset.training_set)?;
    let training_error = self.model.evaluate(&self.dataset.training_set)?;
    let testing_error = self.model.evaluate(&self.dataset.testing_set)?;
    debug!(training_error, testing_error, epochs = report.epochs, "trial finished");
    Ok(TrialOutcome {
      training_error,
      testing_error,
      report,
    })
  }

  /// Mean testing error over `repeat_count` trials. The first failing trial aborts the run.
  #[instrument(skip_all, fields(parameters = %self.params()))]
  pub fn run<R: Rng>(&mut self, repeat_count: usize, rng: &mut R) -> Result<f64> {
    if repeat_count == 0 {
      return Err(Error::NoTrials);
    }
    let mut total = 0.0;
    for trial in 0..repeat_count {
      let outcome = self.run_trial(rng)?;
      info!(
        trial,
        training_error = outcome.training_error,
        testing_error = outcome.testing_error,
        "trial"
      );
      total += outcome.testing_error;
    }
    Ok(total / repeat_count as f64)
  }

  /// Next `lead_length` values after the end of the series, in the series' own units.
  /// Uses the network of the latest trial.
  pub fn forecast(&self) -> Result<Vec<f64>> {
    let lag = self.params().lag_length;
    let window = &self.normalized[self.normalized.len() - lag..];
    let output = self.model.predict(window)?;
    Ok(self.normalizer.inverse_all(&output))
  }
}
