use rand::{seq::SliceRandom, Rng};

use crate::{params::HyperParameters, Error, Result};

/// One supervised pair: `lag` values feed the network, the following `lead` values are the target.
#[derive(Debug, Clone, PartialEq)]
pub struct Example {
  pub lag: Vec<f64>,
  pub lead: Vec<f64>,
}

/// Slides a `lag + lead` window over the series one step at a time.
///
/// Yields `len - lag - lead + 1` examples, or none when `lag + lead >= len`.
pub fn windows(series: &[f64], lag: usize, lead: usize) -> Vec<Example> {
  if lag == 0 || lead == 0 || lag + lead >= series.len() {
    return Vec::new();
  }
  let mut examples = Vec::with_capacity(series.len() - lag - lead + 1);
  let (mut a, mut b) = (0, lag);
  while a + lag + lead <= series.len() {
    examples.push(Example {
      lag: series[a..a + lag].to_vec(),
      lead: series[b..b + lead].to_vec(),
    });
    a += 1;
    b += 1;
  }
  examples
}

/// Training and testing examples of one configuration. Built once, shared by every trial.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
  pub training_set: Vec<Example>,
  pub testing_set: Vec<Example>,
}

impl Dataset {
  /// Windows the (already normalized) series, shuffles the examples and splits them.
  /// Both partitions must end up non-empty.
  pub fn build<R: Rng + ?Sized>(
    normalized: &[f64],
    params: &HyperParameters,
    rng: &mut R,
  ) -> Result<Self> {
    let mut examples = windows(normalized, params.lag_length, params.lead_length);
    if examples.is_empty() {
      return Err(Error::InvalidSample {
        lag: params.lag_length,
        lead: params.lead_length,
        len: normalized.len(),
      });
    }
    examples.shuffle(rng);
    let dataset = Self::partition(examples, params.training_fraction);
    if dataset.training_set.is_empty() || dataset.testing_set.is_empty() {
      return Err(Error::EmptyDataset);
    }
    Ok(dataset)
  }

  /// Position `i` of `total` trains when `i / total < training_fraction`.
  pub fn partition(examples: Vec<Example>, training_fraction: f64) -> Self {
    let total = examples.len();
    let mut dataset = Self::default();
    for (i, example) in examples.into_iter().enumerate() {
      if (i as f64) / (total as f64) < training_fraction {
        dataset.training_set.push(example);
      } else {
        dataset.testing_set.push(example);
      }
    }
    dataset
  }

  pub fn len(&self) -> usize {
    self.training_set.len() + self.testing_set.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

#[cfg(test)]
mod tests {
  use proptest::prelude::*;
  use rand::{rngs::StdRng, SeedableRng};

  use super::*;

  fn params(lag: usize, lead: usize, training_fraction: f64) -> HyperParameters {
    HyperParameters {
      lag_length: lag,
      lead_length: lead,
      hidden_layer_sizes: vec![2],
      training_fraction,
    }
  }

  #[test]
  fn small_series_windows() {
    let examples = windows(&[1.0, 2.0, 3.0, 4.0, 5.0], 2, 1);
    let pairs: Vec<(Vec<f64>, Vec<f64>)> = examples.into_iter().map(|e| (e.lag, e.lead)).collect();
    assert_eq!(
      pairs,
      vec![
        (vec![1.0, 2.0], vec![3.0]),
        (vec![2.0, 3.0], vec![4.0]),
        (vec![3.0, 4.0], vec![5.0]),
      ]
    );
  }

  #[test]
  fn windows_that_do_not_fit_yield_nothing() {
    assert!(windows(&[1.0, 2.0, 3.0], 2, 1).is_empty());
    assert!(windows(&[1.0, 2.0, 3.0], 3, 3).is_empty());
  }

  #[test]
  fn oversized_configuration_is_invalid() {
    let mut rng = StdRng::seed_from_u64(1);
    let result = Dataset::build(&[1.0, 2.0, 3.0], &params(2, 1, 0.5), &mut rng);
    assert!(matches!(result, Err(Error::InvalidSample { lag: 2, lead: 1, len: 3 })));
  }

  #[test]
  fn half_split_of_ten() {
    let examples: Vec<Example> = (0..10)
      .map(|i| Example {
        lag: vec![i as f64],
        lead: vec![0.0],
      })
      .collect();
    let dataset = Dataset::partition(examples, 0.5);
    assert_eq!(dataset.training_set.len(), 5);
    assert_eq!(dataset.testing_set.len(), 5);
    let first: Vec<f64> = dataset.training_set.iter().map(|e| e.lag[0]).collect();
    assert_eq!(first, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
  }

  #[test]
  fn shuffle_is_reproducible_under_seed() {
    let series: Vec<f64> = (0..40).map(f64::from).collect();
    let p = params(3, 2, 0.7);
    let a = Dataset::build(&series, &p, &mut StdRng::seed_from_u64(7)).unwrap();
    let b = Dataset::build(&series, &p, &mut StdRng::seed_from_u64(7)).unwrap();
    assert_eq!(a.training_set, b.training_set);
    assert_eq!(a.testing_set, b.testing_set);
  }

  #[test]
  fn split_without_testing_examples_is_refused() {
    let series: Vec<f64> = (0..10).map(f64::from).collect();
    let mut rng = StdRng::seed_from_u64(0);
    let result = Dataset::build(&series, &params(5, 4, 0.9), &mut rng);
    assert!(matches!(result, Err(Error::EmptyDataset)));
    let result = Dataset::build(&series, &params(2, 1, 0.0), &mut rng);
    assert!(matches!(result, Err(Error::EmptyDataset)));
  }

  #[test]
  fn build_shuffles_the_windows() {
    let series: Vec<f64> = (0..43).map(f64::from).collect();
    let ordered = windows(&series, 3, 1);
    assert_eq!(ordered.len(), 40);
    let mut rng = StdRng::seed_from_u64(7);
    let dataset = Dataset::build(&series, &params(3, 1, 0.5), &mut rng).unwrap();
    let shuffled: Vec<Example> = dataset
      .training_set
      .iter()
      .chain(dataset.testing_set.iter())
      .cloned()
      .collect();
    assert_ne!(shuffled, ordered);

    let key = |e: &Example| e.lag[0];
    let mut sorted = shuffled;
    sorted.sort_by(|a, b| key(a).total_cmp(&key(b)));
    assert_eq!(sorted, ordered);
  }

  proptest! {
    #[test]
    fn window_count_matches_formula(len in 1usize..60, lag in 1usize..30, lead in 1usize..30) {
      let series: Vec<f64> = (0..len).map(|i| i as f64).collect();
      let expected = if lag + lead < len { len - lag - lead + 1 } else { 0 };
      prop_assert_eq!(windows(&series, lag, lead).len(), expected);
    }

    #[test]
    fn partition_keeps_every_example(
      len in 4usize..80,
      fraction in 0.0..1.0f64,
      seed in any::<u64>(),
    ) {
      let series: Vec<f64> = (0..len).map(|i| i as f64).collect();
      let mut examples = windows(&series, 1, 1);
      examples.shuffle(&mut StdRng::seed_from_u64(seed));
      let dataset = Dataset::partition(examples, fraction);
      prop_assert_eq!(dataset.len(), len - 1);
      let mut seen: Vec<f64> = dataset
        .training_set
        .iter()
        .chain(dataset.testing_set.iter())
        .map(|e| e.lag[0])
        .collect();
      seen.sort_by(f64::total_cmp);
      let expected: Vec<f64> = (0..len - 1).map(|i| i as f64).collect();
      prop_assert_eq!(seen, expected);
    }
  }
}
