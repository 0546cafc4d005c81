//! Random search over lag/lead forecasting configurations.
//!
//! A configuration ([`HyperParameters`]) fixes how many past values feed the network, how
//! many future values it predicts, the hidden layer sizes and the train/test split. Each one
//! is evaluated by training freshly initialized networks for a fixed wall-clock budget and
//! averaging their testing error; [`SearchDriver`] keeps sampling unseen configurations and
//! records the results in a [`StatisticsTable`].

pub mod config;
pub mod error;
pub mod experiment;
pub mod model;
pub mod normalize;
pub mod params;
pub mod search;
pub mod series;
pub mod subcommands;
pub mod training;
pub mod utils;
pub mod window;

pub use config::Settings;
pub use error::{Error, Result};
pub use experiment::{Experiment, TrialOutcome};
pub use model::{
  Activation, FeedForward, FeedForwardBuilder, ForecastModel, Network, NetworkBuilder,
};
pub use normalize::Normalizer;
pub use params::{HyperParameters, SearchSpace};
pub use search::{SearchDriver, StatisticsEntry, StatisticsTable, StepOutcome};
pub use series::{parse_series, read_series};
pub use training::{Progress, TrainingLoop, TrainingReport};
pub use window::{windows, Dataset, Example};
