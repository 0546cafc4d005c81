pub use search::*;
pub use single::*;

pub mod search;
pub mod single;

use rand::{rngs::StdRng, SeedableRng};

/// Seeded generator when a seed is given, entropy otherwise.
pub fn make_rng(seed: Option<u64>) -> StdRng {
  match seed {
    Some(seed) => StdRng::seed_from_u64(seed),
    None => StdRng::from_entropy(),
  }
}
