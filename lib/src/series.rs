use std::path::Path;

use crate::{Error, Result};

/// Parses a comma separated list of decimals. No header and no missing values: one bad token
/// rejects the whole series.
pub fn parse_series(content: &str) -> Result<Vec<f64>> {
  let content = content.trim();
  if content.is_empty() {
    return Ok(Vec::new());
  }
  content
    .split(',')
    .enumerate()
    .map(|(position, token)| {
      let token = token.trim();
      token.parse::<f64>().map_err(|_| Error::Parse {
        position,
        token: token.to_string(),
      })
    })
    .collect()
}

pub fn read_series(path: &Path) -> Result<Vec<f64>> {
  let content = std::fs::read_to_string(path).map_err(|source| Error::Io {
    path: path.to_path_buf(),
    source,
  })?;
  let series = parse_series(&content)?;
  tracing::debug!(?path, len = series.len(), "loaded series");
  Ok(series)
}
