use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DmrgError, Result};
use crate::lanczos::LanczosParams;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DmrgConfig {
  pub delta: f64, // Sz-Sz anisotropy
  pub hz: f64, // longitudinal field
  pub bond_dimension: usize, // kept states per block, m
  pub iterations: usize, // infinite-system iterations
  pub chain_length: usize, // finite-system chain length, must be even
  pub sweeps: usize,
  pub energy_tolerance: Option<f64>, // stop sweeping once the energy moves less than this
  pub lanczos: LanczosParams,
}

impl Default for DmrgConfig {
  fn default() -> Self {
    DmrgConfig {
      delta: 1.0,
      hz: 0.0,
      bond_dimension: 20,
      iterations: 40,
      chain_length: 16,
      sweeps: 2,
      energy_tolerance: None,
      lanczos: LanczosParams::default(),
    }
  }
}

impl DmrgConfig {
  pub fn from_file(path: &Path) -> Result<DmrgConfig> {
    let text = fs::read_to_string(path)?;
    let config: DmrgConfig = serde_json::from_str(&text)?;
    config.validate()?;
    Ok(config)
  }

  pub fn validate(&self) -> Result<()> {
    if self.bond_dimension == 0 {
      return Err(DmrgError::InvalidParameter("bond_dimension must be at least 1".into()));
    }
    if self.chain_length % 2 != 0 {
      return Err(DmrgError::OddChainLength(self.chain_length));
    }
    if let Some(tol) = self.energy_tolerance {
      if !(tol > 0.0) {
        return Err(DmrgError::InvalidParameter(format!("energy_tolerance must be positive, got {tol}")));
      }
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;

  #[test]
  fn partial_json_falls_back_to_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{"delta": 0.5, "chain_length": 12, "lanczos": {{"tol": 1e-9}}}}"#).unwrap();
    let config = DmrgConfig::from_file(file.path()).unwrap();
    assert_eq!(config.delta, 0.5);
    assert_eq!(config.chain_length, 12);
    assert_eq!(config.bond_dimension, 20);
    assert_eq!(config.lanczos.tol, 1e-9);
    assert_eq!(config.lanczos.krylov_dim, LanczosParams::default().krylov_dim);
  }

  #[test]
  fn odd_chain_length_fails_validation() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{"chain_length": 9}}"#).unwrap();
    let err = DmrgConfig::from_file(file.path()).unwrap_err();
    assert!(matches!(err, DmrgError::OddChainLength(9)));
  }

  #[test]
  fn missing_file_is_an_io_error() {
    let err = DmrgConfig::from_file(Path::new("/nonexistent/dmrg.json")).unwrap_err();
    assert!(matches!(err, DmrgError::Io(_)));
  }
}
