use crate::block::Block;
use crate::error::Result;

#[derive(Clone, Debug, Default)]
pub struct InfiniteLog {
  pub energy: Vec<f64>,
  pub entropy: Vec<f64>,
  pub spectrum: Vec<Vec<f64>>,
  pub error: Vec<f64>,
  pub dimension: Vec<usize>,
}

// weights below 1e-16 are dropped
pub fn entanglement_entropy(spectrum: &[f64]) -> f64 {
  spectrum.iter().filter(|&&l| l > 1e-16).map(|&l| -l * l.ln()).sum()
}

pub struct InfiniteDmrg<B: Block> {
  block: B,
  cache: Vec<B>,
  log: InfiniteLog,
}

impl<B: Block> InfiniteDmrg<B> {
  pub fn new(block: B) -> InfiniteDmrg<B> {
    InfiniteDmrg { cache: vec![block.clone()], block, log: InfiniteLog::default() }
  }

  pub fn block(&self) -> &B {
    &self.block
  }

  pub fn log(&self) -> &InfiniteLog {
    &self.log
  }

  // snapshots kept by `run(.., save = true)`, starting with the initial block
  pub fn cache(&self) -> &[B] {
    &self.cache
  }

  pub fn run(&mut self, iterations: usize, m: usize, save: bool) -> Result<()> {
    for _ in 0..iterations {
      self.block.enlarge();
      let r = self.block.renormalize(m, None)?;
      let entropy = entanglement_entropy(&r.spectrum);

      log::info!(
        "length {:>4}  energy: {:.12}  entropy: {:.6}  truncation error: {:.3e}  dim: {}",
        2 * self.block.length(),
        r.energy,
        entropy,
        r.truncation_error,
        self.block.dimension()
      );

      self.log.energy.push(r.energy);
      self.log.spectrum.push(r.spectrum);
      self.log.entropy.push(entropy);
      self.log.error.push(r.truncation_error);
      self.log.dimension.push(self.block.dimension());
      if save {
        self.cache.push(self.block.clone());
      }
    }
    Ok(())
  }

  // each iteration adds two sites, so the boundary term cancels
  pub fn bulk_energy_per_site(&self) -> Option<f64> {
    match self.log.energy.as_slice() {
      [.., prev, last] => Some((last - prev) / 2.0),
      _ => None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::block::SpinHalfXXZChain;

  #[test]
  fn entropy_of_maximally_mixed_pair() {
    assert!((entanglement_entropy(&[0.5, 0.5]) - 2f64.ln()).abs() < 1e-15);
    assert_eq!(entanglement_entropy(&[1.0, 1e-20]), 0.0);
  }

  #[test]
  fn logs_grow_in_step() {
    let mut dmrg = InfiniteDmrg::new(SpinHalfXXZChain::new(1.0, 0.0));
    dmrg.run(6, 8, true).unwrap();
    let log = dmrg.log();
    assert_eq!(log.energy.len(), 6);
    assert_eq!(log.spectrum.len(), 6);
    assert_eq!(log.entropy.len(), 6);
    assert_eq!(log.error.len(), 6);
    assert_eq!(log.dimension, vec![4, 8, 8, 8, 8, 8]);
    assert_eq!(dmrg.block().length(), 7);
    assert_eq!(dmrg.cache().len(), 7);
    assert_eq!(dmrg.cache()[0].length(), 1);
    assert_eq!(dmrg.cache()[3].length(), 4);
    assert!(dmrg.bulk_energy_per_site().is_some());
  }

  #[test]
  fn without_save_only_initial_block_is_cached() {
    let mut dmrg = InfiniteDmrg::new(SpinHalfXXZChain::new(0.5, 0.0));
    dmrg.run(2, 4, false).unwrap();
    assert_eq!(dmrg.cache().len(), 1);
    assert!(InfiniteDmrg::new(SpinHalfXXZChain::new(0.5, 0.0)).bulk_energy_per_site().is_none());
  }
}
