use crate::block::{
  truncate, two_block_matvec, xxz_bond_operator, Block, Renormalization, SpinHalfXXZChain, SuperBlock,
};
use crate::error::{DmrgError, Result};
use crate::lanczos::lowest_eigenpair;
use crate::linalg::Matrix;

// H_L ⊗ I + I ⊗ H_R + bond, never materialized. The left block is borrowed
// mutably because renormalization rewrites it.
pub struct SpinHalfXXZChainSuperBlock<'a> {
  lblock: &'a mut SpinHalfXXZChain,
  rblock: &'a SpinHalfXXZChain,
  plpr: Matrix,
  l_dim: usize,
  r_dim: usize,
  d: usize,
}

impl<'a> SpinHalfXXZChainSuperBlock<'a> {
  pub fn new(lblock: &'a mut SpinHalfXXZChain, rblock: &'a SpinHalfXXZChain) -> SpinHalfXXZChainSuperBlock<'a> {
    let l_dim = lblock.dimension();
    let r_dim = rblock.dimension();
    SpinHalfXXZChainSuperBlock {
      plpr: xxz_bond_operator(rblock.delta()),
      d: rblock.site_dimension(),
      lblock,
      rblock,
      l_dim,
      r_dim,
    }
  }

  pub fn l_dim(&self) -> usize {
    self.l_dim
  }

  pub fn r_dim(&self) -> usize {
    self.r_dim
  }

  // dense H in the left ⊗ right ordering, for small-system checks
  pub fn benchmark(&self) -> Matrix {
    let n = self.l_dim * self.r_dim;
    let mut ham = Matrix::zeros(n, n);
    let mut e = vec![0.0; n];
    for col in 0..n {
      e[col] = 1.0;
      let hv = self.matvec(&e);
      e[col] = 0.0;
      for (row, x) in hv.iter().enumerate() {
        let (ra, rb) = (row % self.l_dim, row / self.l_dim);
        let (ca, cb) = (col % self.l_dim, col / self.l_dim);
        ham.set(ra * self.r_dim + rb, ca * self.r_dim + cb, *x);
      }
    }
    ham
  }
}

impl SuperBlock for SpinHalfXXZChainSuperBlock<'_> {
  fn dimension(&self) -> usize {
    self.l_dim * self.r_dim
  }

  fn matvec_into(&self, v: &[f64], out: &mut [f64]) {
    two_block_matvec(self.lblock.completed(), self.rblock.completed(), &self.plpr, self.d, v, out);
  }

  fn eigen(&self, v0: Option<&[f64]>) -> Result<(f64, Matrix)> {
    if self.l_dim % self.d != 0 || self.r_dim % self.d != 0 {
      return Err(DmrgError::InvalidParameter(format!(
        "superblock {}x{} has a truncated edge site", self.l_dim, self.r_dim
      )));
    }
    let pair = lowest_eigenpair(
      |v: &[f64], out: &mut [f64]| self.matvec_into(v, out),
      self.dimension(),
      v0,
      self.lblock.solver(),
    )?;
    let psi = Matrix::from_col_major(self.l_dim, self.r_dim, pair.vector)?;
    Ok((pair.value, psi))
  }

  fn renormalize(&mut self, m: usize, v0: Option<&[f64]>) -> Result<Renormalization> {
    let (energy, psi) = self.eigen(v0)?;
    let t = truncate(&psi, m)?;
    self.lblock.project(&t.isometry)?;
    self.l_dim = self.lblock.dimension();
    Ok(Renormalization {
      energy,
      spectrum: t.spectrum,
      isometry: t.isometry,
      truncation_error: t.truncation_error,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::block::Block;
  use crate::exact::{ground_state_energy, xxz_chain_hamiltonian};
  use crate::linalg::symmetric_eigen;

  #[test]
  fn mirrored_superblock_matches_self_fused_matvec() {
    let mut left = SpinHalfXXZChain::new(0.9, 0.2);
    left.enlarge();
    let right = left.clone();
    let v: Vec<f64> = (0..16).map(|i| (i as f64 * 0.37).cos()).collect();
    let expected = right.matvec(&v);
    let sb = left.fuse(&right);
    let got = sb.matvec(&v);
    for (g, e) in got.iter().zip(expected.iter()) {
      assert!((g - e).abs() < 1e-14);
    }
  }

  #[test]
  fn unequal_blocks_give_open_chain_ground_state() {
    // 3 sites on the left, 2 on the right
    let (delta, hz) = (1.0, 0.1);
    let mut left = SpinHalfXXZChain::new(delta, hz);
    left.enlarge();
    left.enlarge();
    let mut right = SpinHalfXXZChain::new(delta, hz);
    right.enlarge();

    let exact = ground_state_energy(&xxz_chain_hamiltonian(5, delta, hz)).unwrap();
    let sb = left.fuse(&right);
    assert_eq!(sb.dimension(), 32);
    let (energy, psi) = sb.eigen(None).unwrap();
    assert!((energy - exact).abs() < 1e-8, "{energy} vs {exact}");
    assert_eq!((psi.rows(), psi.cols()), (8, 4));

    let bench = sb.benchmark();
    assert!(bench.is_symmetric(1e-14));
    let (evals, _) = symmetric_eigen(&bench).unwrap();
    assert!((evals[0] - exact).abs() < 1e-10);
  }

  #[test]
  fn renormalize_truncates_only_the_left_block() {
    let mut left = SpinHalfXXZChain::new(1.0, 0.0);
    for _ in 0..3 {
      left.enlarge();
    }
    let mut right = SpinHalfXXZChain::new(1.0, 0.0);
    right.enlarge();
    right.enlarge();
    let right_before = right.completed().clone();

    let r = {
      let mut sb = left.fuse(&right);
      let r = sb.renormalize(5, None).unwrap();
      assert_eq!(sb.l_dim(), 5);
      assert_eq!(sb.r_dim(), 8);
      r
    };
    assert_eq!(left.dimension(), 5);
    assert_eq!(right.dimension(), 8);
    assert_eq!(right.completed(), &right_before);
    assert_eq!((r.isometry.rows(), r.isometry.cols()), (16, 5));
    let kept: f64 = r.spectrum.iter().sum();
    assert!((kept + r.truncation_error - 1.0).abs() < 1e-10);
    assert!(left.completed().is_symmetric(1e-12));
  }
}
