use std::f64::consts::PI;

use crate::error::Result;
use crate::linalg::{symmetric_eigen, Matrix};
use crate::operator::SpinHalfOperator;

// op acting on `site` of an n-site chain, site 0 being the slowest index
fn site_operator(op: &Matrix, site: usize, n: usize) -> Matrix {
  let d = SpinHalfOperator::DIM;
  let left = Matrix::identity(d.pow(site as u32));
  let right = Matrix::identity(d.pow((n - site - 1) as u32));
  left.kron(op).kron(&right)
}

pub fn xxz_chain_hamiltonian(n: usize, delta: f64, hz: f64) -> Matrix {
  let ops = SpinHalfOperator;
  let sz = ops.sz().to_dense();
  let sp = ops.sp().to_dense();
  let sm = ops.sm().to_dense();
  let dim = SpinHalfOperator::DIM.pow(n as u32);

  let mut ham = Matrix::zeros(dim, dim);
  for i in 0..n {
    let sz_i = site_operator(&sz, i, n);
    ham.add_scaled(hz, &sz_i);
    if i + 1 < n {
      let bond = |a: &Matrix, b: &Matrix| site_operator(a, i, n).matmul(&site_operator(b, i + 1, n));
      ham.add_scaled(0.5, &bond(&sp, &sm));
      ham.add_scaled(0.5, &bond(&sm, &sp));
      ham.add_scaled(delta, &sz_i.matmul(&site_operator(&sz, i + 1, n)));
    }
  }
  ham
}

pub fn ground_state_energy(h: &Matrix) -> Result<f64> {
  let (evals, _) = symmetric_eigen(h)?;
  Ok(evals.first().copied().unwrap_or(0.0))
}

// Open XX chain (Δ = 0, h_z = 0) through Jordan-Wigner: fill every negative
// single-particle level cos(πk/(n+1)).
pub fn free_fermion_xx_energy(n: usize) -> f64 {
  let modes: f64 = (1..=n).map(|k| (PI * k as f64 / (n as f64 + 1.0)).cos().abs()).sum();
  -0.5 * modes
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn two_site_heisenberg_singlet() {
    let e = ground_state_energy(&xxz_chain_hamiltonian(2, 1.0, 0.0)).unwrap();
    assert!((e + 0.75).abs() < 1e-12);
  }

  #[test]
  fn free_fermions_match_dense_xx_chain() {
    for n in [2, 3, 6] {
      let dense = ground_state_energy(&xxz_chain_hamiltonian(n, 0.0, 0.0)).unwrap();
      let closed = free_fermion_xx_energy(n);
      assert!((dense - closed).abs() < 1e-10, "n={n}: {dense} vs {closed}");
    }
  }

  #[test]
  fn hamiltonian_is_symmetric() {
    assert!(xxz_chain_hamiltonian(4, 0.3, 0.7).is_symmetric(1e-15));
  }
}
