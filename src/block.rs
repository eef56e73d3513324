// An enlarged block basis is old ⊗ site, the new site being the fast index.
// Two-block states are column-major lDim × rDim matrices, left index fast.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{DmrgError, Result};
use crate::lanczos::{lowest_eigenpair, LanczosParams};
use crate::linalg::{gemm, gemm_into, s2i, symmetric_eigen, Matrix};
use crate::operator::SpinHalfOperator;
use crate::superblock::SpinHalfXXZChainSuperBlock;

// Model-independent block contract used by the drivers.
pub trait Block: Clone + fmt::Display {
  type Fused<'a>: SuperBlock
  where
    Self: 'a;

  fn initial(&mut self);

  fn enlarge(&mut self);

  // self is the left block and the only one renormalization touches
  fn fuse<'a>(&'a mut self, other: &'a Self) -> Self::Fused<'a>;

  // ground state against a mirror of itself, then truncation to m states
  fn renormalize(&mut self, m: usize, v0: Option<&[f64]>) -> Result<Renormalization>;

  fn length(&self) -> usize;

  fn dimension(&self) -> usize;
}

pub trait SuperBlock {
  fn dimension(&self) -> usize;

  // out += H v
  fn matvec_into(&self, v: &[f64], out: &mut [f64]);

  fn matvec(&self, v: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; v.len()];
    self.matvec_into(v, &mut out);
    out
  }

  // the state comes back as an lDim × rDim matrix
  fn eigen(&self, v0: Option<&[f64]>) -> Result<(f64, Matrix)>;

  fn renormalize(&mut self, m: usize, v0: Option<&[f64]>) -> Result<Renormalization>;
}

#[derive(Clone, Debug)]
pub struct Renormalization {
  pub energy: f64,
  pub spectrum: Vec<f64>, // kept density-matrix eigenvalues, descending
  pub isometry: Matrix, // D_old × D_new, orthonormal columns
  pub truncation_error: f64, // sum of the discarded eigenvalues
}

// Each bond term names an edge operator stored in a block, coupling prefactor
// folded in, and the raw site operator it pairs with across the bond.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Bond {
  SpSm,
  SmSp,
  SzSz,
}

impl Bond {
  pub const ALL: [Bond; 3] = [Bond::SpSm, Bond::SmSp, Bond::SzSz];

  pub fn label(self) -> &'static str {
    match self {
      Bond::SpSm => "S+S-",
      Bond::SmSp => "S-S+",
      Bond::SzSz => "SzSz",
    }
  }

  pub fn prefactor(self, delta: f64) -> f64 {
    match self {
      Bond::SpSm | Bond::SmSp => 0.5,
      Bond::SzSz => delta,
    }
  }

  // the term that stores the partner operator of this one
  pub fn mirror(self) -> Bond {
    match self {
      Bond::SpSm => Bond::SmSp,
      Bond::SmSp => Bond::SpSm,
      Bond::SzSz => Bond::SzSz,
    }
  }

  // raw single-site operator sitting on the edge of the block
  fn edge_site_operator(self) -> Matrix {
    let ops = SpinHalfOperator;
    match self {
      Bond::SpSm => ops.sp().to_dense(),
      Bond::SmSp => ops.sm().to_dense(),
      Bond::SzSz => ops.sz().to_dense(),
    }
  }

  // raw single-site operator on the far side of the bond
  fn partner_site_operator(self) -> Matrix {
    self.mirror().edge_site_operator()
  }
}

impl fmt::Display for Bond {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.label())
  }
}

// Site-site coupling between the two sites facing each other across the
// central bond: Δ Sz⊗Sz + ½ S+⊗S- + ½ S-⊗S+.
pub(crate) fn xxz_bond_operator(delta: f64) -> Matrix {
  let d = SpinHalfOperator::DIM;
  let mut plpr = Matrix::zeros(d * d, d * d);
  for bond in Bond::ALL {
    let edge = bond.edge_site_operator().scaled(bond.prefactor(delta));
    plpr.add_scaled(1.0, &edge.kron(&bond.partner_site_operator()));
  }
  plpr
}

// out += H·X for H = BL ⊗ I + I ⊗ BR + PLPR, PLPR acting on the two edge sites.
// v holds X as a column-major l × r matrix, rows (left block, left edge site) and
// columns (right block, right edge site).
pub(crate) fn two_block_matvec(bl: &Matrix, br: &Matrix, plpr: &Matrix, d: usize, v: &[f64], out: &mut [f64]) {
  let l = bl.rows();
  let r = br.rows();

  // BL acting on the row index
  gemm_into(false, false, l, r, l, 1.0, bl.data(), l, v, l, 1.0, out, l);
  // BR acting on the column index: X·BRᵀ
  gemm_into(false, true, l, r, r, 1.0, v, l, br.data(), r, 1.0, out, l);

  // Regroup X as ((sl, sr), (al, ar)) so PLPR multiplies the edge-site pair.
  let nl = l / d;
  let nr = r / d;
  let dd = d * d;
  let mut t = vec![0.0; dd * nl * nr];
  for ar in 0..nr {
    for sr in 0..d {
      for al in 0..nl {
        for sl in 0..d {
          t[s2i(sl * d + sr, al + ar * nl, dd)] = v[s2i(al * d + sl, ar * d + sr, l)];
        }
      }
    }
  }
  let mut u = vec![0.0; dd * nl * nr];
  gemm_into(false, false, dd, nl * nr, dd, 1.0, plpr.data(), dd, &t, dd, 0.0, &mut u, dd);
  for ar in 0..nr {
    for sr in 0..d {
      for al in 0..nl {
        for sl in 0..d {
          out[s2i(al * d + sl, ar * d + sr, l)] += u[s2i(sl * d + sr, al + ar * nl, dd)];
        }
      }
    }
  }
}

pub(crate) struct Truncation {
  pub spectrum: Vec<f64>,
  pub isometry: Matrix,
  pub truncation_error: f64,
}

// Reduced density matrix of the row index of psi, truncated to its m largest
// eigenvalues.
pub(crate) fn truncate(psi: &Matrix, m: usize) -> Result<Truncation> {
  if m == 0 {
    return Err(DmrgError::InvalidParameter("bond dimension must be at least 1".into()));
  }
  let rho = gemm(false, psi, true, psi);
  let (evals, evecs) = symmetric_eigen(&rho)?;

  let n = evals.len();
  let dim = m.min(n);
  let truncation_error: f64 = evals[..n - dim].iter().sum();
  let spectrum: Vec<f64> = evals.iter().rev().take(dim).map(|&x| x.max(0.0)).collect();
  let isometry = Matrix::from_fn(n, dim, |i, j| evecs.get(i, n - 1 - j));

  Ok(Truncation { spectrum, isometry, truncation_error })
}

// H = Σ ½(S+_i S-_{i+1} + S-_i S+_{i+1}) + Δ Sz_i Sz_{i+1} + h_z Sz_i
#[derive(Clone, Debug)]
pub struct SpinHalfXXZChain {
  delta: f64,
  hz: f64,
  d: usize,
  length: usize,
  dimension: usize,
  completed: Matrix,
  connected: BTreeMap<Bond, Matrix>,
  plpr: Matrix,
  solver: LanczosParams,
}

impl SpinHalfXXZChain {
  pub fn new(delta: f64, hz: f64) -> SpinHalfXXZChain {
    let mut block = SpinHalfXXZChain {
      delta,
      hz,
      d: SpinHalfOperator::DIM,
      length: 0,
      dimension: 0,
      completed: Matrix::zeros(0, 0),
      connected: BTreeMap::new(),
      plpr: Matrix::zeros(0, 0),
      solver: LanczosParams::default(),
    };
    block.initial();
    block
  }

  pub fn with_solver(mut self, solver: LanczosParams) -> SpinHalfXXZChain {
    self.solver = solver;
    self
  }

  pub fn delta(&self) -> f64 {
    self.delta
  }

  pub fn hz(&self) -> f64 {
    self.hz
  }

  pub fn site_dimension(&self) -> usize {
    self.d
  }

  pub fn solver(&self) -> &LanczosParams {
    &self.solver
  }

  pub fn completed(&self) -> &Matrix {
    &self.completed
  }

  pub fn connected(&self) -> &BTreeMap<Bond, Matrix> {
    &self.connected
  }

  pub fn plpr(&self) -> &Matrix {
    &self.plpr
  }

  pub fn project(&mut self, v: &Matrix) -> Result<()> {
    if v.rows() != self.dimension {
      return Err(DmrgError::DimensionMismatch { expected: self.dimension, found: v.rows() });
    }
    self.completed = self.completed.project(v);
    for op in self.connected.values_mut() {
      *op = op.project(v);
    }
    self.dimension = v.cols();
    Ok(())
  }

  // out += H v for the block fused with a mirror of itself
  pub fn matvec_into(&self, v: &[f64], out: &mut [f64]) {
    two_block_matvec(&self.completed, &self.completed, &self.plpr, self.d, v, out);
  }

  pub fn matvec(&self, v: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; v.len()];
    self.matvec_into(v, &mut out);
    out
  }

  pub fn eigen(&self, v0: Option<&[f64]>) -> Result<(f64, Matrix)> {
    if self.dimension % self.d != 0 {
      return Err(DmrgError::InvalidParameter(format!(
        "block dimension {} carries no bare edge site", self.dimension
      )));
    }
    let n = self.dimension * self.dimension;
    let pair = lowest_eigenpair(|v: &[f64], out: &mut [f64]| self.matvec_into(v, out), n, v0, &self.solver)?;
    let psi = Matrix::from_col_major(self.dimension, self.dimension, pair.vector)?;
    Ok((pair.value, psi))
  }

  // dense two-block Hamiltonian of the block and its mirror, left ⊗ right ordering
  pub fn benchmark(&self) -> Matrix {
    let id = Matrix::identity(self.dimension);
    let mut ham = self.completed.kron(&id);
    ham.add_scaled(1.0, &id.kron(&self.completed));
    for (bond, edge) in &self.connected {
      let partner = bond.mirror();
      let p = partner.prefactor(self.delta);
      // Δ = 0 drops the SzSz term, its raw operator cannot be recovered
      if p == 0.0 {
        log::debug!("benchmark: {} has zero prefactor, term skipped", bond);
        continue;
      }
      ham.add_scaled(1.0, &edge.kron(&self.connected[&partner].scaled(1.0 / p)));
    }
    ham
  }
}

impl Block for SpinHalfXXZChain {
  type Fused<'a> = SpinHalfXXZChainSuperBlock<'a>;

  fn initial(&mut self) {
    let sz = SpinHalfOperator.sz().to_dense();
    self.completed = sz.scaled(self.hz);
    self.connected = Bond::ALL
      .iter()
      .map(|&b| (b, b.edge_site_operator().scaled(b.prefactor(self.delta))))
      .collect();
    self.plpr = xxz_bond_operator(self.delta);
    self.length = 1;
    self.dimension = self.d;
  }

  fn enlarge(&mut self) {
    let sz = SpinHalfOperator.sz().to_dense();
    let id_site = Matrix::identity(self.d);
    let id_block = Matrix::identity(self.dimension);

    let mut ham = self.completed.kron(&id_site);
    ham.add_scaled(self.hz, &id_block.kron(&sz));
    for (bond, edge) in &self.connected {
      ham.add_scaled(1.0, &edge.kron(&bond.partner_site_operator()));
    }
    self.completed = ham;

    for (bond, edge) in self.connected.iter_mut() {
      *edge = id_block.kron(&bond.edge_site_operator().scaled(bond.prefactor(self.delta)));
    }
    self.dimension *= self.d;
    self.length += 1;
  }

  fn fuse<'a>(&'a mut self, other: &'a Self) -> SpinHalfXXZChainSuperBlock<'a> {
    SpinHalfXXZChainSuperBlock::new(self, other)
  }

  fn renormalize(&mut self, m: usize, v0: Option<&[f64]>) -> Result<Renormalization> {
    let (energy, psi) = self.eigen(v0)?;
    let t = truncate(&psi, m)?;
    self.project(&t.isometry)?;
    Ok(Renormalization {
      energy,
      spectrum: t.spectrum,
      isometry: t.isometry,
      truncation_error: t.truncation_error,
    })
  }

  fn length(&self) -> usize {
    self.length
  }

  fn dimension(&self) -> usize {
    self.dimension
  }
}

impl fmt::Display for SpinHalfXXZChain {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "block dimension is {}, block length is {}", self.dimension, self.length)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::exact::xxz_chain_hamiltonian;

  fn eigenvalues(h: &Matrix) -> Vec<f64> {
    symmetric_eigen(h).unwrap().0
  }

  #[test]
  fn initial_block_is_one_site() {
    let b = SpinHalfXXZChain::new(0.7, 0.3);
    assert_eq!((b.length(), b.dimension()), (1, 2));
    assert!((b.completed().get(0, 0) - 0.15).abs() < 1e-15);
    assert_eq!(b.connected()[&Bond::SpSm].get(0, 1), 0.5);
    assert_eq!(b.connected()[&Bond::SmSp].get(1, 0), 0.5);
    assert!((b.connected()[&Bond::SzSz].get(1, 1) + 0.35).abs() < 1e-15);
    assert_eq!(b.to_string(), "block dimension is 2, block length is 1");
  }

  #[test]
  fn bond_labels() {
    let labels: Vec<_> = Bond::ALL.iter().map(|b| b.label()).collect();
    assert_eq!(labels, ["S+S-", "S-S+", "SzSz"]);
    assert_eq!(format!("{} {}", Bond::SzSz, Bond::SmSp), "SzSz S-S+");
    assert_eq!(Bond::SpSm.mirror(), Bond::SmSp);
  }

  #[test]
  fn plpr_is_two_site_xxz_bond() {
    let plpr = xxz_bond_operator(1.0);
    let exact = xxz_chain_hamiltonian(2, 1.0, 0.0);
    assert!(plpr.max_abs_diff(&exact) < 1e-15);
  }

  #[test]
  fn enlarged_block_reproduces_open_chain() {
    let (delta, hz) = (0.8, 0.25);
    let mut b = SpinHalfXXZChain::new(delta, hz);
    for n in 2..=5 {
      b.enlarge();
      assert_eq!(b.length(), n);
      assert_eq!(b.dimension(), 1 << n);
      let exact = xxz_chain_hamiltonian(n, delta, hz);
      assert!(b.completed().max_abs_diff(&exact) < 1e-14, "length {n}");
    }
  }

  #[test]
  fn two_site_singlet_energy() {
    let mut b = SpinHalfXXZChain::new(1.0, 0.0);
    let r = b.renormalize(4, None).unwrap();
    assert!((r.energy + 0.75).abs() < 1e-8, "energy {}", r.energy);
    // the singlet is maximally entangled
    assert_eq!(r.spectrum.len(), 2);
    for l in &r.spectrum {
      assert!((l - 0.5).abs() < 1e-8);
    }
  }

  #[test]
  fn matvec_matches_benchmark() {
    let mut b = SpinHalfXXZChain::new(0.6, 0.1);
    b.enlarge();
    let dim = b.dimension();
    let bench = b.benchmark();
    for col in 0..dim * dim {
      let mut e = vec![0.0; dim * dim];
      e[col] = 1.0;
      let hv = b.matvec(&e);
      // flat index a + b*dim here, a*dim + b in the benchmark ordering
      let (ca, cb) = (col % dim, col / dim);
      for row in 0..dim * dim {
        let (ra, rb) = (row % dim, row / dim);
        let expected = bench.get(ra * dim + rb, ca * dim + cb);
        assert!((hv[row] - expected).abs() < 1e-14, "({row}, {col})");
      }
    }
  }

  #[test]
  fn benchmark_skips_szsz_at_zero_delta() {
    let mut b = SpinHalfXXZChain::new(0.0, 0.0);
    b.enlarge();
    let bench = b.benchmark();
    assert!(bench.is_symmetric(1e-14));
    let exact = xxz_chain_hamiltonian(4, 0.0, 0.0);
    let (got, want) = (eigenvalues(&bench), eigenvalues(&exact));
    for (g, w) in got.iter().zip(want.iter()) {
      assert!((g - w).abs() < 1e-10);
    }
  }

  #[test]
  fn untruncated_renormalization_is_exact() {
    let (delta, hz) = (1.3, 0.2);
    let mut b = SpinHalfXXZChain::new(delta, hz);
    for _ in 0..3 {
      b.enlarge();
      let bench = b.benchmark();
      let exact_ground = eigenvalues(&bench)[0];
      let r = b.renormalize(1 << 10, None).unwrap();
      assert!(r.truncation_error.abs() < 1e-12);
      assert!((r.energy - exact_ground).abs() < 1e-8, "{} vs {exact_ground}", r.energy);
    }
    // no state was dropped, so completed is unitarily equivalent to the exact block
    let got = eigenvalues(b.completed());
    let want = eigenvalues(&xxz_chain_hamiltonian(b.length(), delta, hz));
    for (g, w) in got.iter().zip(want.iter()) {
      assert!((g - w).abs() < 1e-8);
    }
  }

  #[test]
  fn spectrum_sums_to_one_and_matches_error() {
    let mut b = SpinHalfXXZChain::new(1.0, 0.0);
    for _ in 0..4 {
      b.enlarge();
      let r = b.renormalize(6, None).unwrap();
      let kept: f64 = r.spectrum.iter().sum();
      assert!((kept + r.truncation_error - 1.0).abs() < 1e-10);
      assert!(r.spectrum.windows(2).all(|w| w[0] >= w[1]));
      assert!(r.spectrum.iter().all(|&l| l >= 0.0));
      assert!(b.dimension() <= 6);
      assert_eq!(r.isometry.cols(), b.dimension());
    }
  }

  #[test]
  fn projection_keeps_hamiltonian_symmetric() {
    let mut b = SpinHalfXXZChain::new(0.5, 0.4);
    b.enlarge();
    b.enlarge();
    let seed = Matrix::from_fn(8, 8, |i, j| ((i * 7 + j * 3) as f64).sin() + ((j * 7 + i * 3) as f64).sin());
    let (_, basis) = symmetric_eigen(&seed).unwrap();
    let v = Matrix::from_fn(8, 5, |i, j| basis.get(i, j));
    b.project(&v).unwrap();
    assert_eq!(b.dimension(), 5);
    assert!(b.completed().is_symmetric(1e-12));
    assert!(b.project(&Matrix::zeros(3, 2)).is_err());
  }

  #[test]
  fn snapshot_is_isolated_from_live_block() {
    let mut live = SpinHalfXXZChain::new(1.0, 0.0);
    live.enlarge();
    let snapshot = live.clone();
    let frozen = snapshot.completed().clone();
    live.enlarge();
    live.renormalize(3, None).unwrap();
    assert_eq!(snapshot.dimension(), 4);
    assert_eq!(snapshot.length(), 2);
    assert_eq!(snapshot.completed(), &frozen);
  }

  #[test]
  fn eigen_rejects_truncated_edge() {
    let mut b = SpinHalfXXZChain::new(1.0, 0.0);
    b.enlarge();
    b.enlarge();
    b.renormalize(3, None).unwrap();
    assert!(b.eigen(None).is_err());
  }
}
