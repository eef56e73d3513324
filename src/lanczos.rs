use blas::{daxpy, ddot, dnrm2, dscal};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{DmrgError, Result};
use crate::linalg::{symmetric_eigen, Matrix};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LanczosParams {
  pub krylov_dim: usize, // largest Krylov space built before a restart
  pub max_restarts: usize,
  pub tol: f64, // threshold on the Ritz residual norm
}

impl Default for LanczosParams {
  fn default() -> Self {
    LanczosParams { krylov_dim: 100, max_restarts: 100, tol: 1e-10 }
  }
}

#[derive(Clone, Debug)]
pub struct Eigenpair {
  pub value: f64,
  pub vector: Vec<f64>,
}

fn dot(x: &[f64], y: &[f64]) -> f64 {
  unsafe { ddot(x.len() as i32, x, 1, y, 1) }
}

fn norm(x: &[f64]) -> f64 {
  unsafe { dnrm2(x.len() as i32, x, 1) }
}

// y += alpha*x
fn axpy(alpha: f64, x: &[f64], y: &mut [f64]) {
  unsafe { daxpy(x.len() as i32, alpha, x, 1, y, 1) }
}

fn scale(alpha: f64, x: &mut [f64]) {
  unsafe { dscal(x.len() as i32, alpha, x, 1) }
}

// Fixed seed, so runs are reproducible. The fill must carry no structure: a
// quasi-periodic sequence can be exactly orthogonal to a whole S^z sector.
fn random_start(dim: usize) -> Vec<f64> {
  let mut rng = StdRng::seed_from_u64(0x5eed);
  (0..dim).map(|_| rng.gen::<f64>() - 0.5).collect()
}

// Lowest eigenpair of the tridiagonal matrix with diagonal alpha and off-diagonal beta.
fn tridiagonal_ground(alpha: &[f64], beta: &[f64]) -> Result<(f64, Vec<f64>)> {
  let k = alpha.len();
  let mut t = Matrix::zeros(k, k);
  for i in 0..k {
    t.set(i, i, alpha[i]);
    if i > 0 {
      t.set(i, i - 1, beta[i - 1]);
      t.set(i - 1, i, beta[i - 1]);
    }
  }
  let (evals, evecs) = symmetric_eigen(&t)?;
  Ok((evals[0], evecs.column(0).to_vec()))
}

// Lowest eigenpair of the symmetric operator behind matvec. The Krylov basis is
// kept fully orthogonal and the solver restarts from the Ritz vector when the
// space fills up without converging. v0 must have length dim and non-zero norm.
pub fn lowest_eigenpair<F>(
  mut matvec: F,
  dim: usize,
  v0: Option<&[f64]>,
  params: &LanczosParams,
) -> Result<Eigenpair>
where
  F: FnMut(&[f64], &mut [f64]),
{
  if dim == 0 {
    return Err(DmrgError::InvalidParameter("Lanczos on an empty space".into()));
  }
  if params.krylov_dim == 0 {
    return Err(DmrgError::InvalidParameter("krylov_dim must be positive".into()));
  }

  let mut start = match v0 {
    Some(v) if v.len() != dim => {
      return Err(DmrgError::DimensionMismatch { expected: dim, found: v.len() });
    }
    Some(v) => v.to_vec(),
    None => random_start(dim),
  };
  let nrm = norm(&start);
  if !(nrm > 1e-300) {
    return Err(DmrgError::InvalidParameter("start vector has zero norm".into()));
  }
  scale(1.0 / nrm, &mut start);

  let m = params.krylov_dim.min(dim);
  let mut residual = f64::INFINITY;

  for restart in 0..=params.max_restarts {
    let mut basis: Vec<Vec<f64>> = Vec::with_capacity(m);
    let mut alpha: Vec<f64> = Vec::with_capacity(m);
    let mut beta: Vec<f64> = Vec::with_capacity(m);
    basis.push(start.clone());

    let mut w = vec![0.0; dim];
    let mut theta: f64;
    let mut s: Vec<f64>;

    loop {
      let j = basis.len() - 1;
      for x in w.iter_mut() {
        *x = 0.0;
      }
      matvec(&basis[j], &mut w);

      let a = dot(&basis[j], &w);
      alpha.push(a);
      axpy(-a, &basis[j], &mut w);
      if j > 0 {
        axpy(-beta[j - 1], &basis[j - 1], &mut w);
      }

      // two Gram-Schmidt passes keep the basis orthogonal to machine precision
      for _ in 0..2 {
        for q in &basis {
          let overlap = dot(q, &w);
          axpy(-overlap, q, &mut w);
        }
      }

      let b = norm(&w);
      let last = b < 1e-14 || basis.len() == m;

      // diagonalizing T costs O(j^3); past the first steps only check every few
      if last || j < 20 || (j + 1) % 4 == 0 {
        (theta, s) = tridiagonal_ground(&alpha, &beta)?;
        residual = (b * s[j]).abs();
        if residual < params.tol || last {
          break;
        }
      }

      beta.push(b);
      scale(1.0 / b, &mut w);
      basis.push(w.clone());
    }

    // Ritz vector: sum_j s_j q_j
    let mut ritz = vec![0.0; dim];
    for (coeff, q) in s.iter().zip(basis.iter()) {
      axpy(*coeff, q, &mut ritz);
    }
    let nrm = norm(&ritz);
    scale(1.0 / nrm, &mut ritz);

    if residual < params.tol || basis.len() < m || m == dim {
      log::debug!(
        "Lanczos converged: dim={}, krylov={}, restarts={}, residual={:.2e}",
        dim, basis.len(), restart, residual
      );
      return Ok(Eigenpair { value: theta, vector: ritz });
    }

    log::debug!("Lanczos restart {} (residual={:.2e})", restart + 1, residual);
    start = ritz;
  }

  log::warn!("Lanczos: {} restarts exhausted, residual={:.2e}", params.max_restarts, residual);
  Err(DmrgError::NotConverged { restarts: params.max_restarts, residual })
}
