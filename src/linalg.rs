// Storage is Fortran order, element (row, col) of an n-row matrix at row + col*n,
// so buffers go straight to dgemm and dsyev.

use blas::dgemm;
use lapack::dsyev;

use crate::error::{DmrgError, Result};

// converts the row-col indicies into a single column-major index
pub fn s2i(a: usize, b: usize, n: usize) -> usize {
  a + b * n
}

#[derive(Clone, Debug, PartialEq)]
pub struct Matrix {
  rows: usize,
  cols: usize,
  data: Vec<f64>,
}

impl Matrix {
  pub fn zeros(rows: usize, cols: usize) -> Matrix {
    Matrix { rows, cols, data: vec![0.0; rows * cols] }
  }

  pub fn identity(n: usize) -> Matrix {
    let mut id = Matrix::zeros(n, n);
    for i in 0..n {
      id.data[s2i(i, i, n)] = 1.0;
    }
    id
  }

  pub fn from_col_major(rows: usize, cols: usize, data: Vec<f64>) -> Result<Matrix> {
    if data.len() != rows * cols {
      return Err(DmrgError::DimensionMismatch { expected: rows * cols, found: data.len() });
    }
    Ok(Matrix { rows, cols, data })
  }

  pub fn from_fn<F>(rows: usize, cols: usize, f: F) -> Matrix
  where
    F: Fn(usize, usize) -> f64,
  {
    let mut m = Matrix::zeros(rows, cols);
    for j in 0..cols {
      for i in 0..rows {
        m.data[s2i(i, j, rows)] = f(i, j);
      }
    }
    m
  }

  pub fn rows(&self) -> usize {
    self.rows
  }

  pub fn cols(&self) -> usize {
    self.cols
  }

  pub fn data(&self) -> &[f64] {
    &self.data
  }

  pub fn into_data(self) -> Vec<f64> {
    self.data
  }

  pub fn get(&self, i: usize, j: usize) -> f64 {
    self.data[s2i(i, j, self.rows)]
  }

  pub fn set(&mut self, i: usize, j: usize, value: f64) {
    self.data[s2i(i, j, self.rows)] = value;
  }

  pub fn column(&self, j: usize) -> &[f64] {
    &self.data[j * self.rows..(j + 1) * self.rows]
  }

  pub fn transpose(&self) -> Matrix {
    Matrix::from_fn(self.cols, self.rows, |i, j| self.get(j, i))
  }

  pub fn scaled(&self, alpha: f64) -> Matrix {
    Matrix {
      rows: self.rows,
      cols: self.cols,
      data: self.data.iter().map(|x| alpha * x).collect(),
    }
  }

  // self += alpha*other
  pub fn add_scaled(&mut self, alpha: f64, other: &Matrix) {
    assert_eq!((self.rows, self.cols), (other.rows, other.cols), "add_scaled shape mismatch");
    for (x, y) in self.data.iter_mut().zip(other.data.iter()) {
      *x += alpha * y;
    }
  }

  // self carries the slow index
  pub fn kron(&self, other: &Matrix) -> Matrix {
    let rows = self.rows * other.rows;
    let cols = self.cols * other.cols;
    let mut c = Matrix::zeros(rows, cols);
    for ja in 0..self.cols {
      for ia in 0..self.rows {
        let a = self.get(ia, ja);
        if a == 0.0 {
          continue;
        }
        for jb in 0..other.cols {
          for ib in 0..other.rows {
            c.data[s2i(ia * other.rows + ib, ja * other.cols + jb, rows)] = a * other.get(ib, jb);
          }
        }
      }
    }
    c
  }

  pub fn matmul(&self, other: &Matrix) -> Matrix {
    gemm(false, self, false, other)
  }

  // Vᵀ · self · V
  pub fn project(&self, v: &Matrix) -> Matrix {
    let av = gemm(false, self, false, v);
    gemm(true, v, false, &av)
  }

  pub fn is_symmetric(&self, tol: f64) -> bool {
    if self.rows != self.cols {
      return false;
    }
    for j in 0..self.cols {
      for i in 0..j {
        if (self.get(i, j) - self.get(j, i)).abs() > tol {
          return false;
        }
      }
    }
    true
  }

  pub fn max_abs_diff(&self, other: &Matrix) -> f64 {
    assert_eq!((self.rows, self.cols), (other.rows, other.cols), "max_abs_diff shape mismatch");
    self
      .data
      .iter()
      .zip(other.data.iter())
      .map(|(a, b)| (a - b).abs())
      .fold(0.0, f64::max)
  }
}

fn flag(trans: bool) -> u8 {
  if trans {
    b'T'
  } else {
    b'N'
  }
}

// Thin wrapper around dgemm on raw column-major buffers:
// c = alpha*op(a)*op(b) + beta*c with op(a) m x k and op(b) k x n.
#[allow(clippy::too_many_arguments)]
pub fn gemm_into(
  transa: bool,
  transb: bool,
  m: usize,
  n: usize,
  k: usize,
  alpha: f64,
  a: &[f64],
  lda: usize,
  b: &[f64],
  ldb: usize,
  beta: f64,
  c: &mut [f64],
  ldc: usize,
) {
  if m == 0 || n == 0 {
    return;
  }
  if k == 0 {
    for x in c.iter_mut() {
      *x *= beta;
    }
    return;
  }
  unsafe {
    dgemm(flag(transa), flag(transb), m as i32, n as i32, k as i32, alpha,
          a, lda.max(1) as i32, b, ldb.max(1) as i32, beta,
          c, ldc.max(1) as i32);
  }
}

pub fn gemm(transa: bool, a: &Matrix, transb: bool, b: &Matrix) -> Matrix {
  let (m, k) = if transa { (a.cols, a.rows) } else { (a.rows, a.cols) };
  let (kb, n) = if transb { (b.cols, b.rows) } else { (b.rows, b.cols) };
  assert_eq!(k, kb, "gemm inner dimension mismatch");
  let mut c = Matrix::zeros(m, n);
  gemm_into(transa, transb, m, n, k, 1.0, &a.data, a.rows, &b.data, b.rows, 0.0, &mut c.data, m);
  c
}

// eigenvalues ascending, eigenvectors as the columns in the same order
pub fn symmetric_eigen(a: &Matrix) -> Result<(Vec<f64>, Matrix)> {
  if a.rows != a.cols {
    return Err(DmrgError::DimensionMismatch { expected: a.rows, found: a.cols });
  }
  let n = a.rows;
  if n == 0 {
    return Ok((Vec::new(), Matrix::zeros(0, 0)));
  }

  let mut vecs = a.data.clone();
  let mut evals = vec![0.0; n];
  let lwork = 34 * n;
  let mut work = vec![0.0; lwork];
  let mut info: i32 = 0;

  unsafe {
    dsyev(b'V', b'U', n as i32, &mut vecs, n as i32,
          &mut evals, &mut work, lwork as i32, &mut info);
  }

  if info != 0 {
    return Err(DmrgError::Lapack { routine: "dsyev", info });
  }
  Ok((evals, Matrix { rows: n, cols: n, data: vecs }))
}
