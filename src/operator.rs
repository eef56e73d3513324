use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::{DmrgError, Result};
use crate::linalg::Matrix;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CooMatrix<T> {
  pub shape: (usize, usize),
  pub row: Vec<usize>,
  pub col: Vec<usize>,
  pub data: Vec<T>,
}

impl<T> CooMatrix<T> {
  pub fn new(shape: (usize, usize), entries: Vec<(usize, usize, T)>) -> CooMatrix<T> {
    let mut coo = CooMatrix { shape, row: Vec::new(), col: Vec::new(), data: Vec::new() };
    for (i, j, v) in entries {
      coo.row.push(i);
      coo.col.push(j);
      coo.data.push(v);
    }
    coo
  }

  pub fn nnz(&self) -> usize {
    self.data.len()
  }
}

impl CooMatrix<f64> {
  pub fn to_dense(&self) -> Matrix {
    let mut m = Matrix::zeros(self.shape.0, self.shape.1);
    for ((&i, &j), &v) in self.row.iter().zip(self.col.iter()).zip(self.data.iter()) {
      m.set(i, j, m.get(i, j) + v);
    }
    m
  }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SpinHalfOperator;

impl SpinHalfOperator {
  pub const DIM: usize = 2;

  pub fn sx(&self) -> CooMatrix<f64> {
    CooMatrix::new((2, 2), vec![(0, 1, 0.5), (1, 0, 0.5)])
  }

  pub fn sy(&self) -> CooMatrix<Complex64> {
    CooMatrix::new((2, 2), vec![(0, 1, Complex64::new(0.0, -0.5)), (1, 0, Complex64::new(0.0, 0.5))])
  }

  pub fn sz(&self) -> CooMatrix<f64> {
    CooMatrix::new((2, 2), vec![(0, 0, 0.5), (1, 1, -0.5)])
  }

  pub fn sp(&self) -> CooMatrix<f64> {
    CooMatrix::new((2, 2), vec![(0, 1, 1.0)])
  }

  pub fn sm(&self) -> CooMatrix<f64> {
    CooMatrix::new((2, 2), vec![(1, 0, 1.0)])
  }

  pub fn identity(&self) -> CooMatrix<f64> {
    CooMatrix::new((2, 2), vec![(0, 0, 1.0), (1, 1, 1.0)])
  }

  // one {path}/{name}.json per operator
  pub fn save(&self, path: Option<&Path>) -> Result<()> {
    let dir = path.ok_or(DmrgError::MissingPath)?;
    write_json(&dir.join("sx.json"), &self.sx())?;
    write_json(&dir.join("sy.json"), &self.sy())?;
    write_json(&dir.join("sz.json"), &self.sz())?;
    write_json(&dir.join("sp.json"), &self.sp())?;
    write_json(&dir.join("sm.json"), &self.sm())?;
    write_json(&dir.join("identity.json"), &self.identity())?;
    log::debug!("saved spin-1/2 operators to {}", dir.display());
    Ok(())
  }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
  let writer = BufWriter::new(File::create(path)?);
  serde_json::to_writer_pretty(writer, value)?;
  Ok(())
}
