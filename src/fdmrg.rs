// block_list[i] holds the block grown up to and including site i, taken after
// enlargement and before truncation.

use crate::block::{Block, Renormalization, SuperBlock};
use crate::error::{DmrgError, Result};
use crate::linalg::Matrix;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
  Warmup,
  LeftToRight,
  RightToLeft,
}

#[derive(Clone, Debug, Default)]
pub struct FiniteLog {
  pub energy: Vec<f64>,
  pub spectrum: Vec<Vec<f64>>,
  pub truncation_error: Vec<f64>,
}

pub struct FiniteDmrg<B: Block> {
  length: usize,
  half_length: usize,
  bond_dimension: usize,
  sys_block: B,
  block_list: Vec<Option<B>>,
  wave_func: Vec<Option<Matrix>>,
  center: usize,
  direction: Option<Direction>,
  log: FiniteLog,
}

impl<B: Block> FiniteDmrg<B> {
  pub fn new(block: B, length: usize, m: usize) -> Result<FiniteDmrg<B>> {
    if length % 2 != 0 {
      return Err(DmrgError::OddChainLength(length));
    }
    if length < 2 {
      return Err(DmrgError::InvalidParameter(format!("chain length {length} is too short")));
    }
    if block.length() != 1 {
      return Err(DmrgError::InvalidParameter(format!(
        "finite DMRG starts from a one-site block, got length {}", block.length()
      )));
    }
    Ok(FiniteDmrg {
      length,
      half_length: length / 2,
      bond_dimension: m,
      sys_block: block,
      block_list: vec![None; length],
      wave_func: vec![None; length],
      center: 0,
      direction: None,
      log: FiniteLog::default(),
    })
  }

  pub fn length(&self) -> usize {
    self.length
  }

  pub fn center(&self) -> usize {
    self.center
  }

  pub fn direction(&self) -> Option<Direction> {
    self.direction
  }

  pub fn log(&self) -> &FiniteLog {
    &self.log
  }

  pub fn block_list(&self) -> &[Option<B>] {
    &self.block_list
  }

  pub fn wave_func(&self) -> &[Option<Matrix>] {
    &self.wave_func
  }

  pub fn sys_block(&self) -> &B {
    &self.sys_block
  }

  pub fn ground_energy(&self) -> Option<f64> {
    self.log.energy.last().copied()
  }

  pub fn warmup(&mut self, m: usize) -> Result<()> {
    self.direction = Some(Direction::Warmup);
    let last = self.length - 1;
    self.block_list[0] = Some(self.sys_block.clone());
    self.block_list[last] = Some(self.sys_block.clone());

    for i in 1..self.half_length {
      self.center = i;
      self.sys_block.enlarge();
      self.block_list[i] = Some(self.sys_block.clone());
      self.block_list[last - i] = Some(self.sys_block.clone());
      let r = self.sys_block.renormalize(m, None)?;
      self.wave_func[i] = Some(r.isometry.clone());
      self.wave_func[last - i] = Some(r.isometry.clone());
      self.record(r);
    }
    Ok(())
  }

  // one center move: enlarge, snapshot, fuse with the stored environment, truncate
  fn step(&mut self, i: usize, env_index: usize, m: usize) -> Result<()> {
    self.center = i;
    self.sys_block.enlarge();
    self.block_list[i] = Some(self.sys_block.clone());

    let env_block = self.block_list[env_index]
      .as_ref()
      .ok_or_else(|| DmrgError::InvalidParameter(format!("no environment block stored at site {env_index}")))?;
    let r = self.sys_block.fuse(env_block).renormalize(m, None)?;

    self.wave_func[i] = Some(r.isometry.clone());
    self.record(r);
    Ok(())
  }

  fn restart_from(&mut self, index: usize) -> Result<()> {
    self.sys_block = self.block_list[index]
      .clone()
      .ok_or_else(|| DmrgError::InvalidParameter(format!("no block stored at site {index}")))?;
    Ok(())
  }

  // middle to the right edge, back to the left edge, then to the middle again
  pub fn sweep(&mut self, m: usize) -> Result<()> {
    let last = self.length - 1;

    self.direction = Some(Direction::LeftToRight);
    for i in self.half_length..self.length - 2 {
      self.step(i, i + 1, m)?;
    }

    self.restart_from(last)?;
    self.direction = Some(Direction::RightToLeft);
    for i in (2..=self.length - 2).rev() {
      self.step(i, i - 1, m)?;
    }

    self.restart_from(0)?;
    self.direction = Some(Direction::LeftToRight);
    for i in 1..self.half_length {
      self.step(i, i + 1, m)?;
    }
    Ok(())
  }

  pub fn run(&mut self, sweep_number: usize, m: usize) -> Result<()> {
    self.warmup(m)?;
    for i in 0..sweep_number {
      log::info!("This is {i}th sweep process:");
      self.sweep(m)?;
    }
    Ok(())
  }

  // Sweeps at the construction bond dimension until the end-of-sweep energy moves
  // by less than tol. Returns the number of sweeps done.
  pub fn run_until_converged(&mut self, max_sweeps: usize, tol: f64) -> Result<usize> {
    let m = self.bond_dimension;
    self.warmup(m)?;
    let mut previous = self.ground_energy();
    for i in 0..max_sweeps {
      log::info!("This is {i}th sweep process:");
      self.sweep(m)?;
      let current = self.ground_energy();
      if let (Some(e0), Some(e1)) = (previous, current) {
        if (e1 - e0).abs() < tol {
          log::info!("converged after {} sweeps, energy change {:.3e}", i + 1, (e1 - e0).abs());
          return Ok(i + 1);
        }
      }
      previous = current;
    }
    Ok(max_sweeps)
  }

  // '=' for environment sites, '**' for the two-site center
  pub fn diagram(&self) -> String {
    let (left, right) = match self.direction {
      Some(Direction::Warmup) => (self.center, self.center),
      Some(Direction::LeftToRight) => (self.center, self.length.saturating_sub(self.center + 2)),
      Some(Direction::RightToLeft) => (self.center.saturating_sub(1), self.length.saturating_sub(self.center + 1)),
      None => return String::new(),
    };
    format!("{}**{}", "=".repeat(left), "=".repeat(right))
  }

  fn record(&mut self, r: Renormalization) {
    self.log.energy.push(r.energy);
    self.log.spectrum.push(r.spectrum);
    self.log.truncation_error.push(r.truncation_error);
    log::info!("{}", self.diagram());
    log::info!("energy: {} truncation error: {}", r.energy, r.truncation_error);
  }
}
