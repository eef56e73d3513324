use std::path::Path;

use dmrg::{DmrgConfig, FiniteDmrg, InfiniteDmrg, SpinHalfXXZChain};

fn main() -> dmrg::Result<()> {
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

  // Heisenberg chain by default; pass a JSON config file to change any parameter.
  let config = match std::env::args().nth(1) {
    Some(path) => DmrgConfig::from_file(Path::new(&path))?,
    None => DmrgConfig::default(),
  };
  let block = SpinHalfXXZChain::new(config.delta, config.hz).with_solver(config.lanczos.clone());

  let mut idmrg = InfiniteDmrg::new(block.clone());
  idmrg.run(config.iterations, config.bond_dimension, false)?;
  if let Some(e) = idmrg.bulk_energy_per_site() {
    println!("Infinite DMRG, bulk energy per site {}", e);
  }

  let mut fdmrg = FiniteDmrg::new(block, config.chain_length, config.bond_dimension)?;
  match config.energy_tolerance {
    Some(tol) => {
      let sweeps = fdmrg.run_until_converged(config.sweeps, tol)?;
      println!("Finite DMRG stopped after {} sweeps", sweeps);
    }
    None => fdmrg.run(config.sweeps, config.bond_dimension)?,
  }
  if let Some(e) = fdmrg.ground_energy() {
    println!("Finite DMRG, L = {}, ground energy {}, energy per site {}",
             config.chain_length, e, e / config.chain_length as f64);
  }
  Ok(())
}
