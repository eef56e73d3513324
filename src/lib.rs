extern crate blas;
extern crate openblas_src;

pub mod block;
pub mod config;
pub mod error;
pub mod exact;
pub mod fdmrg;
pub mod idmrg;
pub mod lanczos;
pub mod linalg;
pub mod operator;
pub mod superblock;

pub use block::{Block, Bond, Renormalization, SpinHalfXXZChain, SuperBlock};
pub use config::DmrgConfig;
pub use error::{DmrgError, Result};
pub use fdmrg::FiniteDmrg;
pub use idmrg::InfiniteDmrg;
pub use linalg::Matrix;
pub use operator::SpinHalfOperator;
pub use superblock::SpinHalfXXZChainSuperBlock;
