#![allow(non_snake_case)]

//! Floquet band structure and edge-state propagation for a periodically driven
//! two-dimensional lattice with three alternating bond classes.
//!
//! The drive cycles through three equal-length steps, each dominated by one of
//! the A, B, or C bond classes. For every transverse momentum *k*<sub>*y*</sub>
//! the one-period evolution operator is composed from the three step
//! Hamiltonians ([`floquet`]) and diagonalized with a routine that stays
//! correct for degenerate eigenphases ([`eigu`]). The resulting quasienergies
//! give the band structure ([`sweep`]), and the eigenpairs over a discrete
//! transverse momentum grid give real-space propagation of a particle
//! initialized on the first lattice site ([`propagation`]).

pub mod utils;
pub mod error;
pub mod nd_utils;
pub mod lattice;
pub mod floquet;
pub mod eigu;
pub mod sweep;
pub mod propagation;
pub mod config;

pub use error::{ FloquetError, FloquetResult };
pub use lattice::{ Bond, Lattice };
pub use floquet::{ Couplings, UBuilder };
pub use eigu::{ UnitaryEigen, eigu, eigu_checked, DEF_TOL };
pub use sweep::{ Exec, SweepPoint, Spectrum };
pub use propagation::{ EdgeDensity, EdgeSimulator };
pub use config::{ Config, Regime };
