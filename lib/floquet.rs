//! Composition of the one-period evolution (Floquet) operator.
//!
//! The period `T` is split into three equal steps. During step *k* the bond
//! class *k* (A, B, then C) couples with strength `J` while the other two
//! couple with strength `J′`:
//! ```text
//! H1 = -J A - J′ (B + C)
//! H2 = -J B - J′ (A + C)
//! H3 = -J C - J′ (A + B)
//! U(T) = exp(-i H3 T/3) exp(-i H2 T/3) exp(-i H1 T/3)
//! ```
//! Each factor is evaluated exactly through a Hermitian eigendecomposition.

use ndarray as nd;
use ndarray_linalg::{ Eigh, UPLO };
use num_complex::Complex64 as C64;
use crate::{
    error::{ FloquetResult, positive },
    lattice::{ Bond, Lattice },
    nd_utils::{ adjoint, check_hermitian },
};

/// Hopping strengths for the dominant (`j`) and subdominant (`j_prime`) bonds
/// of each step.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Couplings {
    pub j: f64,
    pub j_prime: f64,
}

impl Couplings {
    /// Create a new `Couplings`.
    pub fn new(j: f64, j_prime: f64) -> Self { Self { j, j_prime } }
}

impl Default for Couplings {
    fn default() -> Self { Self { j: 1.0, j_prime: 0.1 } }
}

/// Compute `V diag(exp(-i E t)) V†`.
pub fn spectral_propagator<SE, SV>(
    E: &nd::ArrayBase<SE, nd::Ix1>,
    V: &nd::ArrayBase<SV, nd::Ix2>,
    t: f64,
) -> nd::Array2<C64>
where
    SE: nd::Data<Elem = f64>,
    SV: nd::Data<Elem = C64>,
{
    let phases: nd::Array1<C64> = E.mapv(|e| C64::cis(-e * t));
    (V * &phases).dot(&adjoint(V))
}

/// Compute `exp(-i H t)` for Hermitian `H`.
pub fn step_propagator<S>(H: &nd::ArrayBase<S, nd::Ix2>, t: f64)
    -> FloquetResult<nd::Array2<C64>>
where S: nd::Data<Elem = C64>
{
    let (E, V): (nd::Array1<f64>, nd::Array2<C64>) = H.eigh(UPLO::Lower)?;
    Ok(spectral_propagator(&E, &V, t))
}

/// Floquet operator builder for the three-step bond drive.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct UBuilder {
    lattice: Lattice,
    couplings: Couplings,
}

impl UBuilder {
    /// Create a new `UBuilder`.
    pub fn new(lattice: Lattice, couplings: Couplings) -> Self {
        Self { lattice, couplings }
    }

    /// Get a reference to the lattice.
    pub fn lattice(&self) -> &Lattice { &self.lattice }

    /// Get the couplings.
    pub fn couplings(&self) -> Couplings { self.couplings }

    /// Build the step Hamiltonians `[H1, H2, H3]` at momentum `ky`.
    pub fn step_hamiltonians(&self, ky: f64) -> [nd::Array2<C64>; 3] {
        let Couplings { j, j_prime } = self.couplings;
        let [ha, hb, hc]
            = Bond::ALL.map(|bond| self.lattice.bond_matrix(bond, ky));
        let H1 = &ha * (-j) - (&hb + &hc) * j_prime;
        let H2 = &hb * (-j) - (&ha + &hc) * j_prime;
        let H3 = &hc * (-j) - (&ha + &hb) * j_prime;
        [H1, H2, H3]
    }

    /// Compute the Floquet operator `U(T)` at momentum `ky` for driving period
    /// `period`.
    pub fn gen(&self, period: f64, ky: f64) -> FloquetResult<nd::Array2<C64>> {
        let period = positive("driving period", period)?;
        self.compose(self.step_hamiltonians(ky), period)
    }

    /// Like [`Self::gen`], but first check that each step Hamiltonian is
    /// Hermitian to within `tol`.
    pub fn gen_checked(&self, period: f64, ky: f64, tol: f64)
        -> FloquetResult<nd::Array2<C64>>
    {
        let period = positive("driving period", period)?;
        let steps = self.step_hamiltonians(ky);
        for H in steps.iter() {
            check_hermitian(H, tol)?;
        }
        self.compose(steps, period)
    }

    fn compose(&self, steps: [nd::Array2<C64>; 3], period: f64)
        -> FloquetResult<nd::Array2<C64>>
    {
        let dt = period / 3.0;
        let lx = self.lattice.lx();
        let mut U: nd::Array2<C64> = nd::Array2::eye(lx);
        // later steps multiply from the left
        for H in steps.iter() {
            U = step_propagator(H, dt)?.dot(&U);
        }
        Ok(U)
    }
}
