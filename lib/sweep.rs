//! Quasienergy band structure over a momentum grid.

use std::f64::consts::{ PI, TAU };
use log::{ debug, info };
use ndarray as nd;
use num_complex::Complex64 as C64;
use rayon::prelude::*;
use crate::{
    eigu::{ UnitaryEigen, eigu },
    error::{ FloquetResult, positive },
    floquet::UBuilder,
    nd_utils::principal_arg,
};

/// Execution strategy for loops over independent momentum samples.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Exec {
    /// Distribute samples over the rayon thread pool.
    #[default]
    Parallel,
    /// Process samples one after another on the calling thread.
    Serial,
}

impl Exec {
    /// Apply `f` to every `(index, momentum)` pair, collecting results in
    /// momentum order and stopping at the first error.
    pub(crate) fn map_momenta<T, F>(self, momenta: &[f64], f: F)
        -> FloquetResult<Vec<T>>
    where
        T: Send,
        F: Fn(usize, f64) -> FloquetResult<T> + Sync + Send,
    {
        match self {
            Self::Parallel => {
                momenta.par_iter().enumerate()
                    .map(|(k, &ky)| f(k, ky))
                    .collect()
            },
            Self::Serial => {
                momenta.iter().enumerate()
                    .map(|(k, &ky)| f(k, ky))
                    .collect()
            },
        }
    }
}

/// `num` momenta evenly spaced over the Brillouin zone `[-π, π]`, endpoints
/// included.
pub fn brillouin_zone(num: usize) -> nd::Array1<f64> {
    nd::Array1::linspace(-PI, PI, num)
}

/// Driving frequency `ω = 2π / T`.
pub fn omega(period: f64) -> f64 { TAU / period }

/// Convert Floquet eigenphases `λ` to quasienergies `ε = -arg(λ) / T`.
///
/// With the principal branch `arg ∈ (-π, π]`, quasienergies lie in
/// `[-π/T, π/T)`.
pub fn quasienergies<S>(phases: &nd::ArrayBase<S, nd::Ix1>, period: f64)
    -> nd::Array1<f64>
where S: nd::Data<Elem = C64>
{
    phases.mapv(|l| -principal_arg(l) / period)
}

/// Floquet eigenpairs at a single momentum.
#[derive(Clone, Debug, PartialEq)]
pub struct SweepPoint {
    /// Transverse momentum.
    pub ky: f64,
    /// Quasienergies, ordered by ascending eigenphase argument (i.e. in
    /// non-increasing order).
    pub quasienergies: nd::Array1<f64>,
    /// Eigenvectors, one per column, matching `quasienergies`.
    pub vectors: nd::Array2<C64>,
}

impl SweepPoint {
    /// Diagonalize the Floquet operator of period `period` at momentum `ky`.
    pub fn compute(builder: &UBuilder, period: f64, ky: f64, tol: f64)
        -> FloquetResult<Self>
    {
        let U = builder.gen(period, ky)?;
        let (phases, vectors) = eigu(&U, tol)?.into_parts();
        let quasienergies = quasienergies(&phases, period);
        Ok(Self { ky, quasienergies, vectors })
    }

    /// Reassemble the eigendecomposition of the Floquet operator.
    pub fn to_eigen(&self, period: f64) -> UnitaryEigen {
        UnitaryEigen {
            phases: self.quasienergies.mapv(|e| C64::cis(-e * period)),
            vectors: self.vectors.clone(),
        }
    }
}

/// Quasienergy spectrum over a momentum grid for a single driving period.
#[derive(Clone, Debug, PartialEq)]
pub struct Spectrum {
    pub period: f64,
    pub points: Vec<SweepPoint>,
}

impl Spectrum {
    /// Diagonalize the Floquet operator at every momentum in `momenta`.
    ///
    /// Bands are not tracked across momenta: each sample is sorted
    /// independently by eigenphase.
    pub fn compute(
        builder: &UBuilder,
        period: f64,
        momenta: &nd::Array1<f64>,
        tol: f64,
        exec: Exec,
    ) -> FloquetResult<Self>
    {
        let period = positive("driving period", period)?;
        info!(
            "sweep: {} momenta, T = {:.6}, Lx = {}",
            momenta.len(), period, builder.lattice().lx(),
        );
        let ks: Vec<f64> = momenta.to_vec();
        let points
            = exec.map_momenta(&ks, |k, ky| {
                debug!("sweep: sample {} (ky = {:+.6})", k, ky);
                SweepPoint::compute(builder, period, ky, tol)
            })?;
        info!("sweep: done (T = {:.6})", period);
        Ok(Self { period, points })
    }

    /// Number of momentum samples.
    pub fn len(&self) -> usize { self.points.len() }

    /// Return `true` if there are no momentum samples.
    pub fn is_empty(&self) -> bool { self.points.is_empty() }

    /// Momentum grid.
    pub fn momenta(&self) -> nd::Array1<f64> {
        self.points.iter().map(|p| p.ky).collect()
    }

    /// Quasienergies as a `(momentum, band)` array.
    pub fn quasienergies(&self) -> nd::Array2<f64> {
        let nbands = self.points.first().map(|p| p.quasienergies.len()).unwrap_or(0);
        let mut E: nd::Array2<f64> = nd::Array2::zeros((self.points.len(), nbands));
        E.outer_iter_mut().zip(self.points.iter())
            .for_each(|(mut row, p)| row.assign(&p.quasienergies));
        E
    }

    /// Quasienergies in units of the driving frequency, `ε / ω`, which lie in
    /// `[-1/2, 1/2)`.
    pub fn scaled_quasienergies(&self) -> nd::Array2<f64> {
        self.quasienergies() / omega(self.period)
    }
}
