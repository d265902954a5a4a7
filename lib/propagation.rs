//! Real-space propagation of a particle started on an edge site.
//!
//! For each transverse momentum `ky = 2π j / Ly` the Floquet eigenpairs give
//! the stroboscopic propagator
//! ```text
//! G(t, ky) = V diag(exp(-i ε t)) V†,    t = 0, T, ..., (m - 1) T
//! ```
//! An inverse discrete Fourier transform over the momentum index then gives
//! the amplitude at transverse coordinate `y`, and its squared magnitude on
//! the column of the reference site is the probability density of a particle
//! initialized there.

use log::{ debug, info };
use ndarray as nd;
use num_complex::Complex64 as C64;
use num_traits::Zero;
use rustfft::FftPlanner;
use crate::{
    eigu::DEF_TOL,
    error::{ FloquetError, FloquetResult, positive },
    floquet::{ UBuilder, spectral_propagator },
    sweep::{ Exec, SweepPoint },
};

/// Stroboscopic times `k T` for `k = 0, ..., periods - 1`.
pub fn time_grid(period: f64, periods: usize) -> nd::Array1<f64> {
    (0..periods).map(|k| k as f64 * period).collect()
}

/// Evolve the reference column `x0` of the propagator over `times`.
///
/// Returns `G(t)[x, x0]` as a `(time, site)` array.
pub fn evolve_column<SE, SV>(
    E: &nd::ArrayBase<SE, nd::Ix1>,
    V: &nd::ArrayBase<SV, nd::Ix2>,
    times: &nd::Array1<f64>,
    x0: usize,
) -> nd::Array2<C64>
where
    SE: nd::Data<Elem = f64>,
    SV: nd::Data<Elem = C64>,
{
    let c: nd::Array1<C64> = V.row(x0).mapv(|v| v.conj());
    let mut G: nd::Array2<C64> = nd::Array2::zeros((times.len(), V.nrows()));
    let iter = times.iter().zip(G.outer_iter_mut());
    for (&tk, Gk) in iter {
        V.dot(&(&c * &E.mapv(|e| C64::cis(-e * tk))))
            .move_into(Gk);
    }
    G
}

/// Apply a normalized inverse discrete Fourier transform along `axis`,
///
/// ```text
/// a[y] = (1 / L) Σ_j A[j] exp(+2πi j y / L)
/// ```
/// which maps the momentum index `j` to the transverse coordinate `y`.
pub fn inverse_dft_axis<D>(arr: &mut nd::Array<C64, D>, axis: nd::Axis)
where D: nd::Dimension
{
    let len = arr.len_of(axis);
    if len == 0 { return; }
    let mut planner = FftPlanner::<f64>::new();
    let ifft = planner.plan_fft_inverse(len);
    let scale = 1.0 / len as f64;
    let mut buf: Vec<C64> = vec![C64::zero(); len];
    for mut lane in arr.lanes_mut(axis) {
        buf.iter_mut().zip(lane.iter())
            .for_each(|(b, a)| { *b = *a; });
        ifft.process(&mut buf);
        lane.iter_mut().zip(buf.iter())
            .for_each(|(a, b)| { *a = *b * scale; });
    }
}

/// Squared magnitude of every amplitude.
pub fn probability_density<S, D>(amps: &nd::ArrayBase<S, D>) -> nd::Array<f64, D>
where
    S: nd::Data<Elem = C64>,
    D: nd::Dimension,
{
    amps.mapv(|a| a.norm_sqr())
}

/// Roll a `(time, y, x)` density by `-Ly/2` (rounded toward negative
/// infinity) along `y`, so that `y = 0` sits in the middle of the axis.
pub fn center_transverse<S>(density: &nd::ArrayBase<S, nd::Ix3>) -> nd::Array3<f64>
where S: nd::Data<Elem = f64>
{
    let ly = density.len_of(nd::Axis(1));
    if ly == 0 { return density.to_owned(); }
    let shift = (ly / 2 + ly % 2) % ly;
    nd::Array3::from_shape_fn(density.dim(), |(t, y, x)| {
        density[[t, (y + shift) % ly, x]]
    })
}

/// Probability density from a full propagator tensor indexed as
/// `(time, momentum, x, x0)`, for a particle initialized on site `x0`.
///
/// Returns a `(time, y, x)` array.
pub fn density_from_propagators<S>(G: &nd::ArrayBase<S, nd::Ix4>, x0: usize)
    -> FloquetResult<nd::Array3<f64>>
where S: nd::Data<Elem = C64>
{
    let lx = G.len_of(nd::Axis(3));
    if x0 >= lx {
        return Err(FloquetError::OutOfRange {
            what: "reference site", index: x0, len: lx });
    }
    let mut amps: nd::Array3<C64>
        = G.index_axis(nd::Axis(3), x0).to_owned();
    inverse_dft_axis(&mut amps, nd::Axis(1));
    Ok(probability_density(&amps))
}

/// Probability density over `(time, y, x)` together with its time grid.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeDensity {
    pub time: nd::Array1<f64>,
    pub density: nd::Array3<f64>,
}

impl EdgeDensity {
    /// Number of time steps.
    pub fn num_times(&self) -> usize { self.density.len_of(nd::Axis(0)) }

    /// Number of transverse coordinates.
    pub fn ly(&self) -> usize { self.density.len_of(nd::Axis(1)) }

    /// Number of lattice sites along the driven direction.
    pub fn lx(&self) -> usize { self.density.len_of(nd::Axis(2)) }

    /// Total probability at each time.
    pub fn total_probability(&self) -> nd::Array1<f64> {
        self.density.map_axis(nd::Axis(2), |r| r.sum()).sum_axis(nd::Axis(1))
    }

    /// Density rolled along `y` so that `y = 0` is centered.
    pub fn centered(&self) -> nd::Array3<f64> { center_transverse(&self.density) }

    /// Select a subset of time steps.
    pub fn snapshots(&self, steps: &[usize]) -> FloquetResult<nd::Array3<f64>> {
        let len = self.num_times();
        if let Some(&index) = steps.iter().find(|&&k| k >= len) {
            return Err(FloquetError::OutOfRange { what: "snapshot", index, len });
        }
        Ok(self.density.select(nd::Axis(0), steps))
    }
}

/// Edge-propagation simulator for a single driving regime.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EdgeSimulator {
    builder: UBuilder,
    period: f64,
    periods: usize,
    tol: f64,
    source: usize,
}

impl EdgeSimulator {
    /// Create a new `EdgeSimulator` evolving over `periods` driving periods of
    /// length `period`, starting from the first lattice site.
    pub fn new(builder: UBuilder, period: f64, periods: usize)
        -> FloquetResult<Self>
    {
        let period = positive("driving period", period)?;
        if periods == 0 {
            return Err(FloquetError::NonPositive {
                what: "number of periods", value: 0.0 });
        }
        Ok(Self { builder, period, periods, tol: DEF_TOL, source: 0 })
    }

    /// Set the degeneracy tolerance passed to the diagonalizer.
    pub fn with_tolerance(mut self, tol: f64) -> FloquetResult<Self> {
        self.tol = positive("tolerance", tol)?;
        Ok(self)
    }

    /// Set the initial site along the driven direction.
    pub fn with_source(mut self, x0: usize) -> FloquetResult<Self> {
        let lx = self.builder.lattice().lx();
        if x0 >= lx {
            return Err(FloquetError::OutOfRange {
                what: "reference site", index: x0, len: lx });
        }
        self.source = x0;
        Ok(self)
    }

    pub fn period(&self) -> f64 { self.period }

    pub fn periods(&self) -> usize { self.periods }

    pub fn source(&self) -> usize { self.source }

    /// Time grid `0, T, ..., (m - 1) T`.
    pub fn times(&self) -> nd::Array1<f64> { time_grid(self.period, self.periods) }

    /// Transverse momenta `2π j / Ly`.
    pub fn momenta(&self) -> nd::Array1<f64> {
        self.builder.lattice().transverse_momenta()
    }

    fn eigenpairs(&self, k: usize, ky: f64) -> FloquetResult<SweepPoint> {
        debug!("edge: momentum {} (ky = {:.6})", k, ky);
        SweepPoint::compute(&self.builder, self.period, ky, self.tol)
    }

    /// Compute the full propagator tensor `G[t, j, x, x0]`.
    ///
    /// This holds `m Ly Lx²` complex entries; prefer [`Self::run`] when only
    /// the density is needed.
    pub fn propagators(&self, exec: Exec) -> FloquetResult<nd::Array4<C64>> {
        let times = self.times();
        let ks = self.momenta().to_vec();
        let lx = self.builder.lattice().lx();
        let per_k: Vec<Vec<nd::Array2<C64>>>
            = exec.map_momenta(&ks, |k, ky| {
                let p = self.eigenpairs(k, ky)?;
                Ok(
                    times.iter()
                    .map(|&t| spectral_propagator(&p.quasienergies, &p.vectors, t))
                    .collect()
                )
            })?;
        let mut G: nd::Array4<C64>
            = nd::Array4::zeros((times.len(), ks.len(), lx, lx));
        for (j, Gj) in per_k.into_iter().enumerate() {
            for (t, Gtj) in Gj.into_iter().enumerate() {
                Gtj.move_into(G.slice_mut(nd::s![t, j, .., ..]));
            }
        }
        Ok(G)
    }

    /// Compute the momentum-space amplitudes `G[t, j, x, x0]` on the
    /// reference column only, as a `(time, momentum, x)` array.
    pub fn amplitudes(&self, exec: Exec) -> FloquetResult<nd::Array3<C64>> {
        let times = self.times();
        let ks = self.momenta().to_vec();
        let lx = self.builder.lattice().lx();
        let columns: Vec<nd::Array2<C64>>
            = exec.map_momenta(&ks, |k, ky| {
                let p = self.eigenpairs(k, ky)?;
                Ok(evolve_column(&p.quasienergies, &p.vectors, &times, self.source))
            })?;
        let mut amps: nd::Array3<C64>
            = nd::Array3::zeros((times.len(), ks.len(), lx));
        for (j, Gj) in columns.into_iter().enumerate() {
            Gj.move_into(amps.index_axis_mut(nd::Axis(1), j));
        }
        Ok(amps)
    }

    /// Run the simulation, returning the probability density over
    /// `(time, y, x)`.
    pub fn run(&self, exec: Exec) -> FloquetResult<EdgeDensity> {
        info!(
            "edge: T = {:.6}, {} periods, Ly = {}, Lx = {}, x0 = {}",
            self.period,
            self.periods,
            self.builder.lattice().ly(),
            self.builder.lattice().lx(),
            self.source,
        );
        let mut amps = self.amplitudes(exec)?;
        inverse_dft_axis(&mut amps, nd::Axis(1));
        let density = probability_density(&amps);
        info!("edge: done (T = {:.6})", self.period);
        Ok(EdgeDensity { time: self.times(), density })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;
    use approx::assert_abs_diff_eq;
    use crate::{
        floquet::Couplings,
        lattice::Lattice,
        nd_utils::max_abs,
    };

    fn simulator(n: usize, ly: usize, couplings: Couplings, period: f64, periods: usize)
        -> EdgeSimulator
    {
        let builder = UBuilder::new(Lattice::new(n, ly).unwrap(), couplings);
        EdgeSimulator::new(builder, period, periods).unwrap()
    }

    #[test]
    fn time_grid_excludes_endpoint() {
        let t = time_grid(0.5, 4);
        assert_eq!(t, nd::array![0.0, 0.5, 1.0, 1.5]);
    }

    #[test]
    fn inverse_dft_matches_direct_sum() {
        let L = 5;
        let A: nd::Array1<C64>
            = (0..L).map(|j| C64::new(j as f64 - 1.5, 0.3 * (j * j) as f64)).collect();
        let mut a = A.clone();
        inverse_dft_axis(&mut a, nd::Axis(0));
        for y in 0..L {
            let direct: C64
                = (0..L)
                .map(|j| A[j] * C64::cis(2.0 * PI * (j * y) as f64 / L as f64))
                .sum::<C64>() / L as f64;
            assert!((a[y] - direct).norm() < 1e-12);
        }
    }

    #[test]
    fn inverse_dft_along_middle_axis() {
        // constant in momentum -> localized at y = 0
        let mut a: nd::Array3<C64> = nd::Array3::from_elem((2, 4, 3), C64::new(1.0, 0.0));
        inverse_dft_axis(&mut a, nd::Axis(1));
        for ((_, y, _), v) in a.indexed_iter() {
            let expected = if y == 0 { 1.0 } else { 0.0 };
            assert!((v - C64::new(expected, 0.0)).norm() < 1e-14);
        }
    }

    #[test]
    fn centering_moves_origin_to_middle() {
        for ly in [4, 5] {
            let mut d: nd::Array3<f64> = nd::Array3::zeros((1, ly, 2));
            d[[0, 0, 1]] = 1.0;
            let c = center_transverse(&d);
            assert_eq!(c[[0, ly / 2, 1]], 1.0, "ly = {ly}");
            assert_abs_diff_eq!(c.sum(), 1.0);
        }
    }

    #[test]
    fn density_starts_localized_and_is_conserved() {
        for period in [3.0 * PI / 2.0, PI / 2.0] {
            let sim = simulator(2, 6, Couplings::default(), period, 6);
            let res = sim.run(Exec::Serial).unwrap();
            assert_eq!(res.density.dim(), (6, 6, 8));
            assert!(res.density.iter().all(|&p| p >= 0.0));
            for ((y, x), &p) in res.density.index_axis(nd::Axis(0), 0).indexed_iter() {
                let expected = if y == 0 && x == 0 { 1.0 } else { 0.0 };
                assert_abs_diff_eq!(p, expected, epsilon = 1e-10);
            }
            for &total in res.total_probability().iter() {
                assert_abs_diff_eq!(total, 1.0, epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn tensor_and_column_paths_agree() {
        let sim = simulator(2, 5, Couplings::new(1.0, 0.3), 1.1, 4)
            .with_source(3).unwrap();
        let G = sim.propagators(Exec::Parallel).unwrap();
        assert_eq!(G.dim(), (4, 5, 8, 8));
        let from_tensor = density_from_propagators(&G, 3).unwrap();
        let from_column = sim.run(Exec::Serial).unwrap().density;
        assert!(
            (from_tensor - from_column).iter().all(|d| d.abs() < 1e-10)
        );
        let amps = sim.amplitudes(Exec::Serial).unwrap();
        assert!(max_abs(&(&G.index_axis(nd::Axis(3), 3) - &amps)) < 1e-10);
    }

    #[test]
    fn decoupled_edge_moves_one_site_per_period() {
        // J' = 0 and J T / 3 = π / 2: each step fully swaps the paired sites,
        // and the corner site picks up exp(-i ky) once per period
        let ly = 7;
        let sim = simulator(2, ly, Couplings::new(1.0, 0.0), 3.0 * PI / 2.0, 5);
        let res = sim.run(Exec::Serial).unwrap();
        for k in 0..5 {
            assert_abs_diff_eq!(res.density[[k, k % ly, 0]], 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn frozen_lattice_stays_put() {
        let sim = simulator(1, 4, Couplings::new(0.0, 0.0), 1.0, 3);
        let res = sim.run(Exec::Parallel).unwrap();
        for k in 0..3 {
            assert_abs_diff_eq!(res.density[[k, 0, 0]], 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn snapshots_are_bounds_checked() {
        let sim = simulator(1, 3, Couplings::default(), 1.0, 4);
        let res = sim.run(Exec::Serial).unwrap();
        assert_eq!(res.snapshots(&[0, 3]).unwrap().dim(), (2, 3, 4));
        assert!(matches!(
            res.snapshots(&[1, 4]),
            Err(FloquetError::OutOfRange { index: 4, len: 4, .. })
        ));
    }

    #[test]
    fn rejects_bad_parameters() {
        let builder = UBuilder::new(Lattice::new(1, 3).unwrap(), Couplings::default());
        assert!(EdgeSimulator::new(builder, 0.0, 3).is_err());
        assert!(EdgeSimulator::new(builder, 1.0, 0).is_err());
        let sim = EdgeSimulator::new(builder, 1.0, 3).unwrap();
        assert!(sim.with_source(4).is_err());
        assert!(sim.with_tolerance(-1.0).is_err());
    }
}
