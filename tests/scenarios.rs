#![allow(non_snake_case)]

use std::f64::consts::PI;
use approx::assert_abs_diff_eq;
use ndarray as nd;
use ndarray_linalg::Determinant;
use num_complex::Complex64 as C64;
use floquet_edge::{
    Bond,
    Config,
    Couplings,
    Exec,
    Lattice,
    Spectrum,
    UBuilder,
    eigu,
    eigu_checked,
    nd_utils::{ is_herm, is_unitary, max_abs },
};

fn upper_pairs(H: &nd::Array2<C64>) -> Vec<(usize, usize)> {
    H.indexed_iter()
        .filter(|((i, j), h)| i < j && h.norm() > 1e-15)
        .map(|((i, j), _)| (i, j))
        .collect()
}

#[test]
fn single_cell_at_zero_momentum() {
    let lattice = Lattice::new(1, 1).unwrap();
    let bonds: Vec<nd::Array2<C64>>
        = Bond::ALL.iter().map(|&b| lattice.bond_matrix(b, 0.0)).collect();
    assert_eq!(upper_pairs(&bonds[0]), vec![(0, 1), (2, 3)]);
    assert_eq!(upper_pairs(&bonds[1]), vec![(0, 1), (2, 3)]);
    assert_eq!(upper_pairs(&bonds[2]), vec![(1, 2)]);
    for H in bonds.iter() {
        assert!(is_herm(H, 1e-14));
        assert!(
            H.iter().all(|h| h.norm() < 1e-15 || (h.norm() - 1.0).abs() < 1e-14)
        );
    }

    let builder = UBuilder::new(lattice, Couplings::default());
    let U = builder.gen_checked(3.0 * PI / 2.0, 0.0, 1e-12).unwrap();
    assert_eq!(U.dim(), (4, 4));
    assert!(is_unitary(&U, 1e-10));

    let eig = eigu_checked(&U, 1e-9).unwrap();
    assert_eq!(eig.len(), 4);
    for l in eig.phases.iter() {
        assert_abs_diff_eq!(l.norm(), 1.0, epsilon = 1e-10);
    }
    let prod: C64 = eig.phases.iter().product();
    let det: C64 = U.det().unwrap();
    assert_abs_diff_eq!(prod.re, det.re, epsilon = 1e-10);
    assert_abs_diff_eq!(prod.im, det.im, epsilon = 1e-10);
    assert!(max_abs(&(eig.reconstruct() - &U)) < 1e-10);
}

#[test]
fn both_regimes_have_principal_quasienergies() {
    let config = Config::from_toml_str("[sweep]\nnum_ky = 9").unwrap();
    let builder = config.builder().unwrap();
    for regime in config.regimes.iter() {
        let period = regime.period();
        let spectrum = Spectrum::compute(
            &builder, period, &config.sweep_momenta(), config.tolerance, Exec::Parallel,
        ).unwrap();
        let E = spectrum.quasienergies();
        assert_eq!(E.dim(), (9, 52));
        assert!(E.iter().all(|e| e.abs() <= PI / period + 1e-12));
        for p in spectrum.points.iter() {
            let U = builder.gen(period, p.ky).unwrap();
            let W = p.to_eigen(period).reconstruct();
            assert!(max_abs(&(W - U)) < 1e-8, "{} ky = {}", regime.label, p.ky);
        }
    }
}

#[test]
fn edge_propagation_conserves_probability() {
    let config = Config::from_toml_str(r#"
        snapshots = [0, 1, 5]

        [lattice]
        n = 3
        ly = 8

        [[regimes]]
        label = "anomalous"
        period_pi = 1.5
        periods = 6

        [[regimes]]
        label = "haldane"
        period_pi = 0.5
        periods = 6
    "#).unwrap();
    for regime in config.regimes.iter() {
        let edge = config.simulator(regime).unwrap().run(Exec::Parallel).unwrap();
        assert_eq!(edge.density.dim(), (6, 8, 12));
        assert!(edge.density.iter().all(|&p| p >= 0.0));
        assert_abs_diff_eq!(edge.density[[0, 0, 0]], 1.0, epsilon = 1e-10);
        assert_abs_diff_eq!(edge.density.index_axis(nd::Axis(0), 0).sum(), 1.0, epsilon = 1e-10);
        for &total in edge.total_probability().iter() {
            assert_abs_diff_eq!(total, 1.0, epsilon = 1e-10);
        }
        let snaps = edge.snapshots(&config.snapshots).unwrap();
        assert_eq!(snaps.dim(), (3, 8, 12));
        let centered = edge.centered();
        assert_abs_diff_eq!(centered[[0, 4, 0]], 1.0, epsilon = 1e-10);
    }
}

#[test]
fn anomalous_edge_is_chiral_without_weak_bonds() {
    // with J' = 0 the two edges move in opposite transverse directions
    let ly = 9;
    let builder = UBuilder::new(Lattice::new(2, ly).unwrap(), Couplings::new(1.0, 0.0));
    let sim = floquet_edge::EdgeSimulator::new(builder, 3.0 * PI / 2.0, 4).unwrap();
    let left = sim.run(Exec::Serial).unwrap();
    let right = sim.with_source(7).unwrap().run(Exec::Serial).unwrap();
    for k in 0..4 {
        assert_abs_diff_eq!(left.density[[k, k % ly, 0]], 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(right.density[[k, (ly - k) % ly, 7]], 1.0, epsilon = 1e-9);
    }
}

#[test]
fn degenerate_identity_is_diagonalized() {
    let U: nd::Array2<C64> = nd::Array2::eye(6);
    let eig = eigu(&U, 1e-9).unwrap();
    assert!(is_unitary(&eig.vectors, 1e-12));
    assert!(eig.phases.iter().all(|l| (l - C64::new(1.0, 0.0)).norm() < 1e-12));
}
