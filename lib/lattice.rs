//! Lattice geometry and the three bond-class Hamiltonians.
//!
//! The driven direction holds `Lx = 4 n` sites (`n` unit cells of four sites
//! each), and the transverse direction is treated through its momentum
//! *k*<sub>*y*</sub>. In 1-based site labels, the bonds within and between
//! unit cells are
//! ```text
//! A: (4x + 3) <-> (4x + 4) with phase exp(+i ky),  (4x + 1) <-> (4x + 2)
//! B: (4x + 2) <-> (4x + 1) with phase exp(+i ky),  (4x + 3) <-> (4x + 4)
//! C: (4x)     <-> (4x + 1),                        (4x + 2) <-> (4x + 3)
//! ```
//! The C bonds between `4x` and `4x + 1` link neighboring unit cells, so there
//! are only `n - 1` of them; everything else appears once per unit cell. All
//! indices below are 0-based.

use ndarray as nd;
use num_complex::Complex64 as C64;
use num_traits::One;
use crate::error::{ FloquetError, FloquetResult };

/// Names one of the three bond classes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Bond {
    A,
    B,
    C,
}

impl Bond {
    /// All bond classes, in drive order.
    pub const ALL: [Bond; 3] = [Bond::A, Bond::B, Bond::C];

    /// Return `true` if the bond matrix depends on *k*<sub>*y*</sub>.
    pub fn is_momentum_dependent(&self) -> bool { !matches!(self, Bond::C) }

    /// List the 0-based site pairs `(i, j)` carrying a bond, together with a
    /// flag marking the pairs that pick up the momentum phase `exp(+i ky)` on
    /// the `(i, j)` element.
    pub fn pairs(&self, n: usize) -> Vec<(usize, usize, bool)> {
        match *self {
            Bond::A => {
                (0..n).flat_map(|x| {
                    [(4 * x + 2, 4 * x + 3, true), (4 * x, 4 * x + 1, false)]
                })
                .collect()
            },
            Bond::B => {
                (0..n).flat_map(|x| {
                    [(4 * x + 1, 4 * x, true), (4 * x + 2, 4 * x + 3, false)]
                })
                .collect()
            },
            Bond::C => {
                let inter = (0..n.saturating_sub(1))
                    .map(|x| (4 * x + 3, 4 * x + 4, false));
                let intra = (0..n).map(|x| (4 * x + 1, 4 * x + 2, false));
                inter.chain(intra).collect()
            },
        }
    }
}

/// Lattice dimensions.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Lattice {
    n: usize,
    ly: usize,
}

impl Lattice {
    /// Create a new `Lattice` with `n` unit cells along the driven direction
    /// and `ly` sites along the transverse direction.
    ///
    /// Fails if either is zero.
    pub fn new(n: usize, ly: usize) -> FloquetResult<Self> {
        if n == 0 {
            return Err(FloquetError::SiteCount { n, lx: 0 });
        }
        if ly == 0 {
            return Err(FloquetError::NonPositive { what: "Ly", value: 0.0 });
        }
        Ok(Self { n, ly })
    }

    /// Create a new `Lattice` from an explicit site count `lx`, checking that
    /// it equals `4 n`.
    pub fn with_sites(n: usize, lx: usize, ly: usize) -> FloquetResult<Self> {
        check_sites(n, lx)?;
        Self::new(n, ly)
    }

    /// Number of unit cells along the driven direction.
    pub fn n(&self) -> usize { self.n }

    /// Number of sites along the driven direction.
    pub fn lx(&self) -> usize { 4 * self.n }

    /// Number of sites along the transverse direction.
    pub fn ly(&self) -> usize { self.ly }

    /// Transverse momenta `2π j / Ly` dual to a periodic transverse direction
    /// of `Ly` sites.
    pub fn transverse_momenta(&self) -> nd::Array1<f64> {
        let ly = self.ly as f64;
        (0..self.ly).map(|j| std::f64::consts::TAU * j as f64 / ly).collect()
    }

    /// Build the bond matrix of a given class at momentum `ky`.
    ///
    /// `ky` is ignored for [`Bond::C`].
    pub fn bond_matrix(&self, bond: Bond, ky: f64) -> nd::Array2<C64> {
        bond_matrix(self.n, self.lx(), bond, ky)
    }

    /// Build the A-bond matrix at momentum `ky`.
    pub fn ha(&self, ky: f64) -> nd::Array2<C64> {
        self.bond_matrix(Bond::A, ky)
    }

    /// Build the B-bond matrix at momentum `ky`.
    pub fn hb(&self, ky: f64) -> nd::Array2<C64> {
        self.bond_matrix(Bond::B, ky)
    }

    /// Build the (momentum-independent) C-bond matrix.
    pub fn hc(&self) -> nd::Array2<C64> {
        self.bond_matrix(Bond::C, 0.0)
    }
}

/// Check that `lx == 4 n` with `n > 0`.
pub fn check_sites(n: usize, lx: usize) -> FloquetResult<()> {
    (n > 0 && lx == 4 * n).then_some(())
        .ok_or(FloquetError::SiteCount { n, lx })
}

/// Build the `lx × lx` matrix of a bond class over `n` unit cells at momentum
/// `ky`.
///
/// No checks are performed: `lx` is expected to equal `4 n` (see
/// [`check_sites`]). Pairs falling outside the matrix are skipped.
pub fn bond_matrix(n: usize, lx: usize, bond: Bond, ky: f64) -> nd::Array2<C64> {
    let phase: C64 = C64::cis(ky);
    let mut H: nd::Array2<C64> = nd::Array2::zeros((lx, lx));
    for (i, j, twisted) in bond.pairs(n) {
        if i >= lx || j >= lx { continue; }
        let w: C64 = if twisted { phase } else { C64::one() };
        H[[i, j]] = w;
        H[[j, i]] = w.conj();
    }
    H
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;
    use crate::nd_utils::is_herm;

    fn nonzero_upper(H: &nd::Array2<C64>) -> Vec<(usize, usize, C64)> {
        H.indexed_iter()
            .filter(|((i, j), h)| i < j && h.norm() > 0.0)
            .map(|((i, j), h)| (i, j, *h))
            .collect()
    }

    #[test]
    fn rejects_bad_site_counts() {
        assert!(Lattice::new(0, 10).is_err());
        assert!(Lattice::new(3, 0).is_err());
        assert!(matches!(
            Lattice::with_sites(3, 13, 10),
            Err(FloquetError::SiteCount { n: 3, lx: 13 })
        ));
        assert_eq!(Lattice::with_sites(3, 12, 10).unwrap().lx(), 12);
    }

    #[test]
    fn bonds_are_hermitian() {
        for n in [1, 2, 3, 5, 13] {
            let lat = Lattice::new(n, 4).unwrap();
            for ky in [-PI, -1.3, 0.0, 0.4, 2.0, PI] {
                for bond in Bond::ALL {
                    let H = lat.bond_matrix(bond, ky);
                    assert_eq!(H.dim(), (4 * n, 4 * n));
                    assert!(is_herm(&H, 1e-14), "{bond:?} n={n} ky={ky}");
                    assert!(H.diag().iter().all(|h| h.norm() == 0.0));
                }
            }
        }
    }

    #[test]
    fn single_cell_pattern() {
        let lat = Lattice::new(1, 1).unwrap();
        let ky = 0.7;
        let ha = nonzero_upper(&lat.ha(ky));
        assert_eq!(ha.len(), 2);
        assert_eq!(ha[0].0, 0);
        assert_eq!(ha[0].1, 1);
        assert_eq!(ha[0].2, C64::one());
        assert_eq!((ha[1].0, ha[1].1), (2, 3));
        assert!((ha[1].2 - C64::cis(ky)).norm() < 1e-15);

        let hb = lat.hb(ky);
        assert!((hb[[1, 0]] - C64::cis(ky)).norm() < 1e-15);
        assert_eq!(hb[[2, 3]], C64::one());
        assert_eq!(nonzero_upper(&hb).len(), 2);

        let hc = nonzero_upper(&lat.hc());
        assert_eq!(hc, vec![(1, 2, C64::one())]);
    }

    #[test]
    fn every_site_has_one_bond_per_class_in_the_bulk() {
        let lat = Lattice::new(4, 1).unwrap();
        for bond in Bond::ALL {
            let H = lat.bond_matrix(bond, 0.3);
            for (x, row) in H.outer_iter().enumerate() {
                let count = row.iter().filter(|h| h.norm() > 0.0).count();
                let edge = x == 0 || x == lat.lx() - 1;
                if bond == Bond::C && edge {
                    assert_eq!(count, 0, "site {x}");
                } else {
                    assert_eq!(count, 1, "{bond:?} site {x}");
                }
                assert!(row.iter().all(|h| h.norm() == 0.0 || (h.norm() - 1.0).abs() < 1e-15));
            }
        }
    }

    #[test]
    fn c_bonds_ignore_momentum() {
        let lat = Lattice::new(3, 1).unwrap();
        assert_eq!(lat.bond_matrix(Bond::C, 1.1), lat.hc());
        assert!(!Bond::C.is_momentum_dependent());
        assert!(Bond::A.is_momentum_dependent());
    }

    #[test]
    fn transverse_momenta_grid() {
        let lat = Lattice::new(1, 4).unwrap();
        let k = lat.transverse_momenta();
        assert_eq!(k.len(), 4);
        assert!((k[1] - PI / 2.0).abs() < 1e-15);
        assert_eq!(k[0], 0.0);
    }
}
