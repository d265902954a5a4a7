//! Diagonalization of unitary matrices that stays correct for degenerate
//! eigenphases.
//!
//! A general (non-Hermitian) eigensolver gives no guarantee of an orthonormal
//! eigenbasis when eigenvalues coincide, which for Floquet operators happens
//! routinely at symmetry points of the momentum grid. Instead, a unitary `U` is
//! diagonalized in two Hermitian passes:
//!
//! 1. Diagonalize the Hermitian part `U + U†`. This commutes with `U`, but
//!    maps the distinct eigenphases `λ` and `λ̄` to the same real eigenvalue
//!    `2 Re λ`, so its eigenspaces can be larger than those of `U`.
//! 2. In that basis, `U` is block-diagonal. Indices joined by off-diagonal
//!    elements larger than a tolerance are grouped into connected blocks, and
//!    each block `B` is rediagonalized through the Hermitian `i (B - B†)`,
//!    whose eigenvalues `-2 Im λ` separate `λ` from `λ̄`.
//!
//! The second rotation is verified afterward: any surviving off-diagonal
//! coupling above tolerance is reported as
//! [`FloquetError::DegeneracyUnresolved`].

use itertools::Itertools;
use log::{ debug, warn };
use ndarray as nd;
use ndarray_linalg::{ Eigh, UPLO };
use num_complex::Complex64 as C64;
use rustc_hash::FxHashMap as HashMap;
use crate::{
    error::{ FloquetError, FloquetResult },
    nd_utils::{ adjoint, check_unitary, principal_arg },
};

/// Default tolerance for detecting residual off-diagonal coupling.
pub const DEF_TOL: f64 = 1e-9;

/// Eigendecomposition `U = V diag(phases) V†` of a unitary matrix.
///
/// Phases are sorted by ascending principal argument, and the columns of
/// `vectors` are ordered to match.
#[derive(Clone, Debug, PartialEq)]
pub struct UnitaryEigen {
    pub phases: nd::Array1<C64>,
    pub vectors: nd::Array2<C64>,
}

impl UnitaryEigen {
    /// Number of eigenpairs.
    pub fn len(&self) -> usize { self.phases.len() }

    /// Return `true` if there are no eigenpairs.
    pub fn is_empty(&self) -> bool { self.phases.is_empty() }

    /// Principal arguments of the eigenphases, in `(-π, π]`.
    pub fn angles(&self) -> nd::Array1<f64> { self.phases.mapv(principal_arg) }

    /// Compute `V diag(phases) V†`.
    pub fn reconstruct(&self) -> nd::Array2<C64> {
        (&self.vectors * &self.phases).dot(&adjoint(&self.vectors))
    }

    /// Unpack into `(phases, vectors)`.
    pub fn into_parts(self) -> (nd::Array1<C64>, nd::Array2<C64>) {
        (self.phases, self.vectors)
    }
}

// union-find over matrix indices
#[derive(Clone, Debug)]
struct DisjointSet {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self { parent: (0..n).collect(), size: vec![1; n] }
    }

    fn find(&mut self, k: usize) -> usize {
        let mut root = k;
        while self.parent[root] != root { root = self.parent[root]; }
        let mut cur = k;
        while self.parent[cur] != root {
            let next = self.parent[cur];
            self.parent[cur] = root;
            cur = next;
        }
        root
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb { return; }
        let (big, small)
            = if self.size[ra] >= self.size[rb] { (ra, rb) } else { (rb, ra) };
        self.parent[small] = big;
        self.size[big] += self.size[small];
    }
}

/// Group the indices of a square matrix into connected blocks, where two
/// indices are connected if the off-diagonal element between them exceeds
/// `tol` in magnitude.
///
/// Only blocks of two or more indices are returned. Each block is sorted, and
/// blocks are ordered by their smallest index.
pub fn coupled_blocks<S>(M: &nd::ArrayBase<S, nd::Ix2>, tol: f64)
    -> Vec<Vec<usize>>
where S: nd::Data<Elem = C64>
{
    let m = M.nrows();
    let mut sets = DisjointSet::new(m);
    let mut flagged: Vec<bool> = vec![false; m];
    for (j, k) in (0..m).cartesian_product(0..m) {
        if j != k && M[[j, k]].norm() > tol {
            sets.union(j, k);
            flagged[j] = true;
            flagged[k] = true;
        }
    }
    let mut blocks: HashMap<usize, Vec<usize>> = HashMap::default();
    for k in (0..m).filter(|k| flagged[*k]) {
        blocks.entry(sets.find(k)).or_default().push(k);
    }
    blocks.into_values()
        .filter(|block| block.len() > 1)
        .sorted_by_key(|block| block[0])
        .collect()
}

/// Largest off-diagonal element magnitude of a square matrix.
pub fn max_offdiag<S>(M: &nd::ArrayBase<S, nd::Ix2>) -> f64
where S: nd::Data<Elem = C64>
{
    M.indexed_iter()
        .filter(|((i, j), _)| i != j)
        .map(|(_, a)| a.norm())
        .fold(0.0, f64::max)
}

/// Diagonalize a unitary matrix `U`, resolving degenerate eigenphases.
///
/// Returns eigenphases sorted by ascending principal argument and a matching
/// orthonormal eigenbasis such that `U = V diag(phases) V†`. `tol` sets the
/// magnitude above which a residual off-diagonal element is treated as
/// coupling to be resolved (see [`DEF_TOL`]).
///
/// `U` is assumed to be unitary and is not checked; see [`eigu_checked`].
/// Fails if `U` is not square, if a Hermitian eigendecomposition fails, or if
/// off-diagonal coupling survives the block rediagonalization.
pub fn eigu<S>(U: &nd::ArrayBase<S, nd::Ix2>, tol: f64)
    -> FloquetResult<UnitaryEigen>
where S: nd::Data<Elem = C64>
{
    if !U.is_square() {
        let (rows, cols) = U.dim();
        return Err(FloquetError::NotSquare { rows, cols });
    }
    let m = U.nrows();
    let Ud: nd::Array2<C64> = adjoint(U);
    let (_, mut V1): (nd::Array1<f64>, nd::Array2<C64>)
        = (U + &Ud).eigh(UPLO::Lower)?;
    let mut U1: nd::Array2<C64> = adjoint(&V1).dot(U).dot(&V1);

    let blocks = coupled_blocks(&U1, tol);
    if !blocks.is_empty() {
        let mut V2: nd::Array2<C64> = nd::Array2::eye(m);
        for block in blocks.iter() {
            if block.len() > 2 {
                warn!(
                    "eigu: resolving a block of {} mutually coupled indices",
                    block.len(),
                );
            } else {
                debug!("eigu: resolving coupled indices {:?}", block);
            }
            let B: nd::Array2<C64>
                = U1.select(nd::Axis(0), block).select(nd::Axis(1), block);
            let G: nd::Array2<C64> = (&B - &adjoint(&B)) * C64::i();
            let (_, W): (nd::Array1<f64>, nd::Array2<C64>)
                = G.eigh(UPLO::Lower)?;
            for ((a, &ga), (b, &gb))
                in block.iter().enumerate().cartesian_product(block.iter().enumerate())
            {
                V2[[ga, gb]] = W[[a, b]];
            }
        }
        V1 = V1.dot(&V2);
        U1 = adjoint(&V2).dot(&U1).dot(&V2);
        let residual = max_offdiag(&U1);
        if residual > tol {
            return Err(FloquetError::DegeneracyUnresolved { residual });
        }
    }

    let diag: nd::Array1<C64> = U1.diag().to_owned();
    let order: Vec<usize>
        = (0..m)
        .sorted_by(|&a, &b| {
            principal_arg(diag[a]).total_cmp(&principal_arg(diag[b]))
        })
        .collect();
    let phases: nd::Array1<C64> = diag.select(nd::Axis(0), &order);
    let vectors: nd::Array2<C64> = V1.select(nd::Axis(1), &order);
    Ok(UnitaryEigen { phases, vectors })
}

/// Like [`eigu`], but first check that `U` is unitary to within `tol`.
pub fn eigu_checked<S>(U: &nd::ArrayBase<S, nd::Ix2>, tol: f64)
    -> FloquetResult<UnitaryEigen>
where S: nd::Data<Elem = C64>
{
    check_unitary(U, tol)?;
    eigu(U, tol)
}
