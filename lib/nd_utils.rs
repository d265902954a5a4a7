//! Matrix and state-vector utilities, including the Hermiticity and unitarity
//! checks used to validate inputs to the Floquet machinery.

use std::f64::consts::{ PI, TAU };
use ndarray as nd;
use num_complex::Complex64 as C64;
use num_traits::One;
use crate::error::{ FloquetError, FloquetResult };

/// Compute the conjugate transpose of a matrix.
pub fn adjoint<S>(M: &nd::ArrayBase<S, nd::Ix2>) -> nd::Array2<C64>
where S: nd::Data<Elem = C64>
{
    M.t().mapv(|a| a.conj())
}

/// Compute the outer product `|a⟩⟨b|` of two state vectors.
///
/// With `a == b`, this is the density matrix of a pure state.
pub fn outer_prod<SA, SB>(
    a: &nd::ArrayBase<SA, nd::Ix1>,
    b: &nd::ArrayBase<SB, nd::Ix1>,
) -> nd::Array2<C64>
where
    SA: nd::Data<Elem = C64>,
    SB: nd::Data<Elem = C64>,
{
    nd::Array2::from_shape_fn((a.len(), b.len()), |(i, j)| a[i] * b[j].conj())
}

/// Compute the (real part of the) expectation value `⟨ψ|O|ψ⟩`.
pub fn exp_val<SP, SO>(
    psi: &nd::ArrayBase<SP, nd::Ix1>,
    op: &nd::ArrayBase<SO, nd::Ix2>,
) -> f64
where
    SP: nd::Data<Elem = C64>,
    SO: nd::Data<Elem = C64>,
{
    psi.iter().zip(op.dot(psi).iter())
        .map(|(p, opp)| p.conj() * opp)
        .sum::<C64>()
        .re
}

/// Compute the squared norm `⟨ψ|ψ⟩`.
pub fn norm_sq<S>(psi: &nd::ArrayBase<S, nd::Ix1>) -> f64
where S: nd::Data<Elem = C64>
{
    psi.iter().map(|a| a.norm_sqr()).sum()
}

/// Return a normalized copy of `psi`.
///
/// Fails with [`FloquetError::IllConditioned`] if the norm of `psi` is below
/// `tol`.
pub fn normalize<S>(psi: &nd::ArrayBase<S, nd::Ix1>, tol: f64)
    -> FloquetResult<nd::Array1<C64>>
where S: nd::Data<Elem = C64>
{
    let norm = norm_sq(psi).sqrt();
    if norm.is_nan() || norm < tol {
        return Err(FloquetError::IllConditioned { norm });
    }
    Ok(psi.mapv(|a| a / norm))
}

/// Principal argument of a complex number, in `(-π, π]`.
///
/// Differs from [`C64::arg`] only on the negative real axis with negative-zero
/// imaginary part, which is mapped to `+π`.
pub fn principal_arg(z: C64) -> f64 {
    let a = z.arg();
    if a <= -PI { a + TAU } else { a }
}

/// Largest element magnitude in an array, or zero if it's empty.
pub fn max_abs<S, D>(arr: &nd::ArrayBase<S, D>) -> f64
where
    S: nd::Data<Elem = C64>,
    D: nd::Dimension,
{
    arr.iter().map(|a| a.norm()).fold(0.0, f64::max)
}

/// Compute `max |M - M†|` over all elements, if `M` is square.
pub fn hermiticity_residual<S>(M: &nd::ArrayBase<S, nd::Ix2>) -> Option<f64>
where S: nd::Data<Elem = C64>
{
    M.is_square().then(|| max_abs(&(M - &adjoint(M))))
}

/// Compute `max |M M† - I|` over all elements, if `M` is square.
pub fn unitarity_residual<S>(M: &nd::ArrayBase<S, nd::Ix2>) -> Option<f64>
where S: nd::Data<Elem = C64>
{
    M.is_square().then(|| {
        let mut diff: nd::Array2<C64> = M.dot(&adjoint(M));
        diff.diag_mut().iter_mut().for_each(|d| { *d -= C64::one(); });
        max_abs(&diff)
    })
}

/// Return `true` if `M` is square and Hermitian to within `tol`.
pub fn is_herm<S>(M: &nd::ArrayBase<S, nd::Ix2>, tol: f64) -> bool
where S: nd::Data<Elem = C64>
{
    hermiticity_residual(M).is_some_and(|r| r < tol)
}

/// Return `true` if `M` is square and unitary to within `tol`.
pub fn is_unitary<S>(M: &nd::ArrayBase<S, nd::Ix2>, tol: f64) -> bool
where S: nd::Data<Elem = C64>
{
    unitarity_residual(M).is_some_and(|r| r < tol)
}

fn not_square<S>(M: &nd::ArrayBase<S, nd::Ix2>) -> FloquetError
where S: nd::Data<Elem = C64>
{
    let (rows, cols) = M.dim();
    FloquetError::NotSquare { rows, cols }
}

/// Like [`is_herm`], but report a labeled error on failure.
pub fn check_hermitian<S>(M: &nd::ArrayBase<S, nd::Ix2>, tol: f64)
    -> FloquetResult<()>
where S: nd::Data<Elem = C64>
{
    let residual = hermiticity_residual(M).ok_or_else(|| not_square(M))?;
    if residual < tol {
        Ok(())
    } else {
        Err(FloquetError::NotHermitian { residual })
    }
}

/// Like [`is_unitary`], but report a labeled error on failure.
pub fn check_unitary<S>(M: &nd::ArrayBase<S, nd::Ix2>, tol: f64)
    -> FloquetResult<()>
where S: nd::Data<Elem = C64>
{
    let residual = unitarity_residual(M).ok_or_else(|| not_square(M))?;
    if residual < tol {
        Ok(())
    } else {
        Err(FloquetError::NotUnitary { residual })
    }
}
