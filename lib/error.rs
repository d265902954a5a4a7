//! Error types shared across the crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FloquetError {
    /// Returned when the site count along the driven direction is not four
    /// times a nonzero number of unit cells.
    #[error("invalid lattice: Lx = {lx} must equal 4 * n with n = {n} > 0")]
    SiteCount { n: usize, lx: usize },

    /// Returned when a quantity that must be strictly positive is not.
    #[error("invalid parameter: {what} must be positive, got {value}")]
    NonPositive { what: &'static str, value: f64 },

    /// Returned when a matrix argument is not square.
    #[error("invalid matrix: expected a square matrix, got {rows}x{cols}")]
    NotSquare { rows: usize, cols: usize },

    /// Returned by validation wrappers when a matrix that should be Hermitian
    /// is not.
    #[error("precondition failed: matrix is not Hermitian (max |H - H†| = {residual:.3e})")]
    NotHermitian { residual: f64 },

    /// Returned by validation wrappers when a matrix that should be unitary is
    /// not.
    #[error("precondition failed: matrix is not unitary (max |U U† - I| = {residual:.3e})")]
    NotUnitary { residual: f64 },

    /// Returned when off-diagonal coupling survives the block rediagonalization
    /// of a unitary.
    #[error("degeneracy resolution failed: residual off-diagonal coupling {residual:.3e}")]
    DegeneracyUnresolved { residual: f64 },

    /// Returned when an index falls outside the axis it refers to.
    #[error("index out of range: {what} index {index} for length {len}")]
    OutOfRange { what: &'static str, index: usize, len: usize },

    /// Returned when attempting to normalize a state with vanishing norm.
    #[error("ill-conditioned state: cannot normalize a state with norm {norm:.3e}")]
    IllConditioned { norm: f64 },

    /// Returned when the dense Hermitian eigensolver fails.
    #[error("linear algebra error: {0}")]
    Linalg(#[from] ndarray_linalg::error::LinalgError),

    /// Returned when a configuration cannot be parsed or holds an invalid
    /// value.
    #[error("configuration error: {0}")]
    Config(String),
}
pub type FloquetResult<T> = Result<T, FloquetError>;

/// Return `Ok(value)` if `value > 0`, otherwise a [`FloquetError::NonPositive`]
/// naming the quantity.
pub(crate) fn positive(what: &'static str, value: f64) -> FloquetResult<f64> {
    (value > 0.0).then_some(value)
        .ok_or(FloquetError::NonPositive { what, value })
}
