//! Pure-Rust symmetric eigendecomposition for `ndarray`.
//!
//! A real symmetric matrix `A` is decomposed as `A = Q * diag(w) * Q.t` in two stages:
//!
//! 1. Householder tridiagonalization ([`tridiagonal`]), with an unblocked and a blocked
//!    reducer sharing the [`TridiagonalReducer`](tridiagonal::TridiagonalReducer) trait.
//! 2. Implicit-shift QR iteration on the tridiagonal matrix ([`implicit_qr`]).
//!
//! Most callers only need the [`Eigh`](eigh::Eigh) trait or the
//! [`SymmetricEig`](eigh::SymmetricEig) builder.
//!
//! ```rust
//! use approx::assert_abs_diff_eq;
//! use ndarray::{array, Array2};
//! use linfa_symeig::{eigh::*, Order};
//!
//! let a = array![[2., 1.], [1., 2.]];
//! let (vals, vecs) = a.eigh().unwrap().sort_eig(Order::Smallest);
//! assert_abs_diff_eq!(vals, array![1., 3.], epsilon = 1e-12);
//! let diag = Array2::from_diag(&vals);
//! assert_abs_diff_eq!(a.dot(&vecs), vecs.dot(&diag), epsilon = 1e-12);
//! ```

mod blas;
pub mod eigh;
pub mod givens;
pub mod householder;
pub mod implicit_qr;
pub mod norm;
pub mod reflection;
pub mod tridiagonal;

use ndarray::{ArrayBase, Ix2, NdFloat, RawData};
use num_traits::NumCast;
use thiserror::Error;

/// Panel width used by the blocked reducer unless configured otherwise
pub const DEFAULT_BLOCK_SIZE: usize = 32;
/// Number of QR sweeps allowed per row of an active window before giving up
pub const DEFAULT_MAX_SWEEPS_PER_ROW: usize = 30;
/// Below this dimension [`Reduction::Auto`](eigh::Reduction::Auto) uses the unblocked reducer
pub const BLOCKED_CROSSOVER: usize = 64;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LinalgError {
    /// Non-square matrix
    #[error("Matrix with {rows} rows and {cols} cols is not square")]
    NotSquare { rows: usize, cols: usize },
    /// Unexpected number of rows
    #[error("Expected {expected} rows, got {actual} rows")]
    WrongRows { expected: usize, actual: usize },
    /// Unexpected number of columns
    #[error("Expected {expected} columns, got {actual} columns")]
    WrongColumns { expected: usize, actual: usize },
    /// Matrix with no elements
    #[error("Matrix is empty")]
    EmptyMatrix,
    /// The QR iteration ran out of sweeps on the window `start..=end`
    #[error("QR iteration on rows {start}..={end} did not converge after {sweeps} sweeps")]
    NoConvergence {
        start: usize,
        end: usize,
        sweeps: usize,
    },
}

pub type Result<T> = std::result::Result<T, LinalgError>;

/// Ordering of eigenvalues
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Largest,
    Smallest,
}

pub(crate) fn check_square<S: RawData>(arr: &ArrayBase<S, Ix2>) -> Result<usize> {
    let (rows, cols) = arr.dim();
    if rows != cols {
        Err(LinalgError::NotSquare { rows, cols })
    } else {
        Ok(rows)
    }
}

/// Converts an `f64` literal into the working float type.
pub(crate) fn lit<A: NdFloat>(x: f64) -> A {
    <A as NumCast>::from(x).unwrap_or_else(A::nan)
}
