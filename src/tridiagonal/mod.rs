//! Householder tridiagonalization of symmetric matrices
//!
//! A symmetric matrix `A` is reduced by orthogonal similarity to a symmetric tridiagonal matrix
//! `T = Q.t * A * Q`. Two reducers share the [`TridiagonalReducer`] contract:
//!
//! * [`UnblockedTridiagonal`] applies one reflection at a time with matrix-vector kernels.
//! * [`BlockedTridiagonal`] gathers panels of reflections and applies them with matrix-matrix
//!   kernels.
//!
//! Both read only the lower triangle of the input and produce the same decomposition up to
//! rounding.

mod blocked;
mod unblocked;

use ndarray::{s, Array1, Array2, ArrayBase, Data, Ix2, NdFloat};

use crate::{check_square, LinalgError, Result, BLOCKED_CROSSOVER};

pub use blocked::BlockedTridiagonal;
pub use unblocked::UnblockedTridiagonal;

/// Shared contract of the tridiagonal reducers
pub trait TridiagonalReducer<A: NdFloat>: Sized {
    /// Copies the lower triangle of `matrix` into an owned work buffer and allocates the outputs.
    ///
    /// Fails if `matrix` is not square or is empty. No work is done until [`run`](Self::run).
    fn new<S: Data<Elem = A>>(matrix: &ArrayBase<S, Ix2>) -> Result<Self>;

    /// Stops accumulating `Q`, for callers that only need `T`. Saves the cost of applying every
    /// reflection to `Q`; [`q`](Self::q) then returns `None`.
    fn values_only(self) -> Self;

    /// Performs the reduction. Calling it again after completion is a no-op.
    fn run(&mut self);

    /// Diagonal of `T`
    fn diag(&self) -> &Array1<A>;

    /// Sub-diagonal of `T`
    fn off_diag(&self) -> &Array1<A>;

    /// Accumulated orthogonal transform `Q`, unless the reducer was switched to
    /// [`values_only`](Self::values_only)
    fn q(&self) -> Option<&Array2<A>>;

    /// Hands the outputs over, releasing the work buffer.
    fn into_decomp(self) -> TridiagonalDecomp<A>;

    /// Assembles the dense tridiagonal matrix `T`
    fn tridiag_matrix(&self) -> Array2<A> {
        assemble_tridiagonal(self.diag(), self.off_diag())
    }
}

/// Tridiagonal decomposition `A = Q * T * Q.t`
#[derive(Debug, Clone)]
pub struct TridiagonalDecomp<A> {
    diag: Array1<A>,
    off_diag: Array1<A>,
    q: Option<Array2<A>>,
}

impl<A: NdFloat> TridiagonalDecomp<A> {
    pub fn diag(&self) -> &Array1<A> {
        &self.diag
    }

    pub fn off_diag(&self) -> &Array1<A> {
        &self.off_diag
    }

    pub fn q(&self) -> Option<&Array2<A>> {
        self.q.as_ref()
    }

    /// Returns the tridiagonal matrix `T` without consuming the decomposition
    pub fn tridiag_matrix(&self) -> Array2<A> {
        assemble_tridiagonal(&self.diag, &self.off_diag)
    }

    /// Returns the tridiagonal matrix `T`
    pub fn into_tridiag_matrix(self) -> Array2<A> {
        self.tridiag_matrix()
    }

    /// Returns the diagonal, sub-diagonal and `Q`, in that order
    pub fn into_parts(self) -> (Array1<A>, Array1<A>, Option<Array2<A>>) {
        (self.diag, self.off_diag, self.q)
    }
}

/// Tridiagonal decomposition of symmetric matrices
pub trait SymmetricTridiagonal {
    type Decomp;

    /// Calculate the tridiagonal decomposition of a symmetric matrix, consisting of symmetric
    /// tridiagonal matrix `T` and orthogonal matrix `Q`, such that `Q * T * Q.t` yields the
    /// original matrix. Only the lower triangle is read.
    ///
    /// Small matrices go through the unblocked reducer, larger ones through the blocked reducer.
    fn sym_tridiagonal(&self) -> Result<Self::Decomp>;
}

impl<A, S> SymmetricTridiagonal for ArrayBase<S, Ix2>
where
    A: NdFloat,
    S: Data<Elem = A>,
{
    type Decomp = TridiagonalDecomp<A>;

    fn sym_tridiagonal(&self) -> Result<Self::Decomp> {
        if self.nrows() < BLOCKED_CROSSOVER {
            reduce::<UnblockedTridiagonal<A>, _, _>(self)
        } else {
            reduce::<BlockedTridiagonal<A>, _, _>(self)
        }
    }
}

/// Runs a reducer of type `R` on `matrix` to completion.
pub fn reduce<R, A, S>(matrix: &ArrayBase<S, Ix2>) -> Result<TridiagonalDecomp<A>>
where
    R: TridiagonalReducer<A>,
    A: NdFloat,
    S: Data<Elem = A>,
{
    let mut reducer = R::new(matrix)?;
    reducer.run();
    Ok(reducer.into_decomp())
}

pub(crate) fn assemble_tridiagonal<A: NdFloat>(
    diag: &Array1<A>,
    off_diag: &Array1<A>,
) -> Array2<A> {
    let n = diag.len();
    let mut res = Array2::from_diag(diag);
    if n > 1 {
        res.slice_mut(s![1.., ..]).diag_mut().assign(off_diag);
        res.slice_mut(s![.., 1..]).diag_mut().assign(off_diag);
    }
    res
}

/// Buffers shared by both reducers
#[derive(Debug, Clone)]
struct ReducerState<A> {
    // Lower triangle holds the (partially reduced) matrix and the reflection axes
    work: Array2<A>,
    diag: Array1<A>,
    off_diag: Array1<A>,
    q: Option<Array2<A>>,
    reduced: bool,
}

impl<A: NdFloat> ReducerState<A> {
    fn new<S: Data<Elem = A>>(matrix: &ArrayBase<S, Ix2>) -> Result<Self> {
        let n = check_square(matrix)?;
        if n == 0 {
            return Err(LinalgError::EmptyMatrix);
        }

        Ok(Self {
            work: matrix.to_owned(),
            diag: Array1::zeros(n),
            off_diag: Array1::zeros(n - 1),
            q: Some(Array2::eye(n)),
            reduced: false,
        })
    }

    fn into_decomp(self) -> TridiagonalDecomp<A> {
        TridiagonalDecomp {
            diag: self.diag,
            off_diag: self.off_diag,
            q: self.q,
        }
    }
}
