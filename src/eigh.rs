//! Eigendecomposition of symmetric matrices
//!
//! The matrix is first reduced to tridiagonal form with Householder reflections, then the
//! tridiagonal matrix is diagonalized with implicit-shift QR iteration. Only the lower triangle
//! of the input is read.

use std::cmp::Ordering;

use log::debug;
use ndarray::{Array1, Array2, ArrayBase, ArrayView2, Axis, Data, Ix2, NdFloat};

use crate::{
    implicit_qr::ImplicitQr,
    tridiagonal::{
        BlockedTridiagonal, TridiagonalDecomp, TridiagonalReducer, UnblockedTridiagonal,
    },
    Order, Result, BLOCKED_CROSSOVER, DEFAULT_BLOCK_SIZE, DEFAULT_MAX_SWEEPS_PER_ROW,
};

/// Tridiagonal reduction strategy used by [`SymmetricEig`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Reduction {
    /// One reflection at a time, with matrix-vector kernels
    Unblocked,
    /// Panels of reflections, with matrix-matrix kernels
    Blocked,
    /// Unblocked below [`BLOCKED_CROSSOVER`] rows, blocked otherwise
    #[default]
    Auto,
}

/// Configurable symmetric eigensolver
///
/// # Example
///
/// ```rust
/// use approx::assert_abs_diff_eq;
/// use ndarray::array;
/// use linfa_symeig::eigh::{EigSort, Reduction, SymmetricEig};
/// use linfa_symeig::Order;
///
/// let a = array![[3., 0., 1.], [0., 2., 0.], [1., 0., 3.]];
/// let vals = SymmetricEig::new(&a)
///     .reduction(Reduction::Blocked)
///     .block_size(1)
///     .eigenvalues()
///     .unwrap()
///     .sort_eig(Order::Largest);
/// assert_abs_diff_eq!(vals, array![4., 2., 2.], epsilon = 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct SymmetricEig<'a, A> {
    matrix: ArrayView2<'a, A>,
    reduction: Reduction,
    block_size: usize,
    eps: A,
    max_sweeps_per_row: usize,
}

impl<'a, A: NdFloat> SymmetricEig<'a, A> {
    /// Create a solver for `matrix`, with the default configuration
    pub fn new<S: Data<Elem = A>>(matrix: &'a ArrayBase<S, Ix2>) -> Self {
        Self {
            matrix: matrix.view(),
            reduction: Reduction::default(),
            block_size: DEFAULT_BLOCK_SIZE,
            eps: A::epsilon(),
            max_sweeps_per_row: DEFAULT_MAX_SWEEPS_PER_ROW,
        }
    }

    /// Set the tridiagonal reduction strategy
    pub fn reduction(mut self, reduction: Reduction) -> Self {
        self.reduction = reduction;

        self
    }

    /// Set the panel width of the blocked reduction. Ignored by the unblocked reduction.
    pub fn block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;

        self
    }

    /// Set the relative tolerance below which sub-diagonal entries are treated as zero
    pub fn eps(mut self, eps: A) -> Self {
        self.eps = eps;

        self
    }

    /// Set the QR sweep budget, per row of the active window
    pub fn max_sweeps_per_row(mut self, max_sweeps_per_row: usize) -> Self {
        self.max_sweeps_per_row = max_sweeps_per_row;

        self
    }

    /// Compute eigenvalues and eigenvectors, in no particular order.
    ///
    /// Column `i` of the returned matrix is the unit eigenvector of eigenvalue `i`.
    pub fn decompose(&self) -> Result<(Array1<A>, Array2<A>)> {
        let (mut diag, mut off_diag, q) = self.tridiagonalize(true)?.into_parts();
        // Reducers accumulate Q unless switched to values_only
        let mut q = q.unwrap_or_else(|| Array2::eye(diag.len()));
        ImplicitQr::new(&mut diag, &mut off_diag, &mut q)?
            .eps(self.eps)
            .max_sweeps_per_row(self.max_sweeps_per_row)
            .run()?;
        Ok((diag, q))
    }

    /// Compute eigenvalues only, in no particular order.
    ///
    /// Neither the reduction nor the QR iteration track the orthogonal transform.
    pub fn eigenvalues(&self) -> Result<Array1<A>> {
        let (mut diag, mut off_diag, _) = self.tridiagonalize(false)?.into_parts();
        ImplicitQr::values_only(&mut diag, &mut off_diag)?
            .eps(self.eps)
            .max_sweeps_per_row(self.max_sweeps_per_row)
            .run()?;
        Ok(diag)
    }

    fn tridiagonalize(&self, vectors: bool) -> Result<TridiagonalDecomp<A>> {
        let n = self.matrix.nrows();
        let blocked = match self.reduction {
            Reduction::Unblocked => false,
            Reduction::Blocked => true,
            Reduction::Auto => n >= BLOCKED_CROSSOVER,
        };

        let decomp = if blocked {
            debug!(
                "blocked tridiagonal reduction of {}x{} matrix, block size {}",
                n,
                self.matrix.ncols(),
                self.block_size
            );
            let reducer = BlockedTridiagonal::new(&self.matrix)?.block_size(self.block_size);
            run_reducer(reducer, vectors)
        } else {
            debug!(
                "unblocked tridiagonal reduction of {}x{} matrix",
                n,
                self.matrix.ncols()
            );
            run_reducer(UnblockedTridiagonal::new(&self.matrix)?, vectors)
        };
        Ok(decomp)
    }
}

fn run_reducer<A, R>(mut reducer: R, vectors: bool) -> TridiagonalDecomp<A>
where
    A: NdFloat,
    R: TridiagonalReducer<A>,
{
    if !vectors {
        reducer = reducer.values_only();
    }
    reducer.run();
    reducer.into_decomp()
}

/// Eigendecomposition of symmetric matrices
pub trait Eigh {
    type EigVal;
    type EigVec;

    /// Calculate eigenvalues and eigenvectors of symmetric matrices, returning a tuple of
    /// eigenvalues and eigenvectors (as columns). Only the lower triangular half of the matrix is
    /// accessed. The eigenvalues are not sorted.
    fn eigh(&self) -> Result<(Self::EigVal, Self::EigVec)>;

    /// Calculate eigenvalues of symmetric matrices without eigenvectors. Only the lower
    /// triangular half of the matrix is accessed. The eigenvalues are not sorted.
    fn eigvalsh(&self) -> Result<Self::EigVal>;
}

impl<A: NdFloat, S: Data<Elem = A>> Eigh for ArrayBase<S, Ix2> {
    type EigVal = Array1<A>;
    type EigVec = Array2<A>;

    fn eigh(&self) -> Result<(Self::EigVal, Self::EigVec)> {
        SymmetricEig::new(self).decompose()
    }

    fn eigvalsh(&self) -> Result<Self::EigVal> {
        SymmetricEig::new(self).eigenvalues()
    }
}

/// Implemented on the output of symmetric eigenvalue decomposition to sort the eigenvalues
pub trait EigSort: Sized {
    fn sort_eig_in_place(&mut self, order: Order);

    /// Sort eigendecomposition by the eigenvalues in ascending or descending order. Eigenvectors
    /// are permuted along with their eigenvalues.
    fn sort_eig(mut self, order: Order) -> Self {
        self.sort_eig_in_place(order);
        self
    }
}

fn sorted_indices<A: NdFloat>(vals: &Array1<A>, order: Order) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..vals.len()).collect();
    indices.sort_by(|&a, &b| {
        let ord = vals[a].partial_cmp(&vals[b]).unwrap_or(Ordering::Equal);
        match order {
            Order::Smallest => ord,
            Order::Largest => ord.reverse(),
        }
    });
    indices
}

impl<A: NdFloat> EigSort for Array1<A> {
    fn sort_eig_in_place(&mut self, order: Order) {
        let indices = sorted_indices(self, order);
        *self = self.select(Axis(0), &indices);
    }
}

impl<A: NdFloat> EigSort for (Array1<A>, Array2<A>) {
    fn sort_eig_in_place(&mut self, order: Order) {
        let (vals, vecs) = self;
        let indices = sorted_indices(vals, order);
        *vals = vals.select(Axis(0), &indices);
        *vecs = vecs.select(Axis(1), &indices);
    }
}
