use std::cmp::Ordering;

use ndarray::{
    linalg::general_mat_vec_mul, s, Array1, Array2, ArrayBase, ArrayViewMut1, ArrayViewMut2,
    Data, Ix2, NdFloat,
};

use super::{unblocked::reduce_columns, ReducerState, TridiagonalDecomp, TridiagonalReducer};
use crate::{
    blas::{symv_lower, syr2k_lower},
    householder::make_reflector,
    lit,
    reflection::BlockReflection,
    Result, DEFAULT_BLOCK_SIZE,
};

/// Tridiagonal reducer working on panels of `block_size` columns.
///
/// Within a panel only the panel columns are updated; the rest of the trailing submatrix receives
/// the panel's combined update `A22 -= V * W.t + W * V.t` at once, and `Q` receives the panel's
/// reflections in compact WY form. Whatever is left once the trailing submatrix is no larger than
/// a panel is reduced with the unblocked algorithm.
///
/// ```rust
/// use approx::assert_abs_diff_eq;
/// use ndarray::Array2;
/// use linfa_symeig::tridiagonal::{BlockedTridiagonal, TridiagonalReducer};
///
/// let a = Array2::from_shape_fn((12, 12), |(i, j)| 1. / (1. + i as f64 + j as f64));
/// let mut reducer = BlockedTridiagonal::new(&a).unwrap().block_size(4);
/// reducer.run();
/// let (q, t) = (reducer.q().unwrap(), reducer.tridiag_matrix());
/// assert_abs_diff_eq!(q.dot(&t).dot(&q.t()), a, epsilon = 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct BlockedTridiagonal<A> {
    state: ReducerState<A>,
    block_size: usize,
}

impl<A> BlockedTridiagonal<A> {
    /// Set the panel width. Values below 1 are treated as 1.
    pub fn block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size.max(1);

        self
    }
}

impl<A: NdFloat> TridiagonalReducer<A> for BlockedTridiagonal<A> {
    fn new<S: Data<Elem = A>>(matrix: &ArrayBase<S, Ix2>) -> Result<Self> {
        Ok(Self {
            state: ReducerState::new(matrix)?,
            block_size: DEFAULT_BLOCK_SIZE,
        })
    }

    fn values_only(mut self) -> Self {
        self.state.q = None;

        self
    }

    fn run(&mut self) {
        if self.state.reduced {
            return;
        }

        let n = self.state.work.nrows();
        let nb = self.block_size;
        let mut k = 0;
        while n - k > nb.saturating_add(1) {
            reduce_panel(&mut self.state, k, nb);
            k += nb;
        }
        reduce_columns(&mut self.state, k);
        self.state.reduced = true;
    }


    fn diag(&self) -> &Array1<A> {
        &self.state.diag
    }

    fn off_diag(&self) -> &Array1<A> {
        &self.state.off_diag
    }

    fn q(&self) -> Option<&Array2<A>> {
        self.state.q.as_ref()
    }

    fn into_decomp(self) -> TridiagonalDecomp<A> {
        self.state.into_decomp()
    }
}

/// Reduces columns `k..k + nb`, then applies the panel to the trailing submatrix and to `Q`.
///
/// Requires `k + nb + 1 < n` so that every panel column has a non-empty reflection and the
/// trailing submatrix is not empty.
fn reduce_panel<A: NdFloat>(state: &mut ReducerState<A>, k: usize, nb: usize) {
    let ReducerState {
        work,
        diag,
        off_diag,
        q,
        ..
    } = state;
    let mut a = work.slice_mut(s![k.., k..]);
    let m = a.nrows();

    let mut w = Array2::zeros((m, nb));
    let mut taus = Array1::zeros(nb);
    build_panel(
        &mut a,
        &mut w,
        &mut off_diag.slice_mut(s![k..k + nb]),
        &mut taus,
    );

    // A22 -= V * W.t + W * V.t
    {
        let (v, mut trailing) = a.multi_slice_mut((s![nb.., ..nb], s![nb.., nb..]));
        syr2k_lower(-A::one(), &v, &w.slice(s![nb.., ..]), &mut trailing, nb);
    }

    // Q = Q * (I - V * T * V.t), with V unit lower trapezoidal and starting at row k + 1
    if let Some(q) = q.as_mut() {
        let v = Array2::from_shape_fn((m - 1, nb), |(r, i)| match r.cmp(&i) {
            Ordering::Less => A::zero(),
            Ordering::Equal => A::one(),
            Ordering::Greater => a[(r + 1, i)],
        });
        BlockReflection::new(v, &taus).reflect_rows(&mut q.slice_mut(s![.., k + 1..]));
    }

    for i in 0..nb {
        a[(i + 1, i)] = off_diag[k + i];
        diag[k + i] = a[(i, i)];
    }
}

/// Builds the reflections of the first `nb` columns of `a`, together with `w` such that applying
/// all of them to the trailing submatrix `a[nb.., nb..]` is `A22 -= V * W.t + W * V.t`.
///
/// Only the panel columns of `a` are updated. On return the reflection axes sit below the
/// diagonal of the panel columns, with their unit leading entries stored explicitly.
fn build_panel<A: NdFloat>(
    a: &mut ArrayViewMut2<A>,
    w: &mut Array2<A>,
    off_diag: &mut ArrayViewMut1<A>,
    taus: &mut Array1<A>,
) {
    let nb = w.ncols();
    let mut tmp = Array1::zeros(nb);

    for i in 0..nb {
        if i > 0 {
            // Bring column i up to date with the previous reflections of the panel
            let (mut col, prev_v) = a.multi_slice_mut((s![i.., i], s![i.., ..i]));
            general_mat_vec_mul(-A::one(), &prev_v, &w.slice(s![i, ..i]), A::one(), &mut col);
            general_mat_vec_mul(
                -A::one(),
                &w.slice(s![i.., ..i]),
                &prev_v.slice(s![0, ..]),
                A::one(),
                &mut col,
            );
        }

        let (beta, tau) = {
            let mut col = a.slice_mut(s![i + 1.., i]);
            let alpha = col[0];
            make_reflector(alpha, &mut col.slice_mut(s![1..]))
        };
        off_diag[i] = beta;
        taus[i] = tau;
        a[(i + 1, i)] = A::one();

        let a = a.view();
        let v = a.slice(s![i + 1.., i]);
        let mut w_col = Array1::zeros(v.len());

        // w_i = tau * (A22 - V * W.t - W * V.t) * v, restricted to the rows below column i
        symv_lower(A::one(), &a.slice(s![i + 1.., i + 1..]), &v, &mut w_col);
        if i > 0 {
            let prev_v = a.slice(s![i + 1.., ..i]);
            let prev_w = w.slice(s![i + 1.., ..i]);
            let mut tmp = tmp.slice_mut(s![..i]);
            general_mat_vec_mul(A::one(), &prev_w.t(), &v, A::zero(), &mut tmp);
            general_mat_vec_mul(-A::one(), &prev_v, &tmp, A::one(), &mut w_col);
            general_mat_vec_mul(A::one(), &prev_v.t(), &v, A::zero(), &mut tmp);
            general_mat_vec_mul(-A::one(), &prev_w, &tmp, A::one(), &mut w_col);
        }
        w_col *= tau;
        let alpha = lit::<A>(-0.5) * tau * w_col.dot(&v);
        w_col.scaled_add(alpha, &v);
        w.slice_mut(s![i + 1.., i]).assign(&w_col);
    }
}
