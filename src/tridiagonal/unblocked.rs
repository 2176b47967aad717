use ndarray::{s, Array1, Array2, ArrayBase, Data, Ix2, NdFloat};

use super::{ReducerState, TridiagonalDecomp, TridiagonalReducer};
use crate::{
    blas::{symv_lower, syr2_lower},
    householder::make_reflector,
    lit,
    reflection::Reflection,
    Result,
};

/// Reference tridiagonal reducer, applying each reflection to the trailing submatrix and to `Q`
/// as soon as it is built.
///
/// ```rust
/// use approx::assert_abs_diff_eq;
/// use ndarray::array;
/// use linfa_symeig::tridiagonal::{TridiagonalReducer, UnblockedTridiagonal};
///
/// let a = array![[4., 1., 2.], [1., 3., 0.], [2., 0., 5.]];
/// let mut reducer = UnblockedTridiagonal::new(&a).unwrap();
/// reducer.run();
/// let (q, t) = (reducer.q().unwrap(), reducer.tridiag_matrix());
/// assert_abs_diff_eq!(q.dot(&t).dot(&q.t()), a, epsilon = 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct UnblockedTridiagonal<A> {
    state: ReducerState<A>,
}

impl<A: NdFloat> TridiagonalReducer<A> for UnblockedTridiagonal<A> {
    fn new<S: Data<Elem = A>>(matrix: &ArrayBase<S, Ix2>) -> Result<Self> {
        Ok(Self {
            state: ReducerState::new(matrix)?,
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
        reduce_columns(&mut self.state, 0);
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

/// Reduces columns `start..n-1` of the work buffer one reflection at a time, writing entries
/// `start..` of the diagonal and sub-diagonal.
///
/// Columns before `start` must already be reduced and their updates applied to the trailing
/// submatrix and to `Q`.
pub(super) fn reduce_columns<A: NdFloat>(state: &mut ReducerState<A>, start: usize) {
    let ReducerState {
        work,
        diag,
        off_diag,
        q,
        ..
    } = state;
    let n = work.nrows();

    let mut w = Array1::zeros(n);
    let mut q_work = Array1::zeros(n);

    for k in start..n.saturating_sub(1) {
        let (beta, tau) = {
            let mut col = work.slice_mut(s![k + 1.., k]);
            let alpha = col[0];
            make_reflector(alpha, &mut col.slice_mut(s![1..]))
        };
        off_diag[k] = beta;

        if !tau.is_zero() {
            work[(k + 1, k)] = A::one();
            let (v, mut trailing) = work.multi_slice_mut((s![k + 1.., k], s![k + 1.., k + 1..]));
            let mut w = w.slice_mut(s![..n - k - 1]);

            // w = tau * A22 * v - (tau^2 / 2) * (v.t * A22 * v) * v
            symv_lower(tau, &trailing, &v, &mut w);
            let alpha = lit::<A>(-0.5) * tau * w.dot(&v);
            w.scaled_add(alpha, &v);
            // A22 = H * A22 * H
            syr2_lower(-A::one(), &v, &w, &mut trailing);

            // Q = Q * H
            if let Some(q) = q.as_mut() {
                Reflection::new(v.view(), tau)
                    .reflect_rows(&mut q.slice_mut(s![.., k + 1..]), &mut q_work);
            }
            work[(k + 1, k)] = beta;
        }
        diag[k] = work[(k, k)];
    }
    diag[n - 1] = work[(n - 1, n - 1)];
}
