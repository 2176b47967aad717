use ndarray::{
    linalg::{general_mat_mul, general_mat_vec_mul},
    s, Array1, Array2, ArrayBase, Axis, Data, DataMut, Ix1, Ix2, NdFloat,
};

use crate::blas::trmv_upper;

/// Householder reflection `H = I - tau * v * v.t`
pub struct Reflection<A, D: Data<Elem = A>> {
    axis: ArrayBase<D, Ix1>,
    tau: A,
}

impl<A, D: Data<Elem = A>> Reflection<A, D> {
    /// Create a new reflection from its (unnormalized) axis `v` and scaling factor `tau`
    ///
    /// For `H` to be orthogonal, `tau` must be either zero or `2 / v.dot(v)`.
    pub fn new(axis: ArrayBase<D, Ix1>, tau: A) -> Self {
        Self { axis, tau }
    }

    pub fn axis(&self) -> &ArrayBase<D, Ix1> {
        &self.axis
    }
}

impl<A: NdFloat, D: Data<Elem = A>> Reflection<A, D> {
    pub fn is_identity(&self) -> bool {
        self.tau.is_zero()
    }

    /// Apply reflection to the columns of `rhs`, i.e. `rhs = H * rhs`
    pub fn reflect_cols<M: DataMut<Elem = A>>(&self, rhs: &mut ArrayBase<M, Ix2>) {
        for i in 0..rhs.ncols() {
            let factor = -self.tau * self.axis.dot(&rhs.column(i));
            rhs.column_mut(i).scaled_add(factor, &self.axis);
        }
    }

    /// Apply reflection to the rows of `lhs`, i.e. `lhs = lhs * H`
    ///
    /// Assume that length of `work` equals rows of `lhs` and length of `self.axis` equals columns
    /// of `lhs`.
    pub fn reflect_rows<M1: DataMut<Elem = A>, M2: DataMut<Elem = A>>(
        &self,
        lhs: &mut ArrayBase<M1, Ix2>,
        work: &mut ArrayBase<M2, Ix1>,
    ) {
        if self.is_identity() {
            return;
        }
        // work = lhs * axis
        general_mat_vec_mul(A::one(), lhs, &self.axis, A::zero(), work);
        // lhs -= tau * work * axis.t
        general_mat_mul(
            -self.tau,
            &work.view().insert_axis(Axis(1)),
            &self.axis.view().insert_axis(Axis(0)),
            A::one(),
            lhs,
        );
    }
}

/// Product of consecutive reflections `H_0 * H_1 * ... * H_(k-1)` in compact WY form
/// `I - V * T * V.t`, with `T` upper triangular.
#[derive(Debug, Clone)]
pub struct BlockReflection<A> {
    v: Array2<A>,
    t: Array2<A>,
}

impl<A: NdFloat> BlockReflection<A> {
    /// Accumulates the reflections whose axes are the columns of `v`, scaled by `taus`.
    ///
    /// Panics if `taus` does not have one entry per column of `v`.
    pub fn new<S: Data<Elem = A>>(v: Array2<A>, taus: &ArrayBase<S, Ix1>) -> Self {
        let k = v.ncols();
        assert_eq!(taus.len(), k);

        let mut t = Array2::zeros((k, k));
        for i in 0..k {
            let tau = taus[i];
            // A skipped reflection leaves its whole column of T at zero
            if tau.is_zero() {
                continue;
            }
            if i > 0 {
                // t[..i, i] = -tau * T[..i, ..i] * V[.., ..i].t * v_i
                let mut col = Array1::zeros(i);
                general_mat_vec_mul(
                    -tau,
                    &v.slice(s![.., ..i]).t(),
                    &v.column(i),
                    A::zero(),
                    &mut col,
                );
                trmv_upper(&t.slice(s![..i, ..i]), &mut col);
                t.slice_mut(s![..i, i]).assign(&col);
            }
            t[(i, i)] = tau;
        }

        Self { v, t }
    }

    pub fn t(&self) -> &Array2<A> {
        &self.t
    }

    /// Apply the block reflection to the rows of `lhs`, i.e. `lhs = lhs * (I - V * T * V.t)`
    pub fn reflect_rows<M: DataMut<Elem = A>>(&self, lhs: &mut ArrayBase<M, Ix2>) {
        let (rows, k) = (lhs.nrows(), self.v.ncols());
        let mut lv = Array2::zeros((rows, k));
        general_mat_mul(A::one(), lhs, &self.v, A::zero(), &mut lv);
        let mut lvt = Array2::zeros((rows, k));
        general_mat_mul(A::one(), &lv, &self.t, A::zero(), &mut lvt);
        general_mat_mul(-A::one(), &lvt, &self.v.t(), A::one(), lhs);
    }
}
