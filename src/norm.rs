//! Norm of vectors, and residuals of the decompositions

use ndarray::{prelude::*, Data};

/// Define norm as a metric linear space, treating the whole matrix as one big vector.
pub trait Norm {
    type Output;

    /// L-1 norm
    fn norm_l1(&self) -> Self::Output;
    /// L-2 norm, which is the Frobenius norm for matrices
    fn norm_l2(&self) -> Self::Output;
    /// Maximum norm (L-infinite)
    fn norm_max(&self) -> Self::Output;
}

impl<A, S, D> Norm for ArrayBase<S, D>
where
    A: NdFloat,
    S: Data<Elem = A>,
    D: Dimension,
{
    type Output = A;

    fn norm_l1(&self) -> Self::Output {
        self.fold(A::zero(), |acc, x| acc + x.abs())
    }

    fn norm_l2(&self) -> Self::Output {
        // Scaled sum of squares, so that entries near the overflow threshold don't overflow
        let scale = self.norm_max();
        if scale.is_zero() || !scale.is_finite() {
            return scale;
        }
        let sum_sq = self.fold(A::zero(), |acc, &x| {
            let x = x / scale;
            acc + x * x
        });
        sum_sq.sqrt() * scale
    }

    fn norm_max(&self) -> Self::Output {
        self.iter().fold(A::zero(), |f, &val| val.abs().max(f))
    }
}

/// Frobenius norm of `Q * T * Q.t - A`
pub fn reconstruction_error<A, S1, S2, S3>(
    a: &ArrayBase<S1, Ix2>,
    q: &ArrayBase<S2, Ix2>,
    t: &ArrayBase<S3, Ix2>,
) -> A
where
    A: NdFloat,
    S1: Data<Elem = A>,
    S2: Data<Elem = A>,
    S3: Data<Elem = A>,
{
    (q.dot(t).dot(&q.t()) - a).norm_l2()
}

/// Frobenius norm of `Q.t * Q - I`
pub fn orthogonality_error<A: NdFloat, S: Data<Elem = A>>(q: &ArrayBase<S, Ix2>) -> A {
    (q.t().dot(q) - Array2::eye(q.ncols())).norm_l2()
}

/// Largest `|A * v - lambda * v|` entry over all eigenpairs, with eigenvectors as the columns of
/// `vecs`
pub fn eigen_residual<A, S1, S2, S3>(
    a: &ArrayBase<S1, Ix2>,
    vals: &ArrayBase<S2, Ix1>,
    vecs: &ArrayBase<S3, Ix2>,
) -> A
where
    A: NdFloat,
    S1: Data<Elem = A>,
    S2: Data<Elem = A>,
    S3: Data<Elem = A>,
{
    (a.dot(vecs) - vecs * vals).norm_max()
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn norms() {
        let a = array![[1.0f64, -3.], [2., -8.]];
        assert_abs_diff_eq!(a.norm_l1(), 14.);
        assert_abs_diff_eq!(a.norm_l2(), 78.0f64.sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(a.norm_max(), 8.);

        let zero = Array1::<f64>::zeros(3);
        assert_eq!(zero.norm_l2(), 0.);

        let huge = array![3e300f64, 4e300];
        assert_abs_diff_eq!(huge.norm_l2() / 1e300, 5., epsilon = 1e-12);
    }

    #[test]
    fn residuals() {
        let a = array![[2.0f64, 1.], [1., 2.]];
        let s = 0.5f64.sqrt();
        let q = array![[s, s], [s, -s]];
        let t = array![[3., 0.], [0., 1.]];
        assert_abs_diff_eq!(reconstruction_error(&a, &q, &t), 0., epsilon = 1e-12);
        assert_abs_diff_eq!(orthogonality_error(&q), 0., epsilon = 1e-12);
        assert_abs_diff_eq!(eigen_residual(&a, &array![3., 1.], &q), 0., epsilon = 1e-12);

        // Swapped eigenvalues leave A * v - lambda * v = +-2v
        assert_abs_diff_eq!(eigen_residual(&a, &array![1., 3.], &q), 2. * s, epsilon = 1e-12);
        assert_abs_diff_eq!(orthogonality_error(&(&q * 2.)), 18.0f64.sqrt(), epsilon = 1e-12);
    }
}
