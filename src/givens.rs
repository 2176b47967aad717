use ndarray::{ArrayBase, DataMut, Ix2, NdFloat};

use crate::{LinalgError, Result};

/// A Givens Rotation `G = [[c, s], [-s, c]]`
#[derive(Debug, Clone)]
pub struct GivensRotation<A> {
    c: A,
    s: A,
}

impl<A: NdFloat> GivensRotation<A> {
    /// Builds a rotation from its cosine and sine without normalizing them.
    pub fn new(c: A, s: A) -> Self {
        Self { c, s }
    }

    /// Computes rotation `G` such that the `y` component of `G * [x, y].t` is 0
    ///
    /// Returns `None` if `y` is 0 (no rotation needed), otherwise return the rotation and the norm
    /// of vector `[x, y]`.
    pub fn cancel_y(x: A, y: A) -> Option<(Self, A)> {
        if !y.is_zero() {
            let r = x.hypot(y);
            let c = x / r;
            let s = y / r;
            Some((Self { c, s }, r))
        } else {
            None
        }
    }

    /// Computes the rotation `J` that diagonalizes the symmetric 2x2 matrix
    /// `[[app, apq], [apq, aqq]]` as `J.t * M * J`.
    ///
    /// `J` is returned in the same `[[c, s], [-s, c]]` layout, and `t = s / c` is returned
    /// alongside it; the diagonal of `J.t * M * J` is `[app - t * apq, aqq + t * apq]`.
    pub fn jacobi(app: A, apq: A, aqq: A) -> (Self, A) {
        if apq.is_zero() {
            return (Self::new(A::one(), A::zero()), A::zero());
        }
        let tau = (aqq - app) / (apq + apq);
        let root = A::one().hypot(tau);
        let t = if tau >= A::zero() {
            (tau + root).recip()
        } else {
            -(root - tau).recip()
        };
        let c = A::one().hypot(t).recip();
        (Self::new(c, t * c), t)
    }

    pub fn c(&self) -> A {
        self.c
    }
    pub fn s(&self) -> A {
        self.s
    }

    /// The inverse Givens rotation
    pub fn inverse(self) -> Self {
        Self {
            c: self.c,
            s: -self.s,
        }
    }

    /// Performs the multiplication `lhs = lhs * self.t` in-place, where `lhs` has two columns.
    ///
    /// Applied to columns `k` and `k + 1` of an accumulated transform `Q`, this keeps
    /// `Q * T * Q.t` invariant when `T` is replaced by `G * T * G.t`.
    pub fn rotate_rows<S: DataMut<Elem = A>>(&self, lhs: &mut ArrayBase<S, Ix2>) -> Result<()> {
        let cols = lhs.ncols();
        if cols != 2 {
            return Err(LinalgError::WrongColumns {
                expected: 2,
                actual: cols,
            });
        }
        let c = self.c;
        let s = self.s;

        for mut row in lhs.rows_mut() {
            let a = row[0];
            let b = row[1];
            row[0] = a * c + s * b;
            row[1] = -s * a + b * c;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    use super::*;

    #[test]
    fn cancel_y() {
        let (rot, r) = GivensRotation::cancel_y(1.0f64, 2.0).unwrap();
        assert_abs_diff_eq!(r, 5.0_f64.sqrt());
        assert_abs_diff_eq!(rot.c, 0.4472136, epsilon = 1e-5);
        assert_abs_diff_eq!(rot.s, 0.8944272, epsilon = 1e-5);
        assert_abs_diff_eq!(
            array![[rot.c, rot.s], [-rot.s, rot.c]].dot(&array![1., 2.]),
            array![r, 0.],
            epsilon = 1e-12
        );

        assert!(GivensRotation::cancel_y(3.0f64, 0.).is_none());
    }

    #[test]
    fn jacobi() {
        let m = array![[2.0f64, 1.], [1., 2.]];
        let (rot, t) = GivensRotation::jacobi(2., 1., 2.);
        let j = array![[rot.c, rot.s], [-rot.s, rot.c]];
        let d = j.t().dot(&m).dot(&j);
        assert_abs_diff_eq!(d, array![[1., 0.], [0., 3.]], epsilon = 1e-12);
        assert_abs_diff_eq!(t, 1.);

        let m = array![[1e3f64, 1e-4], [1e-4, -2.]];
        let (rot, t) = GivensRotation::jacobi(1e3, 1e-4, -2.);
        let j = array![[rot.c, rot.s], [-rot.s, rot.c]];
        let d = j.t().dot(&m).dot(&j);
        assert_abs_diff_eq!(d[(0, 1)], 0., epsilon = 1e-10);
        assert_abs_diff_eq!(d[(0, 0)], 1e3 - t * 1e-4, epsilon = 1e-10);
        assert_abs_diff_eq!(d[(1, 1)], -2. + t * 1e-4, epsilon = 1e-10);
    }

    #[test]
    fn rotate_rows() {
        let (rot, _) = GivensRotation::cancel_y(1.0f64, 2.0).unwrap();
        let rows = array![[2., 3.], [4., 5.], [1., 2.], [3., 4.]];
        let mut out = rows.clone();
        rot.rotate_rows(&mut out).unwrap();
        assert_abs_diff_eq!(
            rows.dot(&array![[rot.c, -rot.s], [rot.s, rot.c]]),
            out,
            epsilon = 1e-12
        );

        let mut back = out.clone();
        rot.clone().inverse().rotate_rows(&mut back).unwrap();
        assert_abs_diff_eq!(back, rows, epsilon = 1e-12);

        assert!(matches!(
            rot.rotate_rows(&mut array![[1., 2., 3.]]),
            Err(LinalgError::WrongColumns {
                expected: 2,
                actual: 3
            })
        ));
    }
}
