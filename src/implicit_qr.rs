//! Implicit-shift QR iteration on symmetric tridiagonal matrices
//!
//! Given the diagonal `d` and sub-diagonal `e` of a symmetric tridiagonal matrix `T`, and
//! optionally an accumulated transform `Q` with `A = Q * T * Q.t`, [`ImplicitQr`] drives `e` to
//! zero with Wilkinson-shifted bulge-chasing sweeps. On success `d` holds the eigenvalues (in no
//! particular order) and column `i` of `Q` is the eigenvector of `d[i]`.

use log::{debug, trace, warn};
use ndarray::{s, Array1, Array2, NdFloat};

use crate::{givens::GivensRotation, lit, LinalgError, Result, DEFAULT_MAX_SWEEPS_PER_ROW};

/// Range `start..=end` of the tridiagonal matrix that is iterated on independently
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Window {
    start: usize,
    end: usize,
    sweeps: usize,
}

impl Window {
    fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            sweeps: 0,
        }
    }
}

/// Diagonalizes a symmetric tridiagonal matrix in place.
///
/// The solver borrows the diagonal, sub-diagonal and transform exclusively for its whole
/// lifetime, so the buffers can't be touched from elsewhere while it runs.
///
/// # Example
///
/// ```rust
/// use approx::assert_abs_diff_eq;
/// use ndarray::{array, Array2};
/// use linfa_symeig::implicit_qr::ImplicitQr;
///
/// let mut diag = array![2., 2.];
/// let mut off_diag = array![1.];
/// let mut q = Array2::eye(2);
/// ImplicitQr::new(&mut diag, &mut off_diag, &mut q).unwrap().run().unwrap();
/// assert_abs_diff_eq!(diag, array![1., 3.], epsilon = 1e-12);
/// assert_abs_diff_eq!(off_diag, array![0.]);
/// ```
#[derive(Debug)]
pub struct ImplicitQr<'a, A> {
    diag: &'a mut Array1<A>,
    off_diag: &'a mut Array1<A>,
    q: Option<&'a mut Array2<A>>,
    eps: A,
    max_sweeps_per_row: usize,
}

impl<'a, A: NdFloat> ImplicitQr<'a, A> {
    /// Binds the solver to the tridiagonal matrix and the transform to update.
    ///
    /// `off_diag` must be one element shorter than `diag` and `q` must be square with one column
    /// per diagonal element.
    pub fn new(
        diag: &'a mut Array1<A>,
        off_diag: &'a mut Array1<A>,
        q: &'a mut Array2<A>,
    ) -> Result<Self> {
        let n = diag.len();
        if q.nrows() != n {
            return Err(LinalgError::WrongRows {
                expected: n,
                actual: q.nrows(),
            });
        }
        if q.ncols() != n {
            return Err(LinalgError::WrongColumns {
                expected: n,
                actual: q.ncols(),
            });
        }
        Self::bind(diag, off_diag, Some(q))
    }

    /// Binds the solver to the tridiagonal matrix only; eigenvectors are not tracked.
    pub fn values_only(diag: &'a mut Array1<A>, off_diag: &'a mut Array1<A>) -> Result<Self> {
        Self::bind(diag, off_diag, None)
    }

    fn bind(
        diag: &'a mut Array1<A>,
        off_diag: &'a mut Array1<A>,
        q: Option<&'a mut Array2<A>>,
    ) -> Result<Self> {
        let expected = diag.len().saturating_sub(1);
        if off_diag.len() != expected {
            return Err(LinalgError::WrongRows {
                expected,
                actual: off_diag.len(),
            });
        }
        Ok(Self {
            diag,
            off_diag,
            q,
            eps: A::epsilon(),
            max_sweeps_per_row: DEFAULT_MAX_SWEEPS_PER_ROW,
        })
    }

    /// Set the relative deflation tolerance
    ///
    /// A sub-diagonal entry is treated as zero once `|e[i]| <= eps * (|d[i]| + |d[i + 1]|)`.
    /// Defaults to the machine epsilon.
    pub fn eps(mut self, eps: A) -> Self {
        self.eps = eps;

        self
    }

    /// Set the number of sweeps a window of `k` rows may take before the iteration fails, as a
    /// multiple of `k`
    pub fn max_sweeps_per_row(mut self, max_sweeps_per_row: usize) -> Self {
        self.max_sweeps_per_row = max_sweeps_per_row;

        self
    }

    /// Runs the iteration to completion.
    ///
    /// On [`LinalgError::NoConvergence`] the contents of the diagonal, sub-diagonal and transform
    /// are meaningless.
    pub fn run(&mut self) -> Result<()> {
        let n = self.diag.len();
        if n < 2 {
            return Ok(());
        }

        // Work on a unit-scaled problem so the shift arithmetic stays clear of overflow
        let scale = self
            .diag
            .iter()
            .chain(self.off_diag.iter())
            .fold(A::zero(), |acc, x| acc.max(x.abs()));
        if scale.is_zero() {
            return Ok(());
        }
        *self.diag /= scale;
        *self.off_diag /= scale;

        let res = self.iterate();

        *self.diag *= scale;
        *self.off_diag *= scale;
        res
    }

    fn iterate(&mut self) -> Result<()> {
        let n = self.diag.len();
        let mut windows = vec![Window::new(0, n - 1)];
        let mut total_sweeps = 0;

        while let Some(mut win) = windows.pop() {
            if win.start == win.end {
                continue;
            }

            if let Some(split) = self.deflate(win.start, win.end) {
                trace!(
                    "window {}..={} split after row {}",
                    win.start,
                    win.end,
                    split
                );
                windows.push(Window::new(win.start, split));
                windows.push(Window::new(split + 1, win.end));
                continue;
            }

            if win.end == win.start + 1 {
                self.solve_2x2(win.start)?;
                continue;
            }

            let limit = self.max_sweeps_per_row * (win.end - win.start + 1);
            if win.sweeps >= limit {
                warn!(
                    "QR iteration on rows {}..={} did not converge in {} sweeps",
                    win.start, win.end, win.sweeps
                );
                return Err(LinalgError::NoConvergence {
                    start: win.start,
                    end: win.end,
                    sweeps: win.sweeps,
                });
            }

            self.sweep(win.start, win.end)?;
            win.sweeps += 1;
            total_sweeps += 1;
            windows.push(win);
        }

        debug!("QR iteration on {} rows converged in {} sweeps", n, total_sweeps);
        Ok(())
    }

    /// Zeroes every negligible sub-diagonal entry of `start..=end` and returns the index of the
    /// last one, if any.
    fn deflate(&mut self, start: usize, end: usize) -> Option<usize> {
        let tiny = A::min_positive_value();
        let mut split = None;
        for i in start..end {
            let e = self.off_diag[i].abs();
            if e <= self.eps * (self.diag[i].abs() + self.diag[i + 1].abs()) || e < tiny {
                self.off_diag[i] = A::zero();
                split = Some(i);
            }
        }
        split
    }

    /// Solves the decoupled 2x2 block at rows `k` and `k + 1` in closed form.
    fn solve_2x2(&mut self, k: usize) -> Result<()> {
        let (a, b, c) = (self.diag[k], self.off_diag[k], self.diag[k + 1]);
        let (rot, t) = GivensRotation::jacobi(a, b, c);
        self.diag[k] = a - t * b;
        self.diag[k + 1] = c + t * b;
        self.off_diag[k] = A::zero();

        // Q = Q * J
        if let Some(q) = self.q.as_mut() {
            rot.inverse().rotate_rows(&mut q.slice_mut(s![.., k..k + 2]))?;
        }
        Ok(())
    }

    /// One implicit QR step with Wilkinson shift on rows `start..=end`.
    ///
    /// The first rotation is the one an explicit QR step of `T - mu * I` would start with; it
    /// creates a bulge below the sub-diagonal that each following rotation pushes one row down
    /// until it falls off the window.
    fn sweep(&mut self, start: usize, end: usize) -> Result<()> {
        let d = &mut *self.diag;
        let e = &mut *self.off_diag;

        let mu = wilkinson_shift(d[end - 1], d[end], e[end - 1]);
        let mut x = d[start] - mu;
        let mut z = e[start];

        for k in start..end {
            let (rot, r) = match GivensRotation::cancel_y(x, z) {
                Some(rot) => rot,
                // No bulge left, the rest of the sweep is the identity
                None => break,
            };
            let (c, s) = (rot.c(), rot.s());
            if k > start {
                e[k - 1] = r;
            }

            // T = G * T * G.t on rows/columns k and k + 1
            let (dk, ek, dk1) = (d[k], e[k], d[k + 1]);
            let (cc, ss, cs) = (c * c, s * s, c * s);
            let two_cs_ek = (cs + cs) * ek;
            d[k] = cc * dk + two_cs_ek + ss * dk1;
            d[k + 1] = ss * dk - two_cs_ek + cc * dk1;
            e[k] = cs * (dk1 - dk) + (cc - ss) * ek;

            if k + 1 < end {
                z = s * e[k + 1];
                e[k + 1] *= c;
            }
            x = e[k];

            if let Some(q) = self.q.as_mut() {
                rot.rotate_rows(&mut q.slice_mut(s![.., k..k + 2]))?;
            }
        }
        Ok(())
    }
}

/// Computes the wilkinson shift, i.e., the 2x2 symmetric matrix eigenvalue to its tailing
/// component `tnn`.
///
/// The inputs are interpreted as the 2x2 matrix:
///     tmm  tmn
///     tmn  tnn
pub fn wilkinson_shift<A: NdFloat>(tmm: A, tnn: A, tmn: A) -> A {
    let tmn_sq = tmn * tmn;
    if !tmn_sq.is_zero() {
        let d = (tmm - tnn) * lit(0.5);
        tnn - tmn_sq / (d + d.signum() * d.hypot(tmn))
    } else {
        tnn
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    use super::*;
    use crate::tridiagonal::assemble_tridiagonal;

    fn check_eig(t: &Array2<f64>, diag: &Array1<f64>, q: &Array2<f64>) {
        let n = t.nrows();
        assert_abs_diff_eq!(q.t().dot(q), Array2::eye(n), epsilon = 1e-12);
        assert_abs_diff_eq!(q.dot(&Array2::from_diag(diag)).dot(&q.t()), *t, epsilon = 1e-10);
    }

    #[test]
    fn wilkinson() {
        // Eigenvalues of [[3, 1], [1, 1]] are 2 +- sqrt(2); 2 - sqrt(2) is closer to 1
        assert_abs_diff_eq!(wilkinson_shift(3., 1., 1.), 2. - 2f64.sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(wilkinson_shift(1., 3., 1.), 2. + 2f64.sqrt(), epsilon = 1e-12);
        // Equal diagonal picks either eigenvalue
        let mu = wilkinson_shift(2.0f64, 2., 1.);
        assert!((mu - 1.).abs() < 1e-12 || (mu - 3.).abs() < 1e-12);
        assert_eq!(wilkinson_shift(1., 5., 0.), 5.);
    }

    #[test]
    fn two_by_two() {
        let mut diag = array![2.0f64, 2.];
        let mut off_diag = array![1.];
        let mut q = Array2::eye(2);
        ImplicitQr::new(&mut diag, &mut off_diag, &mut q).unwrap().run().unwrap();

        assert_abs_diff_eq!(off_diag, array![0.]);
        let s = 0.5f64.sqrt();
        for (i, &val) in diag.iter().enumerate() {
            let v = q.column(i);
            let expected = if (val - 3.).abs() < 1e-12 {
                array![s, s]
            } else {
                assert_abs_diff_eq!(val, 1., epsilon = 1e-12);
                array![s, -s]
            };
            assert_abs_diff_eq!(v[0].abs(), expected[0].abs(), epsilon = 1e-12);
            assert_abs_diff_eq!(v[0] * v[1], expected[0] * expected[1], epsilon = 1e-12);
        }
    }

    #[test]
    fn wilkinson_matrix() {
        // W21+ has pairs of nearly equal eigenvalues
        let diag: Array1<f64> = (0..21).map(|i| (10 - i as i64).abs() as f64).collect();
        let off_diag = Array1::ones(20);
        let t = assemble_tridiagonal(&diag, &off_diag);

        let (mut d, mut e, mut q) = (diag.clone(), off_diag.clone(), Array2::eye(21));
        ImplicitQr::new(&mut d, &mut e, &mut q).unwrap().run().unwrap();
        check_eig(&t, &d, &q);
        assert!(e.iter().all(|x| *x == 0.));
        assert_abs_diff_eq!(d.sum(), diag.sum(), epsilon = 1e-10);
        let largest = d.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        assert_abs_diff_eq!(largest, 10.746194182903393, epsilon = 1e-10);
    }

    #[test]
    fn already_split() {
        let diag = array![1., 5., -2., 4., 3.];
        let off_diag = array![0.5, 0., 2., 0.];
        let t = assemble_tridiagonal(&diag, &off_diag);

        let (mut d, mut e, mut q) = (diag.clone(), off_diag.clone(), Array2::eye(5));
        ImplicitQr::new(&mut d, &mut e, &mut q).unwrap().run().unwrap();
        check_eig(&t, &d, &q);
        // The isolated last row is untouched
        assert_abs_diff_eq!(d[4], 3., epsilon = 1e-15);
        assert_abs_diff_eq!(q.column(4), array![0., 0., 0., 0., 1.].view());
    }

    #[test]
    fn values_only() {
        let diag = array![4., -1., 2., 7.];
        let off_diag = array![1., -3., 0.5];
        let (mut d, mut e, mut q) = (diag.clone(), off_diag.clone(), Array2::eye(4));
        ImplicitQr::new(&mut d, &mut e, &mut q).unwrap().run().unwrap();

        let (mut vals, mut e2) = (diag, off_diag);
        ImplicitQr::values_only(&mut vals, &mut e2).unwrap().run().unwrap();
        assert_eq!(vals, d);
    }

    #[test]
    fn zero_and_tiny() {
        let mut d = Array1::<f64>::zeros(3);
        let mut e = Array1::zeros(2);
        let mut q = Array2::eye(3);
        ImplicitQr::new(&mut d, &mut e, &mut q).unwrap().run().unwrap();
        assert_eq!(q, Array2::eye(3));

        let diag = array![1e-200, 3e-200, -2e-200];
        let off_diag = array![1e-200, 1e-200];
        let (mut d, mut e, mut q) = (diag.clone(), off_diag.clone(), Array2::eye(3));
        ImplicitQr::new(&mut d, &mut e, &mut q).unwrap().run().unwrap();
        let t = assemble_tridiagonal(&diag, &off_diag) * 1e200;
        check_eig(&t, &(d * 1e200), &q);
    }

    #[test]
    fn no_convergence() {
        let mut d = array![1., 2., 3.];
        let mut e = array![1., 1.];
        let mut q = Array2::eye(3);
        let res = ImplicitQr::new(&mut d, &mut e, &mut q)
            .unwrap()
            .max_sweeps_per_row(0)
            .run();
        assert!(matches!(
            res,
            Err(LinalgError::NoConvergence {
                start: 0,
                end: 2,
                sweeps: 0
            })
        ));

        let mut d = array![1., f64::NAN, 3., 4.];
        let mut e = array![1., 1., 1.];
        assert!(matches!(
            ImplicitQr::values_only(&mut d, &mut e).unwrap().run(),
            Err(LinalgError::NoConvergence { .. })
        ));
    }

    #[test]
    fn bad_buffers() {
        let mut d = array![1., 2., 3.];
        let mut e = array![1.];
        let mut q = Array2::eye(3);
        assert!(matches!(
            ImplicitQr::new(&mut d, &mut e, &mut q),
            Err(LinalgError::WrongRows {
                expected: 2,
                actual: 1
            })
        ));

        let mut e = array![1., 1.];
        let mut q = Array2::eye(2);
        assert!(matches!(
            ImplicitQr::new(&mut d, &mut e, &mut q),
            Err(LinalgError::WrongRows {
                expected: 3,
                actual: 2
            })
        ));

        let mut q = Array2::zeros((3, 4));
        assert!(matches!(
            ImplicitQr::new(&mut d, &mut e, &mut q),
            Err(LinalgError::WrongColumns {
                expected: 3,
                actual: 4
            })
        ));
    }
}
