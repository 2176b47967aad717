#![allow(unused)]

use std::ops::RangeInclusive;

use ndarray::prelude::*;
use proptest::prelude::*;
use proptest_derive::Arbitrary;

const FLOAT_RANGE: RangeInclusive<f64> = -1000.0..=1000.0;
const DIM_RANGE: RangeInclusive<usize> = 1..=10;

/// Tolerance scale for backward errors of an `n`-by-`n` decomposition of a matrix of norm `norm`
pub fn tol(n: usize, norm: f64) -> f64 {
    100. * n as f64 * f64::EPSILON * norm.max(1.)
}

#[derive(Debug, Arbitrary)]
struct Layout {
    invert_rows: bool,
    invert_cols: bool,
    transpose: bool,
}

impl Layout {
    fn apply(&self, mut arr: Array2<f64>) -> Array2<f64> {
        if self.invert_rows {
            arr.invert_axis(Axis(0));
        }
        if self.invert_cols {
            arr.invert_axis(Axis(1));
        }
        if self.transpose {
            arr.reversed_axes()
        } else {
            arr
        }
    }
}

prop_compose! {
    pub fn square_arr()(dim in DIM_RANGE)
        (data in prop::collection::vec(FLOAT_RANGE, dim*dim), dim in Just(dim), layout in any::<Layout>()) -> Array2<f64> {
        layout.apply(Array2::from_shape_vec((dim, dim), data).unwrap())
    }
}

fn to_symm(arr: &mut Array2<f64>) {
    let n = arr.nrows();
    for i in 0..n {
        for j in 0..i {
            arr[(i, j)] = arr[(j, i)];
        }
    }
}

prop_compose! {
    pub fn symm_arr()(mut arr in square_arr()) -> Array2<f64> {
        to_symm(&mut arr);
        arr
    }
}

fn off_diag_entry() -> impl Strategy<Value = f64> {
    prop_oneof![Just(0.0), FLOAT_RANGE, FLOAT_RANGE]
}

prop_compose! {
    /// Diagonal and sub-diagonal of a symmetric tridiagonal matrix. Roughly a third of the
    /// sub-diagonal entries are exact zeros.
    pub fn tridiag_parts()(dim in DIM_RANGE)
        (diag in prop::collection::vec(FLOAT_RANGE, dim),
         off_diag in prop::collection::vec(off_diag_entry(), dim - 1))
        -> (Array1<f64>, Array1<f64>) {
        (Array1::from(diag), Array1::from(off_diag))
    }
}

pub fn tridiag_matrix(diag: &Array1<f64>, off_diag: &Array1<f64>) -> Array2<f64> {
    let n = diag.len();
    Array2::from_shape_fn((n, n), |(i, j)| {
        if i == j {
            diag[i]
        } else if i == j + 1 {
            off_diag[j]
        } else if j == i + 1 {
            off_diag[i]
        } else {
            0.
        }
    })
}
