//! Symmetric and triangular level-2/level-3 kernels over `ndarray` views.
//!
//! All symmetric kernels read and write only the lower triangle (plus, for `syr2k_lower`, the
//! strictly upper part of the diagonal blocks it touches). General products go through
//! `ndarray::linalg`.

use ndarray::{linalg::general_mat_mul, s, ArrayBase, Data, DataMut, Ix1, Ix2, NdFloat};

/// `y = alpha * A * x`, reading only the lower triangle of `A`.
pub(crate) fn symv_lower<A, Sa, Sx, Sy>(
    alpha: A,
    a: &ArrayBase<Sa, Ix2>,
    x: &ArrayBase<Sx, Ix1>,
    y: &mut ArrayBase<Sy, Ix1>,
) where
    A: NdFloat,
    Sa: Data<Elem = A>,
    Sx: Data<Elem = A>,
    Sy: DataMut<Elem = A>,
{
    let n = x.len();
    debug_assert_eq!(a.dim(), (n, n));
    debug_assert_eq!(y.len(), n);

    y.fill(A::zero());
    for j in 0..n {
        let tail = a.slice(s![j + 1.., j]);
        let x_tail = x.slice(s![j + 1..]);
        let xj = x[j];
        y.slice_mut(s![j + 1..]).scaled_add(alpha * xj, &tail);
        y[j] += alpha * (a[(j, j)] * xj + tail.dot(&x_tail));
    }
}

/// `A += alpha * (x * y.t + y * x.t)` on the lower triangle of `A`.
pub(crate) fn syr2_lower<A, Sx, Sy, Sa>(
    alpha: A,
    x: &ArrayBase<Sx, Ix1>,
    y: &ArrayBase<Sy, Ix1>,
    a: &mut ArrayBase<Sa, Ix2>,
) where
    A: NdFloat,
    Sx: Data<Elem = A>,
    Sy: Data<Elem = A>,
    Sa: DataMut<Elem = A>,
{
    let n = x.len();
    debug_assert_eq!(a.dim(), (n, n));

    for j in 0..n {
        let mut col = a.slice_mut(s![j.., j]);
        col.scaled_add(alpha * y[j], &x.slice(s![j..]));
        col.scaled_add(alpha * x[j], &y.slice(s![j..]));
    }
}

/// `A += alpha * (V * W.t + W * V.t)` on the lower triangle of `A`.
///
/// The update walks `A` in column blocks of width `block`, so each block is two matrix-matrix
/// products. Entries above the diagonal inside a diagonal block are updated as well.
pub(crate) fn syr2k_lower<A, Sv, Sw, Sa>(
    alpha: A,
    v: &ArrayBase<Sv, Ix2>,
    w: &ArrayBase<Sw, Ix2>,
    a: &mut ArrayBase<Sa, Ix2>,
    block: usize,
) where
    A: NdFloat,
    Sv: Data<Elem = A>,
    Sw: Data<Elem = A>,
    Sa: DataMut<Elem = A>,
{
    let n = a.nrows();
    debug_assert_eq!(v.dim(), w.dim());
    debug_assert_eq!(v.nrows(), n);

    let block = block.max(1);
    let mut j = 0;
    while j < n {
        let jb = block.min(n - j);
        let mut dst = a.slice_mut(s![j.., j..j + jb]);
        general_mat_mul(
            alpha,
            &v.slice(s![j.., ..]),
            &w.slice(s![j..j + jb, ..]).t(),
            A::one(),
            &mut dst,
        );
        general_mat_mul(
            alpha,
            &w.slice(s![j.., ..]),
            &v.slice(s![j..j + jb, ..]).t(),
            A::one(),
            &mut dst,
        );
        j += jb;
    }
}

/// `x = T * x` where `T` is upper triangular. Only the upper triangle of `t` is read.
pub(crate) fn trmv_upper<A, St, Sx>(t: &ArrayBase<St, Ix2>, x: &mut ArrayBase<Sx, Ix1>)
where
    A: NdFloat,
    St: Data<Elem = A>,
    Sx: DataMut<Elem = A>,
{
    let n = x.len();
    debug_assert_eq!(t.dim(), (n, n));

    for i in 0..n {
        let xi = t.slice(s![i, i..]).dot(&x.slice(s![i..]));
        x[i] = xi;
    }
}
