//! Generation of elementary Householder reflectors

use ndarray::{ArrayBase, DataMut, Ix1, NdFloat};

use crate::norm::Norm;

/// Builds a Householder reflector `H = I - tau * v * v.t`, with `v[0] = 1`, such that
/// `H * [alpha, tail].t = [beta, 0, ..., 0].t`.
///
/// On return `tail` holds `v[1..]` and the function returns `(beta, tau)`. If `tail` is already
/// zero no reflection is needed: `tau` is zero (so `H` is the identity) and `beta == alpha`.
/// Otherwise `beta = -sign(alpha) * norm([alpha, tail])`, which keeps `alpha - beta` free of
/// cancellation.
pub fn make_reflector<A: NdFloat, S: DataMut<Elem = A>>(
    alpha: A,
    tail: &mut ArrayBase<S, Ix1>,
) -> (A, A) {
    let tail_norm = tail.norm_l2();
    if tail_norm.is_zero() {
        return (alpha, A::zero());
    }

    let norm = alpha.hypot(tail_norm);
    let beta = if alpha < A::zero() { norm } else { -norm };
    let tau = (beta - alpha) / beta;
    *tail /= alpha - beta;
    (beta, tau)
}
