//! FRI folding (spec §4.5): halving a [`LineEvaluation`], absorbing one
//! [`SecureEvaluation`] layer into a line buffer, and decomposing a circle
//! evaluation into its canonical-coset part plus a constant correction.
//!
//! Grounded on the teacher's own `fri_utils::fold_line` /
//! `fold_circle_into_line` (the verifier needs the identical arithmetic to
//! recompute a layer from witness data).

use alloc::vec::Vec;

use crate::error::{CoreError, CoreResult};
use crate::fields::backend::{ColumnOps, CpuBackend};
use crate::fields::m31::M31;
use crate::fields::qm31::SecureField;
use crate::fields::secure_column::SecureColumnByCoords;
use crate::fields::FieldExpOps;
use crate::poly::circle::SecureEvaluation;
use crate::poly::line::{LineDomain, LineEvaluation};
use crate::utils::bit_reverse_index;

use super::fft::ibutterfly;

/// Number of domain-halvings performed by one [`fold_line`] call.
pub const FOLD_STEP: usize = 1;
/// Number of domain-halvings performed by one [`fold_circle_into_line`] call.
pub const CIRCLE_TO_LINE_FOLD_STEP: usize = 1;

/// Halves `eval`'s domain: `folded[i] = f0 + alpha * f1`, where `(f0, f1)` is
/// the inverse butterfly of the pair at bit-reversed slot `2i` with the
/// domain point's inverse x-coordinate as twiddle (spec §4.5.1).
pub fn fold_line(
    eval: &LineEvaluation<CpuBackend<M31>>,
    alpha: SecureField,
) -> CoreResult<LineEvaluation<CpuBackend<M31>>> {
    let n = eval.len();
    if n < 2 {
        return Err(CoreError::LineTooSmall(n));
    }
    debug_assert!(n.is_power_of_two());

    let domain = eval.domain;
    let log_size = domain.log_size();
    let folded_len = n / 2;
    let mut folded = Vec::with_capacity(folded_len);

    for i in 0..folded_len {
        let f_x = eval.values.at(2 * i);
        let f_neg_x = eval.values.at(2 * i + 1);

        let domain_index = bit_reverse_index(i * 2, log_size);
        let x = domain.at(domain_index);
        let x_inv = x.inverse();

        let mut f0 = f_x;
        let mut f1 = f_neg_x;
        ibutterfly(&mut f0, &mut f1, x_inv);

        folded.push(f0 + alpha * f1);
    }

    let folded_domain = domain.double();
    let mut values = unsafe { SecureColumnByCoords::<CpuBackend<M31>>::uninitialized(folded_len) };
    for (i, v) in folded.into_iter().enumerate() {
        values.set(i, v);
    }
    Ok(LineEvaluation::new(folded_domain, values))
}

/// Absorbs one circle-domain layer into a line buffer one level below it:
/// `dst[i] = dst[i] * alpha^2 + (f0 + alpha * f1)`, where `(f0, f1)` is the
/// inverse butterfly of `src`'s pair at bit-reversed slot `2i` with
/// `p.y^-1` as twiddle (spec §4.5.2).
pub fn fold_circle_into_line(
    dst: &mut LineEvaluation<CpuBackend<M31>>,
    src: &SecureEvaluation<CpuBackend<M31>, crate::poly::BitReversedOrder>,
    alpha: SecureField,
) -> CoreResult<()> {
    let n_src = src.len();
    let n_dst = dst.len();
    if n_src < 2 {
        return Err(CoreError::LineTooSmall(n_src));
    }
    if n_dst != n_src >> CIRCLE_TO_LINE_FOLD_STEP {
        return Err(CoreError::LengthMismatch {
            expected: n_src >> CIRCLE_TO_LINE_FOLD_STEP,
            actual: n_dst,
        });
    }

    let domain = src.domain;
    let log_size = domain.log_size();
    let alpha_sq = alpha.square();

    for i in 0..n_dst {
        let f_p = src.values.at(2 * i);
        let f_neg_p = src.values.at(2 * i + 1);

        let domain_index = bit_reverse_index(i << CIRCLE_TO_LINE_FOLD_STEP, log_size);
        let p = domain.at(domain_index);
        let p_y_inv = p.y.inverse();

        let mut f0 = f_p;
        let mut f1 = f_neg_p;
        ibutterfly(&mut f0, &mut f1, p_y_inv);

        let f_prime = alpha * f1 + f0;
        let prev = dst.values.at(i);
        dst.values.set(i, prev * alpha_sq + f_prime);
    }

    Ok(())
}

/// Splits `eval` into `(g, lambda)` with `g` summing to zero over the domain
/// (spec §4.5.3): `lambda = (sum_{i < N/2} eval[i] - sum_{i >= N/2} eval[i]) /
/// N`, `g[i] = eval[i] - lambda` for `i < N/2`, `eval[i] + lambda` otherwise.
/// Requires `eval`'s domain to be canonic.
pub fn decompose(
    eval: &SecureEvaluation<CpuBackend<M31>, crate::poly::BitReversedOrder>,
) -> CoreResult<(SecureEvaluation<CpuBackend<M31>, crate::poly::BitReversedOrder>, SecureField)> {
    if !eval.domain.is_canonic() {
        return Err(CoreError::DomainNotCanonic);
    }
    let n = eval.len();
    let half = n / 2;
    let mut a_sum = SecureField::from(0u32);
    let mut b_sum = SecureField::from(0u32);
    for i in 0..n {
        let v = eval.values.at(i);
        if i < half {
            a_sum += v;
        } else {
            b_sum += v;
        }
    }
    let lambda = (a_sum - b_sum) * SecureField::from(n as u32).inverse();

    let mut g = unsafe { SecureColumnByCoords::<CpuBackend<M31>>::uninitialized(n) };
    for i in 0..n {
        let v = eval.values.at(i);
        g.set(i, if i < half { v - lambda } else { v + lambda });
    }

    Ok((SecureEvaluation::new(eval.domain, g), lambda))
}

/// Backend-polymorphic surface for FRI folding (spec §4.5, §9 "Backend
/// polymorphism").
pub trait FriOps: ColumnOps<M31> {
    fn fold_line(
        eval: &LineEvaluation<Self>,
        alpha: SecureField,
    ) -> CoreResult<LineEvaluation<Self>>
    where
        Self: Sized;

    fn fold_circle_into_line(
        dst: &mut LineEvaluation<Self>,
        src: &SecureEvaluation<Self, crate::poly::BitReversedOrder>,
        alpha: SecureField,
    ) -> CoreResult<()>
    where
        Self: Sized;

    fn decompose(
        eval: &SecureEvaluation<Self, crate::poly::BitReversedOrder>,
    ) -> CoreResult<(SecureEvaluation<Self, crate::poly::BitReversedOrder>, SecureField)>
    where
        Self: Sized;
}

impl FriOps for CpuBackend<M31> {
    fn fold_line(
        eval: &LineEvaluation<Self>,
        alpha: SecureField,
    ) -> CoreResult<LineEvaluation<Self>> {
        fold_line(eval, alpha)
    }

    fn fold_circle_into_line(
        dst: &mut LineEvaluation<Self>,
        src: &SecureEvaluation<Self, crate::poly::BitReversedOrder>,
        alpha: SecureField,
    ) -> CoreResult<()> {
        fold_circle_into_line(dst, src, alpha)
    }

    fn decompose(
        eval: &SecureEvaluation<Self, crate::poly::BitReversedOrder>,
    ) -> CoreResult<(SecureEvaluation<Self, crate::poly::BitReversedOrder>, SecureField)> {
        decompose(eval)
    }
}

#[allow(unused)]
fn _line_domain_from(domain: crate::poly::circle::CircleDomain) -> CoreResult<LineDomain> {
    LineDomain::new(domain.half_coset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circle::CirclePointIndex;
    use crate::poly::circle::CanonicCoset;

    fn secure_eval_from(domain: crate::poly::circle::CircleDomain, vals: &[u32]) -> SecureEvaluation<CpuBackend<M31>, crate::poly::BitReversedOrder> {
        let mut col = unsafe { SecureColumnByCoords::<CpuBackend<M31>>::uninitialized(vals.len()) };
        for (i, &v) in vals.iter().enumerate() {
            col.set(i, SecureField::from(v));
        }
        SecureEvaluation::new(domain, col)
    }

    fn line_eval_from(domain: LineDomain, vals: &[u32]) -> LineEvaluation<CpuBackend<M31>> {
        let mut col = unsafe { SecureColumnByCoords::<CpuBackend<M31>>::uninitialized(vals.len()) };
        for (i, &v) in vals.iter().enumerate() {
            col.set(i, SecureField::from(v));
        }
        LineEvaluation::new(domain, col)
    }

    #[test]
    fn fold_line_halves_the_domain() {
        let coset = crate::circle::Coset::half_odds(3);
        let domain = LineDomain::new(coset).unwrap();
        let eval = line_eval_from(domain, &[1, 2, 3, 4, 5, 6, 7, 8]);
        let alpha = SecureField::from(3u32);
        let folded = fold_line(&eval, alpha).unwrap();
        assert_eq!(folded.len(), 4);
        assert_eq!(folded.domain.log_size(), domain.log_size() - 1);
    }

    #[test]
    fn fold_line_rejects_too_small_input() {
        let coset = crate::circle::Coset::new(CirclePointIndex::subgroup_gen(1), 0);
        let domain = LineDomain::new(coset).unwrap();
        let eval = line_eval_from(domain, &[1]);
        assert!(matches!(fold_line(&eval, SecureField::from(1u32)), Err(CoreError::LineTooSmall(1))));
    }

    #[test]
    fn decompose_g_sums_balance() {
        // S5-style sanity: decompose's first-half/second-half sums differ by
        // lambda*N, and g reconstructs eval once lambda is added back.
        let domain = CanonicCoset::new(3).circle_domain();
        let eval = secure_eval_from(domain, &[1, 2, 3, 4, 5, 6, 7, 8]);
        let (g, lambda) = decompose(&eval).unwrap();
        assert_eq!(lambda, SecureField::from(0u32) - SecureField::from(2u32));
        let half = eval.len() / 2;
        for i in 0..eval.len() {
            let reconstructed = if i < half { g.values.at(i) + lambda } else { g.values.at(i) - lambda };
            assert_eq!(reconstructed, eval.values.at(i));
        }
    }

    #[test]
    fn decompose_rejects_non_canonic_domain() {
        let domain = crate::poly::circle::CircleDomain::new(crate::circle::Coset::subgroup(3));
        let eval = secure_eval_from(domain, &[0; 16]);
        assert!(matches!(decompose(&eval), Err(CoreError::DomainNotCanonic)));
    }
}
