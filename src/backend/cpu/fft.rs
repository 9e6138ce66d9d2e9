//! Circle FFT engine: coefficients-in-tensor-basis <-> domain evaluations,
//! plus the associated point evaluation and zero-extension helpers.
//!
//! The general (`log_size >= 3`) case walks the flat twiddle buffer the way
//! [`crate::poly::twiddles`] lays it out: the smallest line-twiddle layer
//! seeds the circle-layer-0 twiddles, and every other line-twiddle layer is
//! consumed from largest to smallest as the circle layers run from `L-1`
//! down to `1`.

use alloc::vec::Vec;
use core::ops::{Add, Mul, Sub};

use num_traits::Zero;

use crate::circle::CirclePoint;
use crate::error::{CoreError, CoreResult};
use crate::fields::backend::{Col, ColumnOps, CpuBackend};
use crate::fields::m31::M31;
use crate::fields::qm31::SecureField;
use crate::poly::circle::{CircleDomain, CircleEvaluation, CirclePoly};
use crate::poly::line::fold;
use crate::poly::twiddles::{circle_twiddles_from_line_twiddles, domain_line_twiddles_from_tree, TwiddleTree};
use crate::poly::BitReversedOrder;
use crate::utils::bit_reverse_index;

/// Decimation-in-time butterfly: `(v0, v1) -> (v0 + t*v1, v0 - t*v1)`. Used by
/// [`evaluate`] (coefficients to values).
pub fn butterfly<V, T>(v0: &mut V, v1: &mut V, twid: T)
where
    V: Copy + Add<Output = V> + Sub<Output = V> + Mul<T, Output = V>,
    T: Copy,
{
    let tmp = *v1 * twid;
    let a = *v0;
    *v0 = a + tmp;
    *v1 = a - tmp;
}

/// Decimation-in-frequency butterfly: `(v0, v1) -> (v0 + v1, (v0 - v1)*itwid)`.
/// Used by [`interpolate`] and line folding.
pub fn ibutterfly<V, T>(v0: &mut V, v1: &mut V, itwid: T)
where
    V: Copy + Add<Output = V> + Sub<Output = V> + Mul<T, Output = V>,
    T: Copy,
{
    let a = *v0;
    let b = *v1;
    *v0 = a + b;
    *v1 = (a - b) * itwid;
}

/// Applies a single-twiddle butterfly round (spec §4.3.4): for a fixed
/// `(i, h)`, pairs `values[(h<<(i+1)) + l]` with `values[(h<<(i+1)) + l +
/// (1<<i)]` for `l` in `[0, 2^i)`, all sharing twiddle `t`.
fn fft_layer_loop<F>(values: &mut [M31], i: u32, h: usize, t: M31, f: F)
where
    F: Fn(&mut M31, &mut M31, M31),
{
    let step = 1usize << i;
    let base = h << (i + 1);
    for l in 0..step {
        let idx0 = base + l;
        let idx1 = idx0 + step;
        let (a, b) = values.split_at_mut(idx1);
        f(&mut a[idx0], &mut b[0], t);
    }
}

/// Whether `root.double()`, applied `root.log_size - target.log_size` times,
/// reproduces `target` exactly (spec §5's twiddle/domain compatibility rule).
fn coset_doubles_to(mut root: crate::circle::Coset, target: crate::circle::Coset) -> bool {
    if root.log_size < target.log_size {
        return false;
    }
    while root.log_size > target.log_size {
        root = root.double();
    }
    root.initial_index == target.initial_index && root.step_size == target.step_size
}

fn check_twiddles(
    twiddles: &TwiddleTree<CpuBackend<M31>>,
    half_coset: crate::circle::Coset,
) -> CoreResult<()> {
    if coset_doubles_to(twiddles.root_coset, half_coset) {
        Ok(())
    } else {
        Err(CoreError::TwiddleMismatch)
    }
}

/// Evaluates `poly` on `domain`, producing a bit-reversed-order evaluation
/// (spec §4.3.4).
pub fn evaluate(
    poly: &CirclePoly<CpuBackend<M31>>,
    domain: CircleDomain,
    twiddles: &TwiddleTree<CpuBackend<M31>>,
) -> CoreResult<CircleEvaluation<CpuBackend<M31>, M31, BitReversedOrder>> {
    if poly.log_size != domain.log_size() {
        return Err(CoreError::LengthMismatch {
            expected: domain.size(),
            actual: poly.len(),
        });
    }
    check_twiddles(twiddles, domain.half_coset)?;

    let log_size = poly.log_size;
    let mut values: Vec<M31> = (0..poly.coeffs.len()).map(|i| poly.coeffs.at(i)).collect();

    match log_size {
        0 => {}
        1 => {
            let y0 = domain.half_coset.initial.y;
            let mut v0 = values[0];
            let mut v1 = values[1];
            butterfly(&mut v0, &mut v1, y0);
            values[0] = v0;
            values[1] = v1;
        }
        _ => {
            let (x0, y0) = (domain.half_coset.initial.x, domain.half_coset.initial.y);
            if log_size == 2 {
                let (mut v0, mut v1, mut v2, mut v3) = (values[0], values[1], values[2], values[3]);
                butterfly(&mut v0, &mut v2, x0);
                butterfly(&mut v1, &mut v3, x0);
                butterfly(&mut v0, &mut v1, y0);
                butterfly(&mut v2, &mut v3, -y0);
                values[0] = v0;
                values[1] = v1;
                values[2] = v2;
                values[3] = v3;
            } else {
                let full_buf: Vec<M31> = (0..twiddles.twiddles.len()).map(|i| twiddles.twiddles.at(i)).collect();
                let domain_log_size = log_size - 1;
                let ascending = domain_line_twiddles_from_tree(domain_log_size, &full_buf);
                let mut reversed = ascending;
                reversed.reverse();

                let circle_twiddles: Vec<M31> = circle_twiddles_from_line_twiddles(reversed[0]).collect();

                for layer in (0..(log_size - 1)).rev() {
                    let i = layer + 1;
                    let t_slice = reversed[layer as usize];
                    for h in 0..(1usize << (log_size - i - 1)) {
                        let t = t_slice[h];
                        fft_layer_loop(&mut values, i, h, t, butterfly);
                    }
                }
                for h in 0..(1usize << (log_size - 1)) {
                    let t = circle_twiddles[h];
                    fft_layer_loop(&mut values, 0, h, t, butterfly);
                }
            }
        }
    }

    let mut col = unsafe { Col::<CpuBackend<M31>, M31>::uninitialized(values.len()) };
    for (i, v) in values.into_iter().enumerate() {
        col.set(i, v);
    }
    Ok(CircleEvaluation::new(domain, col))
}

/// Computes the minimal [`CirclePoly`] evaluating to `eval`'s values (spec
/// §4.3.5): mirrors [`evaluate`] with [`ibutterfly`], in reverse layer order,
/// then normalizes by `1/N`.
pub fn interpolate(
    eval: CircleEvaluation<CpuBackend<M31>, M31, BitReversedOrder>,
    twiddles: &TwiddleTree<CpuBackend<M31>>,
) -> CoreResult<CirclePoly<CpuBackend<M31>>> {
    let domain = eval.domain;
    check_twiddles(twiddles, domain.half_coset)?;
    let log_size = domain.log_size();
    let mut values: Vec<M31> = (0..eval.values.len()).map(|i| eval.values.at(i)).collect();

    match log_size {
        0 => {}
        1 => {
            let y0 = domain.half_coset.initial.y;
            let iy0 = y0.inverse_checked()?;
            let mut v0 = values[0];
            let mut v1 = values[1];
            ibutterfly(&mut v0, &mut v1, iy0);
            values[0] = v0;
            values[1] = v1;
        }
        _ => {
            let (x0, y0) = (domain.half_coset.initial.x, domain.half_coset.initial.y);
            if log_size == 2 {
                let ix0 = x0.inverse_checked()?;
                let iy0 = y0.inverse_checked()?;
                let (mut v0, mut v1, mut v2, mut v3) = (values[0], values[1], values[2], values[3]);
                ibutterfly(&mut v0, &mut v1, iy0);
                ibutterfly(&mut v2, &mut v3, -iy0);
                ibutterfly(&mut v0, &mut v2, ix0);
                ibutterfly(&mut v1, &mut v3, ix0);
                values[0] = v0;
                values[1] = v1;
                values[2] = v2;
                values[3] = v3;
            } else {
                let full_buf: Vec<M31> = (0..twiddles.itwiddles.len()).map(|i| twiddles.itwiddles.at(i)).collect();
                let domain_log_size = log_size - 1;
                let ascending = domain_line_twiddles_from_tree(domain_log_size, &full_buf);
                let mut reversed = ascending;
                reversed.reverse();

                let circle_itwiddles: Vec<M31> = circle_twiddles_from_line_twiddles(reversed[0]).collect();

                for h in 0..(1usize << (log_size - 1)) {
                    let t = circle_itwiddles[h];
                    fft_layer_loop(&mut values, 0, h, t, ibutterfly);
                }
                for layer in 0..(log_size - 1) {
                    let i = layer + 1;
                    let t_slice = reversed[layer as usize];
                    for h in 0..(1usize << (log_size - i - 1)) {
                        let t = t_slice[h];
                        fft_layer_loop(&mut values, i, h, t, ibutterfly);
                    }
                }
            }
        }
    }

    let n_inv = M31::from(1u32 << log_size).inverse_checked()?;
    for v in values.iter_mut() {
        *v = *v * n_inv;
    }

    let mut col = unsafe { Col::<CpuBackend<M31>, M31>::uninitialized(values.len()) };
    for (i, v) in values.into_iter().enumerate() {
        col.set(i, v);
    }
    Ok(CirclePoly::new(col))
}

/// Folds the coefficients with the mapping sequence `[..., pi^2(x), pi(x),
/// x, y]` (spec §4.3.6): built ascending as `[y, x, pi(x), ...]` then
/// reversed, since `fold` consumes its factors head-first against the
/// most-significant half of the coefficients.
pub fn eval_at_point(poly: &CirclePoly<CpuBackend<M31>>, point: CirclePoint<SecureField>) -> SecureField {
    let log_size = poly.log_size;
    if log_size == 0 {
        return SecureField::from(poly.coeffs.at(0));
    }
    let mut mappings = Vec::with_capacity(log_size as usize);
    mappings.push(point.y);
    if log_size > 1 {
        mappings.push(point.x);
        let mut x = point.x;
        for _ in 2..log_size {
            x = CirclePoint::<SecureField>::double_x(x);
            mappings.push(x);
        }
    }
    mappings.reverse();
    let coeffs: Vec<SecureField> = (0..poly.coeffs.len()).map(|i| SecureField::from(poly.coeffs.at(i))).collect();
    fold(&coeffs, &mappings)
}

/// Zero-pads `poly`'s coefficients up to `2^new_log_size` (spec §4.3.7).
pub fn extend(poly: &CirclePoly<CpuBackend<M31>>, new_log_size: u32) -> CoreResult<CirclePoly<CpuBackend<M31>>> {
    if new_log_size < poly.log_size {
        return Err(CoreError::LogSizeTooSmall {
            current: poly.log_size,
            requested: new_log_size,
        });
    }
    let new_len = 1usize << new_log_size;
    let mut col = unsafe { Col::<CpuBackend<M31>, M31>::uninitialized(new_len) };
    for i in 0..poly.coeffs.len() {
        col.set(i, poly.coeffs.at(i));
    }
    for i in poly.coeffs.len()..new_len {
        col.set(i, M31::zero());
    }
    Ok(CirclePoly::new(col))
}

/// Bit-reverses index `i` of a length-`2^log_size` sequence, reused by callers
/// that need to map a natural-order domain index to its FFT-order slot.
pub fn natural_to_fft_order_index(i: usize, log_size: u32) -> usize {
    bit_reverse_index(i, log_size)
}

trait InverseChecked {
    fn inverse_checked(self) -> CoreResult<M31>;
}

impl InverseChecked for M31 {
    fn inverse_checked(self) -> CoreResult<M31> {
        if self == M31::zero() {
            Err(CoreError::ZeroInverse)
        } else {
            Ok(crate::fields::FieldExpOps::inverse(&self))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circle::{CirclePoint, CirclePointIndex, Coset};
    use crate::fields::FieldExpOps;
    use crate::poly::circle::CanonicCoset;

    fn m31_col(vals: &[u32]) -> Col<CpuBackend<M31>, M31> {
        let mut col = unsafe { Col::<CpuBackend<M31>, M31>::uninitialized(vals.len()) };
        for (i, &v) in vals.iter().enumerate() {
            col.set(i, M31::from(v));
        }
        col
    }

    #[test]
    fn eval_at_point_single_coeff() {
        // S1: a single coefficient poly is constant everywhere.
        let poly = CirclePoly::<CpuBackend<M31>>::new(m31_col(&[7]));
        let p = CirclePoint {
            x: SecureField::from(5u32),
            y: SecureField::from(8u32),
        };
        assert_eq!(eval_at_point(&poly, p), SecureField::from(7u32));
    }

    #[test]
    fn evaluate_interpolate_round_trip_log4() {
        let log_size = 4;
        let coeffs: Vec<u32> = (1..=(1u32 << log_size)).collect();
        let poly = CirclePoly::<CpuBackend<M31>>::new(m31_col(&coeffs));
        let domain = CanonicCoset::new(log_size).circle_domain();
        let twiddles = crate::poly::twiddles::precompute_twiddles::<CpuBackend<M31>>(domain.half_coset);

        let evaluation = evaluate(&poly, domain, &twiddles).unwrap();
        let back = interpolate(evaluation, &twiddles).unwrap();

        for i in 0..poly.len() {
            assert_eq!(poly.coeffs.at(i), back.coeffs.at(i));
        }
    }

    #[test]
    fn evaluate_matches_eval_at_point_log4() {
        let log_size = 4;
        let coeffs: Vec<u32> = (1..=(1u32 << log_size)).collect();
        let poly = CirclePoly::<CpuBackend<M31>>::new(m31_col(&coeffs));
        let domain = CanonicCoset::new(log_size).circle_domain();
        let twiddles = crate::poly::twiddles::precompute_twiddles::<CpuBackend<M31>>(domain.half_coset);

        let evaluation = evaluate(&poly, domain, &twiddles).unwrap();
        for i in 0..domain.size() {
            let fft_idx = natural_to_fft_order_index(i, log_size);
            let point = domain.at(i).into_ef::<SecureField>();
            let expected = eval_at_point(&poly, point);
            assert_eq!(SecureField::from(evaluation.values.at(fft_idx)), expected);
        }
    }

    #[test]
    fn evaluate_interpolate_round_trip_log2() {
        let log_size = 2;
        let poly = CirclePoly::<CpuBackend<M31>>::new(m31_col(&[3, 5, 7, 11]));
        let domain = CanonicCoset::new(log_size).circle_domain();
        let twiddles = crate::poly::twiddles::precompute_twiddles::<CpuBackend<M31>>(domain.half_coset);

        let evaluation = evaluate(&poly, domain, &twiddles).unwrap();
        let back = interpolate(evaluation, &twiddles).unwrap();
        for i in 0..poly.len() {
            assert_eq!(poly.coeffs.at(i), back.coeffs.at(i));
        }
    }

    #[test]
    fn extend_pads_with_zeros() {
        let poly = CirclePoly::<CpuBackend<M31>>::new(m31_col(&[1, 2]));
        let extended = extend(&poly, 3).unwrap();
        assert_eq!(extended.len(), 8);
        assert_eq!(extended.coeffs.at(0), M31::from(1u32));
        assert_eq!(extended.coeffs.at(1), M31::from(2u32));
        assert_eq!(extended.coeffs.at(2), M31::zero());
    }

    #[test]
    fn log_size_three_uses_uniform_twiddle_generation() {
        // REDESIGN FLAG: no index-5/7 swap special case for log_size == 3.
        // A round trip at log_size 3 must succeed exactly like any other
        // log_size >= 3, with no divergent branch.
        let log_size = 3;
        let coeffs: Vec<u32> = (1..=(1u32 << log_size)).collect();
        let poly = CirclePoly::<CpuBackend<M31>>::new(m31_col(&coeffs));
        let domain = CanonicCoset::new(log_size).circle_domain();
        let twiddles = crate::poly::twiddles::precompute_twiddles::<CpuBackend<M31>>(domain.half_coset);

        let evaluation = evaluate(&poly, domain, &twiddles).unwrap();
        let back = interpolate(evaluation, &twiddles).unwrap();
        for i in 0..poly.len() {
            assert_eq!(poly.coeffs.at(i), back.coeffs.at(i));
        }
    }

    #[test]
    fn twiddle_mismatch_is_rejected() {
        let domain = CanonicCoset::new(4).circle_domain();
        let wrong_root = Coset::half_odds(5);
        let twiddles = crate::poly::twiddles::precompute_twiddles::<CpuBackend<M31>>(wrong_root);
        let poly = CirclePoly::<CpuBackend<M31>>::new(m31_col(&[1; 16]));
        assert!(evaluate(&poly, domain, &twiddles).is_err());
    }

    #[test]
    fn coset_doubles_to_detects_mismatch() {
        let big = Coset::half_odds(6);
        let small = Coset::half_odds(3);
        assert!(coset_doubles_to(big, small));
        let unrelated = Coset::new(CirclePointIndex::subgroup_gen(2), 3);
        assert_ne!(small.initial_index, unrelated.initial_index);
        assert!(!coset_doubles_to(big, unrelated));
    }
}
