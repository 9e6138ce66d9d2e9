use alloc::vec::Vec;
use core::marker::PhantomData;

use num_traits::Zero;

use crate::circle::{CirclePoint, CirclePointIndex, Coset};
use crate::error::{CoreError, CoreResult};
use crate::fields::backend::{Col, ColumnOps, CpuBackend};
use crate::fields::m31::M31;
use crate::fields::qm31::SecureField;
use crate::fields::secure_column::SecureColumnByCoords;
use crate::poly::twiddles::{precompute_twiddles, TwiddleTree};
use crate::poly::{BitReversedOrder, NaturalOrder};
use crate::utils::bit_reverse_index;

/// The disjoint union of a half-coset and its conjugate (spec §3). Valid FFT
/// domains are exactly the domains of this shape.
#[derive(Copy, Clone, Debug)]
pub struct CircleDomain {
    pub half_coset: Coset,
}

impl CircleDomain {
    pub fn new(half_coset: Coset) -> Self {
        Self { half_coset }
    }

    pub fn log_size(&self) -> u32 {
        self.half_coset.log_size + 1
    }

    pub fn size(&self) -> usize {
        1 << self.log_size()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// `half_coset.index_at(i)` for `i < |half|`, else `-half_coset.index_at(i
    /// - |half|)` (spec §3).
    pub fn index_at(&self, index: usize) -> CirclePointIndex {
        if index < self.half_coset.size() {
            self.half_coset.index_at(index)
        } else {
            -self.half_coset.index_at(index - self.half_coset.size())
        }
    }

    pub fn at(&self, index: usize) -> CirclePoint<M31> {
        self.index_at(index).to_point()
    }

    /// Iteration order: `half_coset` forward, then its conjugate forward.
    pub fn iter(&self) -> impl Iterator<Item = CirclePoint<M31>> + '_ {
        self.iter_indices().map(|i| i.to_point())
    }

    pub fn iter_indices(&self) -> impl Iterator<Item = CirclePointIndex> + '_ {
        (0..self.size()).map(|i| self.index_at(i))
    }

    /// A domain is canonic iff its half-coset is `CanonicCoset::half_coset()`
    /// for some log size, i.e. `initial_index * 4 == step_size`.
    pub fn is_canonic(&self) -> bool {
        self.half_coset.initial_index.mul(4) == self.half_coset.step_size
    }

    /// Splits into `2^log_parts` interleaved sub-domains of log-size
    /// `log_size - log_parts`, each paired with the index shift that recovers
    /// its place in the original order: re-interleaving `sub[r].iter()` for
    /// `r` in `[0, 2^log_parts)` in round-robin reproduces `self.iter()`
    /// (spec §3).
    pub fn split(&self, log_parts: u32) -> Vec<(CircleDomain, CirclePointIndex)> {
        assert!(log_parts <= self.half_coset.log_size);
        let new_log_size = self.half_coset.log_size - log_parts;
        let new_step_size = self.half_coset.step_size.mul(1 << log_parts);
        (0..(1usize << log_parts))
            .map(|r| {
                let shift = self.half_coset.step_size.mul(r);
                let initial_index = self.half_coset.initial_index + shift;
                let half = Coset {
                    initial_index,
                    initial: initial_index.to_point(),
                    step_size: new_step_size,
                    step: new_step_size.to_point(),
                    log_size: new_log_size,
                };
                (CircleDomain::new(half), shift)
            })
            .collect()
    }
}

/// `CanonicCoset(k)` wraps `Coset::odds(k)`; its `circle_domain()` reorders
/// the same `2^k` points into conjugate-pair layout (spec §3).
#[derive(Copy, Clone, Debug)]
pub struct CanonicCoset {
    pub coset: Coset,
}

impl CanonicCoset {
    pub fn new(log_size: u32) -> Self {
        assert!(log_size >= 1);
        Self {
            coset: Coset::odds(log_size),
        }
    }

    pub fn log_size(&self) -> u32 {
        self.coset.log_size
    }

    pub fn size(&self) -> usize {
        self.coset.size()
    }

    pub fn half_coset(&self) -> Coset {
        Coset::half_odds(self.coset.log_size - 1)
    }

    pub fn circle_domain(&self) -> CircleDomain {
        CircleDomain::new(self.half_coset())
    }
}

/// Permutes `col` in place to the bit-reversed ordering of its indices,
/// without requiring contiguous slice access (only `at`/`set`).
fn bit_reverse_col<B: ColumnOps<F>, F: Zero + Clone + Copy>(col: &mut Col<B, F>) {
    let n = col.len();
    assert!(n.is_power_of_two());
    let log_size = n.ilog2();
    for i in 0..n {
        let j = bit_reverse_index(i, log_size);
        if i < j {
            let a = col.at(i);
            let b = col.at(j);
            col.set(i, b);
            col.set(j, a);
        }
    }
}

/// A polynomial of power-of-two coefficient count, stored in the FFT basis
/// (tensor product of twiddle polynomials), bit-reversed (spec §3).
#[derive(Clone, Debug)]
pub struct CirclePoly<B: ColumnOps<M31>> {
    pub log_size: u32,
    pub coeffs: Col<B, M31>,
}

impl<B: ColumnOps<M31>> CirclePoly<B> {
    pub fn new(coeffs: Col<B, M31>) -> Self {
        assert!(coeffs.len().is_power_of_two());
        Self {
            log_size: coeffs.len().ilog2(),
            coeffs,
        }
    }

    pub fn log_size(&self) -> u32 {
        self.log_size
    }

    pub fn len(&self) -> usize {
        self.coeffs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coeffs.is_empty()
    }
}

impl CirclePoly<CpuBackend<M31>> {
    /// Folds the coefficients with the reversed mapping sequence `[y, x,
    /// pi(x), pi^2(x), ...]` (spec §4.3.6).
    pub fn eval_at_point(&self, point: CirclePoint<SecureField>) -> SecureField {
        crate::backend::cpu::fft::eval_at_point(self, point)
    }

    /// Pads the coefficients with zeros up to `2^new_log_size` (spec §4.3.7).
    pub fn extend(&self, new_log_size: u32) -> CoreResult<Self> {
        crate::backend::cpu::fft::extend(self, new_log_size)
    }

    /// Evaluates on `domain`, deriving fresh twiddles from `domain.half_coset`.
    pub fn evaluate(
        &self,
        domain: CircleDomain,
    ) -> CoreResult<CircleEvaluation<CpuBackend<M31>, M31, BitReversedOrder>> {
        let twiddles = precompute_twiddles(domain.half_coset);
        self.evaluate_with_twiddles(domain, &twiddles)
    }

    pub fn evaluate_with_twiddles(
        &self,
        domain: CircleDomain,
        twiddles: &TwiddleTree<CpuBackend<M31>>,
    ) -> CoreResult<CircleEvaluation<CpuBackend<M31>, M31, BitReversedOrder>> {
        crate::backend::cpu::fft::evaluate(self, domain, twiddles)
    }
}

/// An evaluation over a [`CircleDomain`], tagged `Natural` or `BitReversed`
/// (spec §3, §9).
#[derive(Clone, Debug)]
pub struct CircleEvaluation<B: ColumnOps<F>, F: Zero + Clone + Copy, EvalOrder = NaturalOrder> {
    pub domain: CircleDomain,
    pub values: Col<B, F>,
    _eval_order: PhantomData<EvalOrder>,
}

impl<B: ColumnOps<F>, F: Zero + Clone + Copy, EvalOrder> CircleEvaluation<B, F, EvalOrder> {
    pub fn new(domain: CircleDomain, values: Col<B, F>) -> Self {
        assert_eq!(domain.size(), values.len());
        Self {
            domain,
            values,
            _eval_order: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<B: ColumnOps<F>, F: Zero + Clone + Copy> CircleEvaluation<B, F, NaturalOrder> {
    pub fn bit_reverse(mut self) -> CircleEvaluation<B, F, BitReversedOrder> {
        bit_reverse_col(&mut self.values);
        CircleEvaluation::new(self.domain, self.values)
    }
}

impl<B: ColumnOps<F>, F: Zero + Clone + Copy> CircleEvaluation<B, F, BitReversedOrder> {
    pub fn bit_reverse(mut self) -> CircleEvaluation<B, F, NaturalOrder> {
        bit_reverse_col(&mut self.values);
        CircleEvaluation::new(self.domain, self.values)
    }
}

impl CircleEvaluation<CpuBackend<M31>, M31, BitReversedOrder> {
    /// Computes the minimal [`CirclePoly`] evaluating to these values, deriving
    /// fresh twiddles from the evaluation's own domain.
    pub fn interpolate(self) -> CoreResult<CirclePoly<CpuBackend<M31>>> {
        let twiddles = precompute_twiddles(self.domain.half_coset);
        self.interpolate_with_twiddles(&twiddles)
    }

    pub fn interpolate_with_twiddles(
        self,
        twiddles: &TwiddleTree<CpuBackend<M31>>,
    ) -> CoreResult<CirclePoly<CpuBackend<M31>>> {
        crate::backend::cpu::fft::interpolate(self, twiddles)
    }
}

/// A [`CircleEvaluation`]-shaped evaluation over [`SecureColumnByCoords`],
/// used for quotients and FRI's first fold (spec §3).
#[derive(Clone)]
pub struct SecureEvaluation<B: ColumnOps<M31>, EvalOrder = NaturalOrder> {
    pub domain: CircleDomain,
    pub values: SecureColumnByCoords<B>,
    _eval_order: PhantomData<EvalOrder>,
}

impl<B: ColumnOps<M31>, EvalOrder> SecureEvaluation<B, EvalOrder> {
    pub fn new(domain: CircleDomain, values: SecureColumnByCoords<B>) -> Self {
        assert_eq!(domain.size(), values.len());
        Self {
            domain,
            values,
            _eval_order: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Backend-polymorphic surface for circle-domain polynomial operations (spec
/// §9 "Backend polymorphism"): every method a backend other than
/// [`CpuBackend`] would need to provide to slot into the rest of the crate.
pub trait PolyOps: ColumnOps<M31> + Sized {
    fn precompute_twiddles(coset: Coset) -> TwiddleTree<Self>;

    fn evaluate(
        poly: &CirclePoly<Self>,
        domain: CircleDomain,
        twiddles: &TwiddleTree<Self>,
    ) -> CoreResult<CircleEvaluation<Self, M31, BitReversedOrder>>;

    fn interpolate(
        eval: CircleEvaluation<Self, M31, BitReversedOrder>,
        twiddles: &TwiddleTree<Self>,
    ) -> CoreResult<CirclePoly<Self>>;

    fn eval_at_point(poly: &CirclePoly<Self>, point: CirclePoint<SecureField>) -> SecureField;

    fn extend(poly: &CirclePoly<Self>, new_log_size: u32) -> CoreResult<CirclePoly<Self>>;
}

impl PolyOps for CpuBackend<M31> {
    fn precompute_twiddles(coset: Coset) -> TwiddleTree<Self> {
        precompute_twiddles(coset)
    }

    fn evaluate(
        poly: &CirclePoly<Self>,
        domain: CircleDomain,
        twiddles: &TwiddleTree<Self>,
    ) -> CoreResult<CircleEvaluation<Self, M31, BitReversedOrder>> {
        crate::backend::cpu::fft::evaluate(poly, domain, twiddles)
    }

    fn interpolate(
        eval: CircleEvaluation<Self, M31, BitReversedOrder>,
        twiddles: &TwiddleTree<Self>,
    ) -> CoreResult<CirclePoly<Self>> {
        crate::backend::cpu::fft::interpolate(eval, twiddles)
    }

    fn eval_at_point(poly: &CirclePoly<Self>, point: CirclePoint<SecureField>) -> SecureField {
        crate::backend::cpu::fft::eval_at_point(poly, point)
    }

    fn extend(poly: &CirclePoly<Self>, new_log_size: u32) -> CoreResult<CirclePoly<Self>> {
        crate::backend::cpu::fft::extend(poly, new_log_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circle::CirclePointIndex;

    #[test]
    fn canonic_circle_domain_is_canonic() {
        let domain = CanonicCoset::new(5).circle_domain();
        assert!(domain.is_canonic());
        assert_eq!(domain.log_size(), 5);
    }

    #[test]
    fn circle_domain_index_at_matches_half_and_conjugate() {
        let domain = CanonicCoset::new(4).circle_domain();
        let half_len = domain.half_coset.size();
        assert_eq!(domain.index_at(0), domain.half_coset.index_at(0));
        assert_eq!(
            domain.index_at(half_len),
            -domain.half_coset.index_at(0)
        );
    }

    #[test]
    fn split_recovers_half_coset_order() {
        let domain = CanonicCoset::new(6).circle_domain();
        let parts = domain.split(2);
        assert_eq!(parts.len(), 4);
        let half_len = domain.half_coset.size();
        for i in 0..half_len {
            let (part, _) = &parts[i % 4];
            let j = i / 4;
            assert_eq!(part.half_coset.index_at(j), domain.half_coset.index_at(i));
        }
    }

    #[test]
    fn circle_point_index_half_of_generator_even() {
        // Sanity: subgroup_gen(k) is always even for k < log order.
        let idx = CirclePointIndex::subgroup_gen(5);
        assert_eq!(idx.half().half(), CirclePointIndex::subgroup_gen(7));
    }
}
