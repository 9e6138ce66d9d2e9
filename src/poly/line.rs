use alloc::vec::Vec;

use num_traits::{One, Zero};

use crate::circle::{Coset, CirclePoint};
use crate::error::{CoreError, CoreResult};
use crate::fields::backend::{Col, ColumnOps};
use crate::fields::m31::M31;
use crate::fields::qm31::SecureField;
use crate::fields::secure_column::SecureColumnByCoords;
use crate::fields::FieldExpOps;
use crate::utils::bit_reverse;

/// Recursive fold used by both [`crate::poly::circle::CirclePoly::eval_at_point`]
/// and [`LinePoly::eval_at_point`]: for `n = values.len() = 2^k`, returns
/// `values[0]` when `n == 1`, otherwise `fold(lhs, tail) + fold(rhs, tail) *
/// head` where `head`/`tail` split `folding_factors` and `lhs`/`rhs` split
/// `values` in half (spec §4.3.6).
pub fn fold(values: &[SecureField], folding_factors: &[SecureField]) -> SecureField {
    if values.len() == 1 {
        return values[0];
    }
    let half = values.len() / 2;
    let (lhs, rhs) = values.split_at(half);
    let (&head, tail) = folding_factors.split_first().expect("not enough folding factors");
    fold(lhs, tail) + fold(rhs, tail) * head
}

/// The x-coordinates of a [`Coset`] whose points have pairwise distinct x
/// (spec §3). Used as the domain of a [`LinePoly`].
#[derive(Copy, Clone, Debug)]
pub struct LineDomain {
    coset: Coset,
}

impl LineDomain {
    /// Fails with [`CoreError::CosetXNotUnique`] if `coset`'s points do not
    /// have pairwise distinct x-coordinates.
    pub fn new(coset: Coset) -> CoreResult<Self> {
        if coset.log_size == 0 {
            return Ok(Self { coset });
        }
        if coset.log_size == 1 {
            if coset.initial.x == M31::zero() {
                return Err(CoreError::CosetXNotUnique);
            }
            return Ok(Self { coset });
        }
        if coset.initial_index.log_order() < coset.step_size.log_order() + 2 {
            return Err(CoreError::CosetXNotUnique);
        }
        Ok(Self { coset })
    }

    pub fn size(&self) -> usize {
        self.coset.size()
    }

    pub fn log_size(&self) -> u32 {
        self.coset.log_size
    }

    pub fn at(&self, index: usize) -> M31 {
        self.coset.at(index).x
    }

    pub fn coset(&self) -> Coset {
        self.coset
    }

    /// The domain obtained by doubling every point of the underlying coset;
    /// halves the size.
    pub fn double(&self) -> Self {
        Self {
            coset: self.coset.double(),
        }
    }
}

/// A polynomial over `LineDomain`'s x-coordinates, represented in the basis
/// `{1, x, pi(x), pi(x)*x, pi^2(x), ...}` with `pi(x) = 2x^2 - 1`, coefficients
/// held bit-reversed (spec §3).
#[derive(Clone, Debug)]
pub struct LinePoly {
    log_size: u32,
    coeffs: Vec<SecureField>,
}

impl LinePoly {
    pub fn new(coeffs: Vec<SecureField>) -> Self {
        assert!(coeffs.len().is_power_of_two());
        Self {
            log_size: coeffs.len().ilog2(),
            coeffs,
        }
    }

    pub fn log_size(&self) -> u32 {
        self.log_size
    }

    pub fn coeffs(&self) -> &[SecureField] {
        &self.coeffs
    }

    /// Folds the coefficients with the sequence `x, pi(x), pi^2(x), ...`.
    pub fn eval_at_point(&self, mut x: SecureField) -> SecureField {
        if self.log_size == 0 {
            return self.coeffs[0];
        }
        let mut factors = Vec::with_capacity(self.log_size as usize);
        for _ in 0..self.log_size {
            factors.push(x);
            x = CirclePoint::double_x(x);
        }
        fold(&self.coeffs, &factors)
    }
}

/// An evaluation of a [`LinePoly`] over a [`LineDomain`], stored bit-reversed
/// relative to the domain's natural order.
pub struct LineEvaluation<B: ColumnOps<M31>> {
    pub domain: LineDomain,
    pub values: SecureColumnByCoords<B>,
}

impl<B: ColumnOps<M31>> LineEvaluation<B> {
    pub fn new(domain: LineDomain, values: SecureColumnByCoords<B>) -> Self {
        assert_eq!(domain.size(), values.len());
        Self { domain, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl LineEvaluation<crate::fields::backend::CpuBackend<M31>> {
    /// Bit-reverses into natural order, runs [`line_ifft`], and normalizes by
    /// `1/N` to recover the [`LinePoly`] (spec §4.4).
    pub fn interpolate(self) -> LinePoly {
        let mut values = self.values.to_vec();
        bit_reverse(&mut values);
        line_ifft(&mut values, self.domain);
        let n_inv = SecureField::from(self.domain.size() as u32).inverse();
        for v in values.iter_mut() {
            *v *= n_inv;
        }
        LinePoly::new(values)
    }
}

/// In-place inverse FFT of `values` (natural order) over `domain`, without the
/// final `1/N` normalization (spec §4.4): repeatedly halves `domain`, and at
/// each step pairs `(i, i + half)` within every `domain.size()`-sized chunk of
/// `values` via `ibutterfly(left, right, domain.at(i)^-1)`.
pub fn line_ifft(values: &mut [SecureField], mut domain: LineDomain) {
    assert_eq!(values.len(), domain.size(), "line_ifft: length mismatch");
    while domain.size() > 1 {
        let half = domain.size() / 2;
        for chunk in values.chunks_mut(domain.size()) {
            for i in 0..half {
                let itwid = domain.at(i).inverse();
                let (lo, hi) = chunk.split_at_mut(half);
                crate::backend::cpu::fft::ibutterfly(&mut lo[i], &mut hi[i], itwid);
            }
        }
        domain = domain.double();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eval_at_point_two_coeffs_matches_spec_s2() {
        // S2: coefficients [1, 2] = 1 + 2y, point (x=5, y=8): returns 17.
        let poly = LinePoly::new(alloc::vec![SecureField::from(1u32), SecureField::from(2u32)]);
        let y = SecureField::from(8u32);
        assert_eq!(poly.eval_at_point(y), SecureField::from(17u32));
    }

    #[test]
    fn line_domain_rejects_zero_x_size_two() {
        // subgroup_gen(2) has order 4; its point is (0, +-1), so a size-two
        // coset starting there has two points sharing x = 0.
        let bad = Coset::new(crate::circle::CirclePointIndex::subgroup_gen(2), 1);
        assert_eq!(bad.initial.x, M31::zero());
        assert!(matches!(LineDomain::new(bad), Err(CoreError::CosetXNotUnique)));
    }
}
