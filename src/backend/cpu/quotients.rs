//! Quotient accumulation (spec §4.6): combines several columns' evaluations,
//! each paired with an out-of-domain sample, into one secure-field evaluation
//! via a random linear combination.
//!
//! Grounded on the real stwo prover's CPU quotients backend
//! (`examples/other_examples/845ff03d_ajgara-stwo__...cpu-quotients.rs.rs`),
//! adapted to the constants already defined in [`crate::constraints`].

use alloc::vec::Vec;

use itertools::zip_eq;
use num_traits::{One, Zero};

use crate::circle::CirclePoint;
use crate::constraints::{complex_conjugate_line_coeffs, pair_vanishing};
use crate::error::{CoreError, CoreResult};
use crate::fields::backend::{Col, ColumnOps, CpuBackend};
use crate::fields::batch_inverse;
use crate::fields::m31::M31;
use crate::fields::qm31::SecureField;
use crate::fields::secure_column::SecureColumnByCoords;
use crate::fields::ComplexConjugate;
use crate::poly::circle::{CircleDomain, CircleEvaluation, SecureEvaluation};
use crate::poly::BitReversedOrder;
use crate::utils::{bit_reverse, bit_reverse_index};

/// A single out-of-domain sample point, shared by every column in the batch,
/// paired with each sampled column's index and claimed value (spec §4.6).
#[derive(Clone, Debug)]
pub struct ColumnSampleBatch {
    pub point: CirclePoint<SecureField>,
    pub columns_and_values: Vec<(usize, SecureField)>,
}

/// Precomputed per-row constants shared by every call to
/// [`accumulate_row_quotients`] for one [`accumulate_quotients`] invocation.
pub struct QuotientConstants {
    pub line_coeffs: Vec<Vec<(SecureField, SecureField, SecureField)>>,
    pub batch_random_coeffs: Vec<SecureField>,
    pub denominator_inverses: Vec<Col<CpuBackend<SecureField>, SecureField>>,
}

/// Line coefficients `(alpha^i * a, alpha^i * b, alpha^i * c)` for every
/// column in every batch, where `a*y + b = c*F(p)` is the conjugate-pair line
/// through `(point, value)` (spec §4.6).
pub fn column_line_coeffs(
    sample_batches: &[ColumnSampleBatch],
    random_coeff: SecureField,
) -> Vec<Vec<(SecureField, SecureField, SecureField)>> {
    sample_batches
        .iter()
        .map(|sample_batch| {
            let mut alpha = SecureField::one();
            sample_batch
                .columns_and_values
                .iter()
                .map(|(_, sampled_value)| {
                    alpha *= random_coeff;
                    complex_conjugate_line_coeffs(sample_batch.point, *sampled_value, alpha)
                })
                .collect()
        })
        .collect()
}

/// `random_coeff^(batch size)` for every batch, used to fold one batch's
/// contribution into the running per-row accumulator.
pub fn batch_random_coeffs(
    sample_batches: &[ColumnSampleBatch],
    random_coeff: SecureField,
) -> Vec<SecureField> {
    sample_batches
        .iter()
        .map(|sb| crate::fields::FieldExpOps::pow(&random_coeff, sb.columns_and_values.len() as u32))
        .collect()
}

/// Inverse of `pair_vanishing(point, conj(point), domain_point)` at every
/// domain row, for every batch, in bit-reversed order (matching `columns`'
/// own storage order). A zero denominator means the batch's sample point
/// coincides with a domain point (spec §4.6, §7 `QuotientPointOnDomain`).
pub fn denominator_inverses(
    sample_batches: &[ColumnSampleBatch],
    domain: CircleDomain,
) -> CoreResult<Vec<Col<CpuBackend<SecureField>, SecureField>>> {
    let mut flat_denominators = Vec::with_capacity(sample_batches.len() * domain.size());
    for (batch_index, sample_batch) in sample_batches.iter().enumerate() {
        for row in 0..domain.size() {
            let domain_point = domain.at(row);
            let denominator = pair_vanishing(
                sample_batch.point,
                sample_batch.point.complex_conjugate(),
                domain_point.into_ef(),
            );
            if denominator.is_zero() {
                return Err(CoreError::QuotientPointOnDomain(batch_index));
            }
            flat_denominators.push(denominator);
        }
    }

    let flat_denominator_inverses = batch_inverse(&flat_denominators);

    Ok(flat_denominator_inverses
        .chunks_mut(domain.size())
        .map(|chunk| {
            bit_reverse(chunk);
            let mut col = unsafe { Col::<CpuBackend<SecureField>, SecureField>::uninitialized(chunk.len()) };
            for (i, v) in chunk.iter().enumerate() {
                col.set(i, *v);
            }
            col
        })
        .collect())
}

pub fn quotient_constants(
    sample_batches: &[ColumnSampleBatch],
    random_coeff: SecureField,
    domain: CircleDomain,
) -> CoreResult<QuotientConstants> {
    Ok(QuotientConstants {
        line_coeffs: column_line_coeffs(sample_batches, random_coeff),
        batch_random_coeffs: batch_random_coeffs(sample_batches, random_coeff),
        denominator_inverses: denominator_inverses(sample_batches, domain)?,
    })
}

/// The quotient value at one domain row: for each batch, a random linear
/// combination of `c * F(p) - (a * p.y + b)` over the batch's columns,
/// divided by the batch's vanishing denominator, itself folded across
/// batches by `batch_random_coeffs` (spec §4.6).
pub fn accumulate_row_quotients(
    sample_batches: &[ColumnSampleBatch],
    columns: &[&CircleEvaluation<CpuBackend<M31>, M31, BitReversedOrder>],
    quotient_constants: &QuotientConstants,
    row: usize,
    domain_point: CirclePoint<M31>,
) -> SecureField {
    let mut row_accumulator = SecureField::zero();
    for (((sample_batch, line_coeffs), batch_coeff), denominator_inverses) in sample_batches
        .iter()
        .zip(&quotient_constants.line_coeffs)
        .zip(&quotient_constants.batch_random_coeffs)
        .zip(&quotient_constants.denominator_inverses)
    {
        let mut numerator = SecureField::zero();
        for ((column_index, _), (a, b, c)) in zip_eq(&sample_batch.columns_and_values, line_coeffs) {
            let column = columns[*column_index];
            let value = SecureField::from(column.values.at(row)) * *c;
            let linear_term = *a * domain_point.y + *b;
            numerator += value - linear_term;
        }
        row_accumulator = row_accumulator * *batch_coeff + numerator * denominator_inverses.at(row);
    }
    row_accumulator
}

/// Accumulates every sampled column against every batch into one secure-field
/// evaluation over `domain` (spec §4.6).
pub fn accumulate_quotients(
    domain: CircleDomain,
    columns: &[&CircleEvaluation<CpuBackend<M31>, M31, BitReversedOrder>],
    random_coeff: SecureField,
    sample_batches: &[ColumnSampleBatch],
) -> CoreResult<SecureEvaluation<CpuBackend<M31>, BitReversedOrder>> {
    for (index, column) in columns.iter().enumerate() {
        if column.len() != domain.size() {
            return Err(CoreError::ColumnSizeMismatch {
                index,
                expected: domain.size(),
                actual: column.len(),
            });
        }
    }

    let constants = quotient_constants(sample_batches, random_coeff, domain)?;
    let mut values = unsafe { SecureColumnByCoords::<CpuBackend<M31>>::uninitialized(domain.size()) };

    for row in 0..domain.size() {
        let domain_point = domain.at(bit_reverse_index(row, domain.log_size()));
        let row_value =
            accumulate_row_quotients(sample_batches, columns, &constants, row, domain_point);
        values.set(row, row_value);
    }

    Ok(SecureEvaluation::new(domain, values))
}

/// Backend-polymorphic surface for quotient accumulation (spec §4.6, §9
/// "Backend polymorphism").
pub trait QuotientOps: ColumnOps<M31> {
    fn accumulate_quotients(
        domain: CircleDomain,
        columns: &[&CircleEvaluation<Self, M31, BitReversedOrder>],
        random_coeff: SecureField,
        sample_batches: &[ColumnSampleBatch],
    ) -> CoreResult<SecureEvaluation<Self, BitReversedOrder>>
    where
        Self: Sized;
}

impl QuotientOps for CpuBackend<M31> {
    fn accumulate_quotients(
        domain: CircleDomain,
        columns: &[&CircleEvaluation<Self, M31, BitReversedOrder>],
        random_coeff: SecureField,
        sample_batches: &[ColumnSampleBatch],
    ) -> CoreResult<SecureEvaluation<Self, BitReversedOrder>> {
        accumulate_quotients(domain, columns, random_coeff, sample_batches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poly::circle::{CanonicCoset, CirclePoly};

    #[test]
    fn quotient_of_single_sample_is_low_degree() {
        // S6-style sanity: quotient of a low-degree poly against one of its
        // own (on-domain) sample points stays low-degree after interpolation.
        const LOG_SIZE: u32 = 5;
        let coeffs: Vec<M31> = (0..(1u32 << LOG_SIZE)).map(M31::from).collect();
        let mut col = unsafe { Col::<CpuBackend<M31>, M31>::uninitialized(coeffs.len()) };
        for (i, v) in coeffs.into_iter().enumerate() {
            col.set(i, v);
        }
        let poly = CirclePoly::<CpuBackend<M31>>::new(col);

        let eval_domain = CanonicCoset::new(LOG_SIZE + 1).circle_domain();
        let eval = poly.evaluate(eval_domain).unwrap();

        let point = CirclePoint {
            x: SecureField::from(3u32),
            y: SecureField::from(4u32),
        };
        let value = poly.eval_at_point(point);
        let coeff = SecureField::from(7u32);

        let quotient = accumulate_quotients(
            eval_domain,
            &[&eval],
            coeff,
            &[ColumnSampleBatch {
                point,
                columns_and_values: alloc::vec![(0, value)],
            }],
        )
        .unwrap();

        assert_eq!(quotient.len(), eval_domain.size());
    }

    #[test]
    fn accumulate_quotients_rejects_column_size_mismatch() {
        let domain = CanonicCoset::new(4).circle_domain();
        let small_domain = CanonicCoset::new(3).circle_domain();
        let mut col = unsafe { Col::<CpuBackend<M31>, M31>::uninitialized(small_domain.size()) };
        for i in 0..small_domain.size() {
            col.set(i, M31::zero());
        }
        let eval = CircleEvaluation::<CpuBackend<M31>, M31, BitReversedOrder>::new(small_domain, col);

        let point = CirclePoint {
            x: SecureField::from(3u32),
            y: SecureField::from(4u32),
        };
        let result = accumulate_quotients(
            domain,
            &[&eval],
            SecureField::from(1u32),
            &[ColumnSampleBatch {
                point,
                columns_and_values: alloc::vec![(0, SecureField::from(0u32))],
            }],
        );
        assert!(matches!(result, Err(CoreError::ColumnSizeMismatch { .. })));
    }

    #[test]
    fn accumulate_quotients_rejects_point_on_domain() {
        // A sample point equal to an actual domain point makes
        // pair_vanishing's denominator zero instead of panicking in
        // batch_inverse.
        let domain = CanonicCoset::new(3).circle_domain();
        let mut col = unsafe { Col::<CpuBackend<M31>, M31>::uninitialized(domain.size()) };
        for i in 0..domain.size() {
            col.set(i, M31::zero());
        }
        let eval = CircleEvaluation::<CpuBackend<M31>, M31, BitReversedOrder>::new(domain, col);

        let on_domain_point = domain.at(0).into_ef::<SecureField>();
        let result = accumulate_quotients(
            domain,
            &[&eval],
            SecureField::from(1u32),
            &[ColumnSampleBatch {
                point: on_domain_point,
                columns_and_values: alloc::vec![(0, SecureField::from(0u32))],
            }],
        );
        assert!(matches!(result, Err(CoreError::QuotientPointOnDomain(0))));
    }
}
