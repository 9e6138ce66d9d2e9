use crate::circle::{CirclePoint, Coset};
use crate::fields::m31::M31;
use crate::fields::qm31::SecureField;
use crate::fields::{ComplexConjugate, ExtensionOf, Field};

/// Evaluates the vanishing polynomial of `coset` at `p`.
///
/// Doubling a point `log_size - 1` times and taking the x-coordinate evaluates
/// a degree-`2^(log_size - 1)` polynomial in x. If every point of the coset is
/// a root of that polynomial, it vanishes on the whole coset.
pub fn coset_vanishing(coset: Coset, mut p: CirclePoint<SecureField>) -> SecureField {
    // Rotating by `-initial + step/2` turns the coset into `step/2 + <step>`,
    // a coset symmetric around the x-axis; doubling `log_size - 1` times then
    // collapses it onto `{+-G_4}`, whose vanishing polynomial is just `x`.
    let initial_point_ef = coset.initial.into_ef();
    let half_step_point_ef = coset.step_size.half().to_point().into_ef();

    p = p - initial_point_ef + half_step_point_ef;
    let mut x = p.x;

    for _ in 1..coset.log_size {
        x = CirclePoint::double_x(x);
    }
    x
}

/// Evaluates, at `p`, the unique (up to scaling) rational function that
/// vanishes at `excluded` and nowhere else on the circle.
pub fn point_vanishing<F: ExtensionOf<M31>, EF: ExtensionOf<F>>(
    excluded: CirclePoint<F>,
    p: CirclePoint<EF>,
) -> EF {
    let h = p - excluded.into_ef();
    h.y / (EF::one() + h.x)
}

/// Evaluates the vanishing polynomial of `{excluded, -excluded}` at `p`,
/// without needing `excluded`'s complex conjugate explicitly — used to build a
/// quotient with a conjugate pair of out-of-domain sample points.
pub fn pair_vanishing<F: ExtensionOf<M31>, EF: ExtensionOf<F>>(
    excluded0: CirclePoint<EF>,
    excluded1: CirclePoint<EF>,
    p: CirclePoint<F>,
) -> EF {
    // The line through `excluded0` and `excluded1`, evaluated at `p`.
    (excluded0.y - excluded1.y) * p.x - (excluded0.x - excluded1.x) * p.y
        + excluded0.x * excluded1.y
        - excluded0.y * excluded1.x
}

/// Coefficients `(a, b, c)` of the line `a*y + b = c*f(p)` through the pair
/// `(point, value)` and `(point.conjugate(), value.complex_conjugate())` —
/// valid for any `f` satisfying `f(conj(p)) = conj(f(p))`. Pre-multiplied by
/// `alpha` so the accumulator can fold several sample batches with one
/// running random-linear-combination coefficient.
pub fn complex_conjugate_line_coeffs(
    point: CirclePoint<SecureField>,
    value: SecureField,
    alpha: SecureField,
) -> (SecureField, SecureField, SecureField) {
    assert_ne!(
        point.y,
        point.y.complex_conjugate(),
        "point should not be on the real line"
    );
    let a = value - value.complex_conjugate();
    let c = point.y - point.y.complex_conjugate();
    let b = value * c - a * point.y;
    (alpha * a, alpha * b, alpha * c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circle::CirclePointIndex;

    #[test]
    fn coset_vanishes_on_its_own_points() {
        let coset = Coset::odds(3);
        for p in coset.iter() {
            let v = coset_vanishing(coset, p.into_ef::<SecureField>());
            assert_eq!(v, SecureField::from(0u32));
        }
    }

    #[test]
    fn point_vanishing_is_zero_only_at_excluded() {
        let excluded = CirclePointIndex::subgroup_gen(4).to_point();
        assert_eq!(point_vanishing(excluded, excluded), M31::from(0u32));
        let other = CirclePointIndex::subgroup_gen(5).to_point();
        assert_ne!(point_vanishing(excluded, other), M31::from(0u32));
    }
}
