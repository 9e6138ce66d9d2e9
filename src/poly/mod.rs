pub mod circle;
pub mod line;
pub mod twiddles;

/// Marker: a column's values are laid out in the domain's natural coset order.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct NaturalOrder;

/// Marker: a column's values are laid out bit-reversed relative to natural
/// order. The FFT engine both consumes and produces this ordering; [`crate::utils::bit_reverse`]
/// is the only sanctioned conversion between the two.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct BitReversedOrder;
