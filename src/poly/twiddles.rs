use alloc::vec::Vec;

use num_traits::One;

use crate::circle::Coset;
use crate::fields::backend::{Col, ColumnOps};
use crate::fields::m31::M31;
use crate::fields::batch_inverse;
use crate::utils::bit_reverse;

/// Precomputed twiddle factors for every layer of the circle/line FFT rooted
/// at `root_coset`, plus their inverses. Read-only after construction and
/// freely shareable across operations (spec §5).
pub struct TwiddleTree<B: ColumnOps<M31>> {
    pub root_coset: Coset,
    pub twiddles: Col<B, M31>,
    pub itwiddles: Col<B, M31>,
}

/// Builds the flat twiddle buffer: for each of `root_coset.log_size` layers,
/// the bit-reversed x-coordinates of the first half of the current coset,
/// then one sentinel element to round the total up to the next power of two
/// (spec §4.3.1).
fn twiddle_buffer(root_coset: Coset) -> Vec<M31> {
    let mut coset = root_coset;
    let mut twiddles = Vec::with_capacity(root_coset.size());
    for _ in 0..root_coset.log_size {
        let half_len = coset.size() / 2;
        let mut layer: Vec<M31> = coset.iter().take(half_len).map(|p| p.x).collect();
        bit_reverse(&mut layer);
        twiddles.extend(layer);
        coset = coset.double();
    }
    twiddles.push(M31::one());
    twiddles
}

pub fn precompute_twiddles<B: ColumnOps<M31>>(root_coset: Coset) -> TwiddleTree<B> {
    let twiddles = twiddle_buffer(root_coset);
    let itwiddles_vec = batch_inverse(&twiddles);

    let mut twiddle_col = unsafe { Col::<B, M31>::uninitialized(twiddles.len()) };
    for (i, v) in twiddles.into_iter().enumerate() {
        twiddle_col.set(i, v);
    }
    let mut itwiddle_col = unsafe { Col::<B, M31>::uninitialized(itwiddles_vec.len()) };
    for (i, v) in itwiddles_vec.into_iter().enumerate() {
        itwiddle_col.set(i, v);
    }

    TwiddleTree {
        root_coset,
        twiddles: twiddle_col,
        itwiddles: itwiddle_col,
    }
}

/// Slices `twiddles` into `domain_log_size` ascending-layer windows: layer `i`
/// is `twiddles[len - 2*2^i .. len - 2^i)` (spec §4.3.2). `twiddles` must be at
/// least as long as the coset of that log size.
pub fn domain_line_twiddles_from_tree(domain_log_size: u32, twiddles: &[M31]) -> Vec<&[M31]> {
    let len = twiddles.len();
    (0..domain_log_size)
        .map(|i| {
            let start = len - (2 << i);
            let end = len - (1 << i);
            &twiddles[start..end]
        })
        .collect()
}

/// Derives the layer-0 (circle) twiddles from the smallest line-twiddle layer:
/// for each adjacent pair `(x, y)`, emits `(y, -y, -x, x)` (spec §4.3.3). Only
/// meaningful for domains of size > 4.
pub fn circle_twiddles_from_line_twiddles(first_layer: &[M31]) -> impl Iterator<Item = M31> + '_ {
    first_layer.chunks_exact(2).flat_map(|pair| {
        let (x, y) = (pair[0], pair[1]);
        [y, -y, -x, x]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::backend::CpuBackend;

    #[test]
    fn twiddles_are_inverses_of_itwiddles() {
        let tree = precompute_twiddles::<CpuBackend<M31>>(Coset::half_odds(4));
        for i in 0..tree.twiddles.len() {
            let t = tree.twiddles.at(i);
            let it = tree.itwiddles.at(i);
            assert_eq!(t * it, M31::one());
        }
    }

    #[test]
    fn buffer_length_is_power_of_two() {
        let coset = Coset::half_odds(5);
        let buf = twiddle_buffer(coset);
        assert_eq!(buf.len(), coset.size());
        assert!(buf.len().is_power_of_two());
    }
}
