use alloc::vec::Vec;

/// Returns the bit reversed index of `i`, represented by the low `log_size` bits.
pub const fn bit_reverse_index(i: usize, log_size: u32) -> usize {
    if log_size == 0 {
        return i;
    }
    i.reverse_bits() >> (usize::BITS - log_size)
}

/// Permutes `values` in place so that `values[bit_reverse_index(i, log_size)]`
/// ends up where `values[i]` started, for `log_size = values.len().ilog2()`.
///
/// # Panics
/// Panics if `values.len()` is not a power of two.
pub fn bit_reverse<T>(values: &mut [T]) {
    let n = values.len();
    assert!(n.is_power_of_two(), "bit_reverse: length {n} is not a power of two");
    let log_size = n.ilog2();
    for i in 0..n {
        let j = bit_reverse_index(i, log_size);
        if i < j {
            values.swap(i, j);
        }
    }
}

/// Repeats every element of `values` `d` times, consecutively: `[a, b], d=2 ->
/// [a, a, b, b]`.
pub fn repeat_value<T: Clone>(values: &[T], d: usize) -> Vec<T> {
    let mut out = Vec::with_capacity(values.len() * d);
    for v in values {
        for _ in 0..d {
            out.push(v.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_reverse_index_is_involution() {
        for log_size in 0..8 {
            for i in 0..(1usize << log_size) {
                let j = bit_reverse_index(i, log_size);
                assert_eq!(bit_reverse_index(j, log_size), i);
            }
        }
    }

    #[test]
    fn bit_reverse_is_involution() {
        let mut values: Vec<u32> = (0..16).collect();
        let original = values.clone();
        bit_reverse(&mut values);
        bit_reverse(&mut values);
        assert_eq!(values, original);
    }

    #[test]
    fn bit_reverse_known_case() {
        let mut values: Vec<u32> = (0..8).collect();
        bit_reverse(&mut values);
        assert_eq!(values, vec![0, 4, 2, 6, 1, 5, 3, 7]);
    }

    #[test]
    fn repeat_value_repeats_consecutively() {
        assert_eq!(repeat_value(&[1, 2], 3), vec![1, 1, 1, 2, 2, 2]);
    }
}
