use alloc::vec::Vec;
use core::fmt::Debug;

use blake2::digest::Digest;
use blake2::Blake2s256;

use crate::fields::m31::{BaseField, M31, P};
use crate::fields::qm31::SecureField;

/// A Fiat-Shamir transcript: absorbs field elements and commitment roots,
/// squeezes field elements and raw bytes. The core treats this purely as an
/// external collaborator interface (spec §6); it never constructs proofs
/// itself.
pub trait Channel: Default + Clone + Debug {
    const BYTES_PER_HASH: usize;

    fn trailing_zeros(&self) -> u32;

    fn mix_felts(&mut self, felts: &[SecureField]);
    fn mix_u64(&mut self, value: u64);

    fn draw_felt(&mut self) -> SecureField;
    fn draw_felts(&mut self, n_felts: usize) -> Vec<SecureField> {
        (0..n_felts).map(|_| self.draw_felt()).collect()
    }
    fn draw_random_bytes(&mut self) -> Vec<u8>;
}

/// Commits a Merkle node from its children's hashes (or leaf, if `children`
/// is `None`) and a row of column values.
pub trait MerkleHasher: Default + Clone {
    type Hash: Copy + Clone + Debug + Default + Eq + Send + Sync;

    fn hash_node(children: Option<(Self::Hash, Self::Hash)>, column_values: &[BaseField]) -> Self::Hash;
}

/// Binds a concrete [`Channel`] to a concrete [`MerkleHasher`], so the channel
/// knows how to mix a commitment root into its own state.
pub trait MerkleChannel: Default {
    type C: Channel;
    type H: MerkleHasher;

    fn mix_root(channel: &mut Self::C, root: <Self::H as MerkleHasher>::Hash);
}

/// Proof-of-work grinding: find a nonce making the channel's digest have at
/// least `pow_bits` trailing zero bits, and mix it in.
pub trait GrindOps<C: Channel> {
    fn grind(channel: &C, pow_bits: u32) -> u64;
}

/// A [`Channel`] built on Blake2s, mixing felts as their little-endian byte
/// encoding and squeezing randomness by repeated re-hashing of its digest.
#[derive(Clone, Debug, Default)]
pub struct Blake2sChannel {
    digest: [u8; 32],
    n_challenges_drawn: u32,
}

impl Blake2sChannel {
    fn update_digest(&mut self, bytes: &[u8]) {
        let mut hasher = Blake2s256::new();
        hasher.update(self.digest);
        hasher.update(bytes);
        self.digest.copy_from_slice(&hasher.finalize());
        self.n_challenges_drawn = 0;
    }

    fn draw_base_felts(&mut self) -> [M31; 8] {
        let mut hasher = Blake2s256::new();
        hasher.update(self.digest);
        hasher.update(self.n_challenges_drawn.to_le_bytes());
        self.n_challenges_drawn += 1;
        let digest = hasher.finalize();

        core::array::from_fn(|i| {
            let mut bytes = [0u8; 4];
            bytes.copy_from_slice(&digest[i * 4..i * 4 + 4]);
            // Top bit discarded so the result is always < P, avoiding modular bias.
            M31::from_u32_unchecked(u32::from_le_bytes(bytes) & (P >> 1))
        })
    }
}

impl Channel for Blake2sChannel {
    const BYTES_PER_HASH: usize = 32;

    fn trailing_zeros(&self) -> u32 {
        u128::from_le_bytes(core::array::from_fn(|i| *self.digest.get(i).unwrap_or(&0))).trailing_zeros()
    }

    fn mix_felts(&mut self, felts: &[SecureField]) {
        let mut bytes = Vec::with_capacity(felts.len() * 16);
        for felt in felts {
            for m in felt.to_m31_array() {
                bytes.extend_from_slice(&m.to_bytes());
            }
        }
        self.update_digest(&bytes);
    }

    fn mix_u64(&mut self, value: u64) {
        self.update_digest(&value.to_le_bytes());
    }

    fn draw_felt(&mut self) -> SecureField {
        let felts = self.draw_base_felts();
        SecureField::from_m31_array([felts[0], felts[1], felts[2], felts[3]])
    }

    fn draw_random_bytes(&mut self) -> Vec<u8> {
        let mut hasher = Blake2s256::new();
        hasher.update(self.digest);
        hasher.update(self.n_challenges_drawn.to_le_bytes());
        self.n_challenges_drawn += 1;
        hasher.finalize().to_vec()
    }
}

/// A [`MerkleHasher`] pairing with [`Blake2sChannel`]: leaves hash the row's
/// bytes directly, internal nodes hash the concatenation of both children.
#[derive(Clone, Default)]
pub struct Blake2sMerkleHasher;

impl MerkleHasher for Blake2sMerkleHasher {
    type Hash = [u8; 32];

    fn hash_node(children: Option<(Self::Hash, Self::Hash)>, column_values: &[BaseField]) -> Self::Hash {
        let mut hasher = Blake2s256::new();
        if let Some((left, right)) = children {
            hasher.update(left);
            hasher.update(right);
        }
        for value in column_values {
            hasher.update(value.to_bytes());
        }
        let mut out = [0u8; 32];
        out.copy_from_slice(&hasher.finalize());
        out
    }
}

/// Brute-force [`GrindOps`] over [`Blake2sChannel`]: tries nonces in order
/// starting from 0 until one survives `mix_u64` with enough trailing zero
/// bits, matching the teacher's scalar, non-SIMD grinding loop.
impl GrindOps<Blake2sChannel> for crate::fields::backend::CpuBackend<M31> {
    fn grind(channel: &Blake2sChannel, pow_bits: u32) -> u64 {
        let mut nonce = 0u64;
        loop {
            let mut candidate = channel.clone();
            candidate.mix_u64(nonce);
            if candidate.trailing_zeros() >= pow_bits {
                return nonce;
            }
            nonce += 1;
        }
    }
}

#[derive(Default)]
pub struct Blake2sMerkleChannel;

impl MerkleChannel for Blake2sMerkleChannel {
    type C = Blake2sChannel;
    type H = Blake2sMerkleHasher;

    fn mix_root(channel: &mut Self::C, root: <Self::H as MerkleHasher>::Hash) {
        channel.update_digest(&root);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixing_changes_digest() {
        let mut channel = Blake2sChannel::default();
        let before = channel.digest;
        channel.mix_u64(42);
        assert_ne!(before, channel.digest);
    }

    #[test]
    fn draw_felt_is_deterministic_given_state() {
        let mut a = Blake2sChannel::default();
        let mut b = a.clone();
        assert_eq!(a.draw_felt(), b.draw_felt());
    }

    #[test]
    fn draw_felt_changes_after_mix() {
        let mut channel = Blake2sChannel::default();
        let f0 = channel.draw_felt();
        channel.mix_u64(7);
        let f1 = channel.draw_felt();
        assert_ne!(f0, f1);
    }

    #[test]
    fn grind_finds_a_nonce_meeting_the_difficulty() {
        let channel = Blake2sChannel::default();
        let nonce = <crate::fields::backend::CpuBackend<M31> as GrindOps<Blake2sChannel>>::grind(&channel, 4);
        let mut check = channel.clone();
        check.mix_u64(nonce);
        assert!(check.trailing_zeros() >= 4);
    }
}
