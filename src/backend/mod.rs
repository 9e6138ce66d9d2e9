//! Concrete backend implementations of the `PolyOps`/`FriOps`/`QuotientOps`
//! surface (spec §6, §9 "Backend polymorphism"). Only [`crate::fields::backend::CpuBackend`]
//! is implemented here; other backends (SIMD, GPU) would provide the same
//! trait impls over their own column representation without changing
//! contracts.

pub mod cpu;
