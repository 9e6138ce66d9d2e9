//! The scalar CPU backend's trait implementations: the circle/line FFT engine
//! (§4.3), FRI folding (§4.5), and quotient accumulation (§4.6), all over
//! [`crate::fields::backend::CpuBackend<M31>`].

pub mod fft;
pub mod fri;
pub mod quotients;

pub use fri::FriOps;
pub use quotients::QuotientOps;
