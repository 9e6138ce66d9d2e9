#![no_std]

extern crate alloc;

pub mod backend;
pub mod channel;
pub mod circle;
pub mod constraints;
pub mod error;
pub mod fields;
pub mod poly;
pub mod utils;

pub use fields::secure_column::SECURE_EXTENSION_DEGREE;
