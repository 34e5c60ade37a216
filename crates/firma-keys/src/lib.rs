#![forbid(unsafe_code)]

//! Key material handling for the Firma invoice signing library.

pub mod material;

pub use material::KeyMaterial;
