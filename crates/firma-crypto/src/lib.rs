#![forbid(unsafe_code)]

//! Cryptographic primitives for the Firma invoice signing library.
//!
//! Digest and signature algorithms are addressed by their XML Security
//! URI, matching how they appear in `Algorithm` attributes.

pub mod digest;
pub mod sign;
