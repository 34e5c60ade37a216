#![forbid(unsafe_code)]

//! Transform pipeline engine for the Firma invoice signing library.
//!
//! Implements the transform chain model from XML-DSig: each reference
//! contains a sequence of transforms that are applied in order.

pub mod enveloped;
pub mod pipeline;

pub use enveloped::EnvelopedSignatureTransform;
pub use pipeline::{C14nTransform, Transform, TransformData, TransformPipeline};
