#![forbid(unsafe_code)]

//! Shared foundations for the Firma workspace: the error taxonomy,
//! algorithm URI constants, and XML name constants.

pub mod algorithm;
pub mod error;
pub mod ns;

pub use error::{Error, Result};
