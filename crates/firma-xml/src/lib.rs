#![forbid(unsafe_code)]

//! XML document helpers for the Firma invoice signing library.
//!
//! Thin conveniences over `roxmltree`, plus the `NodeSet` type used by
//! canonicalization and the enveloped-signature transform.

pub mod document;
pub mod nodeset;

pub use document::XmlDocument;
pub use nodeset::NodeSet;

/// Return roxmltree parsing options that allow DTD.
///
/// DTD is allowed because roxmltree does not expand external entities or
/// perform entity substitution beyond the five predefined XML entities,
/// so it is safe. Some invoice producers ship documents with a DOCTYPE.
pub fn parsing_options() -> roxmltree::ParsingOptions {
    roxmltree::ParsingOptions {
        allow_dtd: true,
        ..roxmltree::ParsingOptions::default()
    }
}
