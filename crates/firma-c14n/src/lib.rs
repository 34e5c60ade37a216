#![forbid(unsafe_code)]

//! XML Canonicalization (C14N) for the Firma invoice signing library.
//!
//! Implements Canonical XML 1.0 (inclusive), with and without comments.
//! This is the only variant that appears on the wire in the signatures
//! this library emits.

pub mod escape;
pub mod inclusive;
pub mod render;

use firma_core::{algorithm, Error};
use firma_xml::NodeSet;

/// The canonicalization mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum C14nMode {
    /// Canonical XML 1.0
    Inclusive,
    /// Canonical XML 1.0 with comments
    InclusiveWithComments,
}

impl C14nMode {
    /// Get the algorithm URI for this mode.
    pub fn uri(&self) -> &'static str {
        match self {
            Self::Inclusive => algorithm::C14N,
            Self::InclusiveWithComments => algorithm::C14N_WITH_COMMENTS,
        }
    }

    pub fn with_comments(&self) -> bool {
        matches!(self, Self::InclusiveWithComments)
    }
}

/// Canonicalize an XML document.
///
/// - `xml`: the raw XML text
/// - `mode`: which C14N variant to use
/// - `node_set`: optional node set (for document-subset canonicalization)
pub fn canonicalize(
    xml: &str,
    mode: C14nMode,
    node_set: Option<&NodeSet>,
) -> Result<Vec<u8>, Error> {
    let doc = roxmltree::Document::parse_with_options(xml, firma_xml::parsing_options())
        .map_err(|e| Error::XmlParse(e.to_string()))?;
    inclusive::canonicalize(&doc, mode.with_comments(), node_set)
}

/// Convenience: canonicalize with a pre-parsed document.
pub fn canonicalize_doc(
    doc: &roxmltree::Document<'_>,
    mode: C14nMode,
    node_set: Option<&NodeSet>,
) -> Result<Vec<u8>, Error> {
    inclusive::canonicalize(doc, mode.with_comments(), node_set)
}
