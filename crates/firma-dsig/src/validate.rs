#![forbid(unsafe_code)]

//! Structural validation of the invoice document.

use firma_core::{ns, Error, Result};
use firma_xml::document;

/// Check that the document carries at least one `ExtensionContent`
/// element (any namespace).  This is the anchor the signature is
/// inserted into, and it must be verified before any keystore material
/// is touched.
/// Parse and structurally validate an invoice document from text.
///
/// Entry point for callers that must fail on structure before doing any
/// keystore I/O.
pub fn validate_document(xml_text: &str) -> Result<()> {
    let doc = roxmltree::Document::parse_with_options(xml_text, firma_xml::parsing_options())
        .map_err(|e| Error::XmlParse(e.to_string()))?;
    ensure_extension_content(&doc)
}

pub fn ensure_extension_content(doc: &roxmltree::Document<'_>) -> Result<()> {
    document::find_element_local(doc, ns::node::EXTENSION_CONTENT)
        .map(|_| ())
        .ok_or_else(|| {
            Error::Structure(format!(
                "document has no {} element to hold the signature",
                ns::node::EXTENSION_CONTENT
            ))
        })
}
