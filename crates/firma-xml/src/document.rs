#![forbid(unsafe_code)]

//! XML document wrapper over roxmltree.

use firma_core::Error;

/// An owned XML document.  Stores the text; parsed views borrow from it.
///
/// To work with the parsed tree, call [`XmlDocument::parse_doc`] which
/// returns a temporary `roxmltree::Document` borrowing from the text.
pub struct XmlDocument {
    text: String,
}

impl XmlDocument {
    /// Parse and validate XML from a string, taking ownership.
    pub fn parse(text: String) -> Result<Self, Error> {
        // Validate that the XML parses successfully.
        let _doc = roxmltree::Document::parse_with_options(&text, crate::parsing_options())
            .map_err(|e| Error::XmlParse(e.to_string()))?;
        Ok(Self { text })
    }

    /// Get the raw XML text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Parse the document and return a temporary `roxmltree::Document`.
    ///
    /// This re-parses the XML from the stored text.  For performance,
    /// call this once at the top of a processing pipeline and pass the
    /// resulting document reference down through the call chain.
    pub fn parse_doc(&self) -> Result<roxmltree::Document<'_>, Error> {
        roxmltree::Document::parse_with_options(&self.text, crate::parsing_options())
            .map_err(|e| Error::XmlParse(e.to_string()))
    }
}

/// Find the first descendant element with the given local name and namespace.
pub fn find_element<'a>(
    doc: &'a roxmltree::Document<'a>,
    ns: &str,
    local_name: &str,
) -> Option<roxmltree::Node<'a, 'a>> {
    doc.descendants().find(|n| {
        n.is_element()
            && n.tag_name().name() == local_name
            && n.tag_name().namespace().unwrap_or("") == ns
    })
}

/// Find the first descendant element with the given local name, in any
/// namespace.  Matches the `//*[local-name()='...']` addressing used for
/// the UBL anchor elements.
pub fn find_element_local<'a>(
    doc: &'a roxmltree::Document<'a>,
    local_name: &str,
) -> Option<roxmltree::Node<'a, 'a>> {
    doc.descendants()
        .find(|n| n.is_element() && n.tag_name().name() == local_name)
}

/// Find all descendant elements with the given local name and namespace.
pub fn find_elements<'a>(
    doc: &'a roxmltree::Document<'a>,
    ns: &str,
    local_name: &str,
) -> Vec<roxmltree::Node<'a, 'a>> {
    doc.descendants()
        .filter(|n| {
            n.is_element()
                && n.tag_name().name() == local_name
                && n.tag_name().namespace().unwrap_or("") == ns
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(XmlDocument::parse("<a><b></a>".to_owned()).is_err());
    }

    #[test]
    fn test_find_element_local_ignores_namespace() {
        let xml = r#"<r xmlns:e="urn:e"><e:Invoice/></r>"#;
        let doc = roxmltree::Document::parse(xml).unwrap();
        let node = find_element_local(&doc, "Invoice").unwrap();
        assert_eq!(node.tag_name().namespace(), Some("urn:e"));
    }

    #[test]
    fn test_find_element_requires_namespace() {
        let xml = r#"<r xmlns:e="urn:e"><e:Invoice/></r>"#;
        let doc = roxmltree::Document::parse(xml).unwrap();
        assert!(find_element(&doc, "urn:other", "Invoice").is_none());
        assert!(find_element(&doc, "urn:e", "Invoice").is_some());
    }
}
