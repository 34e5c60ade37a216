#![forbid(unsafe_code)]

//! Byte-offset insertion of the signature into the anchor element.
//!
//! roxmltree gives byte ranges into the original text, so the fragment
//! is spliced into the input string directly.  Everything outside the
//! splice point is carried through verbatim.

use firma_core::{ns, Error, Result};
use firma_xml::document;

/// Splice `fragment` in as the FIRST child of the FIRST
/// `ExtensionContent` element.  Returns the new text and the byte offset
/// the fragment was inserted at.
///
/// A childless self-closing anchor (`<ext:ExtensionContent/>`) is
/// expanded to an open/close pair around the fragment; no other byte of
/// the input changes.
pub fn insert_into_extension_content(xml_text: &str, fragment: &str) -> Result<(String, usize)> {
    let doc = roxmltree::Document::parse_with_options(xml_text, firma_xml::parsing_options())
        .map_err(|e| Error::XmlParse(e.to_string()))?;

    let anchor = document::find_element_local(&doc, ns::node::EXTENSION_CONTENT).ok_or_else(
        || {
            Error::Structure(format!(
                "document has no {} element to hold the signature",
                ns::node::EXTENSION_CONTENT
            ))
        },
    )?;

    let start = anchor.range().start;
    let gt = open_tag_end(xml_text, start)?;

    if xml_text[..gt].ends_with('/') {
        // Self-closing anchor: expand to an open/close pair. The closing
        // tag name is taken from the source bytes so the prefix matches.
        let open_tag = &xml_text[start..gt - 1];
        let qname = qualified_name(open_tag)?;
        let offset = gt;
        let mut out = String::with_capacity(xml_text.len() + fragment.len() + qname.len() + 3);
        out.push_str(&xml_text[..gt - 1]);
        out.push('>');
        out.push_str(fragment);
        out.push_str("</");
        out.push_str(qname);
        out.push('>');
        out.push_str(&xml_text[gt + 1..]);
        Ok((out, offset))
    } else {
        // Open/close pair: first-child position is right after the `>`.
        let offset = gt + 1;
        let mut out = String::with_capacity(xml_text.len() + fragment.len());
        out.push_str(&xml_text[..offset]);
        out.push_str(fragment);
        out.push_str(&xml_text[offset..]);
        Ok((out, offset))
    }
}

/// Find the `>` that closes the open tag starting at `start`, skipping
/// over quoted attribute values.
fn open_tag_end(text: &str, start: usize) -> Result<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in text[start..].char_indices() {
        match (quote, c) {
            (None, '"') | (None, '\'') => quote = Some(c),
            (Some(q), _) if c == q => quote = None,
            (None, '>') => return Ok(start + i),
            _ => {}
        }
    }
    Err(Error::Structure("malformed anchor element range".into()))
}

/// Extract the qualified element name from the source text of an open tag.
fn qualified_name(open_tag: &str) -> Result<&str> {
    let rest = open_tag
        .strip_prefix('<')
        .ok_or_else(|| Error::Structure("malformed anchor element range".into()))?;
    let end = rest
        .find(|c: char| c.is_ascii_whitespace() || c == '/' || c == '>')
        .unwrap_or(rest.len());
    Ok(&rest[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_before_existing_children() {
        let xml = r#"<r><ExtensionContent><Existing/></ExtensionContent></r>"#;
        let (out, offset) = insert_into_extension_content(xml, "<Sig/>").unwrap();
        assert_eq!(
            out,
            r#"<r><ExtensionContent><Sig/><Existing/></ExtensionContent></r>"#
        );
        assert_eq!(&out[offset..offset + 6], "<Sig/>");
    }

    #[test]
    fn test_insert_into_self_closing_anchor() {
        let xml = r#"<r><ext:ExtensionContent xmlns:ext="urn:e"/></r>"#;
        let (out, _) = insert_into_extension_content(xml, "<Sig/>").unwrap();
        assert_eq!(
            out,
            r#"<r><ext:ExtensionContent xmlns:ext="urn:e"><Sig/></ext:ExtensionContent></r>"#
        );
    }

    #[test]
    fn test_insert_into_empty_pair_anchor() {
        let xml = r#"<r><ExtensionContent></ExtensionContent></r>"#;
        let (out, _) = insert_into_extension_content(xml, "<Sig/>").unwrap();
        assert_eq!(out, r#"<r><ExtensionContent><Sig/></ExtensionContent></r>"#);
    }

    #[test]
    fn test_first_anchor_wins() {
        let xml = r#"<r><ExtensionContent>a</ExtensionContent><ExtensionContent>b</ExtensionContent></r>"#;
        let (out, _) = insert_into_extension_content(xml, "<S/>").unwrap();
        assert_eq!(
            out,
            r#"<r><ExtensionContent><S/>a</ExtensionContent><ExtensionContent>b</ExtensionContent></r>"#
        );
    }

    #[test]
    fn test_whitespace_only_anchor_keeps_bytes() {
        let xml = "<r><ExtensionContent>\n  </ExtensionContent></r>";
        let (out, _) = insert_into_extension_content(xml, "<S/>").unwrap();
        assert_eq!(out, "<r><ExtensionContent><S/>\n  </ExtensionContent></r>");
    }

    #[test]
    fn test_missing_anchor_is_structure_error() {
        let err = insert_into_extension_content("<r/>", "<S/>").unwrap_err();
        assert!(matches!(err, Error::Structure(_)));
    }
}
