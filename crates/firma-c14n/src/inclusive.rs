#![forbid(unsafe_code)]

//! Inclusive Canonical XML 1.0 (C14N 1.0).
//!
//! Algorithm URI: `http://www.w3.org/TR/2001/REC-xml-c14n-20010315`
//! With comments: `http://www.w3.org/TR/2001/REC-xml-c14n-20010315#WithComments`
//!
//! Per C14N 1.0, the canonical form:
//! - Outputs namespace declarations sorted by prefix (default first)
//! - Outputs attributes sorted by (namespace-URI, local-name)
//! - Escapes text and attribute values per C14N rules
//! - Optionally preserves or strips comments
//! - Supports document-subset canonicalization via NodeSet

use crate::escape;
use crate::render::{Attr, NsDecl};
use firma_core::ns::XML as XML_NS;
use firma_core::Error;
use firma_xml::NodeSet;
use std::collections::BTreeMap;

/// Canonicalize a document using Inclusive C14N 1.0.
pub fn canonicalize(
    doc: &roxmltree::Document<'_>,
    with_comments: bool,
    node_set: Option<&NodeSet>,
) -> Result<Vec<u8>, Error> {
    let mut output = Vec::new();
    let ctx = C14nContext {
        with_comments,
        node_set,
        text: doc.input_text(),
    };
    ctx.process_node(doc.root(), &mut output, &BTreeMap::new())?;
    Ok(output)
}

struct C14nContext<'a> {
    with_comments: bool,
    node_set: Option<&'a NodeSet>,
    /// Original document text; qualified names are read from it so the
    /// canonical form keeps the prefixes the document used.
    text: &'a str,
}

impl C14nContext<'_> {
    fn is_visible(&self, node: &roxmltree::Node<'_, '_>) -> bool {
        match self.node_set {
            None => true,
            Some(set) => set.contains(node),
        }
    }

    fn process_node(
        &self,
        node: roxmltree::Node<'_, '_>,
        output: &mut Vec<u8>,
        inherited_ns: &BTreeMap<String, String>,
    ) -> Result<(), Error> {
        match node.node_type() {
            roxmltree::NodeType::Root => {
                for child in node.children() {
                    self.process_node(child, output, inherited_ns)?;
                }
            }
            roxmltree::NodeType::Element => {
                self.process_element(node, output, inherited_ns)?;
            }
            roxmltree::NodeType::Text => {
                if self.is_visible(&node) {
                    let text = node.text().unwrap_or("");
                    output.extend_from_slice(escape::escape_text(text).as_bytes());
                }
            }
            roxmltree::NodeType::Comment => {
                if self.with_comments && self.is_visible(&node) {
                    // Comments outside the document element get newline
                    // separators in the canonical form.
                    let parent_is_root = node
                        .parent()
                        .is_some_and(|p| p.node_type() == roxmltree::NodeType::Root);
                    if parent_is_root && node.prev_siblings().any(|s| s.is_element()) {
                        output.push(b'\n');
                    }

                    output.extend_from_slice(b"<!--");
                    output.extend_from_slice(node.text().unwrap_or("").as_bytes());
                    output.extend_from_slice(b"-->");

                    if parent_is_root && node.next_siblings().any(|s| s.is_element()) {
                        output.push(b'\n');
                    }
                }
            }
            roxmltree::NodeType::PI => {
                if self.is_visible(&node) {
                    let parent_is_root = node
                        .parent()
                        .is_some_and(|p| p.node_type() == roxmltree::NodeType::Root);
                    if parent_is_root && node.prev_siblings().any(|s| s.is_element()) {
                        output.push(b'\n');
                    }

                    if let Some(pi) = node.pi() {
                        output.extend_from_slice(b"<?");
                        output.extend_from_slice(pi.target.as_bytes());
                        if let Some(value) = pi.value {
                            if !value.is_empty() {
                                output.push(b' ');
                                output.extend_from_slice(escape::escape_pi(value).as_bytes());
                            }
                        }
                        output.extend_from_slice(b"?>");
                    }

                    if parent_is_root && node.next_siblings().any(|s| s.is_element()) {
                        output.push(b'\n');
                    }
                }
            }
        }
        Ok(())
    }

    fn process_element(
        &self,
        node: roxmltree::Node<'_, '_>,
        output: &mut Vec<u8>,
        inherited_ns: &BTreeMap<String, String>,
    ) -> Result<(), Error> {
        if !self.is_visible(&node) {
            // Per C14N 1.0 section 2.3, an element outside the node-set
            // still has its in-set children processed. Visible descendants
            // render against the namespace context of the nearest visible
            // ancestor, so inherited_ns passes through unchanged.
            for child in node.children() {
                self.process_node(child, output, inherited_ns)?;
            }
            return Ok(());
        }

        // All namespaces in scope at this element. roxmltree resolves
        // scoping at parse time, so `namespaces()` already reflects
        // ancestor declarations and `xmlns=""` un-declarations.
        let current_ns = collect_inscope_namespaces(&node);

        // Emit a declaration only when it is new or changed relative to
        // the nearest visible ancestor. xmlns:xml is never emitted.
        let mut ns_decls: Vec<NsDecl> = Vec::new();
        for (prefix, uri) in &current_ns {
            if prefix == "xml" {
                continue;
            }
            if inherited_ns.get(prefix) != Some(uri) {
                ns_decls.push(NsDecl {
                    prefix: prefix.clone(),
                    uri: uri.clone(),
                });
            }
        }
        // Default namespace un-declaration: a rendered ancestor had a
        // default namespace, this element does not.
        if !current_ns.contains_key("") && inherited_ns.contains_key("") {
            ns_decls.push(NsDecl {
                prefix: String::new(),
                uri: String::new(),
            });
        }
        ns_decls.sort();

        let src_qnames = source_attr_qnames(self.text, &node);
        let mut attrs: Vec<Attr> = Vec::new();
        for (attr, qname) in node.attributes().zip(src_qnames) {
            let ns_uri = attr.namespace().unwrap_or("");
            attrs.push(Attr {
                ns_uri: ns_uri.to_owned(),
                local_name: attr.name().to_owned(),
                qualified_name: qname.to_owned(),
                value: attr.value().to_owned(),
            });
        }

        // Document-subset C14N: when the immediate parent is not in the
        // node-set, xml:* attributes are inherited from ancestors. A
        // visible parent renders its own xml:* attrs instead.
        if self.node_set.is_some() {
            let parent_not_visible = node
                .parent()
                .map_or(true, |p| !p.is_element() || !self.is_visible(&p));
            if parent_not_visible {
                let extra = collect_inherited_xml_attrs(&node, &attrs);
                attrs.extend(extra);
            }
        }
        attrs.sort();

        let elem_name = qualified_element_name(self.text, &node);

        output.push(b'<');
        output.extend_from_slice(elem_name.as_bytes());
        for ns_decl in &ns_decls {
            ns_decl.render_into(output);
        }
        for attr in &attrs {
            attr.render_into(output);
        }
        output.push(b'>');

        // Children see this element's full namespace context.
        let mut child_ns = inherited_ns.clone();
        if !current_ns.contains_key("") {
            child_ns.remove("");
        }
        for (prefix, uri) in &current_ns {
            if prefix != "xml" {
                child_ns.insert(prefix.clone(), uri.clone());
            }
        }
        for child in node.children() {
            self.process_node(child, output, &child_ns)?;
        }

        output.extend_from_slice(b"</");
        output.extend_from_slice(elem_name.as_bytes());
        output.push(b'>');
        Ok(())
    }
}

/// Collect xml:* attributes inherited from ancestors, skipping names the
/// element already carries. Nearest ancestor value wins.
fn collect_inherited_xml_attrs(
    node: &roxmltree::Node<'_, '_>,
    existing_attrs: &[Attr],
) -> Vec<Attr> {
    let mut inherited_xml: BTreeMap<String, String> = BTreeMap::new();

    let mut current = node.parent();
    while let Some(ancestor) = current {
        if ancestor.is_element() {
            for attr in ancestor.attributes() {
                if attr.namespace() == Some(XML_NS) && !inherited_xml.contains_key(attr.name()) {
                    inherited_xml.insert(attr.name().to_owned(), attr.value().to_owned());
                }
            }
        }
        current = ancestor.parent();
    }

    inherited_xml
        .into_iter()
        .filter(|(name, _)| {
            !existing_attrs
                .iter()
                .any(|a| a.ns_uri == XML_NS && a.local_name == *name)
        })
        .map(|(name, value)| Attr {
            ns_uri: XML_NS.to_owned(),
            qualified_name: format!("xml:{name}"),
            local_name: name,
            value,
        })
        .collect()
}

/// Collect the in-scope namespaces of an element as a prefix → URI map.
fn collect_inscope_namespaces(node: &roxmltree::Node<'_, '_>) -> BTreeMap<String, String> {
    node.namespaces()
        .map(|ns| (ns.name().unwrap_or("").to_owned(), ns.uri().to_owned()))
        .collect()
}

/// Read the qualified element name (prefix:local or just local) from the
/// source text, so the prefix is the one the document actually used.
fn qualified_element_name<'a>(text: &'a str, node: &roxmltree::Node<'_, '_>) -> &'a str {
    let rest = &text[node.range().start + 1..];
    let end = rest
        .find(|c: char| c.is_ascii_whitespace() || c == '/' || c == '>')
        .unwrap_or(rest.len());
    &rest[..end]
}

/// Read the attribute qualified names from the element's open tag, in
/// document order, skipping namespace declarations.  The result aligns
/// one-to-one with `node.attributes()`.
fn source_attr_qnames<'a>(text: &'a str, node: &roxmltree::Node<'_, '_>) -> Vec<&'a str> {
    let mut names = Vec::new();
    let tag = &text[node.range().start + 1..];

    // Skip the element qname.
    let mut pos = tag
        .find(|c: char| c.is_ascii_whitespace() || c == '/' || c == '>')
        .unwrap_or(tag.len());

    loop {
        let rest = &tag[pos..];
        let skipped = rest.len() - rest.trim_start().len();
        pos += skipped;
        match tag[pos..].chars().next() {
            None | Some('>') | Some('/') => break,
            _ => {}
        }

        let name_len = tag[pos..]
            .find(|c: char| c.is_ascii_whitespace() || c == '=')
            .unwrap_or(tag.len() - pos);
        let name = &tag[pos..pos + name_len];
        pos += name_len;

        // Step over `=` and the quoted value.
        if let Some(eq) = tag[pos..].find('=') {
            pos += eq + 1;
            let after_eq = &tag[pos..];
            let skipped = after_eq.len() - after_eq.trim_start().len();
            pos += skipped;
            if let Some(quote) = tag[pos..].chars().next() {
                pos += quote.len_utf8();
                match tag[pos..].find(quote) {
                    Some(close) => pos += close + quote.len_utf8(),
                    None => break,
                }
            }
        } else {
            break;
        }

        if name != "xmlns" && !name.starts_with("xmlns:") {
            names.push(name);
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c14n(xml: &str) -> String {
        let doc = roxmltree::Document::parse(xml).unwrap();
        String::from_utf8(canonicalize(&doc, false, None).unwrap()).unwrap()
    }

    #[test]
    fn test_attribute_sorting() {
        assert_eq!(
            c14n(r#"<root><a b="1" a="2"/></root>"#),
            r#"<root><a a="2" b="1"></a></root>"#
        );
    }

    #[test]
    fn test_empty_element_expanded() {
        assert_eq!(c14n("<root/>"), "<root></root>");
    }

    #[test]
    fn test_namespace_rendering() {
        let out = c14n(r#"<root xmlns:a="http://a" xmlns:b="http://b"><a:child/></root>"#);
        assert!(out.contains(r#"xmlns:a="http://a""#));
        assert!(out.contains(r#"xmlns:b="http://b""#));
    }

    #[test]
    fn test_inherited_namespace_not_redeclared() {
        let out = c14n(r#"<r xmlns:a="http://a"><a:c><a:d/></a:c></r>"#);
        assert_eq!(
            out,
            r#"<r xmlns:a="http://a"><a:c><a:d></a:d></a:c></r>"#
        );
    }

    #[test]
    fn test_text_escaping() {
        assert_eq!(
            c14n("<root>a &amp; b &lt; c</root>"),
            "<root>a &amp; b &lt; c</root>"
        );
    }

    #[test]
    fn test_comments_stripped_without_comments() {
        assert_eq!(c14n("<root><!-- x --><a/></root>"), "<root><a></a></root>");
    }

    #[test]
    fn test_subset_includes_ancestor_namespaces() {
        let xml = r#"<r xmlns:a="http://a"><a:c>text</a:c></r>"#;
        let doc = roxmltree::Document::parse(xml).unwrap();
        let c = doc
            .descendants()
            .find(|n| n.tag_name().name() == "c")
            .unwrap();
        let set = NodeSet::tree_without_comments(c);
        let out =
            String::from_utf8(canonicalize(&doc, false, Some(&set)).unwrap()).unwrap();
        assert_eq!(out, r#"<a:c xmlns:a="http://a">text</a:c>"#);
    }

    #[test]
    fn test_default_namespace_undeclaration_rendered() {
        assert_eq!(
            c14n(r#"<r xmlns="urn:u"><c xmlns=""/></r>"#),
            r#"<r xmlns="urn:u"><c xmlns=""></c></r>"#
        );
    }

    #[test]
    fn test_undeclared_default_not_rebound_in_grandchild() {
        assert_eq!(
            c14n(r#"<r xmlns="urn:u"><c xmlns=""><d/></c></r>"#),
            r#"<r xmlns="urn:u"><c xmlns=""><d></d></c></r>"#
        );
    }

    #[test]
    fn test_element_keeps_source_prefix_when_uri_bound_twice() {
        assert_eq!(
            c14n(r#"<r xmlns="urn:u" xmlns:p="urn:u"><p:c/></r>"#),
            r#"<r xmlns="urn:u" xmlns:p="urn:u"><p:c></p:c></r>"#
        );
    }

    #[test]
    fn test_attribute_keeps_source_prefix_when_uri_bound_twice() {
        assert_eq!(
            c14n(r#"<r xmlns:a="urn:u" xmlns:b="urn:u"><c b:x="1"/></r>"#),
            r#"<r xmlns:a="urn:u" xmlns:b="urn:u"><c b:x="1"></c></r>"#
        );
    }

    #[test]
    fn test_attr_name_with_spaced_equals() {
        assert_eq!(c14n("<a b = '1'/>"), r#"<a b="1"></a>"#);
    }

    #[test]
    fn test_subset_inherits_xml_attrs() {
        let xml = r#"<r xml:lang="en"><c>x</c></r>"#;
        let doc = roxmltree::Document::parse(xml).unwrap();
        let c = doc
            .descendants()
            .find(|n| n.tag_name().name() == "c")
            .unwrap();
        let set = NodeSet::tree_without_comments(c);
        let out =
            String::from_utf8(canonicalize(&doc, false, Some(&set)).unwrap()).unwrap();
        assert_eq!(out, r#"<c xml:lang="en">x</c>"#);
    }
}
