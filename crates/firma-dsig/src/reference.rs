#![forbid(unsafe_code)]

//! Reference digest computation for the invoice subtree.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use firma_core::{algorithm, ns, Error, Result};
use firma_transforms::{
    C14nTransform, EnvelopedSignatureTransform, TransformData, TransformPipeline,
};
use firma_xml::{document, NodeSet};

/// Compute the base64 SHA-256 digest for the single empty-URI reference.
///
/// Locates the first `Invoice` element (any namespace), applies the
/// enveloped-signature transform so pre-existing signatures do not enter
/// the digest, canonicalizes the subtree with inclusive C14N 1.0, and
/// hashes the resulting octets.
pub fn invoice_digest(xml_text: &str) -> Result<String> {
    let doc = roxmltree::Document::parse_with_options(xml_text, firma_xml::parsing_options())
        .map_err(|e| Error::XmlParse(e.to_string()))?;

    let invoice = document::find_element_local(&doc, ns::node::INVOICE).ok_or_else(|| {
        Error::Structure(format!(
            "document has no {} element to digest",
            ns::node::INVOICE
        ))
    })?;

    let node_set = NodeSet::tree_without_comments(invoice);

    let mut pipeline = TransformPipeline::new();
    pipeline.push(Box::new(EnvelopedSignatureTransform::new()));
    pipeline.push(Box::new(C14nTransform::new(firma_c14n::C14nMode::Inclusive)));

    let output = pipeline.execute(TransformData::Xml {
        xml_text: xml_text.to_owned(),
        node_set: Some(node_set),
    })?;

    let octets = output.to_binary()?;
    let hash = firma_crypto::digest::digest(algorithm::SHA256, &octets)?;
    Ok(BASE64.encode(hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sha2::{Digest, Sha256};

    #[test]
    fn test_digest_matches_canonical_subtree() {
        let xml = r#"<Invoice xmlns="urn:ubl"><ID>F001-1</ID></Invoice>"#;
        let digest = invoice_digest(xml).unwrap();

        let expected_octets = br#"<Invoice xmlns="urn:ubl"><ID>F001-1</ID></Invoice>"#;
        let expected = BASE64.encode(Sha256::digest(expected_octets));
        assert_eq!(digest, expected);
    }

    #[test]
    fn test_digest_is_deterministic() {
        let xml = r#"<Invoice><ID>F001-1</ID></Invoice>"#;
        assert_eq!(invoice_digest(xml).unwrap(), invoice_digest(xml).unwrap());
    }

    #[test]
    fn test_existing_signature_excluded() {
        let unsigned = r#"<Invoice><ID>1</ID></Invoice>"#;
        let signed = concat!(
            r#"<Invoice><ds:Signature xmlns:ds="http://www.w3.org/2000/09/xmldsig#">"#,
            "<ds:SignatureValue>x</ds:SignatureValue></ds:Signature><ID>1</ID></Invoice>"
        );
        assert_eq!(
            invoice_digest(unsigned).unwrap(),
            invoice_digest(signed).unwrap()
        );
    }

    #[test]
    fn test_missing_invoice_is_structure_error() {
        let err = invoice_digest("<Receipt/>").unwrap_err();
        assert!(matches!(err, Error::Structure(_)));
    }
}
