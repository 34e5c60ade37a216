#![forbid(unsafe_code)]

//! Enveloped XML-DSig signing for UBL invoices.
//!
//! The entry point is [`sign_invoice`]: validate the document structure,
//! pull key material out of a PKCS#12 keystore, digest the `Invoice`
//! subtree, and splice a `ds:Signature` into the first
//! `ExtensionContent` element while preserving every other input byte.

pub mod insert;
pub mod reference;
pub mod signer;
pub mod template;
pub mod validate;

pub use signer::{sign_invoice, sign_with_material};

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine;
    use firma_core::{algorithm, ns, Error};
    use firma_keys::KeyMaterial;
    use firma_xml::NodeSet;

    const INVOICE: &str = concat!(
        r#"<?xml version="1.0" encoding="UTF-8"?>"#,
        "\n",
        r#"<Invoice xmlns="urn:oasis:names:specification:ubl:schema:xsd:Invoice-2" "#,
        r#"xmlns:cbc="urn:oasis:names:specification:ubl:schema:xsd:CommonBasicComponents-2" "#,
        r#"xmlns:ext="urn:oasis:names:specification:ubl:schema:xsd:CommonExtensionComponents-2">"#,
        "<ext:UBLExtensions><ext:UBLExtension><ext:ExtensionContent>",
        "</ext:ExtensionContent></ext:UBLExtension></ext:UBLExtensions>",
        "<cbc:ID>F001-00000001</cbc:ID>",
        "</Invoice>"
    );

    fn test_material() -> KeyMaterial {
        let mut rng = rand::thread_rng();
        let key = rsa::RsaPrivateKey::new(&mut rng, 2048).unwrap();
        // Any DER blob works for KeyInfo; it is only re-encoded as base64.
        let cert_der = vec![0x30, 0x82, 0x01, 0x0a, 0xde, 0xad, 0xbe, 0xef];
        KeyMaterial::from_parts(key, cert_der)
    }

    fn signature_node<'a>(
        doc: &'a roxmltree::Document<'a>,
    ) -> roxmltree::Node<'a, 'a> {
        let anchor = doc
            .descendants()
            .find(|n| n.tag_name().name() == "ExtensionContent")
            .unwrap();
        anchor
            .children()
            .find(|n| n.is_element())
            .unwrap()
    }

    #[test]
    fn test_signature_is_first_child_of_anchor() {
        let material = test_material();
        let signed = sign_with_material(INVOICE, &material).unwrap();
        let doc = roxmltree::Document::parse(&signed).unwrap();

        let sig = signature_node(&doc);
        assert_eq!(sig.tag_name().name(), "Signature");
        assert_eq!(sig.tag_name().namespace(), Some(ns::DSIG));
        assert_eq!(sig.attribute("Id"), Some("SignatureSP"));
    }

    #[test]
    fn test_input_bytes_preserved_around_insertion() {
        let material = test_material();
        let signed = sign_with_material(INVOICE, &material).unwrap();

        let start = signed.find("<ds:Signature").unwrap();
        let end_marker = "</ds:Signature>";
        let end = signed.find(end_marker).unwrap() + end_marker.len();
        let mut stripped = String::new();
        stripped.push_str(&signed[..start]);
        stripped.push_str(&signed[end..]);
        assert_eq!(stripped, INVOICE);
    }

    #[test]
    fn test_signing_is_deterministic() {
        let material = test_material();
        let a = sign_with_material(INVOICE, &material).unwrap();
        let b = sign_with_material(INVOICE, &material).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_digest_value_matches_reference() {
        let material = test_material();
        let signed = sign_with_material(INVOICE, &material).unwrap();
        let doc = roxmltree::Document::parse(&signed).unwrap();

        let digest_value = doc
            .descendants()
            .find(|n| n.tag_name().name() == "DigestValue")
            .unwrap()
            .text()
            .unwrap()
            .to_owned();
        assert_eq!(digest_value, reference::invoice_digest(INVOICE).unwrap());
    }

    #[test]
    fn test_signature_value_verifies_against_signed_info() {
        let material = test_material();
        let signed = sign_with_material(INVOICE, &material).unwrap();
        let doc = roxmltree::Document::parse(&signed).unwrap();

        let signature_b64 = doc
            .descendants()
            .find(|n| n.tag_name().name() == "SignatureValue")
            .unwrap()
            .text()
            .unwrap()
            .to_owned();
        let signature = BASE64.decode(signature_b64).unwrap();

        // Recompute the SignedInfo octets the way a verifier would: the
        // subtree canonicalized in document context.
        let signed_info = doc
            .descendants()
            .find(|n| n.tag_name().name() == "SignedInfo")
            .unwrap();
        let set = NodeSet::tree_without_comments(signed_info);
        let octets =
            firma_c14n::canonicalize_doc(&doc, firma_c14n::C14nMode::Inclusive, Some(&set))
                .unwrap();

        let alg = firma_crypto::sign::from_uri(algorithm::RSA_SHA1).unwrap();
        assert!(alg
            .verify(&material.private_key.to_public_key(), &octets, &signature)
            .unwrap());
    }

    #[test]
    fn test_key_info_certificate_text() {
        let material = test_material();
        let signed = sign_with_material(INVOICE, &material).unwrap();
        let doc = roxmltree::Document::parse(&signed).unwrap();

        let cert_text = doc
            .descendants()
            .find(|n| n.tag_name().name() == "X509Certificate")
            .unwrap()
            .text()
            .unwrap()
            .to_owned();
        assert_eq!(cert_text, BASE64.encode(&material.certificate_der));
    }

    #[test]
    fn test_missing_anchor_fails_before_keystore_parse() {
        // Keystore bytes are garbage; if validation runs first the error
        // must be Structure, not Keystore.
        let err = sign_invoice("<Invoice/>", b"not a keystore", "pw").unwrap_err();
        assert!(matches!(err, Error::Structure(_)));
    }

    #[test]
    fn test_garbage_keystore_is_keystore_error() {
        let err = sign_invoice(INVOICE, b"not a keystore", "pw").unwrap_err();
        assert!(matches!(err, Error::Keystore(_)));
    }

    #[test]
    fn test_malformed_xml_is_parse_error() {
        let err = sign_invoice("<Invoice><a></Invoice>", b"x", "pw").unwrap_err();
        assert!(matches!(err, Error::XmlParse(_)));
    }

    #[test]
    fn test_sign_end_to_end_with_fixture_keystore() {
        let pfx_path = std::path::Path::new("../../test-data/keystores/signer.pfx");
        if !pfx_path.exists() {
            eprintln!("skipping test: {pfx_path:?} not found");
            return;
        }
        let keystore = std::fs::read(pfx_path).unwrap();
        let signed = sign_invoice(INVOICE, &keystore, "secret123").unwrap();
        let doc = roxmltree::Document::parse(&signed).unwrap();
        let sig = signature_node(&doc);
        assert_eq!(sig.tag_name().name(), "Signature");
        let err = sign_invoice(INVOICE, &keystore, "wrong").unwrap_err();
        assert!(matches!(err, Error::Keystore(_)));
    }
}
