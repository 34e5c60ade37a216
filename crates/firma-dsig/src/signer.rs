#![forbid(unsafe_code)]

//! The signing pipeline.
//!
//! Stages run in a fixed order and the first failure aborts the run:
//! parse, structure validation, key extraction, reference digest,
//! template insertion, SignedInfo signing.  Structure validation always
//! completes before any keystore byte is parsed.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use firma_core::{algorithm, ns, Error, Result};
use firma_keys::KeyMaterial;
use firma_xml::{document, NodeSet, XmlDocument};

use crate::{insert, reference, template, validate};

/// Sign an invoice document with the key material from a PKCS#12
/// keystore, returning the document with the enveloped `ds:Signature`
/// inserted as the first child of the first `ExtensionContent` element.
///
/// Key material lives only for the duration of this call.
pub fn sign_invoice(xml_text: &str, keystore: &[u8], password: &str) -> Result<String> {
    let doc = XmlDocument::parse(xml_text.to_owned())?;

    // Validated
    let parsed = doc.parse_doc()?;
    validate::ensure_extension_content(&parsed)?;
    drop(parsed);

    // KeyExtracted
    let material = KeyMaterial::from_keystore(keystore, password)?;

    sign_with_material(doc.text(), &material)
}

/// Sign with already extracted key material.  Used by callers that keep
/// keys outside PKCS#12 containers, and by tests.
pub fn sign_with_material(xml_text: &str, material: &KeyMaterial) -> Result<String> {
    let parsed = roxmltree::Document::parse_with_options(xml_text, firma_xml::parsing_options())
        .map_err(|e| Error::XmlParse(e.to_string()))?;
    validate::ensure_extension_content(&parsed)?;
    drop(parsed);

    // Digested
    let digest_b64 = reference::invoice_digest(xml_text)?;

    // Assembled (with an empty SignatureValue)
    let fragment = template::signature_template(&digest_b64, &material.certificate_der);
    let (spliced, offset) = insert::insert_into_extension_content(xml_text, &fragment)?;

    // Signed: canonicalize SignedInfo in its final document context so
    // in-scope ancestor namespace declarations participate, then fill
    // the SignatureValue in.
    let signed_info_octets = canonicalize_signed_info(&spliced)?;
    let alg = firma_crypto::sign::from_uri(algorithm::RSA_SHA1)?;
    let signature = alg.sign(&material.private_key, &signed_info_octets)?;
    let signature_b64 = BASE64.encode(signature);

    // Done
    fill_signature_value(spliced, offset, fragment.len(), &signature_b64)
}

/// Canonicalize the SignedInfo subtree of the freshly inserted signature.
fn canonicalize_signed_info(xml_text: &str) -> Result<Vec<u8>> {
    let doc = roxmltree::Document::parse_with_options(xml_text, firma_xml::parsing_options())
        .map_err(|e| Error::XmlParse(e.to_string()))?;

    let anchor = document::find_element_local(&doc, ns::node::EXTENSION_CONTENT)
        .ok_or_else(|| Error::Signing("anchor element lost after insertion".into()))?;
    let signature = anchor
        .children()
        .find(|n| {
            n.is_element()
                && n.tag_name().name() == ns::node::SIGNATURE
                && n.tag_name().namespace() == Some(ns::DSIG)
        })
        .ok_or_else(|| Error::Signing("inserted signature not found".into()))?;
    let signed_info = signature
        .children()
        .find(|n| n.is_element() && n.tag_name().name() == ns::node::SIGNED_INFO)
        .ok_or_else(|| Error::Signing("SignedInfo not found in inserted signature".into()))?;

    let node_set = NodeSet::tree_without_comments(signed_info);
    firma_c14n::canonicalize_doc(&doc, firma_c14n::C14nMode::Inclusive, Some(&node_set))
}

/// Replace the empty SignatureValue marker inside the inserted fragment.
fn fill_signature_value(
    mut text: String,
    offset: usize,
    fragment_len: usize,
    signature_b64: &str,
) -> Result<String> {
    let marker = template::EMPTY_SIGNATURE_VALUE;
    let region_end = (offset + fragment_len + marker.len()).min(text.len());
    let pos = text[offset..region_end]
        .find(marker)
        .map(|p| offset + p)
        .ok_or_else(|| Error::Signing("SignatureValue placeholder not found".into()))?;

    let filled = format!("<ds:SignatureValue>{signature_b64}</ds:SignatureValue>");
    text.replace_range(pos..pos + marker.len(), &filled);
    Ok(text)
}
