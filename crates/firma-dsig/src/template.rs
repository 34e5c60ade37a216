#![forbid(unsafe_code)]

//! Construction of the `ds:Signature` element.
//!
//! The template is built with the DigestValue and KeyInfo certificate
//! already filled in and an empty SignatureValue; the signer computes
//! the SignedInfo signature after the template is in place in the
//! document and fills the value in.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use firma_core::{algorithm, ns};

/// Marker the signer replaces once the SignedInfo octets are signed.
pub const EMPTY_SIGNATURE_VALUE: &str = "<ds:SignatureValue></ds:SignatureValue>";

/// Base64 body of an X.509 certificate for `ds:X509Certificate`: the DER
/// bytes encoded without PEM delimiters and without line breaks.
pub fn certificate_text(cert_der: &[u8]) -> String {
    BASE64.encode(cert_der)
}

/// Build the complete `ds:Signature` fragment.
///
/// Exactly one `ds:Reference` with `URI=""` (same-document addressing),
/// the enveloped-signature and inclusive C14N transforms in that order,
/// SHA-256 digest and RSA-SHA1 signature methods.  The `Id` attribute is
/// fixed to `SignatureSP`.
pub fn signature_template(digest_b64: &str, cert_der: &[u8]) -> String {
    let mut out = String::with_capacity(1024 + cert_der.len() * 4 / 3);

    out.push_str(&format!(
        r#"<ds:Signature xmlns:ds="{}" {}="{}">"#,
        ns::DSIG,
        ns::attr::ID,
        ns::SIGNATURE_ID
    ));

    out.push_str("<ds:SignedInfo>");
    out.push_str(&format!(
        r#"<ds:CanonicalizationMethod Algorithm="{}"></ds:CanonicalizationMethod>"#,
        algorithm::C14N
    ));
    out.push_str(&format!(
        r#"<ds:SignatureMethod Algorithm="{}"></ds:SignatureMethod>"#,
        algorithm::RSA_SHA1
    ));
    out.push_str(r#"<ds:Reference URI="">"#);
    out.push_str("<ds:Transforms>");
    out.push_str(&format!(
        r#"<ds:Transform Algorithm="{}"></ds:Transform>"#,
        algorithm::ENVELOPED_SIGNATURE
    ));
    out.push_str(&format!(
        r#"<ds:Transform Algorithm="{}"></ds:Transform>"#,
        algorithm::C14N
    ));
    out.push_str("</ds:Transforms>");
    out.push_str(&format!(
        r#"<ds:DigestMethod Algorithm="{}"></ds:DigestMethod>"#,
        algorithm::SHA256
    ));
    out.push_str(&format!(
        "<ds:DigestValue>{digest_b64}</ds:DigestValue>"
    ));
    out.push_str("</ds:Reference>");
    out.push_str("</ds:SignedInfo>");

    out.push_str(EMPTY_SIGNATURE_VALUE);

    out.push_str("<ds:KeyInfo><ds:X509Data>");
    out.push_str(&format!(
        "<ds:X509Certificate>{}</ds:X509Certificate>",
        certificate_text(cert_der)
    ));
    out.push_str("</ds:X509Data></ds:KeyInfo>");

    out.push_str("</ds:Signature>");
    out
}
