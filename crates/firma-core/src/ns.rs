#![forbid(unsafe_code)]

//! XML namespace and name constants used across the library.

/// XML Digital Signature namespace
pub const DSIG: &str = "http://www.w3.org/2000/09/xmldsig#";

/// XML namespace
pub const XML: &str = "http://www.w3.org/XML/1998/namespace";

/// `Id` value placed on the emitted `ds:Signature` element
pub const SIGNATURE_ID: &str = "SignatureSP";

// ── Element names ────────────────────────────────────────────────────

pub mod node {
    // DSig elements
    pub const SIGNATURE: &str = "Signature";
    pub const SIGNED_INFO: &str = "SignedInfo";

    // UBL anchor elements
    pub const INVOICE: &str = "Invoice";
    pub const EXTENSION_CONTENT: &str = "ExtensionContent";
}

// ── Attribute names ──────────────────────────────────────────────────

pub mod attr {
    pub const ID: &str = "Id";
}
