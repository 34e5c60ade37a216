#![forbid(unsafe_code)]

//! Enveloped signature transform.
//!
//! Removes `<ds:Signature>` subtrees from the node set so an already
//! signed document can be digested as if the signature were absent.

use crate::pipeline::{Transform, TransformData};
use firma_core::{algorithm, ns, Error};
use firma_xml::{document, NodeSet};

/// The enveloped signature transform — removes every `Signature` element
/// in the XML-DSig namespace, together with its descendants, from the
/// node set.
pub struct EnvelopedSignatureTransform;

impl EnvelopedSignatureTransform {
    pub fn new() -> Self {
        Self
    }
}

impl Default for EnvelopedSignatureTransform {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform for EnvelopedSignatureTransform {
    fn uri(&self) -> &str {
        algorithm::ENVELOPED_SIGNATURE
    }

    fn execute(&self, input: TransformData) -> Result<TransformData, Error> {
        match input {
            TransformData::Xml { xml_text, node_set } => {
                let doc =
                    roxmltree::Document::parse_with_options(&xml_text, firma_xml::parsing_options())
                        .map_err(|e| Error::XmlParse(e.to_string()))?;

                let mut set = node_set.unwrap_or_else(|| NodeSet::all_without_comments(&doc));
                for node in document::find_elements(&doc, ns::DSIG, ns::node::SIGNATURE) {
                    if set.contains(&node) {
                        set.remove_subtree(node);
                    }
                }

                Ok(TransformData::Xml {
                    xml_text,
                    node_set: Some(set),
                })
            }
            TransformData::Binary(_) => Err(Error::Signing(
                "enveloped-signature transform requires XML input".into(),
            )),
        }
    }
}
