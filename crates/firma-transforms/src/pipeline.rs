#![forbid(unsafe_code)]

//! Transform pipeline and trait definitions.

use firma_core::Error;
use firma_xml::NodeSet;

/// Data flowing through the transform pipeline.
pub enum TransformData {
    /// XML node set (for XML-aware transforms like C14N).
    Xml {
        xml_text: String,
        node_set: Option<NodeSet>,
    },
    /// Raw binary data.
    Binary(Vec<u8>),
}

impl TransformData {
    /// Convert to binary (applying C14N if needed).
    pub fn to_binary(&self) -> Result<Vec<u8>, Error> {
        match self {
            TransformData::Binary(data) => Ok(data.clone()),
            TransformData::Xml { xml_text, node_set } => {
                // Default: inclusive C14N without comments
                firma_c14n::canonicalize(xml_text, firma_c14n::C14nMode::Inclusive, node_set.as_ref())
            }
        }
    }
}

/// Trait for individual transforms.
pub trait Transform: Send {
    /// The algorithm URI for this transform.
    fn uri(&self) -> &str;

    /// Execute the transform on the given data.
    fn execute(&self, input: TransformData) -> Result<TransformData, Error>;
}

/// A pipeline of transforms executed in sequence.
pub struct TransformPipeline {
    transforms: Vec<Box<dyn Transform>>,
}

impl TransformPipeline {
    /// Create an empty pipeline.
    pub fn new() -> Self {
        Self {
            transforms: Vec::new(),
        }
    }

    /// Add a transform to the pipeline.
    pub fn push(&mut self, transform: Box<dyn Transform>) {
        self.transforms.push(transform);
    }

    /// Execute all transforms in order.
    pub fn execute(&self, input: TransformData) -> Result<TransformData, Error> {
        let mut data = input;
        for transform in &self.transforms {
            data = transform.execute(data)?;
        }
        Ok(data)
    }

}

impl Default for TransformPipeline {
    fn default() -> Self {
        Self::new()
    }
}

// ── C14N Transform ───────────────────────────────────────────────────

/// A canonicalization transform.
pub struct C14nTransform {
    mode: firma_c14n::C14nMode,
}

impl C14nTransform {
    pub fn new(mode: firma_c14n::C14nMode) -> Self {
        Self { mode }
    }
}

impl Transform for C14nTransform {
    fn uri(&self) -> &str {
        self.mode.uri()
    }

    fn execute(&self, input: TransformData) -> Result<TransformData, Error> {
        match input {
            TransformData::Xml { xml_text, node_set } => {
                let bytes = firma_c14n::canonicalize(&xml_text, self.mode, node_set.as_ref())?;
                Ok(TransformData::Binary(bytes))
            }
            TransformData::Binary(data) => {
                let text = std::str::from_utf8(&data)
                    .map_err(|e| Error::Signing(format!("invalid UTF-8: {e}")))?;
                let bytes = firma_c14n::canonicalize(text, self.mode, None)?;
                Ok(TransformData::Binary(bytes))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_c14n_transform_produces_binary() {
        let transform = C14nTransform::new(firma_c14n::C14nMode::Inclusive);
        let out = transform
            .execute(TransformData::Xml {
                xml_text: "<a  b='1'/>".to_owned(),
                node_set: None,
            })
            .unwrap();
        match out {
            TransformData::Binary(bytes) => {
                assert_eq!(bytes, br#"<a b="1"></a>"#);
            }
            TransformData::Xml { .. } => panic!("expected binary output"),
        }
    }

    #[test]
    fn test_pipeline_runs_in_order() {
        let mut pipeline = TransformPipeline::new();
        pipeline.push(Box::new(C14nTransform::new(
            firma_c14n::C14nMode::Inclusive,
        )));
        let out = pipeline
            .execute(TransformData::Xml {
                xml_text: "<a/>".to_owned(),
                node_set: None,
            })
            .unwrap();
        assert_eq!(out.to_binary().unwrap(), b"<a></a>");
    }
}
