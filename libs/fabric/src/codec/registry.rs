use std::collections::HashMap;
use std::sync::Arc;

use switchboard_core::{Error, Result};

use crate::codec::Codec;

/// Maps negotiated content types to codecs
///
/// Keys are stored lower-cased; lookups ignore case and any parameters after
/// a `;` (such as a charset declaration).
#[derive(Default, Clone)]
pub struct CodecRegistry {
    codecs: HashMap<String, Arc<dyn Codec>>,
}

impl CodecRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `codec` for `content_type`, replacing any previous codec
    pub fn register(&mut self, codec: Arc<dyn Codec>, content_type: &str) {
        self.codecs.insert(content_type.to_lowercase(), codec);
    }

    /// Select the codec for a raw `Content-Type` header value
    ///
    /// A header that is empty once parameters are stripped selects the only
    /// registered codec when exactly one exists; otherwise the media type must
    /// be registered. Whitespace alone does not count as empty.
    pub fn select(&self, content_type: &str) -> Result<Arc<dyn Codec>> {
        let unparameterized = content_type.split(';').next().unwrap_or(content_type);
        let media_type = media_type(content_type);

        if unparameterized.is_empty() && self.codecs.len() == 1 {
            if let Some(codec) = self.codecs.values().next() {
                return Ok(Arc::clone(codec));
            }
        }

        self.codecs
            .get(&media_type.to_lowercase())
            .cloned()
            .ok_or_else(|| Error::UnsupportedMediaType(media_type.to_string()))
    }

    /// Check whether a codec is registered for `content_type`
    pub fn contains(&self, content_type: &str) -> bool {
        self.codecs
            .contains_key(&media_type(content_type).to_lowercase())
    }

    /// Number of registered codecs
    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    /// True if no codec is registered
    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }
}

/// Strip parameters from a header value: `application/json; charset=utf-8`
/// becomes `application/json`.
fn media_type(content_type: &str) -> &str {
    content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
}
