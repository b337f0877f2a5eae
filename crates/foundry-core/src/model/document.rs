use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A retrieved passage. Rank is implied by its position in the result list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub content: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl Document {
    pub fn new(content: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            source: source.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// Short label for citations: the file name for PDFs, the host for URLs.
    pub fn display_source(&self) -> String {
        let source = self.source.trim();
        if source.to_ascii_lowercase().ends_with(".pdf") {
            return source
                .rsplit(['/', '\\'])
                .next()
                .unwrap_or(source)
                .to_string();
        }
        if let Some((_, rest)) = source.split_once("://") {
            let host = rest.split(['/', '?', '#']).next().unwrap_or(rest);
            return host.strip_prefix("www.").unwrap_or(host).to_string();
        }
        if source.is_empty() {
            return "Unknown".to_string();
        }
        source.to_string()
    }
}

/// Joins document contents with blank lines, preserving rank order.
pub fn context_block(documents: &[Document]) -> String {
    documents
        .iter()
        .map(|d| d.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}
