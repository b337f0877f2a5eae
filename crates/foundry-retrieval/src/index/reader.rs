use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::Value;
use tantivy::{Index, IndexReader, ReloadPolicy, TantivyDocument};

use foundry_core::capability::{CallOptions, CapabilityError, Retriever};
use foundry_core::model::Document;

use super::schema::KnowledgeSchema;
use crate::error::RetrievalError;

#[derive(Debug, Clone)]
pub struct ScoredDocument {
    pub document: Document,
    pub score: f32,
}

/// Full-text retriever over an existing index. Never writes to it.
#[derive(Clone)]
pub struct KnowledgeRetriever {
    index: Index,
    reader: IndexReader,
    content: tantivy::schema::Field,
    source: tantivy::schema::Field,
    metadata_json: tantivy::schema::Field,
}

impl KnowledgeRetriever {
    pub fn open(path: &Path) -> Result<Self, RetrievalError> {
        if !path.join("meta.json").exists() {
            return Err(RetrievalError::Missing(path.display().to_string()));
        }
        let index = Index::open_in_dir(path)?;
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::OnCommitWithDelay)
            .try_into()?;
        let schema = KnowledgeSchema::new();
        tracing::debug!(path = %path.display(), "Opened knowledge index");
        Ok(Self {
            index,
            reader,
            content: schema.content,
            source: schema.source,
            metadata_json: schema.metadata_json,
        })
    }

    /// Up to `limit` documents for a free-text query, best match first.
    pub fn search(&self, query_str: &str, limit: usize) -> Result<Vec<ScoredDocument>, RetrievalError> {
        if query_str.trim().is_empty() || limit == 0 {
            return Ok(Vec::new());
        }
        let searcher = self.reader.searcher();
        let query_parser = QueryParser::for_index(&self.index, vec![self.content]);

        // User questions contain arbitrary punctuation; keep whatever parses
        let (query, errors) = query_parser.parse_query_lenient(query_str);
        if !errors.is_empty() {
            tracing::debug!(errors = errors.len(), "Ignored unparsable query fragments");
        }

        let top_docs = searcher.search(&query, &TopDocs::with_limit(limit))?;

        let mut results = Vec::with_capacity(top_docs.len());
        for (score, address) in top_docs {
            let doc: TantivyDocument = searcher.doc(address)?;
            results.push(ScoredDocument {
                document: self.to_document(&doc),
                score,
            });
        }
        Ok(results)
    }

    fn to_document(&self, doc: &TantivyDocument) -> Document {
        let text = |field| {
            doc.get_first(field)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string()
        };
        let metadata_json = text(self.metadata_json);
        let metadata = if metadata_json.is_empty() {
            BTreeMap::new()
        } else {
            serde_json::from_str::<BTreeMap<String, String>>(&metadata_json).unwrap_or_else(|e| {
                tracing::debug!(error = %e, "Skipping undecodable document metadata");
                BTreeMap::new()
            })
        };

        let mut document = Document::new(text(self.content), text(self.source));
        document.metadata = metadata;
        document
    }
}

#[async_trait]
impl Retriever for KnowledgeRetriever {
    async fn top_k(
        &self,
        query: &str,
        k: usize,
        _options: &CallOptions,
    ) -> Result<Vec<Document>, CapabilityError> {
        let this = self.clone();
        let query = query.to_string();
        let found = tokio::task::spawn_blocking(move || this.search(&query, k))
            .await
            .map_err(|e| CapabilityError::Index(format!("search task failed: {e}")))??;
        Ok(found.into_iter().map(|hit| hit.document).collect())
    }
}
