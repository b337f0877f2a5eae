use tantivy::schema::*;

/// Field handles for the knowledge index.
///
/// `metadata_json` holds a flat JSON object of string values.
pub struct KnowledgeSchema {
    pub schema: Schema,
    pub content: Field,
    pub source: Field,
    pub metadata_json: Field,
}

impl KnowledgeSchema {
    pub fn new() -> Self {
        let mut builder = Schema::builder();

        let content = builder.add_text_field("content", TEXT | STORED);
        let source = builder.add_text_field("source", STRING | STORED);
        let metadata_json = builder.add_text_field("metadata_json", STORED);

        Self {
            schema: builder.build(),
            content,
            source,
            metadata_json,
        }
    }
}

impl Default for KnowledgeSchema {
    fn default() -> Self {
        Self::new()
    }
}
