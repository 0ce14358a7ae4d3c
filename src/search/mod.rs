pub mod azure;
pub mod vector;

pub use azure::AzureSearchStore;
pub use vector::VectorStore;

use std::collections::BTreeMap;

use crate::models::DocumentSummary;

/// Fields of a stored chunk needed to summarise its document.
pub(crate) struct ChunkFacts<'a> {
    pub document_id: &'a str,
    pub filename: &'a str,
    pub person_name: &'a str,
    pub upload_date: &'a str,
    pub size_bytes: u64,
    pub blob_name: Option<&'a str>,
}

/// Group chunks by document id, one summary per document.
pub(crate) fn summarize<'a>(
    chunks: impl IntoIterator<Item = ChunkFacts<'a>>,
) -> Vec<DocumentSummary> {
    let mut docs: BTreeMap<&str, DocumentSummary> = BTreeMap::new();
    for c in chunks {
        if c.document_id.is_empty() {
            continue;
        }
        docs.entry(c.document_id)
            .and_modify(|d| d.chunk_count += 1)
            .or_insert_with(|| DocumentSummary {
                document_id: c.document_id.to_string(),
                filename: c.filename.to_string(),
                person_name: c.person_name.to_string(),
                upload_date: c.upload_date.to_string(),
                size_bytes: c.size_bytes,
                chunk_count: 1,
                blob_name: c.blob_name.map(str::to_string),
            });
    }
    docs.into_values().collect()
}
