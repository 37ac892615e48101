pub mod embedding;
pub mod indexer;
pub mod search;

use serde::Serialize;

use self::embedding::Embedder;

#[derive(Debug, Clone)]
pub struct ReferenceDocument {
    pub source_path: String,
    pub content: String,
    pub vector: Vec<f32>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredDocument {
    pub source_path: String,
    pub content: String,
    pub score: f32,
}

/// The only capability the pipeline depends on: the top-K most similar
/// reference documents for a query, ordered by descending score.
pub trait Retriever {
    fn retrieve(&self, query: &str) -> Result<Vec<ScoredDocument>, String>;
}

/// In-memory similarity index over the reference corpus. Rebuilt from
/// scratch on every invocation; nothing is persisted across runs.
pub struct ReferenceIndex {
    embedder: Box<dyn Embedder>,
    documents: Vec<ReferenceDocument>,
    top_k: usize,
}

impl std::fmt::Debug for ReferenceIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReferenceIndex")
            .field("documents", &self.documents.len())
            .field("top_k", &self.top_k)
            .finish()
    }
}

impl ReferenceIndex {
    pub fn document_count(&self) -> usize {
        self.documents.len()
    }
}
