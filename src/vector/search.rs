use std::cmp::Ordering;

use crate::vector::{ReferenceIndex, Retriever, ScoredDocument};

impl Retriever for ReferenceIndex {
    fn retrieve(&self, query: &str) -> Result<Vec<ScoredDocument>, String> {
        if query.trim().is_empty() {
            return Err("query is required".to_string());
        }
        if self.documents.is_empty() {
            return Ok(Vec::new());
        }

        let query_vector = self.embedder.embed(query)?;

        let mut scored = self
            .documents
            .iter()
            .map(|document| ScoredDocument {
                source_path: document.source_path.clone(),
                content: document.content.clone(),
                score: cosine_similarity(&query_vector, &document.vector),
            })
            .collect::<Vec<_>>();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        scored.truncate(self.top_k.max(1));

        Ok(scored)
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let dot = a.iter().zip(b).map(|(x, y)| x * y).sum::<f32>();
    let a_norm = a.iter().map(|value| value * value).sum::<f32>().sqrt();
    let b_norm = b.iter().map(|value| value * value).sum::<f32>().sqrt();

    if a_norm == 0.0 || b_norm == 0.0 {
        return 0.0;
    }

    dot / (a_norm * b_norm)
}
