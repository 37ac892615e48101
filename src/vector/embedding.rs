use std::time::Duration;

use serde_json::{json, Value};
use sha2::{Digest, Sha256};

use crate::runtime_config::{self, RuntimeFlags};

pub const HASH_VECTOR_DIM: usize = 256;

pub trait Embedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, String>;
}

pub fn embedder_from_flags(flags: &RuntimeFlags) -> Result<Box<dyn Embedder>, String> {
    if flags.local_embeddings {
        return Ok(Box::new(HashEmbedder));
    }

    Ok(Box::new(OpenAiEmbedder::from_flags(flags)?))
}

/// Remote embedder backed by the OpenAI embeddings endpoint. One blocking
/// request per document, no retry; any API failure propagates to the caller.
pub struct OpenAiEmbedder {
    api_key: String,
    model: String,
    timeout: Duration,
}

impl OpenAiEmbedder {
    pub fn from_flags(flags: &RuntimeFlags) -> Result<Self, String> {
        Ok(Self {
            api_key: runtime_config::required_api_key()?,
            model: flags.embedding_model.clone(),
            timeout: Duration::from_secs(flags.request_timeout_secs),
        })
    }
}

impl Embedder for OpenAiEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, String> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|error| format!("Failed to build embedding HTTP client: {error}"))?;

        let body = json!({
            "model": self.model,
            "input": text
        });
        let response = client
            .post("https://api.openai.com/v1/embeddings")
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|error| format!("Failed to call embedding API: {error}"))?;

        let status = response.status();
        let payload: Value = response
            .json()
            .map_err(|error| format!("Invalid embedding response payload: {error}"))?;
        if !status.is_success() {
            return Err(format!(
                "Embedding API failed with status {status}: {payload}"
            ));
        }

        extract_embedding(&payload)
    }
}

fn extract_embedding(payload: &Value) -> Result<Vec<f32>, String> {
    payload
        .get("data")
        .and_then(Value::as_array)
        .and_then(|data| data.first())
        .and_then(|entry| entry.get("embedding"))
        .and_then(Value::as_array)
        .map(|values| {
            values
                .iter()
                .map(|value| value.as_f64().unwrap_or(0.0) as f32)
                .collect::<Vec<_>>()
        })
        .filter(|vector| !vector.is_empty())
        .ok_or_else(|| format!("Embedding response did not include a vector: {payload}"))
}

/// Deterministic token-hash embedder. Tokens are hashed into a fixed-size
/// signed bucket vector which is then L2-normalized, so identical text always
/// produces the identical vector. Used for offline runs and in tests.
pub struct HashEmbedder;

impl Embedder for HashEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, String> {
        let mut vector = vec![0.0_f32; HASH_VECTOR_DIM];

        for token in text
            .split(|ch: char| !ch.is_alphanumeric() && ch != '_')
            .filter(|token| token.len() >= 3)
        {
            let token = token.to_ascii_lowercase();
            let digest = Sha256::digest(token.as_bytes());
            let idx = u16::from_le_bytes([digest[0], digest[1]]) as usize % HASH_VECTOR_DIM;
            let sign = if digest[2] % 2 == 0 { 1.0 } else { -1.0 };
            vector[idx] += sign;
        }

        let norm = vector.iter().map(|value| value * value).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }

        Ok(vector)
    }
}
