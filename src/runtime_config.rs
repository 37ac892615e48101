pub const OPENAI_API_KEY_VAR: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone)]
pub struct RuntimeFlags {
    pub chat_model: String,
    pub embedding_model: String,
    pub local_embeddings: bool,
    pub retrieval_top_k: usize,
    pub request_timeout_secs: u64,
}

impl RuntimeFlags {
    pub fn from_env() -> Self {
        Self {
            chat_model: env_string("STORYFORGE_CHAT_MODEL", "gpt-4o-mini"),
            embedding_model: env_string("STORYFORGE_EMBEDDING_MODEL", "text-embedding-3-small"),
            local_embeddings: env_bool("STORYFORGE_LOCAL_EMBEDDINGS", false),
            retrieval_top_k: env_usize("STORYFORGE_RETRIEVAL_TOP_K", 2, 1, 10),
            request_timeout_secs: env_u64("STORYFORGE_REQUEST_TIMEOUT_SECS", 60, 5, 600),
        }
    }
}

pub fn load_env_files() {
    let _ = dotenvy::from_path(".env");
    let _ = dotenvy::from_path(".env.local");
}

pub fn required_api_key() -> Result<String, String> {
    std::env::var(OPENAI_API_KEY_VAR)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| format!("{OPENAI_API_KEY_VAR} is required to call the OpenAI API"))
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|value| {
            matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            )
        })
        .unwrap_or(default)
}

fn env_usize(key: &str, default: usize, min: usize, max: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<usize>().ok())
        .map(|value| value.clamp(min, max))
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64, min: u64, max: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(|value| value.clamp(min, max))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_env_applies_defaults_and_clamps() {
        std::env::remove_var("STORYFORGE_CHAT_MODEL");
        std::env::remove_var("STORYFORGE_EMBEDDING_MODEL");
        std::env::remove_var("STORYFORGE_LOCAL_EMBEDDINGS");
        std::env::remove_var("STORYFORGE_REQUEST_TIMEOUT_SECS");
        std::env::set_var("STORYFORGE_RETRIEVAL_TOP_K", "99");

        let flags = RuntimeFlags::from_env();

        assert_eq!(flags.chat_model, "gpt-4o-mini");
        assert_eq!(flags.embedding_model, "text-embedding-3-small");
        assert!(!flags.local_embeddings);
        assert_eq!(flags.retrieval_top_k, 10);
        assert_eq!(flags.request_timeout_secs, 60);

        std::env::remove_var("STORYFORGE_RETRIEVAL_TOP_K");
    }
}
