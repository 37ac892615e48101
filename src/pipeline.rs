use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::llm_adapter::{ChatModel, ChatRequest, ChatResponse};
use crate::prompts;
use crate::vector::{Retriever, ScoredDocument};
use crate::writer::{self, GeneratedFile};

/// Caller-owned conversation memory. The CLI always starts a fresh buffer;
/// the completed turn is recorded so a future multi-turn caller can feed the
/// history back into the rephrase stage.
#[derive(Debug, Clone, Default)]
pub struct ConversationBuffer {
    turns: Vec<ConversationTurn>,
}

#[derive(Debug, Clone)]
pub struct ConversationTurn {
    pub user_story: String,
    pub answer: String,
}

impl ConversationBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, user_story: impl Into<String>, answer: impl Into<String>) {
        self.turns.push(ConversationTurn {
            user_story: user_story.into(),
            answer: answer.into(),
        });
    }

    pub fn history_text(&self) -> String {
        self.turns
            .iter()
            .map(|turn| format!("Human: {}\nAI: {}", turn.user_story, turn.answer))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct PipelineInput {
    pub user_story: String,
    pub run_directory: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineReport {
    pub standalone_story: String,
    pub retrieved: Vec<ScoredDocument>,
    pub first_pair: Vec<GeneratedFile>,
    pub second_pair: Vec<GeneratedFile>,
}

#[derive(Debug, Clone)]
struct GeneratedPair {
    response_text: String,
    files: Vec<GeneratedFile>,
}

/// Run the four generation stages strictly in order: rephrase the story,
/// retrieve grounding documents for it, generate apps.py/models.py, then
/// generate admin.py/filters.py from the freshly written pair. Each stage
/// consumes the previous stage's output; the first error aborts the run and
/// already-written files stay on disk.
pub fn run_pipeline(
    chat: &dyn ChatModel,
    retriever: &dyn Retriever,
    memory: &mut ConversationBuffer,
    input: PipelineInput,
) -> Result<PipelineReport, String> {
    if input.user_story.trim().is_empty() {
        return Err("user story is required".to_string());
    }

    let standalone_story = rephrase_story(chat, memory, &input.user_story)?;
    let retrieved = retrieve_context(retriever, &standalone_story)?;
    let first_pair =
        generate_apps_and_models(chat, &standalone_story, &retrieved, &input.run_directory)?;
    let second_pair = generate_admin_and_filters(chat, &first_pair, &input.run_directory)?;

    memory.record(input.user_story, second_pair.response_text.clone());

    Ok(PipelineReport {
        standalone_story,
        retrieved,
        first_pair: first_pair.files,
        second_pair: second_pair.files,
    })
}

fn rephrase_story(
    chat: &dyn ChatModel,
    memory: &ConversationBuffer,
    user_story: &str,
) -> Result<String, String> {
    tracing::info!("Rephrasing user story into a standalone story");
    let request = ChatRequest {
        system_prompt: prompts::DJANGO_DEVELOPER_SYSTEM_PROMPT.to_string(),
        user_prompt: prompts::rephrase_prompt(user_story, &memory.history_text()),
    };

    let response = chat.generate(&request)?;
    log_token_usage("rephrase", &response);
    Ok(response.text)
}

fn retrieve_context(
    retriever: &dyn Retriever,
    standalone_story: &str,
) -> Result<Vec<ScoredDocument>, String> {
    tracing::info!("Retrieving reference documents for the standalone story");
    let documents = retriever.retrieve(standalone_story)?;
    tracing::debug!("Retrieved {} reference documents", documents.len());
    Ok(documents)
}

fn generate_apps_and_models(
    chat: &dyn ChatModel,
    standalone_story: &str,
    retrieved: &[ScoredDocument],
    run_directory: &Path,
) -> Result<GeneratedPair, String> {
    tracing::info!("Generating apps.py and models.py files");
    let context = prompts::combine_documents(retrieved);
    let request = ChatRequest {
        system_prompt: prompts::DJANGO_DEVELOPER_SYSTEM_PROMPT.to_string(),
        user_prompt: prompts::generate_models_prompt(standalone_story, &context),
    };

    let response = chat.generate(&request)?;
    log_token_usage("generate_models", &response);
    let files = writer::create_files(&response.text, run_directory)?;

    Ok(GeneratedPair {
        response_text: response.text,
        files,
    })
}

fn generate_admin_and_filters(
    chat: &dyn ChatModel,
    first_pair: &GeneratedPair,
    run_directory: &Path,
) -> Result<GeneratedPair, String> {
    tracing::info!("Generating admin.py and filters.py files");
    let written = prompts::format_written_files(&first_pair.files);
    let request = ChatRequest {
        system_prompt: prompts::DJANGO_DEVELOPER_SYSTEM_PROMPT.to_string(),
        user_prompt: prompts::generate_admin_prompt(&written),
    };

    let response = chat.generate(&request)?;
    log_token_usage("generate_admin_filters", &response);
    let files = writer::create_files(&response.text, run_directory)?;

    Ok(GeneratedPair {
        response_text: response.text,
        files,
    })
}

fn log_token_usage(stage: &str, response: &ChatResponse) {
    if let (Some(input), Some(output)) = (response.input_tokens, response.output_tokens) {
        tracing::debug!("{stage} used {input} prompt tokens and {output} completion tokens");
    }
}
