pub mod llm_adapter;
pub mod pipeline;
pub mod prompts;
pub mod runtime_config;
pub mod vector;
pub mod writer;

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use chrono::Local;

use llm_adapter::OpenAiChatModel;
use pipeline::{ConversationBuffer, PipelineInput, PipelineReport};
use runtime_config::RuntimeFlags;
use vector::embedding;

#[derive(Debug, Clone)]
pub struct GenerateProjectInput {
    pub task_file: PathBuf,
    pub reference_paths: Vec<PathBuf>,
    pub output_root: PathBuf,
}

/// End-to-end run: read the task description, index the reference projects,
/// then drive the four-stage generation pipeline. A missing task file is the
/// one clean-abort path and returns `Ok(None)` after logging; every other
/// failure propagates to the caller.
pub fn generate_project(input: GenerateProjectInput) -> Result<Option<PipelineReport>, String> {
    let user_story = match fs::read_to_string(&input.task_file) {
        Ok(value) => value,
        Err(error) if error.kind() == ErrorKind::NotFound => {
            tracing::error!("Task file not found: {}", input.task_file.display());
            return Ok(None);
        }
        Err(error) => {
            return Err(format!(
                "Failed to read task file '{}': {error}",
                input.task_file.display()
            ));
        }
    };

    let flags = RuntimeFlags::from_env();
    tracing::debug!(
        "Runtime flags: chat_model={} embedding_model={} local_embeddings={} top_k={}",
        flags.chat_model,
        flags.embedding_model,
        flags.local_embeddings,
        flags.retrieval_top_k
    );

    let embedder = embedding::embedder_from_flags(&flags)?;
    let index = vector::indexer::build_index(&input.reference_paths, embedder, flags.retrieval_top_k)?;
    let chat = OpenAiChatModel::from_flags(&flags)?;

    let run_directory = writer::run_directory(&input.output_root, Local::now());
    tracing::info!("Writing generated files under {}", run_directory.display());

    let mut memory = ConversationBuffer::new();
    let report = pipeline::run_pipeline(
        &chat,
        &index,
        &mut memory,
        PipelineInput {
            user_story,
            run_directory,
        },
    )?;

    Ok(Some(report))
}
