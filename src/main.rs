use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storyforge::{generate_project, runtime_config, GenerateProjectInput};

#[derive(Parser)]
#[command(name = "storyforge")]
#[command(about = "Generate Django application scaffolding from a task description file")]
struct Cli {
    /// Path to the text file containing the task description
    #[arg(short = 't', long = "task")]
    task: PathBuf,

    /// Path to a reference project directory (repeatable)
    #[arg(short = 'p', long = "path", required = true)]
    paths: Vec<PathBuf>,

    /// Root output directory
    #[arg(short = 'o', long = "output", default_value = "result")]
    output: PathBuf,
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "storyforge=debug".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();
    runtime_config::load_env_files();

    let input = GenerateProjectInput {
        task_file: cli.task,
        reference_paths: cli.paths,
        output_root: cli.output,
    };

    match generate_project(input) {
        Ok(Some(report)) => {
            tracing::info!(
                "Run complete: {} generated files",
                report.first_pair.len() + report.second_pair.len()
            );
            if let Ok(summary) = serde_json::to_string(&report) {
                tracing::debug!("Pipeline report: {summary}");
            }
            ExitCode::SUCCESS
        }
        Ok(None) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!("{error}");
            ExitCode::FAILURE
        }
    }
}
