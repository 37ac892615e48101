//! Prompt templates for the generation pipeline. Placeholders are written as
//! `{name}` and filled in by the render helpers below.

use crate::vector::ScoredDocument;
use crate::writer::GeneratedFile;

pub const DJANGO_DEVELOPER_SYSTEM_PROMPT: &str = "You are a Python Django senior developer. \
    You know how to write the code that belongs in each Django file.";

pub const REPHRASE_PROMPT_TEMPLATE: &str = r##"Rephrase the follow up user story to be a standalone user story, in its original language.

Conversation so far:
{chat_history}

Follow Up Input: {user_story}
Standalone user story:"##;

pub const GENERATE_APPS_AND_MODELS_TEMPLATE: &str = r##"This is how to write Python Django apps:
{context}

Remember: always give the code in a "```python" markdown block.
Code must be in English - always!
Every "```python" block must start with a "# <path/to/file.py>" line.
The root folder of the application is "app"; all other app folders you may name on your own.
Create two files per app, "apps.py" and "models.py", based only on the following user story:

User Story:
{user_story}"##;

pub const GENERATE_ADMIN_AND_FILTERS_TEMPLATE: &str = r##"Given the existing Django app files `apps.py` and `models.py`, generate the corresponding `admin.py` and `filters.py` files.

Every file below starts with a comment naming its path, for example: # app/catalog/models.py
Here are the apps.py and models.py contents:
{first_pair}

Generate admin.py and filters.py files for all classes in all models.py files.
Remember: always give the code in a "```python" markdown block.
Every "```python" block must start with a "# <path/to/file.py>" line."##;

pub fn rephrase_prompt(user_story: &str, chat_history: &str) -> String {
    REPHRASE_PROMPT_TEMPLATE
        .replace("{chat_history}", chat_history)
        .replace("{user_story}", user_story)
}

pub fn generate_models_prompt(user_story: &str, context: &str) -> String {
    GENERATE_APPS_AND_MODELS_TEMPLATE
        .replace("{context}", context)
        .replace("{user_story}", user_story)
}

pub fn generate_admin_prompt(first_pair: &str) -> String {
    GENERATE_ADMIN_AND_FILTERS_TEMPLATE.replace("{first_pair}", first_pair)
}

/// Retrieved page contents joined by a blank line, in retrieval order.
pub fn combine_documents(documents: &[ScoredDocument]) -> String {
    documents
        .iter()
        .map(|document| document.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Written files rendered back into prompt form: each file's content preceded
/// by the `# <path>` comment the writer stripped when persisting it.
pub fn format_written_files(files: &[GeneratedFile]) -> String {
    files
        .iter()
        .map(|file| format!("# {}\n{}", file.relative_path, file.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}
