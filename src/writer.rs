use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedFile {
    pub relative_path: String,
    pub content: String,
}

/// Run directory for one invocation: `<root>/%Y/%m/%d/%H/%M`. Minute
/// granularity only, so two runs started in the same minute share a
/// directory and later writes win.
pub fn run_directory(output_root: &Path, now: DateTime<Local>) -> PathBuf {
    now.format("%Y/%m/%d/%H/%M")
        .to_string()
        .split('/')
        .filter(|part| !part.is_empty())
        .fold(output_root.to_path_buf(), |acc, part| acc.join(part))
}

/// Extract every fenced code block whose first content line is a
/// `# <relative/path>` comment. Only that first line is consulted for the
/// path contract; `#` characters later in a block are plain content. Blocks
/// without a path comment are skipped; an unterminated block is dropped.
pub fn extract_code_blocks(response: &str) -> Vec<GeneratedFile> {
    let mut files = Vec::new();
    let mut in_block = false;
    let mut awaiting_path = false;
    let mut path: Option<String> = None;
    let mut buffer: Vec<&str> = Vec::new();

    for line in response.lines() {
        if line.trim_start().starts_with("```") {
            if in_block {
                if let Some(relative_path) = path.take() {
                    files.push(GeneratedFile {
                        relative_path,
                        content: join_block_lines(&buffer),
                    });
                }
                in_block = false;
                buffer.clear();
            } else {
                in_block = true;
                awaiting_path = true;
                path = None;
                buffer.clear();
            }
            continue;
        }

        if !in_block {
            continue;
        }

        if awaiting_path {
            awaiting_path = false;
            match parse_path_comment(line) {
                Some(value) => path = Some(value),
                None => {
                    tracing::warn!("Skipping code block without a leading '# <path>' comment");
                }
            }
            continue;
        }

        if path.is_some() {
            buffer.push(line);
        }
    }

    files
}

/// Write every path-tagged code block beneath the output root, creating
/// parent directories as needed. Returns the written files so the next
/// generation stage can embed their content. A response with no valid
/// blocks writes nothing and is not an error.
pub fn create_files(response: &str, output_root: &Path) -> Result<Vec<GeneratedFile>, String> {
    let blocks = extract_code_blocks(response);
    if blocks.is_empty() {
        tracing::warn!("Model response contained no writable code blocks");
        return Ok(blocks);
    }

    for block in &blocks {
        let destination = resolve_output_file(output_root, &block.relative_path)?;
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).map_err(|error| {
                format!(
                    "Failed to create output directory '{}': {error}",
                    parent.display()
                )
            })?;
        }
        fs::write(&destination, &block.content).map_err(|error| {
            format!(
                "Failed to write generated file '{}': {error}",
                destination.display()
            )
        })?;
        tracing::info!("Wrote {}", destination.display());
    }

    Ok(blocks)
}

fn join_block_lines(lines: &[&str]) -> String {
    if lines.is_empty() {
        return String::new();
    }
    let mut content = lines.join("\n");
    content.push('\n');
    content
}

fn parse_path_comment(line: &str) -> Option<String> {
    let path = line.trim().strip_prefix('#')?.trim();
    if path.is_empty() {
        return None;
    }
    Some(path.to_string())
}

fn resolve_output_file(output_root: &Path, relative_path: &str) -> Result<PathBuf, String> {
    if relative_path.trim().is_empty() {
        return Err("generated file path is empty".to_string());
    }
    if relative_path.contains("..") {
        return Err(format!(
            "generated file path '{relative_path}' cannot contain '..'"
        ));
    }
    if Path::new(relative_path).is_absolute() {
        return Err(format!(
            "generated file path '{relative_path}' must be relative"
        ));
    }

    Ok(relative_path
        .split('/')
        .filter(|part| !part.is_empty())
        .fold(output_root.to_path_buf(), |acc, part| acc.join(part)))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use chrono::TimeZone;
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn writes_each_tagged_block_to_its_declared_path() {
        let output = tempdir().expect("output dir should exist");
        let response = "Here are the files.\n\n```python\n# a/b.py\nprint('b')\n```\n\nAnd the second one:\n\n```python\n# c/d.py\nprint('d')\n```\n";

        let written = create_files(response, output.path()).expect("writing should succeed");

        assert_eq!(written.len(), 2);
        assert_eq!(
            fs::read_to_string(output.path().join("a/b.py")).expect("file should exist"),
            "print('b')\n"
        );
        assert_eq!(
            fs::read_to_string(output.path().join("c/d.py")).expect("file should exist"),
            "print('d')\n"
        );
    }

    #[test]
    fn hash_characters_inside_block_bodies_are_plain_content() {
        let response = "```python\n# app/shop/views.py\ngreeting = \"# not a path\"\n# trailing comment\n```\n";

        let blocks = extract_code_blocks(response);

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].relative_path, "app/shop/views.py");
        assert_eq!(
            blocks[0].content,
            "greeting = \"# not a path\"\n# trailing comment\n"
        );
    }

    #[test]
    fn blocks_without_a_path_comment_are_skipped() {
        let response = "```python\nprint('no destination')\n```\n\n```python\n# kept/file.py\npass\n```\n";

        let blocks = extract_code_blocks(response);

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].relative_path, "kept/file.py");
    }

    #[test]
    fn unterminated_blocks_are_dropped() {
        let response = "```python\n# half/open.py\nprint('never closed')\n";
        assert!(extract_code_blocks(response).is_empty());
    }

    #[test]
    fn responses_without_blocks_write_nothing() {
        let output = tempdir().expect("output dir should exist");
        let written =
            create_files("No code here, sorry.", output.path()).expect("call should succeed");
        assert!(written.is_empty());
    }

    #[test]
    fn traversal_paths_are_refused() {
        let output = tempdir().expect("output dir should exist");
        let response = "```python\n# ../escape.py\npass\n```\n";

        let error = create_files(response, output.path()).expect_err("traversal should fail");
        assert!(error.contains("cannot contain '..'"));
    }

    #[test]
    fn absolute_paths_are_refused() {
        let output = tempdir().expect("output dir should exist");
        let response = "```python\n# /etc/evil.py\npass\n```\n";

        let error = create_files(response, output.path()).expect_err("absolute path should fail");
        assert!(error.contains("must be relative"));
    }

    #[test]
    fn run_directory_has_minute_granularity() {
        let root = Path::new("result");
        let first = Local
            .with_ymd_and_hms(2024, 3, 9, 14, 25, 10)
            .single()
            .expect("timestamp should resolve");
        let same_minute = Local
            .with_ymd_and_hms(2024, 3, 9, 14, 25, 59)
            .single()
            .expect("timestamp should resolve");
        let next_minute = Local
            .with_ymd_and_hms(2024, 3, 9, 14, 26, 0)
            .single()
            .expect("timestamp should resolve");

        assert_eq!(
            run_directory(root, first),
            Path::new("result/2024/03/09/14/25")
        );
        assert_eq!(run_directory(root, first), run_directory(root, same_minute));
        assert_ne!(run_directory(root, first), run_directory(root, next_minute));
    }

    #[test]
    fn same_minute_runs_merge_with_last_write_winning() {
        let output = tempdir().expect("output dir should exist");
        let stamp = Local
            .with_ymd_and_hms(2024, 3, 9, 14, 25, 10)
            .single()
            .expect("timestamp should resolve");
        let run_dir = run_directory(output.path(), stamp);

        create_files("```python\n# app/x.py\nfirst = 1\n```\n", &run_dir)
            .expect("first run should write");
        create_files("```python\n# app/x.py\nsecond = 2\n```\n", &run_dir)
            .expect("second run should write");

        assert_eq!(
            fs::read_to_string(run_dir.join("app/x.py")).expect("file should exist"),
            "second = 2\n"
        );
    }
}
