use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use crate::vector::embedding::Embedder;
use crate::vector::{ReferenceDocument, ReferenceIndex};

/// Embed every Django source file found under the reference roots into an
/// in-memory similarity index. One embedding call per document; an empty
/// reference list yields an empty index whose retriever returns no results.
pub fn build_index(
    reference_paths: &[PathBuf],
    embedder: Box<dyn Embedder>,
    top_k: usize,
) -> Result<ReferenceIndex, String> {
    let mut documents = Vec::new();

    for root in reference_paths {
        for file in collect_django_files(root)? {
            let content = match fs::read_to_string(&file) {
                Ok(data) => data,
                Err(_) => continue,
            };
            if content.trim().is_empty() {
                continue;
            }

            let vector = embedder.embed(&content)?;
            documents.push(ReferenceDocument {
                source_path: to_posix_relative(root, &file)?,
                content,
                vector,
            });
        }
    }

    tracing::debug!("Reference index built with {} documents", documents.len());

    Ok(ReferenceIndex {
        embedder,
        documents,
        top_k,
    })
}

fn collect_django_files(root: &Path) -> Result<Vec<PathBuf>, String> {
    let mut queue = VecDeque::from([root.to_path_buf()]);
    let mut files = Vec::new();

    while let Some(current_dir) = queue.pop_front() {
        let entries = fs::read_dir(&current_dir).map_err(|error| {
            format!(
                "Failed to read reference directory '{}': {error}",
                current_dir.display()
            )
        })?;

        for entry in entries {
            let entry =
                entry.map_err(|error| format!("Failed to read directory entry: {error}"))?;
            let path = entry.path();
            let file_type = entry
                .file_type()
                .map_err(|error| format!("Failed to inspect '{}': {error}", path.display()))?;

            if file_type.is_dir() {
                let name = entry.file_name().to_string_lossy().to_string();
                if should_skip_dir(&name) {
                    continue;
                }
                queue.push_back(path);
                continue;
            }

            if file_type.is_file() && is_django_source(&path) {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}

fn should_skip_dir(name: &str) -> bool {
    matches!(
        name,
        ".git" | "__pycache__" | "venv" | ".venv" | "node_modules" | "migrations" | "static"
            | "media"
    )
}

fn is_django_source(path: &Path) -> bool {
    matches!(path.extension().and_then(|value| value.to_str()), Some("py"))
}

fn to_posix_relative(root: &Path, file: &Path) -> Result<String, String> {
    let relative = file.strip_prefix(root).map_err(|error| {
        format!(
            "Failed to compute relative path for '{}': {error}",
            file.display()
        )
    })?;

    Ok(relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy().to_string())
        .collect::<Vec<_>>()
        .join("/"))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use crate::vector::embedding::HashEmbedder;
    use crate::vector::Retriever;

    use super::*;

    #[test]
    fn indexes_python_sources_and_skips_noise_dirs() {
        let project = tempdir().expect("project temp dir should exist");
        let app_dir = project.path().join("shop");
        fs::create_dir_all(app_dir.join("__pycache__")).expect("fixture dirs should be created");
        fs::create_dir_all(app_dir.join("migrations")).expect("fixture dirs should be created");
        fs::write(
            app_dir.join("models.py"),
            "from django.db import models\n\nclass Product(models.Model):\n    name = models.CharField(max_length=120)\n",
        )
        .expect("fixture should be written");
        fs::write(app_dir.join("__pycache__").join("models.py"), "cached\n")
            .expect("fixture should be written");
        fs::write(app_dir.join("migrations").join("0001_initial.py"), "noise\n")
            .expect("fixture should be written");
        fs::write(project.path().join("README.md"), "docs\n")
            .expect("fixture should be written");

        let index = build_index(
            &[project.path().to_path_buf()],
            Box::new(HashEmbedder),
            2,
        )
        .expect("indexing should succeed");

        assert_eq!(index.document_count(), 1);

        let results = index
            .retrieve("django model with a product name field")
            .expect("retrieve should succeed");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source_path, "shop/models.py");
    }

    #[test]
    fn empty_reference_list_builds_an_empty_index() {
        let index =
            build_index(&[], Box::new(HashEmbedder), 2).expect("empty index should build");

        assert_eq!(index.document_count(), 0);
        let results = index
            .retrieve("anything at all")
            .expect("retrieve should succeed");
        assert!(results.is_empty());
    }

    #[test]
    fn missing_reference_root_propagates_a_filesystem_error() {
        let missing = PathBuf::from("/definitely/not/a/real/reference/root");
        let error = build_index(&[missing], Box::new(HashEmbedder), 2)
            .expect_err("missing root should fail");
        assert!(error.contains("Failed to read reference directory"));
    }
}
