//! Support-document corpus loading.

use std::path::Path;

use tracing::{debug, warn};

use helpdesk_core::error::HelpdeskError;

/// A raw source document, identified by its file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub name: String,
    pub text: String,
}

impl Document {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

/// Read every regular file in `dir`, ordered by file name.
///
/// A missing directory is an empty corpus. Files that are not valid UTF-8
/// are skipped with a warning; subdirectories are ignored.
pub fn load_documents(dir: &Path) -> Result<Vec<Document>, HelpdeskError> {
    if !dir.is_dir() {
        debug!(path = %dir.display(), "Documents directory not found; corpus is empty");
        return Ok(Vec::new());
    }

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    let mut docs = Vec::with_capacity(paths.len());
    for path in paths {
        let name = match path.file_name() {
            Some(n) => n.to_string_lossy().to_string(),
            None => continue,
        };
        match std::fs::read_to_string(&path) {
            Ok(text) => docs.push(Document { name, text }),
            Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable document"),
        }
    }

    Ok(docs)
}
