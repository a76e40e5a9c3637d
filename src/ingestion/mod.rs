//! Corpus loading: turning a source directory into in-memory documents.
//!
//! A corpus is a flat directory of UTF-8 text files; one file is one source
//! document, keyed by its file name. Loading is deliberately forgiving:
//! unreadable or non-UTF-8 files are skipped with a warning rather than
//! aborting the build, while a missing directory is a configuration error.

use std::collections::BTreeMap;
use std::path::Path;

use tokio::fs;
use tracing::{debug, warn};

use crate::types::RagError;

/// Documents loaded from a source directory, plus how many files were
/// skipped as unreadable.
#[derive(Clone, Debug, Default)]
pub struct LoadedCorpus {
    /// `source_id → content`, in file-name order.
    pub documents: BTreeMap<String, String>,
    pub skipped: usize,
}

impl LoadedCorpus {
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }
}

/// Loads every regular file in `dir` (flat, non-recursive) as a UTF-8
/// document.
pub async fn load_documents(dir: impl AsRef<Path>) -> Result<LoadedCorpus, RagError> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(RagError::Config(format!(
            "source directory {} does not exist",
            dir.display()
        )));
    }

    let mut corpus = LoadedCorpus::default();
    let mut entries = fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        let path = entry.path();
        let source_id = entry.file_name().to_string_lossy().into_owned();
        match fs::read_to_string(&path).await {
            Ok(content) => {
                corpus.documents.insert(source_id, content);
            }
            Err(err) => {
                warn!(file = %path.display(), error = %err, "skipping unreadable document");
                corpus.skipped += 1;
            }
        }
    }

    debug!(
        dir = %dir.display(),
        documents = corpus.documents.len(),
        skipped = corpus.skipped,
        "loaded corpus"
    );
    Ok(corpus)
}
