//! Stage-boundary datasets: JSON row sets in the output directory.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use storylab_types::TimedSentence;
use tracing::info;

use crate::error::{Result, StoryError};
use crate::lazy::InitOnce;

/// The four intermediate datasets, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dataset {
    Sentences,
    Clean,
    Topic,
    Time,
}

impl Dataset {
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Sentences => "sentences.json",
            Self::Clean => "sentences_clean.json",
            Self::Topic => "sentences_topic.json",
            Self::Time => "sentences_time.json",
        }
    }

    /// The command that produces this dataset.
    pub fn producer(&self) -> &'static str {
        match self {
            Self::Sentences => "extract",
            Self::Clean => "clean",
            Self::Topic => "classify",
            Self::Time => "timeline",
        }
    }

    pub fn path_in(&self, out_dir: &Path) -> PathBuf {
        out_dir.join(self.file_name())
    }
}

/// Overwrite the dataset with `rows`.
pub fn write_rows<T: Serialize>(out_dir: &Path, dataset: Dataset, rows: &[T]) -> Result<()> {
    fs::create_dir_all(out_dir).map_err(|e| StoryError::io(out_dir, e))?;
    let path = dataset.path_in(out_dir);
    let json = serde_json::to_string_pretty(rows).map_err(|e| StoryError::json(&path, e))?;
    fs::write(&path, &json).map_err(|e| StoryError::io(&path, e))?;
    info!(
        "wrote {} rows to {} ({} bytes)",
        rows.len(),
        path.display(),
        json.len()
    );
    Ok(())
}

/// Read a dataset, reporting [`StoryError::MissingInput`] if it was never written.
pub fn read_rows<T: DeserializeOwned>(out_dir: &Path, dataset: Dataset) -> Result<Vec<T>> {
    let path = dataset.path_in(out_dir);
    if !path.exists() {
        return Err(StoryError::MissingInput {
            stage: dataset.producer(),
            path,
        });
    }
    let json = fs::read_to_string(&path).map_err(|e| StoryError::io(&path, e))?;
    serde_json::from_str(&json).map_err(|e| StoryError::json(&path, e))
}

/// The timed dataset, read from disk once and shared afterwards.
pub struct LazyDataset {
    out_dir: PathBuf,
    cell: InitOnce<Vec<TimedSentence>>,
}

impl LazyDataset {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            cell: InitOnce::new(),
        }
    }

    #[cfg(test)]
    pub fn ready(rows: Vec<TimedSentence>) -> Self {
        let dataset = Self::new(PathBuf::new());
        let shared = Arc::new(rows);
        // cannot fail: the initializer is infallible
        let _ = dataset
            .cell
            .get_or_try_init(|| Ok::<_, StoryError>(shared));
        dataset
    }

    pub fn get(&self) -> Result<Arc<Vec<TimedSentence>>> {
        self.cell
            .get_or_try_init(|| read_rows(&self.out_dir, Dataset::Time).map(Arc::new))
    }

    #[cfg(test)]
    pub fn is_loaded(&self) -> bool {
        self.cell.is_initialized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storylab_types::{Phase, SentenceRecord};

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let rows = vec![SentenceRecord::new("a.pdf", 1, "Hello.")];
        write_rows(dir.path(), Dataset::Sentences, &rows).unwrap();
        let back: Vec<SentenceRecord> = read_rows(dir.path(), Dataset::Sentences).unwrap();
        assert_eq!(back, rows);
    }

    #[test]
    fn test_missing_dataset_names_producer() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_rows::<SentenceRecord>(dir.path(), Dataset::Clean).unwrap_err();
        match err {
            StoryError::MissingInput { stage, path } => {
                assert_eq!(stage, "clean");
                assert!(path.ends_with("sentences_clean.json"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_rewrite_overwrites_in_full() {
        let dir = tempfile::tempdir().unwrap();
        let two = vec![
            SentenceRecord::new("a.pdf", 1, "One."),
            SentenceRecord::new("a.pdf", 1, "Two."),
        ];
        write_rows(dir.path(), Dataset::Sentences, &two).unwrap();
        write_rows(dir.path(), Dataset::Sentences, &two[..1]).unwrap();
        let back: Vec<SentenceRecord> = read_rows(dir.path(), Dataset::Sentences).unwrap();
        assert_eq!(back.len(), 1);
    }

    #[test]
    fn test_lazy_dataset_reads_once() {
        let dir = tempfile::tempdir().unwrap();
        let rows = vec![
            SentenceRecord::new("a.pdf", 2, "Wind.")
                .with_topic("Energy")
                .with_phase(Phase::Present),
        ];
        write_rows(dir.path(), Dataset::Time, &rows).unwrap();

        let lazy = LazyDataset::new(dir.path());
        assert!(!lazy.is_loaded());
        assert_eq!(*lazy.get().unwrap(), rows);

        // later writes are not observed: the first load is cached
        write_rows::<TimedSentence>(dir.path(), Dataset::Time, &[]).unwrap();
        assert_eq!(lazy.get().unwrap().len(), 1);
    }

    #[test]
    fn test_lazy_dataset_missing() {
        let dir = tempfile::tempdir().unwrap();
        let lazy = LazyDataset::new(dir.path());
        assert!(matches!(lazy.get(), Err(StoryError::MissingInput { .. })));
    }
}
