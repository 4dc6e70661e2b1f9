//! Stage runners and the driver that chains them.
//!
//! Every stage reads the dataset of the stage before it and overwrites its
//! own. A missing input is reported and the stage is skipped; the driver
//! then carries on with the next requested stage.

use std::fs;
use std::path::{Path, PathBuf};

use storylab_types::{ClassifiedSentence, SentenceRecord, TimedSentence};
use tracing::{error, info, warn};

use crate::classify::TopicTable;
use crate::clean::clean_sentences;
use crate::config::Config;
use crate::dataset::{Dataset, LazyDataset, read_rows, write_rows};
use crate::error::{Result, StoryError};
use crate::extract::extract_documents;
use crate::model::LazyModel;
use crate::scanner::scan_documents;
use crate::story::{Story, StoryTeller};
use crate::timeline::PhaseTagger;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Extract,
    Clean,
    Classify,
    Timeline,
    Story,
}

impl Stage {
    /// Fixed order used by `all`.
    pub const ALL: [Stage; 5] = [
        Stage::Extract,
        Stage::Clean,
        Stage::Classify,
        Stage::Timeline,
        Stage::Story,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Extract => "extract",
            Self::Clean => "clean",
            Self::Classify => "classify",
            Self::Timeline => "timeline",
            Self::Story => "story",
        }
    }
}

pub struct Pipeline {
    config: Config,
    topics: TopicTable,
    tagger: PhaseTagger,
    model: LazyModel,
    dataset: LazyDataset,
}

impl Pipeline {
    /// Pipeline talking to the completion server named in `config`.
    pub fn new(config: Config) -> Self {
        let model = LazyModel::from_config(&config.model);
        Self::with_model(config, model)
    }

    pub fn with_model(config: Config, model: LazyModel) -> Self {
        let tagger = PhaseTagger::new(config.boundary_year);
        let dataset = LazyDataset::new(&config.out_dir);
        Self {
            config,
            topics: TopicTable::default(),
            tagger,
            model,
            dataset,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn teller(&self) -> StoryTeller<'_> {
        StoryTeller::new(&self.model, &self.dataset)
    }

    // ═══════════════════════════════════════════════════════════════════
    //  DRIVER
    // ═══════════════════════════════════════════════════════════════════

    /// Run `stages` in order. Stages whose input is missing are skipped with
    /// a warning; any other failure stops the run.
    pub fn run(&self, stages: &[Stage]) -> Result<()> {
        for &stage in stages {
            match self.run_stage(stage) {
                Ok(count) => info!(stage = stage.name(), count, "stage finished"),
                Err(e @ StoryError::MissingInput { .. }) => {
                    warn!(stage = stage.name(), "skipped: {e}");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Run one stage; returns the number of rows (or stories) written.
    pub fn run_stage(&self, stage: Stage) -> Result<usize> {
        match stage {
            Stage::Extract => self.extract(),
            Stage::Clean => self.clean(),
            Stage::Classify => self.classify(),
            Stage::Timeline => self.timeline(),
            Stage::Story => self.write_stories(&[]),
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    //  STAGES
    // ═══════════════════════════════════════════════════════════════════

    pub fn extract(&self) -> Result<usize> {
        info!("scanning documents in {}", self.config.data_dir.display());
        let docs = scan_documents(&self.config.data_dir);
        info!("found {} documents", docs.len());

        let rows = extract_documents(&docs);
        if rows.is_empty() {
            warn!(
                "no text extracted; check that documents exist in {}",
                self.config.data_dir.display()
            );
        }
        write_rows(&self.config.out_dir, Dataset::Sentences, &rows)?;
        Ok(rows.len())
    }

    pub fn clean(&self) -> Result<usize> {
        let mut rows: Vec<SentenceRecord> = read_rows(&self.config.out_dir, Dataset::Sentences)?;
        clean_sentences(&mut rows);
        write_rows(&self.config.out_dir, Dataset::Clean, &rows)?;
        Ok(rows.len())
    }

    pub fn classify(&self) -> Result<usize> {
        let rows: Vec<SentenceRecord> = read_rows(&self.config.out_dir, Dataset::Clean)?;
        let classified = self.topics.classify_sentences(rows);
        write_rows(&self.config.out_dir, Dataset::Topic, &classified)?;
        Ok(classified.len())
    }

    pub fn timeline(&self) -> Result<usize> {
        let rows: Vec<ClassifiedSentence> = read_rows(&self.config.out_dir, Dataset::Topic)?;
        info!(boundary_year = self.tagger.boundary_year(), "tagging phases");
        let timed: Vec<TimedSentence> = self.tagger.tag_sentences(rows);
        write_rows(&self.config.out_dir, Dataset::Time, &timed)?;
        Ok(timed.len())
    }

    /// Write one story per topic: the given `topics`, or every topic in the
    /// timed dataset when empty. A failing topic does not stop the others.
    pub fn write_stories(&self, topics: &[String]) -> Result<usize> {
        let teller = self.teller();
        let topics = if topics.is_empty() {
            teller.topics()?
        } else {
            topics.to_vec()
        };
        if topics.is_empty() {
            warn!("no topics found; run the previous stages first");
            return Ok(0);
        }

        let mut written = 0;
        let mut failed = Vec::new();
        for topic in &topics {
            info!(%topic, "generating story");
            match teller.story(topic) {
                Ok(story) => {
                    let path = self.save(&self.config.out_dir, &story)?;
                    info!(%topic, chars = story.body.len(), "wrote {}", path.display());
                    written += 1;
                }
                Err(e @ StoryError::MissingInput { .. }) => return Err(e),
                Err(e) => {
                    error!(%topic, "story failed: {e}");
                    failed.push(topic.clone());
                }
            }
        }

        if !failed.is_empty() {
            return Err(StoryError::StoriesFailed { topics: failed });
        }
        info!(
            "{written} stories written to {}",
            self.config.out_dir.display()
        );
        Ok(written)
    }

    /// Write the cross-topic story for `topic_a` and `topic_b`.
    pub fn write_comparison(&self, topic_a: &str, topic_b: &str) -> Result<PathBuf> {
        let story = self.teller().compare(topic_a, topic_b)?;
        let path = self.save(&self.config.compare_dir(), &story)?;
        info!("wrote {}", path.display());
        Ok(path)
    }

    fn save(&self, dir: &Path, story: &Story) -> Result<PathBuf> {
        fs::create_dir_all(dir).map_err(|e| StoryError::io(dir, e))?;
        let path = dir.join(story.file_name());
        fs::write(&path, story.render()).map_err(|e| StoryError::io(&path, e))?;
        Ok(path)
    }
}
