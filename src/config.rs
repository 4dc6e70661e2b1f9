use std::path::PathBuf;
use std::time::Duration;

use crate::timeline::DEFAULT_BOUNDARY_YEAR;

pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_OUT_DIR: &str = "out";
pub const DEFAULT_MODEL_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_MODEL_NAME: &str = "mistral-7b-instruct-v0.2.Q4_K_M";
pub const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 600;

/// Where the completion server lives and how long one HTTP call may take.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub url: String,
    pub name: String,
    pub timeout: Duration,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_MODEL_URL.to_string(),
            name: DEFAULT_MODEL_NAME.to_string(),
            timeout: Duration::from_secs(DEFAULT_MODEL_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the source documents
    pub data_dir: PathBuf,
    /// Directory receiving datasets and stories
    pub out_dir: PathBuf,
    /// Last year counted as Past
    pub boundary_year: u16,
    pub model: ModelConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            out_dir: PathBuf::from(DEFAULT_OUT_DIR),
            boundary_year: DEFAULT_BOUNDARY_YEAR,
            model: ModelConfig::default(),
        }
    }
}

impl Config {
    /// Defaults rooted at `root` instead of the working directory.
    #[cfg(test)]
    pub fn rooted_at(root: &std::path::Path) -> Self {
        Self {
            data_dir: root.join(DEFAULT_DATA_DIR),
            out_dir: root.join(DEFAULT_OUT_DIR),
            ..Self::default()
        }
    }

    pub fn out_path(&self, name: &str) -> PathBuf {
        self.out_dir.join(name)
    }

    /// Cross-topic stories live in their own subdirectory.
    pub fn compare_dir(&self) -> PathBuf {
        self.out_dir.join("compare")
    }
}
