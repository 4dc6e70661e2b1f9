mod classify;
mod clean;
mod config;
mod dataset;
mod error;
mod extract;
mod lazy;
mod model;
mod narrative;
mod overlap;
mod pipeline;
mod scanner;
mod story;
mod timeline;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use classify::{FALLBACK_TOPIC, TopicTable};
use config::{
    Config, DEFAULT_DATA_DIR, DEFAULT_MODEL_NAME, DEFAULT_MODEL_TIMEOUT_SECS, DEFAULT_MODEL_URL,
    DEFAULT_OUT_DIR, ModelConfig,
};
use error::StoryError;
use narrative::{NarrativeSections, find_comparison, split_story, strip_references};
use pipeline::{Pipeline, Stage};
use timeline::DEFAULT_BOUNDARY_YEAR;

#[derive(Parser)]
#[command(
    name = "storylab",
    about = "Report sentences → topics → Past/Present/Future stories with citations"
)]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Args)]
struct Settings {
    /// Directory with the source documents (*.pdf, form-feed paged *.txt)
    #[arg(long, global = true, env = "STORYLAB_DATA_DIR", default_value = DEFAULT_DATA_DIR)]
    data_dir: PathBuf,

    /// Directory for datasets and stories
    #[arg(long, global = true, env = "STORYLAB_OUT_DIR", default_value = DEFAULT_OUT_DIR)]
    out_dir: PathBuf,

    /// Last year counted as Past; the two following years are Present
    #[arg(long, global = true, env = "STORYLAB_BOUNDARY_YEAR", default_value_t = DEFAULT_BOUNDARY_YEAR)]
    boundary_year: u16,

    /// Base URL of an OpenAI-compatible completion server
    #[arg(long, global = true, env = "STORYLAB_MODEL_URL", default_value = DEFAULT_MODEL_URL)]
    model_url: String,

    /// Model name sent with every completion request
    #[arg(long, global = true, env = "STORYLAB_MODEL", default_value = DEFAULT_MODEL_NAME)]
    model_name: String,

    /// HTTP timeout for one model call, in seconds
    #[arg(long, global = true, env = "STORYLAB_MODEL_TIMEOUT", default_value_t = DEFAULT_MODEL_TIMEOUT_SECS)]
    model_timeout_secs: u64,
}

impl Settings {
    fn into_config(self) -> Config {
        Config {
            data_dir: self.data_dir,
            out_dir: self.out_dir,
            boundary_year: self.boundary_year,
            model: ModelConfig {
                url: self.model_url,
                name: self.model_name,
                timeout: Duration::from_secs(self.model_timeout_secs),
            },
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Pull sentences out of every document → sentences.json
    Extract,
    /// Fix number formatting → sentences_clean.json
    Clean,
    /// Tag each sentence with a topic → sentences_topic.json
    Classify,
    /// Tag each sentence Past/Present/Future → sentences_time.json
    Timeline,
    /// Write story_<Topic>.txt for every topic (or only the given ones)
    Story {
        /// Topic to write; repeatable
        #[arg(long = "topic")]
        topics: Vec<String>,
    },
    /// Run every stage in order (the default)
    All,
    /// Write a story connecting two topics → compare/<A>_vs_<B>.txt
    Compare { topic_a: String, topic_b: String },
    /// Print a stored topic story split into Past / Present / Future
    Show { topic: String },
    /// Print a stored comparison (either order) without its references
    Combined { topic_a: String, topic_b: String },
}

fn main() -> anyhow::Result<()> {
    // a missing .env is fine
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let pipeline = Pipeline::new(cli.settings.into_config());

    match cli.command.unwrap_or(Command::All) {
        Command::Extract => pipeline.run(&[Stage::Extract])?,
        Command::Clean => pipeline.run(&[Stage::Clean])?,
        Command::Classify => pipeline.run(&[Stage::Classify])?,
        Command::Timeline => pipeline.run(&[Stage::Timeline])?,
        Command::Story { topics } => {
            skip_if_missing(pipeline.write_stories(&topics))?;
        }
        Command::All => pipeline.run(&Stage::ALL)?,
        Command::Compare { topic_a, topic_b } => {
            distinct_topics(&topic_a, &topic_b)?;
            skip_if_missing(pipeline.write_comparison(&topic_a, &topic_b))
                .with_context(|| format!("comparing {topic_a} and {topic_b}"))?;
        }
        Command::Show { topic } => run_show(pipeline.config(), &topic)?,
        Command::Combined { topic_a, topic_b } => run_combined(pipeline.config(), &topic_a, &topic_b)?,
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// A pair made of one topic twice has nothing to connect.
fn distinct_topics(topic_a: &str, topic_b: &str) -> anyhow::Result<()> {
    if topic_a == topic_b {
        bail!("pick two different topics, got {topic_a} twice");
    }
    Ok(())
}

/// A missing upstream dataset is reported, not fatal.
fn skip_if_missing<T>(result: error::Result<T>) -> error::Result<Option<T>> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(e @ StoryError::MissingInput { .. }) => {
            warn!("skipped: {e}");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  READING STORED STORIES
// ═══════════════════════════════════════════════════════════════════════

fn run_show(config: &Config, topic: &str) -> anyhow::Result<()> {
    let path = config.out_path(&format!("story_{topic}.txt"));
    let text = std::fs::read_to_string(&path).with_context(|| {
        let table = TopicTable::default();
        let known: Vec<&str> = table.labels().collect();
        format!(
            "cannot read {}; run 'story' first (topics: {}, {FALLBACK_TOPIC})",
            path.display(),
            known.join(", ")
        )
    })?;

    let sections = split_story(&text).unwrap_or_else(|e| {
        warn!("{}: {e}", path.display());
        NarrativeSections::placeholder()
    });

    println!("── {topic} ──");
    println!("\nPast:\n{}", sections.past);
    println!("\nPresent:\n{}", sections.present);
    println!("\nFuture:\n{}", sections.future);
    Ok(())
}

fn run_combined(config: &Config, topic_a: &str, topic_b: &str) -> anyhow::Result<()> {
    distinct_topics(topic_a, topic_b)?;
    let dir = config.compare_dir();
    let Some(path) = find_comparison(&dir, topic_a, topic_b) else {
        bail!(
            "no comparison of {topic_a} and {topic_b} in {}; run 'compare' first",
            dir.display()
        );
    };
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    println!("{}", strip_references(&text));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_means_all() {
        let cli = Cli::try_parse_from(["storylab"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_unknown_subcommand_rejected() {
        assert!(Cli::try_parse_from(["storylab", "publish"]).is_err());
    }

    #[test]
    fn test_settings_into_config() {
        let cli = Cli::try_parse_from([
            "storylab",
            "timeline",
            "--boundary-year",
            "2024",
            "--out-dir",
            "/tmp/x",
            "--model-timeout-secs",
            "5",
        ])
        .unwrap();
        assert!(matches!(cli.command, Some(Command::Timeline)));
        let config = cli.settings.into_config();
        assert_eq!(config.boundary_year, 2024);
        assert_eq!(config.out_dir, PathBuf::from("/tmp/x"));
        assert_eq!(config.model.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_story_topics_repeatable() {
        let cli =
            Cli::try_parse_from(["storylab", "story", "--topic", "Energy", "--topic", "Trade"])
                .unwrap();
        match cli.command {
            Some(Command::Story { topics }) => assert_eq!(topics, vec!["Energy", "Trade"]),
            _ => panic!("expected story command"),
        }
    }

    #[test]
    fn test_skip_if_missing() {
        let missing: error::Result<u8> = Err(StoryError::MissingInput {
            stage: "timeline",
            path: PathBuf::from("out/sentences_time.json"),
        });
        assert!(matches!(skip_if_missing(missing), Ok(None)));

        let failed: error::Result<u8> = Err(StoryError::StoriesFailed {
            topics: vec!["Energy".into()],
        });
        assert!(skip_if_missing(failed).is_err());
    }

    #[test]
    fn test_pair_needs_two_topics() {
        assert!(distinct_topics("Energy", "Trade").is_ok());
        let err = distinct_topics("Energy", "Energy").unwrap_err();
        assert!(err.to_string().contains("Energy twice"));
    }

    #[test]
    fn test_combined_strips_references() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::rooted_at(dir.path());
        std::fs::create_dir_all(config.compare_dir()).unwrap();
        std::fs::write(
            config.compare_dir().join("Trade_vs_Energy.txt"),
            "Linked.\n\n**References**\n– a.pdf p.1",
        )
        .unwrap();
        assert!(run_combined(&config, "Energy", "Trade").is_ok());
        assert!(run_combined(&config, "Energy", "Labour").is_err());
        assert!(run_combined(&config, "Energy", "Energy").is_err());
    }
}
