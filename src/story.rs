//! Cited narrative synthesis.
//!
//! Snippets are picked from the timed dataset, rendered with inline
//! citations into a prompt, and the model's answer gets a sorted,
//! de-duplicated `**References**` section built from the very same
//! citations.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use storylab_types::{Citation, Phase, TimedSentence};
use tracing::{debug, info};

use crate::dataset::LazyDataset;
use crate::error::{Result, StoryError};
use crate::model::{GenerationParams, LazyModel, TextModel};
use crate::narrative::{comparison_file_name, split_story};
use crate::overlap::overlap_snippets;

// Any parenthesised "<name> p.<page>", whatever the source
static RE_PAREN_CITATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([^()]+?) p\.(\d+)\)").unwrap());

/// Stand-in for a phase without any sentences.
pub const NO_DATA: &str = "no data found";
/// Sentences per phase in a single-topic prompt.
pub const SNIPPETS_PER_PHASE: usize = 3;
/// Shared pages per cross-topic prompt.
pub const MAX_OVERLAP_PAGES: usize = 5;

pub fn single_topic_params() -> GenerationParams {
    GenerationParams {
        max_tokens: 380,
        temperature: 0.2,
        top_p: 0.9,
        stop: vec!["</s>".into(), "Snippets:".into()],
    }
}

pub fn cross_topic_params() -> GenerationParams {
    GenerationParams {
        max_tokens: 220,
        temperature: 0.25,
        top_p: 0.95,
        stop: vec!["</s>".into()],
    }
}

// ── Story ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subject {
    Topic(String),
    Pair(String, String),
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Topic(t) => f.write_str(t),
            Self::Pair(a, b) => write!(f, "{a} vs {b}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Story {
    pub subject: Subject,
    pub body: String,
    /// Sorted, no duplicates
    pub references: Vec<Citation>,
}

impl Story {
    fn new(subject: Subject, body: String, refs: BTreeSet<Citation>) -> Self {
        Self {
            subject,
            body,
            references: refs.into_iter().collect(),
        }
    }

    /// Artifact file name: `story_<Topic>.txt` or `<A>_vs_<B>.txt`.
    pub fn file_name(&self) -> String {
        match &self.subject {
            Subject::Topic(t) => format!("story_{t}.txt"),
            Subject::Pair(a, b) => comparison_file_name(a, b),
        }
    }

    /// Body followed by the `**References**` section, if there are any.
    pub fn render(&self) -> String {
        if self.references.is_empty() {
            return self.body.clone();
        }
        let refs: Vec<String> = self.references.iter().map(|c| format!("– {c}")).collect();
        format!("{}\n\n**References**\n{}", self.body, refs.join("\n"))
    }
}

// ── Snippet selection and prompts ────────────────────────────────────────

/// Up to [`SNIPPETS_PER_PHASE`] sentences of `topic` in `phase`, highest
/// page first; equal pages keep dataset order.
pub fn select_snippets<'a>(
    rows: &'a [TimedSentence],
    topic: &str,
    phase: Phase,
) -> Vec<&'a TimedSentence> {
    let mut picked: Vec<&TimedSentence> = rows
        .iter()
        .filter(|r| r.topic == topic && r.phase == phase)
        .collect();
    picked.sort_by_key(|r| std::cmp::Reverse(r.page));
    picked.truncate(SNIPPETS_PER_PHASE);
    picked
}

fn with_cite(text: &str, cite: &Citation) -> String {
    format!("{text} ({cite})")
}

pub fn single_topic_prompt(topic: &str, buckets: &[(Phase, Vec<String>)]) -> String {
    let mut prompt = format!(
        "You are an economic analyst. Write a concise story on **{topic}**\n\
         in three paragraphs (Past, Present, Future), labelled exactly\n\
         \"Paragraph 1 (Past):\", \"Paragraph 2 (Present):\" and \"Paragraph 3 (Future):\".\n\
         Quote at least one number from the snippets. ≤120 words per paragraph.\n\
         Return plain text.\n\nSnippets:"
    );
    for (phase, lines) in buckets {
        prompt.push_str(&format!("\n{phase}: {}", lines.join(" | ")));
    }
    prompt
}

pub fn cross_topic_prompt(topic_a: &str, topic_b: &str, lines: &[String]) -> String {
    format!(
        "You are a policy analyst. Write one cohesive paragraph (≤180 words)\n\
         that explains how **{topic_a}** and **{topic_b}** are connected in the\n\
         report. Base yourself only on the snippets; quote at least one number.\n\
         Return plain text.\n\nSnippets:\n{}",
        lines.join(" | ")
    )
}

pub fn nothing_to_match(topic_a: &str, topic_b: &str) -> String {
    format!("Nothing to match between **{topic_a}** and **{topic_b}**.")
}

/// Citations written inline in `body`, in text order.
///
/// Sources present in `rows` are found anywhere, bare or bracketed; any
/// other source only when cited in parentheses.
pub fn cited_in(body: &str, rows: &[TimedSentence]) -> Vec<Citation> {
    let sources: BTreeSet<&str> = rows.iter().map(|r| r.source_id.as_str()).collect();
    let mut found = Vec::new();
    for &source in &sources {
        let pattern = format!(r"(?:^|[\s(\[|,;])({}) p\.(\d+)", regex::escape(source));
        let Ok(re) = Regex::new(&pattern) else {
            continue;
        };
        for cap in re.captures_iter(body) {
            if let Ok(page) = cap[2].parse::<u32>() {
                found.push((cap.get(1).map_or(0, |m| m.start()), Citation::new(source, page)));
            }
        }
    }

    for cap in RE_PAREN_CITATION.captures_iter(body) {
        let name = cap[1].trim();
        // already found by the per-source pass above
        let known = sources.iter().any(|s| {
            name.strip_suffix(s)
                .is_some_and(|rest| rest.is_empty() || rest.ends_with([' ', '(', '[', '|', ',', ';']))
        });
        if known {
            continue;
        }
        if let Ok(page) = cap[2].parse::<u32>() {
            found.push((cap.get(1).map_or(0, |m| m.start()), Citation::new(name, page)));
        }
    }

    found.sort_by_key(|(pos, _)| *pos);
    found.into_iter().map(|(_, cite)| cite).collect()
}

/// Reject generated text citing a page that was never given to the model.
fn check_citations(
    subject: &Subject,
    body: &str,
    rows: &[TimedSentence],
    refs: &BTreeSet<Citation>,
) -> Result<()> {
    match cited_in(body, rows).into_iter().find(|c| !refs.contains(c)) {
        Some(cite) => Err(StoryError::UnknownCitation {
            subject: subject.to_string(),
            citation: cite.to_string(),
        }),
        None => Ok(()),
    }
}

// ── Synthesis ────────────────────────────────────────────────────────────

/// Past/Present/Future story for one topic.
///
/// Every phase appears in the prompt, with [`NO_DATA`] when the topic has
/// no sentences there. The answer must split into the three phases.
pub fn make_story(topic: &str, rows: &[TimedSentence], model: &dyn TextModel) -> Result<Story> {
    let subject = Subject::Topic(topic.to_string());
    let mut refs = BTreeSet::new();
    let mut buckets = Vec::with_capacity(Phase::ALL.len());

    for phase in Phase::ALL {
        let mut lines = Vec::new();
        for row in select_snippets(rows, topic, phase) {
            let cite = row.citation();
            lines.push(with_cite(&row.text, &cite));
            refs.insert(cite);
        }
        if lines.is_empty() {
            lines.push(NO_DATA.to_string());
        }
        buckets.push((phase, lines));
    }

    let prompt = single_topic_prompt(topic, &buckets);
    debug!(%topic, citations = refs.len(), "requesting story");
    let body = model.complete(&prompt, &single_topic_params())?;

    if split_story(&body).is_err() {
        return Err(StoryError::MalformedNarrative {
            subject: subject.to_string(),
        });
    }
    check_citations(&subject, &body, rows, &refs)?;

    Ok(Story::new(subject, body, refs))
}

/// One paragraph connecting two topics through the pages they share.
///
/// Without shared pages the result is the "Nothing to match" notice and the
/// model is neither loaded nor called.
pub fn compare_topics(
    topic_a: &str,
    topic_b: &str,
    rows: &[TimedSentence],
    model: &LazyModel,
) -> Result<Story> {
    let subject = Subject::Pair(topic_a.to_string(), topic_b.to_string());
    let overlaps = overlap_snippets(topic_a, topic_b, rows);
    if overlaps.is_empty() {
        info!(%topic_a, %topic_b, "no shared pages");
        return Ok(Story::new(
            subject,
            nothing_to_match(topic_a, topic_b),
            BTreeSet::new(),
        ));
    }

    let mut refs = BTreeSet::new();
    let mut lines = Vec::new();
    for group in overlaps.iter().take(MAX_OVERLAP_PAGES) {
        let cite = group.citation();
        lines.extend(group.snippets.iter().map(|s| with_cite(s, &cite)));
        refs.insert(cite);
    }

    let prompt = cross_topic_prompt(topic_a, topic_b, &lines);
    let body = model.get()?.complete(&prompt, &cross_topic_params())?;
    if body.trim().is_empty() {
        return Err(StoryError::MalformedNarrative {
            subject: subject.to_string(),
        });
    }
    check_citations(&subject, &body, rows, &refs)?;

    Ok(Story::new(subject, body, refs))
}

/// Topics in order of first appearance.
pub fn topics_in(rows: &[TimedSentence]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    rows.iter()
        .filter(|r| seen.insert(r.topic.as_str()))
        .map(|r| r.topic.clone())
        .collect()
}

/// Synthesizer bound to the shared model and dataset handles.
pub struct StoryTeller<'a> {
    model: &'a LazyModel,
    dataset: &'a LazyDataset,
}

impl<'a> StoryTeller<'a> {
    pub fn new(model: &'a LazyModel, dataset: &'a LazyDataset) -> Self {
        Self { model, dataset }
    }

    pub fn topics(&self) -> Result<Vec<String>> {
        Ok(topics_in(&self.dataset.get()?))
    }

    pub fn story(&self, topic: &str) -> Result<Story> {
        let rows = self.dataset.get()?;
        let model = self.model.get()?;
        make_story(topic, &rows, model.as_ref())
    }

    pub fn compare(&self, topic_a: &str, topic_b: &str) -> Result<Story> {
        let rows = self.dataset.get()?;
        compare_topics(topic_a, topic_b, &rows, self.model)
    }
}
