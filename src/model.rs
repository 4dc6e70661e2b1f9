//! Text-completion model access.
//!
//! The pipeline only needs "prompt in, text out". [`CompletionServer`] talks
//! to an OpenAI-compatible `/v1/completions` endpoint (llama.cpp server,
//! vLLM, ...). [`LazyModel`] connects on first use and hands the same
//! instance to every later caller.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::ModelConfig;
use crate::lazy::InitOnce;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("parse error: {0}")]
    Parse(String),
}

/// Sampling settings for one completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub stop: Vec<String>,
}

/// Blocking text completion. No cancellation: the caller waits for the
/// answer or the error.
pub trait TextModel: Send + Sync {
    fn complete(&self, prompt: &str, params: &GenerationParams) -> Result<String, ModelError>;
}

// ── HTTP completion server ──────────────────────────────────────────────

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    stop: &'a [String],
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    text: String,
}

pub struct CompletionServer {
    http_client: reqwest::blocking::Client,
    base_url: String,
    model: String,
}

impl CompletionServer {
    /// Build the client and check that the server answers with its model list.
    pub fn connect(config: &ModelConfig) -> Result<Self, ModelError> {
        let base_url = config.url.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ModelError::Config("model URL is empty".into()));
        }

        let http_client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ModelError::Config(format!("cannot build HTTP client: {e}")))?;

        let probe = format!("{base_url}/v1/models");
        let response = http_client
            .get(&probe)
            .send()
            .map_err(|e| ModelError::Network(format!("{probe}: {e}")))?;
        if !response.status().is_success() {
            return Err(ModelError::Api(format!(
                "{probe} answered {}",
                response.status()
            )));
        }

        info!(url = %base_url, model = %config.name, "connected to completion server");
        Ok(Self {
            http_client,
            base_url,
            model: config.name.clone(),
        })
    }
}

impl TextModel for CompletionServer {
    fn complete(&self, prompt: &str, params: &GenerationParams) -> Result<String, ModelError> {
        let url = format!("{}/v1/completions", self.base_url);
        let request = CompletionRequest {
            model: &self.model,
            prompt,
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            top_p: params.top_p,
            stop: &params.stop,
        };

        debug!(prompt_chars = prompt.len(), max_tokens = params.max_tokens, "completion request");

        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .map_err(|e| ModelError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ModelError::Api(format!("{status}: {body}")));
        }

        let parsed: CompletionResponse = response
            .json()
            .map_err(|e| ModelError::Parse(format!("invalid completion response: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.text.trim().to_string())
            .ok_or_else(|| ModelError::Parse("completion response has no choices".into()))
    }
}

// ── Lazily loaded shared model ──────────────────────────────────────────

type Loader = Box<dyn Fn() -> Result<Arc<dyn TextModel>, ModelError> + Send + Sync>;

/// Handle to a model that is loaded at most once per process.
pub struct LazyModel {
    cell: InitOnce<dyn TextModel>,
    loader: Loader,
}

impl LazyModel {
    pub fn new(
        loader: impl Fn() -> Result<Arc<dyn TextModel>, ModelError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            cell: InitOnce::new(),
            loader: Box::new(loader),
        }
    }

    /// Connects to the configured completion server on first [`get`](Self::get).
    pub fn from_config(config: &ModelConfig) -> Self {
        let config = config.clone();
        Self::new(move || {
            CompletionServer::connect(&config).map(|m| Arc::new(m) as Arc<dyn TextModel>)
        })
    }

    /// Wrap an already constructed model.
    #[cfg(test)]
    pub fn ready(model: Arc<dyn TextModel>) -> Self {
        Self::new(move || Ok(Arc::clone(&model)))
    }

    pub fn get(&self) -> Result<Arc<dyn TextModel>, ModelError> {
        self.cell.get_or_try_init(|| (self.loader)())
    }

    #[cfg(test)]
    pub fn is_loaded(&self) -> bool {
        self.cell.is_initialized()
    }
}
