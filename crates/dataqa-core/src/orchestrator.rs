//! Session Orchestrator: one render pass per request.
//!
//! ensure-agent -> load-preview (abort on failure) -> presets + question input -> ask.
//! The pass produces a `Page`; turning it into HTML is the gateway's job.

use crate::agent::{Agent, AgentFactory};
use crate::config::AppConfig;
use crate::dataset::{ColumnType, Dataset};
use crate::presets::{self, PresetQuestion, PRESETS};
use crate::session::{EnsureOutcome, SessionId, SessionStore};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

pub const AGENT_UNAVAILABLE_MESSAGE: &str =
    "Failed to initialize the agent. Please check if GROQ_API_KEY is set correctly in .env file";

/// What the user did to trigger this pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interaction {
    View,
    Preset(usize),
    Question(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum Message {
    Success(String),
    Error(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct Preview {
    pub headers: Vec<String>,
    pub column_types: Vec<ColumnType>,
    pub rows: Vec<Vec<String>>,
    pub total_rows: usize,
}

/// View model for one render pass.
#[derive(Debug, Clone, Serialize)]
pub struct Page {
    pub title: String,
    pub heading: String,
    pub init_error: Option<String>,
    pub preview: Option<Preview>,
    pub load_error: Option<String>,
    pub presets: Vec<PresetQuestion>,
    pub show_question_input: bool,
    pub last_question: Option<String>,
    pub answer: Option<Message>,
}

impl Page {
    fn new(config: &AppConfig) -> Self {
        Self {
            title: config.app_title.clone(),
            heading: config.page_heading.clone(),
            init_error: None,
            preview: None,
            load_error: None,
            presets: Vec::new(),
            show_question_input: false,
            last_question: None,
            answer: None,
        }
    }
}

pub struct Orchestrator {
    config: Arc<AppConfig>,
    factory: Arc<dyn AgentFactory>,
    sessions: SessionStore,
}

impl Orchestrator {
    pub fn new(config: Arc<AppConfig>, factory: Arc<dyn AgentFactory>) -> Self {
        Self {
            config,
            factory,
            sessions: SessionStore::new(),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Drop sessions idle longer than `session_idle_secs`, agents included.
    pub fn evict_idle_sessions(&self) -> usize {
        self.sessions.evict_idle(self.config.session_idle_ttl())
    }

    /// Run one full pass for `session_id`. Passes for the same session are serialized.
    pub async fn render(&self, session_id: &SessionId, interaction: Interaction) -> Page {
        let session = self.sessions.get_or_create(session_id);
        let mut guard = session.lock().await;
        let mut page = Page::new(&self.config);

        let agent = match guard.ensure_agent(self.factory.as_ref(), &self.config) {
            EnsureOutcome::Available(agent) => Some(agent),
            EnsureOutcome::JustFailed(msg) => {
                page.init_error = Some(format!("Error initializing agent: {}", msg));
                None
            }
            EnsureOutcome::PreviouslyFailed => None,
        };

        match self.load_preview().await {
            Ok(preview) => page.preview = Some(preview),
            Err(msg) => {
                page.load_error = Some(msg);
                return page;
            }
        }

        page.presets = PRESETS.to_vec();
        page.show_question_input = true;

        let question = match interaction {
            Interaction::View => None,
            Interaction::Preset(i) => match presets::preset(i) {
                Some(p) => Some(p.question.to_string()),
                None => {
                    tracing::warn!(index = i, "unknown preset index");
                    None
                }
            },
            // Whitespace-only input counts as no question at all.
            Interaction::Question(q) if q.trim().is_empty() => None,
            Interaction::Question(q) => Some(q),
        };

        if let Some(q) = question {
            page.answer = Some(ask(agent.as_deref(), &q).await);
            page.last_question = Some(q);
        }

        page
    }

    async fn load_preview(&self) -> Result<Preview, String> {
        match Dataset::load_async(self.config.data_path.clone()).await {
            Ok(ds) => Ok(Preview {
                headers: ds.headers().to_vec(),
                column_types: ds.column_types(),
                rows: ds.head(self.config.preview_rows).to_vec(),
                total_rows: ds.row_count(),
            }),
            Err(e) => {
                tracing::warn!(error = %e, "data preview failed");
                Err(format!("Error loading CSV file: {}", e))
            }
        }
    }
}

/// Forward `question` to the agent. No agent: fixed configuration message, no call made.
pub async fn ask(agent: Option<&dyn Agent>, question: &str) -> Message {
    let Some(agent) = agent else {
        return Message::Error(AGENT_UNAVAILABLE_MESSAGE.to_string());
    };

    tracing::info!(agent = agent.name(), question, "analyzing");
    let started = Instant::now();
    let result = agent.invoke(question).await;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    match result {
        Ok(answer) => {
            tracing::info!(elapsed_ms, "answer ready");
            Message::Success(answer)
        }
        Err(e) => {
            tracing::error!(elapsed_ms, error = %e, "agent invocation failed");
            Message::Error(format!("Error analyzing question: {}", e))
        }
    }
}
