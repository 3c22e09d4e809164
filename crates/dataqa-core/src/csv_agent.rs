//! CSV agent: grounds each question in the bound dataset and asks Groq.
//!
//! The dataset is re-read on every question so answers track the file on disk.
//! The table schema and up to `max_context_rows` rows travel in the system prompt;
//! the question itself is the user message, forwarded untouched.

use crate::agent::{Agent, AgentFactory};
use crate::config::AppConfig;
use crate::dataset::Dataset;
use crate::error::{DataQaError, Result};
use crate::groq::GroqChatClient;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

const AGENT_NAME: &str = "groq-csv-agent";

const ANALYST_PROMPT: &str = "You are a data analyst working with a single table loaded from a CSV file. \
Answer the user's question using only the data provided below. \
Work through filters, counts and sums carefully before answering. \
Give a concise final answer in plain text; include the number or value asked for. \
If the data cannot answer the question, say so.";

pub struct CsvAgent {
    client: GroqChatClient,
    data_path: PathBuf,
    max_context_rows: usize,
}

impl CsvAgent {
    pub fn new(client: GroqChatClient, data_path: PathBuf, max_context_rows: usize) -> Self {
        Self {
            client,
            data_path,
            max_context_rows,
        }
    }

    fn system_prompt(&self, dataset: &Dataset) -> Result<String> {
        let (snippet, included) = dataset.to_csv_snippet(self.max_context_rows)?;
        Ok(build_system_prompt(dataset, &snippet, included))
    }
}

/// Describes the table (file, row count, typed columns) and attaches the rows.
/// `included` is the number of data rows in `snippet`.
pub fn build_system_prompt(dataset: &Dataset, snippet: &str, included: usize) -> String {
    let columns: Vec<String> = dataset
        .headers()
        .iter()
        .zip(dataset.column_types())
        .map(|(name, ty)| format!("- {} ({})", name, ty))
        .collect();

    let file_name = dataset
        .path()
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "data.csv".to_string());

    let rows_note = if included < dataset.row_count() {
        format!(
            "Only the first {} of {} rows are included below.",
            included,
            dataset.row_count()
        )
    } else {
        format!("All {} rows are included below.", dataset.row_count())
    };

    format!(
        "{}\n\nFile: {}\nRows: {}\nColumns:\n{}\n\n{}\n\n```csv\n{}```",
        ANALYST_PROMPT,
        file_name,
        dataset.row_count(),
        columns.join("\n"),
        rows_note,
        snippet
    )
}

#[async_trait::async_trait]
impl Agent for CsvAgent {
    fn name(&self) -> &str {
        AGENT_NAME
    }

    async fn invoke(&self, question: &str) -> Result<String> {
        let dataset = Dataset::load_async(self.data_path.clone())
            .await
            .map_err(DataQaError::into_invocation)?;
        let system = self.system_prompt(&dataset).map_err(DataQaError::into_invocation)?;

        tracing::debug!(
            target: "dataqa::agent",
            model = self.client.model(),
            prompt_chars = system.len(),
            question,
            "invoking agent"
        );

        let started = Instant::now();
        let answer = self.client.complete(&system, question).await?;
        tracing::debug!(
            target: "dataqa::agent",
            elapsed_ms = started.elapsed().as_millis() as u64,
            answer = answer.as_str(),
            "agent finished"
        );
        Ok(answer)
    }
}

/// Production factory: credential check, Groq client, CSV agent bound to `data_path`.
#[derive(Debug, Default, Clone, Copy)]
pub struct GroqAgentFactory;

impl AgentFactory for GroqAgentFactory {
    fn build(&self, config: &AppConfig) -> Result<Arc<dyn Agent>> {
        let client = GroqChatClient::from_config(config)?;
        if config.allow_dangerous_code {
            tracing::debug!("agent built with allow_dangerous_code=true");
        }
        Ok(Arc::new(CsvAgent::new(
            client,
            config.data_path.clone(),
            config.max_context_rows,
        )))
    }
}
