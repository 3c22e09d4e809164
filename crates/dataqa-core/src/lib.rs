//! DataQA core library.
//! Ask natural-language questions about one CSV file through a Groq-hosted LLM.

pub mod agent;
pub mod config;
pub mod csv_agent;
pub mod dataset;
pub mod error;
pub mod groq;
pub mod orchestrator;
pub mod presets;
pub mod session;

pub use agent::{Agent, AgentFactory};
pub use config::{AppConfig, GROQ_API_KEY_ENV};
pub use csv_agent::{CsvAgent, GroqAgentFactory};
pub use dataset::{ColumnType, Dataset};
pub use error::{DataQaError, Result};
pub use groq::GroqChatClient;
pub use orchestrator::{ask, Interaction, Message, Orchestrator, Page, Preview, AGENT_UNAVAILABLE_MESSAGE};
pub use presets::{PresetQuestion, PRESETS};
pub use session::{AgentSlot, Session, SessionId, SessionStore};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
