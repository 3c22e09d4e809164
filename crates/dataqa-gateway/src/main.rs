//! DataQA Gateway: data preview + preset and free-text questions about `data.csv`.
//! Run: cargo run -p dataqa-gateway, then open http://127.0.0.1:8501

use dataqa_core::{AppConfig, GroqAgentFactory, Orchestrator, GROQ_API_KEY_ENV};
use dataqa_gateway::{router, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[dataqa-gateway] .env not loaded: {} (using system environment)", e);
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(AppConfig::load()?);
    if !config.has_api_key() {
        tracing::warn!(
            "{} is not set; the page will load but questions cannot be answered",
            GROQ_API_KEY_ENV
        );
    }
    if config.allow_dangerous_code {
        tracing::info!("allow_dangerous_code=true (informational; generated code is never executed)");
    }
    tracing::info!(
        data_path = %config.data_path.display(),
        model = %config.model,
        "DataQA configured"
    );

    let addr: SocketAddr = config.bind_addr.parse()?;
    let orchestrator = Orchestrator::new(Arc::clone(&config), Arc::new(GroqAgentFactory));
    let state = AppState::new(orchestrator);
    spawn_session_sweeper(state.clone(), config.session_idle_ttl());
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("DataQA gateway listening on http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

/// Periodically drop idle sessions so abandoned cookies do not pin agents forever.
fn spawn_session_sweeper(state: AppState, ttl: Duration) {
    let period = (ttl / 2).clamp(Duration::from_secs(1), Duration::from_secs(300));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.tick().await;
        loop {
            interval.tick().await;
            let removed = state.orchestrator.evict_idle_sessions();
            if removed > 0 {
                tracing::info!(removed, live = state.orchestrator.sessions().len(), "session sweep");
            }
        }
    });
}
