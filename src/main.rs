use std::sync::Arc;

use anyhow::Context;

use email_assistant::api::{AppState, router};
use email_assistant::config::ServiceConfig;
use email_assistant::pipeline::EmailPipeline;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = ServiceConfig::from_env().context("Invalid configuration")?;

    eprintln!("📧 Email Assistant v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Backend: {}", config.llm.backend.name());
    eprintln!("   Model: {}", config.llm.model);
    eprintln!("   API: http://{}/api/v1/assistant", config.bind);
    eprintln!("   CORS: {}\n", config.cors_origins.join(", "));

    // No credential, no service: fail here rather than on the first request.
    let pipeline =
        EmailPipeline::from_config(&config.llm).context("Failed to initialize the LLM pipeline")?;

    let app = router(
        AppState {
            pipeline: Arc::new(pipeline),
        },
        &config.cors_origins,
    );

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    tracing::info!(addr = %config.bind, "Email assistant listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Email assistant stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
