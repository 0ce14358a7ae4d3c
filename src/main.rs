use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cv_rag::api;
use cv_rag::config::Config;
use cv_rag::search::AzureSearchStore;
use cv_rag::state::{http_client, AppState};

#[derive(Parser)]
#[command(name = "cv-rag", version, about = "Question answering over indexed CVs")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Create or update the Azure AI Search index, then exit
    InitIndex,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    let config = Config::from_env();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    config.validate()?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::InitIndex => init_index(config).await,
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    tracing::info!("Environment: {}", config.environment);
    tracing::info!("Data directory: {}", config.data_dir.display());

    let state = AppState::new(config.clone())?;

    if let Err(e) = state.blobs.ensure_containers().await {
        tracing::warn!("Could not verify storage containers: {e}");
    }

    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

async fn init_index(config: Config) -> anyhow::Result<()> {
    if !config.search_configured() {
        anyhow::bail!("AZURE_SEARCH_ENDPOINT and AZURE_SEARCH_API_KEY must be set");
    }
    let store = AzureSearchStore::new(
        http_client()?,
        config.search.clone(),
        config.llm.embedding_dim,
    );
    store.initialize_index().await?;
    tracing::info!("Index {} initialized", config.search.index_name);
    Ok(())
}
