use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use skin_overlay::cache::{self, derive_key};
use skin_overlay::consts::{
    DEFAULT_CACHE_URL, DEFAULT_FETCH_TIMEOUT, DEFAULT_HOST, DEFAULT_MAX_BASE_BYTES,
    DEFAULT_MAX_BODY_BYTES, DEFAULT_PORT, DEFAULT_UPLOAD_URL, USER_AGENT,
};
use skin_overlay::engine::{Engine, EngineConfig};
use skin_overlay::error::ImageRole;
use skin_overlay::imaging;
use skin_overlay::server;
use skin_overlay::upload::MineSkinUploader;

#[derive(Parser)]
#[command(
    name = "skin-overlay",
    version,
    about = "Paints overlays onto skins and publishes the result."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Address to bind
    #[arg(long, env = "HOST", default_value = DEFAULT_HOST)]
    host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Bearer credential for the upload API
    #[arg(long, env = "MINESKIN_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Cache store: redis://…, rediss://…, sqlite:<path> or :memory:
    #[arg(long, env = "REDIS_URL", default_value = DEFAULT_CACHE_URL)]
    cache_url: String,

    /// Upload endpoint
    #[arg(long, env = "UPLOAD_URL", default_value = DEFAULT_UPLOAD_URL)]
    upload_url: String,

    /// Base image fetch timeout in seconds
    #[arg(long, env = "FETCH_TIMEOUT_SECS", default_value_t = DEFAULT_FETCH_TIMEOUT.as_secs())]
    fetch_timeout: u64,

    /// Largest base image accepted from the remote host, in bytes
    #[arg(long, env = "MAX_BASE_BYTES", default_value_t = DEFAULT_MAX_BASE_BYTES)]
    max_base_bytes: usize,

    /// Largest accepted request body in bytes
    #[arg(long, env = "MAX_BODY_BYTES", default_value_t = DEFAULT_MAX_BODY_BYTES)]
    max_body_bytes: usize,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP service (the default)
    Serve,
    /// Print the cache key for a base URL and overlay payload
    Key {
        #[arg(long)]
        base: String,
        #[arg(long)]
        overlay: String,
    },
    /// Composite two local PNG files without uploading anything
    Composite {
        base: PathBuf,
        overlay: PathBuf,
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match cli.command.take() {
        Some(Command::Key { base, overlay }) => {
            println!("{}", derive_key(&base, &overlay));
            Ok(())
        }
        Some(Command::Composite {
            base,
            overlay,
            output,
        }) => composite_files(&base, &overlay, &output),
        Some(Command::Serve) | None => serve(cli).await,
    }
}

async fn serve(cli: Cli) -> anyhow::Result<()> {
    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .context("failed to build HTTP client")?;

    let cache: Arc<dyn cache::Cache> = Arc::from(
        cache::open(&cli.cache_url)
            .await
            .with_context(|| format!("failed to open cache at {}", cli.cache_url))?,
    );

    let uploader = MineSkinUploader::new(client.clone(), &cli.upload_url, cli.api_key);
    if !uploader.has_api_key() {
        warn!("MINESKIN_API_KEY is not set; uploads will fail until it is");
    }

    let config = EngineConfig {
        fetch_timeout: Duration::from_secs(cli.fetch_timeout),
        max_base_bytes: cli.max_base_bytes,
    };
    let engine = Arc::new(Engine::new(client, cache, Arc::new(uploader), config));

    let listener = TcpListener::bind((cli.host.as_str(), cli.port))
        .await
        .with_context(|| format!("failed to bind {}:{}", cli.host, cli.port))?;
    let addr = listener.local_addr()?;

    info!(
        %addr,
        cache = engine.cache_backend(),
        upload_url = %cli.upload_url,
        "listening"
    );

    let app = server::router(engine, cli.max_body_bytes);
    server::serve(listener, app, server::shutdown_signal()).await?;

    info!("stopped");
    Ok(())
}

fn composite_files(base: &Path, overlay: &Path, output: &Path) -> anyhow::Result<()> {
    let base_bytes =
        std::fs::read(base).with_context(|| format!("failed to read {}", base.display()))?;
    let overlay_bytes =
        std::fs::read(overlay).with_context(|| format!("failed to read {}", overlay.display()))?;

    let base_image = imaging::decode_png(&base_bytes, ImageRole::Base)?;
    let overlay_image = imaging::decode_png(&overlay_bytes, ImageRole::Overlay)?;

    let composite = imaging::composite(&base_image, &overlay_image);
    let png = imaging::encode_png(&composite)?;
    std::fs::write(output, png).with_context(|| format!("failed to write {}", output.display()))?;

    info!(
        output = %output.display(),
        width = composite.width(),
        height = composite.height(),
        "composite written"
    );
    Ok(())
}
