use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use tracing_subscriber::{fmt, EnvFilter};
use reco_core::EngineHandle;
use server::{build_app, spawn_build, EngineSource};
use tokio::net::TcpListener;

#[derive(Parser)]
struct Args {
    /// CSV corpus path
    #[arg(long, env = "DATA_PATH", default_value = "coursea_data.csv")]
    corpus: String,
    /// Snapshot directory; takes precedence over the corpus when set
    #[arg(long, env = "INDEX_DIR")]
    index: Option<String>,
    /// Host to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, env = "PORT", default_value_t = 5000)]
    port: u16,
    /// Results per query when the caller does not ask for a count
    #[arg(long, env = "TOP_K", default_value_t = reco_core::DEFAULT_TOP_K)]
    top_k: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let source = match args.index {
        Some(dir) => EngineSource::Snapshot(dir),
        None => EngineSource::Corpus(args.corpus.replace('\\', "/")),
    };
    let handle = EngineHandle::new();
    let _build = spawn_build(handle.clone(), source);
    let app = build_app(handle, args.top_k);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
