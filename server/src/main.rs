use anyhow::Result;
use axum::Router;
use clap::Parser;
use sift_core::Stopwords;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};
use sift_server::{build_app, ServerOptions};
use tokio::net::TcpListener;

#[derive(Parser)]
struct Args {
    /// Index directory path
    #[arg(long, default_value = "./index")]
    index: String,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
    /// Query tokenizer: split, regex or stemming
    #[arg(long, default_value = "regex")]
    tokenizer: String,
    /// File of multi-word expressions, one per line
    #[arg(long)]
    multiword: Option<PathBuf>,
    /// File of query stopwords, one per line
    #[arg(long)]
    stopwords: Option<PathBuf>,
    /// Relevance model used when a request names none
    #[arg(long, default_value = "bm25")]
    scorer: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let options = ServerOptions {
        tokenizer: args.tokenizer.parse()?,
        multiword: args.multiword,
        stopwords: args.stopwords.map(Stopwords::from_file).transpose()?,
        default_scorer: args.scorer.parse()?,
    };
    let app: Router = build_app(args.index.clone(), options)?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, index = %args.index, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
