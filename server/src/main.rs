use anyhow::Result;
use axum::Router;
use clap::Parser;
use docindex::{IndexConfig, TokenizerConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};
use server::{build_app, ServerConfig};
use tokio::net::TcpListener;

#[derive(Parser)]
struct Args {
    /// Search index file or directory
    #[arg(long, default_value = "./search_index.js")]
    index: PathBuf,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
    /// Weight of a title token occurrence
    #[arg(long, default_value_t = 2.0)]
    title_weight: f32,
    /// Weight of a text token occurrence
    #[arg(long, default_value_t = 1.0)]
    text_weight: f32,
    /// Apply English stemming to indexed and query tokens
    #[arg(long, default_value_t = false)]
    stem: bool,
    /// Keep the first record of each duplicated location instead of failing
    #[arg(long, default_value_t = false)]
    keep_first_duplicate: bool,
    /// Token required by POST /index/reload
    #[arg(long, env = "ADMIN_TOKEN", hide_env_values = true)]
    admin_token: Option<String>,
    /// Comma-separated allowed CORS origins
    #[arg(long, env = "CORS_ALLOW_ORIGIN")]
    cors_allow_origin: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let config = ServerConfig {
        source: args.index,
        index: IndexConfig {
            tokenizer: TokenizerConfig { stem: args.stem, ..Default::default() },
            title_weight: args.title_weight,
            text_weight: args.text_weight,
        },
        keep_first_duplicate: args.keep_first_duplicate,
        admin_token: args.admin_token,
        cors_allow_origin: args.cors_allow_origin,
    };
    let app: Router = build_app(config)?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
