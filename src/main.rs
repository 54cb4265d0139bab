use std::io::Read;
use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use fact_check::config::Config;
use fact_check::http::start_http_server;
use fact_check::{FactCheckPipeline, FactCheckRequest};
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Parser)]
#[command(name = "fact-check")]
#[command(about = "Extract factual claims from text and check them against fact-check sources", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Markdown,
}

#[derive(Subcommand)]
enum Commands {
    /// Fact-check TEXT (or stdin when omitted) and print the report
    Check {
        text: Option<String>,
        #[arg(long)]
        max_claims: Option<usize>,
        #[arg(long, value_enum, default_value = "markdown")]
        format: OutputFormat,
        /// Source text (or URL) to weigh alongside the lookups; repeatable
        #[arg(long = "source")]
        sources: Vec<String>,
    },
    /// Serve the HTTP API
    Serve {
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        e
    })?;

    tracing_subscriber::fmt()
        .with_env_filter(config.runtime.log_level.as_str())
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .init();

    let pipeline = FactCheckPipeline::from_config(&config)?;

    match cli.command {
        Commands::Check {
            text,
            max_claims,
            format,
            sources,
        } => {
            let text = match text {
                Some(t) => t,
                None => {
                    let mut buf = String::new();
                    std::io::stdin()
                        .read_to_string(&mut buf)
                        .context("Failed to read text from stdin")?;
                    buf
                }
            };

            let token = CancellationToken::new();
            let ctrl_c = token.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    ctrl_c.cancel();
                }
            });

            let request = FactCheckRequest {
                text: Some(text),
                max_claims,
                sources: (!sources.is_empty()).then_some(sources),
            };
            let report = pipeline.run_request(request, token).await?;

            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
                OutputFormat::Markdown => print!("{}", report.render_markdown()),
            }
        }
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                config.runtime.http_bind = bind;
            }
            info!(
                "fact-check {} serving on {}",
                env!("CARGO_PKG_VERSION"),
                config.runtime.http_bind
            );
            start_http_server(pipeline, &config.runtime).await?;
        }
    }

    Ok(())
}
