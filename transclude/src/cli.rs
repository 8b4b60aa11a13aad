///
/// This module implements the CLI interface for transclude: command parsing,
/// argument exposure, and the async entrypoint used by `main` and by tests.
///
/// All engine logic (directive scanning, resolution, edge handling) lives in
/// the [`transclude-core`] crate. This module is strictly CLI glue.
///
/// ## How To Use
/// - For command-line users: use the installed `transclude` binary with `--help`.
/// - For programmatic/integration use: call [`run`] with a constructed [`Cli`].
///
/// [`transclude-core`]: ../../transclude-core/
use crate::load_config::{load_config, ORIGIN_TOKEN_ENV};
use crate::origin::{build_fetcher, HttpOrigin};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use transclude_core::config::EngineConfig;
use transclude_core::contract::Fetcher;
use transclude_core::edge::{EdgeEvent, EdgeHandler};
use transclude_core::resolver::Resolver;
use transclude_core::spa::SpaRewriter;

/// CLI for transclude: resolve server-side includes the way the edge function does.
#[derive(Parser)]
#[clap(
    name = "transclude",
    version,
    about = "Resolve server-side include directives from a content store"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve one document from the configured store and print it
    Render {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// Logical path of the document, e.g. /index.shtml
        path: String,
    },
    /// Run the edge handler on a CDN event JSON file and print the result
    HandleEvent {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// Path to the event JSON
        #[clap(long)]
        event: PathBuf,
        /// Read from the S3 bucket named in the event instead of the configured store
        #[clap(long)]
        origin_from_event: bool,
    },
    /// Print the SPA rewrite of a uri
    RewriteUri {
        /// Optional YAML config file providing spa_file_extensions
        #[clap(long)]
        config: Option<PathBuf>,
        uri: String,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Render { config, path } => {
            let config = load_config(config)?;
            let resolver = Resolver::from_config(build_fetcher(&config.store), &config.engine);
            tracing::info!(command = "render", path = %path, "Rendering document");
            let body = resolver
                .resolve_document(&path)
                .await
                .with_context(|| format!("Failed to render {path}"))?;
            print!("{body}");
            tracing::info!(command = "render", bytes = body.len(), "Render complete");
        }
        Commands::HandleEvent {
            config,
            event,
            origin_from_event,
        } => {
            let config = load_config(config)?;
            let raw = std::fs::read_to_string(&event)
                .with_context(|| format!("Failed to read event file {}", event.display()))?;
            let event: EdgeEvent =
                serde_json::from_str(&raw).context("Failed to parse edge event JSON")?;

            let fetcher: Arc<dyn Fetcher> = if origin_from_event {
                let bucket = event
                    .records
                    .first()
                    .and_then(|r| r.cf.request.origin_bucket())
                    .context("Event has no S3 origin to read from")?;
                Arc::new(HttpOrigin::for_bucket(
                    bucket,
                    std::env::var(ORIGIN_TOKEN_ENV).ok(),
                ))
            } else {
                build_fetcher(&config.store)
            };

            let handler = EdgeHandler::from_config(fetcher, &config.engine);
            match handler.handle(event).await {
                Ok(outcome) => {
                    tracing::info!(command = "handle-event", "Edge event handled");
                    println!("{}", serde_json::to_string_pretty(&outcome)?);
                }
                Err(e) => {
                    tracing::error!(command = "handle-event", error = %e, "Edge event failed");
                    return Err(anyhow::Error::new(e));
                }
            }
        }
        Commands::RewriteUri { config, uri } => {
            let engine = match config {
                Some(path) => load_config(path)?.engine,
                None => EngineConfig::default(),
            };
            println!("{}", SpaRewriter::from_config(&engine).rewrite(&uri));
        }
    }

    Ok(())
}
