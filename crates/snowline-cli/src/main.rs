use clap::{Parser, Subcommand};
use snowline_report::CacheMode;
use tracing_subscriber::EnvFilter;

mod outcomes;
mod sweep;

#[derive(Debug, Parser)]
#[command(name = "snowline")]
#[command(about = "Snow-report survey across configured backend servers")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Enumerate every region and resort and load a report for each
    Sweep {
        /// Survey only the named server from the catalog
        #[arg(long)]
        server: Option<String>,

        /// Always fetch live; never read or write the report cache
        #[arg(long)]
        no_cache: bool,

        /// Prefix the reported server id with test_ so log scraping can
        /// separate synthetic survey traffic from real clients
        #[arg(long)]
        test_tag: bool,
    },
    /// List the regions advertised by each configured server
    Regions {
        /// Check only the named server from the catalog
        #[arg(long)]
        server: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = snowline_core::load_app_config()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Sweep {
            server,
            no_cache,
            test_tag,
        } => {
            let mode = if no_cache {
                CacheMode::NoCache
            } else {
                CacheMode::Cached
            };
            let results = sweep::run_sweep(&config, server.as_deref(), mode, test_tag).await?;

            let mut total_errors = 0usize;
            let mut total_successes = 0usize;
            for (server_id, outcomes) in &results {
                outcomes.log_errors(server_id);
                outcomes.log_successes(server_id);
                total_errors += outcomes.error_count();
                total_successes += outcomes.success_count();
            }
            tracing::info!(
                servers = results.len(),
                successes = total_successes,
                errors = total_errors,
                "survey complete"
            );
            if total_errors > 0 {
                anyhow::bail!("{total_errors} problems found across {} servers", results.len());
            }
        }
        Commands::Regions { server } => {
            sweep::list_regions(&config, server.as_deref()).await?;
        }
    }

    Ok(())
}
