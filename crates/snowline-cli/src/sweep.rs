//! Survey orchestration: iterate configured servers, enumerate their
//! catalogs, and load a report per resort.

use std::collections::BTreeMap;

use futures::stream::{self, StreamExt};
use snowline_core::servers::ServerConfig;
use snowline_core::AppConfig;
use snowline_report::{
    AssumeOnline, CacheMode, HttpClient, LocationFinder, Report, ReportCache, ReportFetcher,
    Server, SkiServer, TestServer,
};

use crate::outcomes::ServerOutcomes;

/// Surveys every configured server (or just `only`) and returns the
/// accumulated outcomes keyed by server id.
///
/// Catalog-level failures are recorded on that server's outcomes and halt
/// its enumeration; they never abort the run as a whole.
pub async fn run_sweep(
    config: &AppConfig,
    only: Option<&str>,
    mode: CacheMode,
    test_tag: bool,
) -> anyhow::Result<BTreeMap<String, ServerOutcomes>> {
    let selected = select_servers(config, only)?;

    let client = HttpClient::new(
        config.request_timeout_secs,
        &config.user_agent,
        config.max_retries,
        config.retry_backoff_base_ms,
    )?;
    let cache = ReportCache::new(&config.cache_dir);
    let connectivity = AssumeOnline;
    let fetcher = ReportFetcher::new(&client, &cache, &connectivity);

    let mut results = BTreeMap::new();
    for server_config in &selected {
        let ski = SkiServer::from_config(server_config)?;
        let server: Box<dyn Server> = if test_tag {
            Box::new(TestServer::new(ski))
        } else {
            Box::new(ski)
        };
        tracing::info!(
            server = %server.id(),
            name = %server_config.name,
            "surveying server"
        );

        let mut outcomes = ServerOutcomes::new();
        survey_server(
            &client,
            &fetcher,
            server.as_ref(),
            mode,
            config.max_concurrent_reports,
            &mut outcomes,
        )
        .await;
        results.insert(server.id().to_string(), outcomes);
    }
    Ok(results)
}

/// Lists the regions each configured server (or just `only`) advertises.
///
/// # Errors
///
/// Fails if any surveyed server cannot produce its catalog — the quick
/// connectivity check has nothing to fall back on.
pub async fn list_regions(config: &AppConfig, only: Option<&str>) -> anyhow::Result<()> {
    let selected = select_servers(config, only)?;

    let client = HttpClient::new(
        config.request_timeout_secs,
        &config.user_agent,
        config.max_retries,
        config.retry_backoff_base_ms,
    )?;

    let mut failures = 0usize;
    for server_config in &selected {
        let ski = SkiServer::from_config(server_config)?;
        let finder = LocationFinder::new(&client, &ski);
        match finder.regions().await {
            Ok(regions) => {
                println!("{} ({}):", server_config.name, ski.id());
                for region in regions {
                    println!("  {region}");
                }
            }
            Err(e) => {
                tracing::error!(server = %ski.id(), error = %e, "catalog enumeration failed");
                failures += 1;
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{failures} of {} servers failed catalog enumeration", selected.len());
    }
    Ok(())
}

fn select_servers(config: &AppConfig, only: Option<&str>) -> anyhow::Result<Vec<ServerConfig>> {
    let servers_file = snowline_core::load_servers(&config.servers_path)?;
    let selected: Vec<ServerConfig> = servers_file
        .servers
        .into_iter()
        .filter(|s| only.map_or(true, |name| s.name == name))
        .collect();
    if selected.is_empty() {
        anyhow::bail!(
            "no configured server named '{}' in {}",
            only.unwrap_or_default(),
            config.servers_path.display()
        );
    }
    Ok(selected)
}

async fn survey_server(
    client: &HttpClient,
    fetcher: &ReportFetcher<'_>,
    server: &dyn Server,
    mode: CacheMode,
    max_concurrent: usize,
    outcomes: &mut ServerOutcomes,
) {
    let finder = LocationFinder::new(client, server);

    let regions = match finder.regions().await {
        Ok(regions) => regions,
        Err(e) => {
            tracing::error!(server = %server.id(), error = %e, "catalog enumeration failed");
            outcomes.add_error(e.to_string());
            return;
        }
    };

    for region in &regions {
        let locations = match finder.locations(region).await {
            Ok(locations) => locations,
            Err(e) => {
                tracing::error!(server = %server.id(), region = %region, error = %e, "region enumeration failed");
                outcomes.add_error(e.to_string());
                continue;
            }
        };
        tracing::info!(
            server = %server.id(),
            region = %region,
            count = locations.len(),
            "surveying region"
        );

        let reports: Vec<Report> = stream::iter(locations)
            .map(|location| async move { fetcher.load(&location.resort, server, mode).await })
            .buffer_unordered(max_concurrent.max(1))
            .collect()
            .await;
        for report in reports {
            outcomes.process_report(report);
        }
    }
}
