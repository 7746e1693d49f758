//! Binary entrypoint for the sgen host.
use anyhow::Context;
use sgen_core::{CancellationToken, RunContext};
use sgen_host::{Host, HostConfig};
use std::path::Path;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Config path: first argument, then SGEN_CONFIG, then ./sgen.yaml
    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("SGEN_CONFIG").ok())
        .unwrap_or_else(|| "sgen.yaml".to_string());
    let config = if Path::new(&path).exists() {
        HostConfig::load(&path).with_context(|| format!("loading {}", path))?
    } else {
        tracing::info!("{} not found, using defaults", path);
        HostConfig::default()
    };
    let watch = config.watch.clone();

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupt received, cancelling");
                shutdown.cancel();
            }
        });
    }

    let mut host = Host::new(config)?;
    let mut runs = 0u64;
    loop {
        let ctx = RunContext::with_cancellation(shutdown.clone());
        let (returned, result) = tokio::task::spawn_blocking(move || {
            let result = host.run_once(&ctx);
            (host, result)
        })
        .await?;
        host = returned;

        match result {
            Ok(report) => {
                for doc in report.changed_documents() {
                    println!("{}", host.config().out_dir.join(&doc.name).display());
                }
                if watch.is_none() && report.has_errors() {
                    anyhow::bail!("{} diagnostic(s) reported", report.diagnostics.len());
                }
            }
            Err(e) if e.is_cancelled() => {
                tracing::info!("run cancelled, nothing published");
                break;
            }
            Err(e) => return Err(e.into()),
        }
        runs += 1;

        let Some(watch) = &watch else { break };
        if watch.max_runs.is_some_and(|max| runs >= max) || shutdown.is_cancelled() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(watch.interval_ms)).await;
        if shutdown.is_cancelled() {
            break;
        }
    }
    Ok(())
}
