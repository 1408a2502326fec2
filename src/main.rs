//! proxvoiced - proximity voice router daemon.
//!
//! Replays a JSON-lines host event feed (file or stdin) through the router
//! against in-memory voice servers and logs every routing decision.

use proxvoice::config::{Config, validation};
use proxvoice::dispatch::{Dispatcher, ServerFilter};
use proxvoice::host::ServerCallbacks;
use proxvoice::replay::Replay;
use proxvoice::router::{Router, RouterSettings};
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let mut args = std::env::args().skip(1);
    let config_path = args.next().unwrap_or_else(|| "proxvoice.toml".to_string());
    let feed_path = args.next();

    let config = Config::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    if let Err(errors) = validation::validate(&config) {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        anyhow::bail!("{} configuration error(s) in {}", errors.len(), config_path);
    }

    let settings = RouterSettings::from_config(&config)?;
    info!(
        signature = %settings.signature,
        maps = settings.world_maps.len(),
        remove_empty_groups = settings.remove_empty_groups,
        "Starting proxvoiced"
    );

    proxvoice::metrics::init();
    if let Some(metrics) = config.metrics.clone() {
        tokio::spawn(proxvoice::http::run_http_server(metrics));
    }

    let router = Arc::new(Router::new(settings));
    let callbacks: Arc<dyn ServerCallbacks> = router.clone();
    let filter = ServerFilter::from_ids(&config.router.servers);
    let dispatcher = Arc::new(Dispatcher::new(callbacks, filter));
    let mut replay = Replay::new(dispatcher);

    let summary = match &feed_path {
        Some(path) => {
            let file = tokio::fs::File::open(path).await.map_err(|e| {
                error!(path = %path, error = %e, "Failed to open event feed");
                e
            })?;
            replay.run(BufReader::new(file)).await?
        }
        None => replay.run(BufReader::new(tokio::io::stdin())).await?,
    };

    for (server_id, tree) in replay.trees() {
        info!(server_id, "Channel tree:\n{}", tree.trim_end());
        if let Some(sessions) = router.dump(server_id).await {
            debug!(server_id, sessions = %sessions, "Tracked sessions");
        }
    }
    info!(
        events = summary.events,
        rejected = summary.rejected,
        echoed = summary.echoed,
        failed = summary.failed,
        "Replay finished"
    );

    if config.metrics.is_some() {
        info!("Metrics endpoint still serving, press Ctrl-C to exit");
        tokio::signal::ctrl_c().await?;
    }

    Ok(())
}
