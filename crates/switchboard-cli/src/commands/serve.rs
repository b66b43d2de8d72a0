use std::sync::Arc;
use std::time::Duration;
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use tracing::info;

use switchboard_config::SwitchboardConfig;
use switchboard_core::Result;
use switchboard_router::{Host, watch};

use super::load_router;

pub(super) async fn cmd_serve(config: &SwitchboardConfig, watch_flag: bool) -> Result<()> {
    let router = Arc::new(load_router(config).await?);

    let _watcher = if watch_flag || config.watch.enabled {
        Some(watch(
            Arc::clone(router.live()),
            Duration::from_millis(config.watch.debounce_ms),
        )?)
    } else {
        None
    };

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, shutting down");
            signal.cancel();
        }
    });

    let host = Host::new(router);
    host.serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout(), shutdown)
        .await?;
    Ok(())
}
