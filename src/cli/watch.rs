//! Watch command: print source change events as JSON lines.

use std::path::PathBuf;

use anyhow::{Context, Result};
use futures::StreamExt;
use tracing::info;

use muster::config::Config;
use muster::{EventMultiplexer, Notifier, ServiceRef, SourceWatcher};

/// Service name used when `--service` is not given.
fn default_service_name(dir: &std::path::Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "source".to_string())
}

/// Watch `dir` until Ctrl+C, printing one JSON event per line on stdout.
pub(crate) async fn cmd_watch(
    dir: PathBuf,
    service: Option<String>,
    version: Option<String>,
    fanout: bool,
) -> Result<()> {
    let config = Config::load().context("Failed to load config")?;

    let name = service.unwrap_or_else(|| default_service_name(&dir));
    let mut svc = ServiceRef::new(&name);
    if let Some(v) = version.as_deref() {
        svc = svc.with_version(v);
    }

    let watcher = SourceWatcher::new(svc, &dir, &config.watcher)
        .with_context(|| format!("Failed to watch {}", dir.display()))?;

    let notifier: Box<dyn Notifier> = if fanout {
        let managed = config.profile.managed_set();
        info!(services = managed.len(), "Fanning out over platform services");
        Box::new(EventMultiplexer::with_capacity(
            watcher,
            managed,
            config.watcher.queue_capacity,
        ))
    } else {
        Box::new(watcher)
    };

    let mut events = notifier.notify().context("Failed to start watcher")?;
    info!(
        dir = %dir.display(),
        notifier = notifier.name(),
        "Watching for changes (Ctrl+C to stop)"
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping watcher");
                break;
            }
            next = events.next() => match next {
                Some(event) => println!("{}", serde_json::to_string(&event)?),
                None => break,
            },
        }
    }

    notifier.close().context("Failed to stop watcher")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_default_service_name() {
        assert_eq!(default_service_name(Path::new("/src/billing")), "billing");
        assert_eq!(default_service_name(Path::new("/")), "source");
    }
}
