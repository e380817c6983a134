use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use crate::config::Config;
use crate::diff::{compare, Comparison};
use crate::notify::report::{render_failure, render_report, render_storage_notice};
use crate::notify::{build_notifiers, Notifier};
use crate::snapshot::store::{build_store_chain, StoreChain};
use crate::snapshot::Snapshot;
use crate::source::{build_source, SnapshotSource};

/// The only fatal condition in a run. Store and parse trouble is recovered
/// inside the pipeline; a run that cannot capture a snapshot notifies the
/// failure and leaves the stored baseline untouched.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("snapshot source unavailable: {0:#}")]
    SourceUnavailable(anyhow::Error),
}

#[derive(Debug)]
pub struct RunReport {
    pub current: Snapshot,
    pub baseline_established: bool,
    pub comparison: Comparison,
    pub saved_to: Option<String>,
}

/// One full pipeline pass with the configured collaborators.
pub async fn run_once(config: &Config) -> Result<RunReport, RunError> {
    let notifiers = build_notifiers(config);
    let source = match build_source(config) {
        Ok(source) => source,
        Err(err) => {
            broadcast(&notifiers, &render_failure(&format!("{err:#}"))).await;
            return Err(RunError::SourceUnavailable(err));
        }
    };
    let stores = build_store_chain(config);
    run_pipeline(config, source.as_ref(), &stores, &notifiers).await
}

/// Capture, load, compare, notify, persist. Persisting runs last so a
/// failed run never clobbers the last-known-good baseline, and a persist
/// failure never suppresses the report that was already computed.
pub async fn run_pipeline(
    config: &Config,
    source: &dyn SnapshotSource,
    stores: &StoreChain,
    notifiers: &[Box<dyn Notifier>],
) -> Result<RunReport, RunError> {
    let current = match source.fetch().await {
        Ok(snapshot) => snapshot,
        Err(err) => {
            let reason = format!(
                "could not capture attendance from {}: {err:#}",
                source.describe()
            );
            warn!("{reason}");
            broadcast(notifiers, &render_failure(&reason)).await;
            return Err(RunError::SourceUnavailable(err));
        }
    };

    let previous = stores.load().await;
    let baseline_established = previous.is_none();
    let comparison = compare(&current, previous.as_ref());
    for warning in &comparison.warnings {
        warn!(
            subject = %warning.subject,
            "attended count exceeds held count ({}/{})",
            warning.classes_attended,
            warning.classes_held
        );
    }

    let report = render_report(
        &current,
        &comparison,
        baseline_established,
        config.severity.thresholds(),
        config.severity.parse_policy,
    );
    broadcast(notifiers, &report).await;

    let save = stores.save(&current).await;
    if save.saved_to.is_none() {
        warn!("every snapshot store failed, baseline not advanced");
        broadcast(notifiers, &render_storage_notice(&save.failures)).await;
    }

    info!(
        subjects = current.subjects.len(),
        events = comparison.events.len(),
        baseline = baseline_established,
        "run complete"
    );
    Ok(RunReport {
        current,
        baseline_established,
        comparison,
        saved_to: save.saved_to,
    })
}

/// Repeated runs on a fixed interval. A failed iteration is a no-op with
/// respect to stored state, so the loop just continues.
pub async fn run_watch(config: &Config, interval_secs: u64, iterations: u32) {
    let interval = Duration::from_secs(interval_secs.max(1));
    let total = iterations.max(1);
    for i in 0..total {
        info!("watch iteration {}", i + 1);
        if let Err(err) = run_once(config).await {
            warn!("run failed: {err}");
        }
        if i + 1 < total {
            tokio::time::sleep(interval).await;
        }
    }
}

async fn broadcast(notifiers: &[Box<dyn Notifier>], text: &str) {
    for notifier in notifiers {
        if let Err(err) = notifier.send(text).await {
            warn!("failed sending report via {}: {err:#}", notifier.describe());
        }
    }
}
