use std::fmt::Display;
use std::time::Duration;

use futures::future::join_all;
use job_filter::{
    all_of, filter_postings, new_postings, unique_by_identity, LevelFilter, Platform, Posting,
    PostingFilter, RecencyFilter,
};
use job_scraper::{CollectQuery, Collector};
use notifier::Notifier;
use persistence::SnapshotFile;
use tokio::sync::{watch, Mutex};

use crate::config::Settings;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Collecting,
    Classifying,
    Deduping,
    Persisting,
    Notifying,
}

/// What happened during one cycle.
#[derive(Debug, Default, Clone)]
pub struct CycleReport {
    pub collected: usize,
    pub accepted: usize,
    pub new: Vec<Posting>,
    pub failed_sources: Vec<Platform>,
    pub persisted: bool,
    pub notified: bool,
}

impl Display for CycleReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} collected, {} accepted, {} new",
            self.collected,
            self.accepted,
            self.new.len()
        )?;
        if !self.failed_sources.is_empty() {
            let failed = self
                .failed_sources
                .iter()
                .map(Platform::name)
                .collect::<Vec<_>>();
            write!(f, ", failed sources: {}", failed.join(", "))?;
        }
        if !self.persisted {
            f.write_str(", snapshot not saved")?;
        }
        if !self.notified {
            f.write_str(", notification failed")?;
        }
        Ok(())
    }
}

/// Collect, classify, diff against the last snapshot, persist and notify.
pub struct Pipeline {
    query: CollectQuery,
    level_filter: LevelFilter,
    source_timeout: Duration,
    collectors: Vec<Box<dyn Collector>>,
    snapshot: SnapshotFile,
    notifier: Box<dyn Notifier>,
    stage: watch::Sender<Stage>,
    cycle_lock: Mutex<()>,
}

impl Pipeline {
    pub fn new(
        settings: &Settings,
        collectors: Vec<Box<dyn Collector>>,
        snapshot: SnapshotFile,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        let (stage, _) = watch::channel(Stage::Idle);
        Self {
            query: settings.collect_query(),
            level_filter: settings.level_filter(),
            source_timeout: settings.source_timeout(),
            collectors,
            snapshot,
            notifier,
            stage,
            cycle_lock: Mutex::new(()),
        }
    }

    pub fn stage(&self) -> Stage {
        *self.stage.borrow()
    }

    fn enter(&self, stage: Stage) {
        let previous = self.stage.send_replace(stage);
        log::debug!("pipeline {:?} -> {:?}", previous, stage);
    }

    /// Runs one full cycle. Calls on a shared pipeline are serialized.
    ///
    /// Only an unreadable snapshot fails the cycle; source, save and notify
    /// failures are logged and reflected in the report.
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let _guard = self.cycle_lock.lock().await;
        log::info!("starting collection cycle");
        let result = self.cycle().await;
        self.enter(Stage::Idle);
        result
    }

    async fn cycle(&self) -> Result<CycleReport> {
        let mut report = CycleReport::default();

        self.enter(Stage::Collecting);
        let collected = self.collect_all(&mut report.failed_sources).await;
        report.collected = collected.len();

        self.enter(Stage::Classifying);
        let accepted = {
            let filters: Vec<&dyn PostingFilter> = vec![&self.level_filter, &RecencyFilter];
            unique_by_identity(filter_postings(collected, &all_of(filters)))
        };
        report.accepted = accepted.len();
        log::info!("{} of {} postings accepted", report.accepted, report.collected);

        self.enter(Stage::Deduping);
        let previous = self.snapshot.load().await?;
        report.new = new_postings(&accepted, &previous);
        log::info!("{} new postings since the last cycle", report.new.len());

        self.enter(Stage::Persisting);
        match self.snapshot.save(&accepted).await {
            Ok(()) => report.persisted = true,
            Err(e) => log::error!("failed to save snapshot: {}", e),
        }

        self.enter(Stage::Notifying);
        match self.notifier.notify(&report.new).await {
            Ok(()) => report.notified = true,
            Err(e) => log::error!("failed to notify: {}", e),
        }

        Ok(report)
    }

    async fn collect_all(&self, failed: &mut Vec<Platform>) -> Vec<Posting> {
        let runs = self.collectors.iter().map(|collector| async move {
            let platform = collector.platform();
            log::info!("collecting from {}", platform);
            let result = tokio::time::timeout(self.source_timeout, collector.collect(&self.query)).await;
            (platform, result)
        });

        let mut postings = Vec::new();
        for (platform, result) in join_all(runs).await {
            match result {
                Ok(Ok(found)) => {
                    log::info!("{} postings from {}", found.len(), platform);
                    postings.extend(found);
                }
                Ok(Err(e)) => {
                    log::error!("collection from {} failed: {}", platform, e);
                    failed.push(platform);
                }
                Err(_) => {
                    log::error!(
                        "collection from {} timed out after {}s",
                        platform,
                        self.source_timeout.as_secs()
                    );
                    failed.push(platform);
                }
            }
        }
        postings
    }
}
