//! Periodic polling driver.

use chrono::{DateTime, Utc};
use flarewatch::CloudflareMetrics;
use tokio::{
    sync::watch,
    task::JoinSet,
    time::{self, MissedTickBehavior},
};

use std::{collections::HashMap, fmt, sync::Arc, time::Instant};

use crate::{
    batch::{batch, Batch},
    client::{ApiError, CloudflareClient},
    config::PollerConfig,
    fetch::AnalyticsFetcher,
    mapper::MetricMapper,
    resources::{filter_zones, Account, ResourceDirectory, ZoneIndex},
    rules::RuleDescriptions,
    window::QueryWindow,
};


/// Query family. Each family is fetched and mapped by a separate pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Family {
    /// 1-minute HTTP request totals. Keyed by zone; available on all plans.
    ZoneTotals,
    /// Firewall, health check and HTTP status breakdowns. Keyed by zone; paid-only.
    ZoneAdaptive,
    /// Per-colocation request stats. Keyed by zone; paid-only.
    Colocation,
    /// Load balancer pool stats. Keyed by zone; paid-only.
    LoadBalancer,
    /// Failed logpush jobs for zones. Keyed by zone; paid-only.
    LogpushZone,
    /// Worker invocation stats. Keyed by account; available on all plans.
    Workers,
    /// Failed logpush jobs for accounts. Keyed by account; paid-only.
    LogpushAccount,
}

impl Family {
    /// Families keyed by zone batches.
    pub const ZONE: [Self; 5] = [
        Self::ZoneTotals,
        Self::ZoneAdaptive,
        Self::Colocation,
        Self::LoadBalancer,
        Self::LogpushZone,
    ];
    /// Families keyed by accounts.
    pub const ACCOUNT: [Self; 2] = [Self::Workers, Self::LogpushAccount];

    /// Returns the family name, which is the same as the name of the GraphQL operation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ZoneTotals => "ZoneTotals",
            Self::ZoneAdaptive => "ZoneAdaptive",
            Self::Colocation => "Colocation",
            Self::LoadBalancer => "LoadBalancer",
            Self::LogpushZone => "LogpushZone",
            Self::Workers => "Workers",
            Self::LogpushAccount => "LogpushAccount",
        }
    }

    /// Checks whether this family is unavailable on the free plan.
    pub fn is_paid_only(self) -> bool {
        !matches!(self, Self::ZoneTotals | Self::Workers)
    }
}

impl fmt::Display for Family {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PipelineOutcome {
    Applied,
    Skipped,
    Failed,
}

/// Summary of a single polling cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct CycleReport {
    /// Number of zones after filtering.
    pub zones: usize,
    /// Number of accounts.
    pub accounts: usize,
    /// Number of zone batches.
    pub batches: usize,
    /// Number of pipelines that fetched data and applied it.
    pub applied: usize,
    /// Number of pipelines skipped without a network call because of tier gating.
    pub skipped: usize,
    /// Number of pipelines that failed (including panicked ones).
    pub failed: usize,
}

impl CycleReport {
    /// Returns the total number of pipelines spawned in the cycle.
    pub fn pipelines(&self) -> usize {
        self.applied + self.skipped + self.failed
    }
}

#[derive(Debug)]
struct SchedulerInner {
    config: PollerConfig,
    client: Arc<CloudflareClient>,
    directory: ResourceDirectory,
    fetcher: AnalyticsFetcher,
    metrics: CloudflareMetrics,
}

impl SchedulerInner {
    fn outcome(family: Family, resource: &str, result: Result<(), ApiError>) -> PipelineOutcome {
        match result {
            Ok(()) => PipelineOutcome::Applied,
            Err(err) => {
                tracing::warn!(
                    %family,
                    resource,
                    %err,
                    "Pipeline failed; its data is skipped for this cycle"
                );
                PipelineOutcome::Failed
            }
        }
    }

    async fn run_zone_pipeline(
        self: Arc<Self>,
        family: Family,
        batch: Batch,
        window: QueryWindow,
        mapper: Arc<MetricMapper>,
    ) -> PipelineOutcome {
        let zone_ids = if family.is_paid_only() {
            if self.config.free_tier {
                return PipelineOutcome::Skipped;
            }
            let zone_ids = batch.non_free_ids();
            if zone_ids.is_empty() {
                return PipelineOutcome::Skipped;
            }
            zone_ids
        } else {
            batch.ids()
        };

        tracing::trace!(%family, batch_len = zone_ids.len(), "Running zone pipeline");
        let fetcher = &self.fetcher;
        let result = match family {
            Family::ZoneTotals => fetcher
                .zone_totals(&zone_ids, &window)
                .await
                .map(|zones| mapper.apply_zone_totals(&zones)),
            Family::ZoneAdaptive => self.fetch_zone_adaptive(&zone_ids, &window, &mapper).await,
            Family::Colocation => fetcher
                .colocation(&zone_ids, &window)
                .await
                .map(|zones| mapper.apply_colocation(&zones)),
            Family::LoadBalancer => fetcher
                .load_balancers(&zone_ids, &window)
                .await
                .map(|zones| mapper.apply_load_balancers(&zones)),
            Family::LogpushZone => fetcher
                .logpush_zones(&zone_ids, &window)
                .await
                .map(|zones| mapper.apply_logpush_zones(&zones)),
            Family::Workers | Family::LogpushAccount => {
                tracing::error!(%family, "Account family scheduled for a zone batch");
                return PipelineOutcome::Skipped;
            }
        };
        Self::outcome(family, &zone_ids.join(","), result)
    }

    async fn fetch_zone_adaptive(
        &self,
        zone_ids: &[String],
        window: &QueryWindow,
        mapper: &MetricMapper,
    ) -> Result<(), ApiError> {
        let zones = self.fetcher.zone_adaptive(zone_ids, window).await?;
        let mut rules = HashMap::new();
        let zones_with_events = zones
            .iter()
            .filter(|zone| !zone.firewall_events_adaptive_groups.is_empty());
        for zone in zones_with_events {
            let descriptions = RuleDescriptions::fetch(&self.client, &zone.zone_tag).await;
            rules.insert(zone.zone_tag.clone(), descriptions);
        }
        mapper.apply_zone_adaptive(&zones, &rules);
        Ok(())
    }

    async fn run_account_pipeline(
        self: Arc<Self>,
        family: Family,
        account: Account,
        window: QueryWindow,
        mapper: Arc<MetricMapper>,
    ) -> PipelineOutcome {
        if family.is_paid_only() && self.config.free_tier {
            return PipelineOutcome::Skipped;
        }

        tracing::trace!(%family, account_id = account.id.as_str(), "Running account pipeline");
        let fetcher = &self.fetcher;
        let result = match family {
            Family::Workers => fetcher
                .workers(&account.id, &window)
                .await
                .map(|results| mapper.apply_workers(&account, &results)),
            Family::LogpushAccount => fetcher
                .logpush_account(&account.id, &window)
                .await
                .map(|results| mapper.apply_logpush_account(&account, &results)),
            _ => {
                tracing::error!(%family, "Zone family scheduled for an account");
                return PipelineOutcome::Skipped;
            }
        };
        Self::outcome(family, &account.id, result)
    }
}

/// Periodically polls the upstream API and updates metrics.
///
/// Each tick starts a polling cycle without waiting for the previous one, so cycles may overlap.
/// Within a cycle, all pipelines (query families for each zone batch or account) run concurrently;
/// a failure of one pipeline does not affect others.
#[derive(Debug, Clone)]
pub struct Scheduler {
    inner: Arc<SchedulerInner>,
}

impl Scheduler {
    /// Creates a scheduler that will update the provided metrics.
    pub fn new(config: PollerConfig, metrics: CloudflareMetrics) -> Self {
        let client = Arc::new(CloudflareClient::new(&config));
        let inner = SchedulerInner {
            directory: ResourceDirectory::new(client.clone()),
            fetcher: AnalyticsFetcher::new(client.clone()),
            client,
            config,
            metrics,
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Checks upstream reachability and credentials by listing zones. Returns the number of visible zones.
    ///
    /// # Errors
    ///
    /// Returns an error if zones cannot be listed.
    pub async fn check_upstream(&self) -> Result<usize, ApiError> {
        let zones = self.inner.directory.list_zones().await?;
        Ok(zones.len())
    }

    /// Runs a single polling cycle for the current time.
    ///
    /// # Errors
    ///
    /// Returns an error if zones or accounts cannot be listed; in this case, the cycle is abandoned
    /// and no metrics are updated.
    pub async fn run_cycle(&self) -> Result<CycleReport, ApiError> {
        self.run_cycle_at(Utc::now()).await
    }

    /// Runs a single polling cycle as if the current time was `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if zones or accounts cannot be listed.
    pub async fn run_cycle_at(&self, now: DateTime<Utc>) -> Result<CycleReport, ApiError> {
        let inner = &self.inner;
        let started_at = Instant::now();
        let window = QueryWindow::new(now, inner.config.scrape_delay);

        let (zones, accounts) = tokio::try_join!(
            inner.directory.list_zones(),
            inner.directory.list_accounts()
        )?;
        let zones = filter_zones(zones, &inner.config.include_zones, &inner.config.exclude_zones);
        let batches = batch(&zones, inner.config.batch_size);
        let mapper = Arc::new(MetricMapper::new(
            inner.metrics.clone(),
            Arc::new(ZoneIndex::new(&zones)),
        ));
        tracing::debug!(
            since = %window.since_rfc3339(),
            until = %window.until_rfc3339(),
            zone_count = zones.len(),
            account_count = accounts.len(),
            batch_count = batches.len(),
            "Starting polling cycle"
        );

        let mut pipelines = JoinSet::new();
        for batch in &batches {
            for family in Family::ZONE {
                let pipeline =
                    inner
                        .clone()
                        .run_zone_pipeline(family, batch.clone(), window, mapper.clone());
                pipelines.spawn(pipeline);
            }
        }
        for account in &accounts {
            for family in Family::ACCOUNT {
                let pipeline =
                    inner
                        .clone()
                        .run_account_pipeline(family, account.clone(), window, mapper.clone());
                pipelines.spawn(pipeline);
            }
        }

        let mut report = CycleReport {
            zones: zones.len(),
            accounts: accounts.len(),
            batches: batches.len(),
            ..CycleReport::default()
        };
        while let Some(result) = pipelines.join_next().await {
            match result {
                Ok(PipelineOutcome::Applied) => report.applied += 1,
                Ok(PipelineOutcome::Skipped) => report.skipped += 1,
                Ok(PipelineOutcome::Failed) => report.failed += 1,
                Err(err) => {
                    tracing::error!(%err, "Pipeline panicked");
                    report.failed += 1;
                }
            }
        }

        tracing::debug!(
            elapsed = ?started_at.elapsed(),
            pipelines = report.pipelines(),
            applied = report.applied,
            skipped = report.skipped,
            failed = report.failed,
            "Finished polling cycle"
        );
        Ok(report)
    }

    /// Runs the polling loop until a stop signal is received. The first cycle starts immediately.
    pub async fn run(self, mut stop_receiver: watch::Receiver<()>) {
        let interval = self.inner.config.scrape_interval;
        let mut timer = time::interval(interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(?interval, "Started polling loop");

        loop {
            tokio::select! {
                _ = timer.tick() => {}
                _ = stop_receiver.changed() => break,
            }

            let scheduler = self.clone();
            tokio::spawn(async move {
                if let Err(err) = scheduler.run_cycle().await {
                    tracing::warn!(%err, "Cannot list resources; polling cycle is abandoned");
                }
            });
        }
        tracing::info!("Stop signal received, polling loop is shut down");
    }
}
