use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use crawler_analyzer::{analyze, Enricher, NullEnricher};
use crawler_discovery::{likely_mcp, CargoDiscoverer, Discoverer, GoDiscoverer, NpmDiscoverer, PypiDiscoverer};
use crawler_http::Fetcher;
use crawler_ids::{CollectionId, RunId};
use crawler_intel::{classify_health, collect, CollectorConfig};
use crawler_protocol::{CrawlerConfig, Ecosystem};
use crawler_scrape::{CargoScraper, GoScraper, NpmScraper, PypiScraper, Scraper};
use crawler_store::{normalize_and_merge, RunCounters, Store};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::cancellation::CancelToken;
use crate::error::OrchestratorError;
use crate::metrics::Metrics;
use crate::status::RunCompletionStatus;

/// Wires discovery, scraping, analysis, live validation, and persistence
/// into one bounded-concurrency pipeline. One instance owns one run at a
/// time; a second `run_once` while a run is active is rejected, matching
/// the "only one run may be active" scheduling rule.
pub struct Orchestrator {
    config: CrawlerConfig,
    store: Arc<Store>,
    fetcher: Arc<Fetcher>,
    discoverers: Vec<Arc<dyn Discoverer>>,
    scrapers: HashMap<Ecosystem, Arc<dyn Scraper>>,
    active: Arc<tokio::sync::Mutex<Option<CancelToken>>>,
}

impl Orchestrator {
    pub fn new(config: CrawlerConfig, store: Store) -> Self {
        let fetcher = Arc::new(Fetcher::new(
            config.rate_limits.registry_qps,
            config.rate_limits.repo_api_qps,
            config.rate_limits.doc_site_qps,
            config.rate_limits.generic_qps,
        ));

        let discoverers: Vec<Arc<dyn Discoverer>> = vec![
            Arc::new(NpmDiscoverer::new(fetcher.clone(), &config)),
            Arc::new(PypiDiscoverer::new(fetcher.clone(), &config)),
            Arc::new(CargoDiscoverer::new(fetcher.clone(), &config)),
            Arc::new(GoDiscoverer::new(fetcher.clone(), &config)),
        ];

        let mut scrapers: HashMap<Ecosystem, Arc<dyn Scraper>> = HashMap::new();
        scrapers.insert(Ecosystem::Npm, Arc::new(NpmScraper::new(fetcher.clone(), config.github_token.clone())));
        scrapers.insert(Ecosystem::Pypi, Arc::new(PypiScraper::new(fetcher.clone(), config.github_token.clone())));
        scrapers.insert(Ecosystem::Cargo, Arc::new(CargoScraper::new(fetcher.clone(), config.github_token.clone())));
        scrapers.insert(Ecosystem::Go, Arc::new(GoScraper::new(fetcher.clone(), config.github_token.clone())));

        Self {
            config,
            store: Arc::new(store),
            fetcher,
            discoverers,
            scrapers,
            active: Arc::new(tokio::sync::Mutex::new(None)),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Requests cancellation of whatever run is currently active, if any.
    /// A no-op when idle.
    pub async fn cancel_active_run(&self) {
        if let Some(token) = self.active.lock().await.as_ref() {
            token.cancel();
        }
    }

    pub async fn is_active(&self) -> bool {
        self.active.lock().await.is_some()
    }

    /// Runs one full discovery-through-persistence pass. Returns
    /// `RunAlreadyActive` instead of queuing behind a concurrent run,
    /// matching the "a second trigger while a run is active is skipped"
    /// scheduling rule — callers decide whether "skipped" means "logged
    /// and dropped" (the scheduler) or "reported to the operator" (the
    /// CLI's `run-once`).
    pub async fn run_once(&self, metrics: &Metrics) -> Result<RunOutcome, OrchestratorError> {
        let token = {
            let mut guard = self.active.lock().await;
            if guard.is_some() {
                return Err(OrchestratorError::RunAlreadyActive);
            }
            let token = CancelToken::new();
            *guard = Some(token.clone());
            token
        };

        let run_id = RunId::new();
        let started_at = Utc::now();
        self.store.record_run_start(&run_id).await?;
        info!(run_id = %run_id, "run started");

        let result = tokio::time::timeout(
            self.config.timeouts.run_wall_clock(),
            self.execute(&run_id, &token, metrics),
        )
        .await;

        *self.active.lock().await = None;

        let (status, counters) = match result {
            Ok(Ok(counters)) => (RunCompletionStatus::Completed, counters),
            Ok(Err(_)) => (RunCompletionStatus::Failed, metrics.snapshot().into()),
            Err(_) => {
                warn!(run_id = %run_id, "run exceeded its wall-clock budget");
                token.cancel();
                (RunCompletionStatus::Failed, metrics.snapshot().into())
            }
        };

        self.store.record_run_complete(&run_id, &counters, status.as_str()).await?;
        let completed_at = Utc::now();

        Ok(RunOutcome {
            run_id: run_id.to_string(),
            started_at,
            completed_at,
            status,
            counts: metrics.snapshot(),
        })
    }

    async fn execute(&self, run_id: &RunId, token: &CancelToken, metrics: &Metrics) -> Result<RunCounters, OrchestratorError> {
        let candidates = self.discover(token, metrics).await;
        let capped: Vec<_> = candidates.into_iter().take(self.config.max_candidates_per_run).collect();

        // Scraping and filtering share one `Scraper::scrape` call: the
        // registry-detail fetch filtering needs is not separable from the
        // repo/doc fetches a scraper also performs in the same round trip.
        // Candidates the filter rejects pay for the fetch but not for
        // anything downstream.
        let scrape_semaphore = Arc::new(Semaphore::new(self.config.concurrency.scrape_workers.max(1)));
        let mut scrape_set = JoinSet::new();
        for candidate in capped {
            if token.is_cancelled() {
                break;
            }
            let Some(scraper) = self.scrapers.get(&candidate.ecosystem).cloned() else {
                continue;
            };
            let permit = scrape_semaphore.clone().acquire_owned().await.expect("semaphore never closed");
            scrape_set.spawn(async move {
                let _permit = permit;
                let bundle = scraper.scrape(&candidate).await;
                (candidate, bundle)
            });
        }

        let mut scraped = Vec::new();
        while let Some(joined) = scrape_set.join_next().await {
            let (candidate, bundle) = joined.expect("scrape task does not panic");
            match bundle {
                Ok(bundle) => {
                    Metrics::incr(&metrics.candidates_scraped);
                    if likely_mcp(&candidate, &bundle.registry, &self.config.filter) {
                        Metrics::incr(&metrics.candidates_filtered);
                        scraped.push((candidate, bundle));
                    }
                }
                Err(e) => {
                    warn!(identifier = %candidate.identifier, error = %e, "scrape failed");
                    Metrics::incr(&metrics.errors);
                }
            }
        }

        let intel_semaphore = Arc::new(Semaphore::new(self.config.concurrency.intel_pool_size.max(1)));
        let collector_config = Arc::new(CollectorConfig {
            scratch_base_dir: std::env::temp_dir().join("mcp-registry-crawler-scratch"),
            timeouts: self.config.timeouts.clone(),
        });

        let mut validate_set = JoinSet::new();
        for (candidate, bundle) in scraped {
            if token.is_cancelled() {
                break;
            }
            // A first pass, without a live report, exists only to pick the
            // install/run command `collect` needs. The analysis actually
            // persisted is re-derived below with the live report in hand,
            // so the authoritative tool list can enrich descriptions rather
            // than being discarded in favor of the doc-only pass.
            let pre_analysis = analyze(&candidate, &bundle, None);

            let permit = intel_semaphore.clone().acquire_owned().await.expect("semaphore never closed");
            let collector_config = collector_config.clone();
            let run_command = pre_analysis
                .installation_methods
                .iter()
                .min_by_key(|m| m.priority)
                .map(|m| m.command.clone())
                .unwrap_or_else(|| candidate.identifier.clone());

            validate_set.spawn(async move {
                let _permit = permit;
                let collection_id = CollectionId::new();
                let report = collect(&candidate, &run_command, &run_command, &collection_id, &collector_config).await;
                let analysis = NullEnricher.enrich(analyze(&candidate, &bundle, Some(&report))).await;
                (candidate, bundle, analysis, report)
            });
        }

        let mut counters = RunCounters::default();
        counters.candidates_discovered = metrics.candidates_discovered.load(Ordering::Relaxed) as usize;
        counters.candidates_filtered = metrics.candidates_filtered.load(Ordering::Relaxed) as usize;

        while let Some(joined) = validate_set.join_next().await {
            let (candidate, bundle, analysis, report) = joined.expect("validation task does not panic");
            Metrics::incr(&metrics.candidates_validated);
            counters.candidates_validated += 1;

            let handshake_ok = report.protocol_version.is_some() || !report.tools.is_empty();
            let health = classify_health(handshake_ok, &report);

            let (existing, match_kind) = match self
                .store
                .find_existing(
                    &analysis.slug_base,
                    candidate.ecosystem,
                    &candidate.identifier,
                    candidate.declared_repository_url.as_deref(),
                    analysis.installation_methods.first().map(|m| m.command.as_str()),
                )
                .await
            {
                Ok(Some((record, kind))) => (Some(record), Some(kind)),
                Ok(None) => (None, None),
                Err(e) => {
                    warn!(identifier = %candidate.identifier, error = %e, "dedup lookup failed");
                    Metrics::incr(&metrics.errors);
                    counters.errors += 1;
                    (None, None)
                }
            };

            let canonical = normalize_and_merge(&candidate, &bundle, &analysis, Some(&report), health, existing);

            match self.store.upsert(&canonical, match_kind).await {
                Ok(_) => {
                    Metrics::incr(&metrics.records_upserted);
                    counters.records_upserted += 1;
                }
                Err(e) => {
                    warn!(identifier = %candidate.identifier, error = %e, "upsert failed");
                    Metrics::incr(&metrics.errors);
                    counters.errors += 1;
                }
            }
        }

        let _ = run_id;
        Ok(counters)
    }

    async fn discover(&self, token: &CancelToken, metrics: &Metrics) -> Vec<crawler_protocol::Candidate> {
        let mut discover_set = JoinSet::new();
        for discoverer in &self.discoverers {
            let discoverer = discoverer.clone();
            let seeds = self.config.filter.seed_keywords.clone();
            discover_set.spawn(async move { discoverer.discover(&seeds).await });
        }

        let mut candidates = Vec::new();
        while let Some(joined) = discover_set.join_next().await {
            match joined.expect("discovery task does not panic") {
                Ok(found) => candidates.extend(found),
                Err(e) => warn!(error = %e, "discoverer failed"),
            }
        }
        metrics.candidates_discovered.fetch_add(candidates.len() as u64, Ordering::Relaxed);

        if token.is_cancelled() {
            return Vec::new();
        }
        candidates
    }
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub status: RunCompletionStatus,
    pub counts: crate::metrics::MetricsSnapshot,
}

impl From<crate::metrics::MetricsSnapshot> for RunCounters {
    fn from(snapshot: crate::metrics::MetricsSnapshot) -> Self {
        RunCounters {
            candidates_discovered: snapshot.candidates_discovered as usize,
            candidates_filtered: snapshot.candidates_filtered as usize,
            candidates_scraped: snapshot.candidates_scraped as usize,
            candidates_validated: snapshot.candidates_validated as usize,
            records_upserted: snapshot.records_upserted as usize,
            errors: snapshot.errors as usize,
        }
    }
}
