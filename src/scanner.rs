//! Scanner coordinating extraction, registry checks and reporting.

use crate::http::{ObservedTransaction, RequestInfo, TargetId};
use crate::notify::{FindingSink, LogSink};
use crate::parser::extract_module_names;
use crate::registry::{NpmRegistry, RegistryChecker};
use crate::targets::ProcessedTargets;
use crate::types::{Finding, RegistryConfig, RegistryVerdict, Result, ScanStats};
use futures::future;
use futures::stream::{self, StreamExt};
use indicatif::ProgressBar;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Registry lookups in flight for a single target.
const DEFAULT_LOOKUP_CONCURRENCY: usize = 8;

#[derive(Debug, Default)]
struct Counters {
    observed: AtomicUsize,
    analysed: AtomicUsize,
    duplicates: AtomicUsize,
    unparseable: AtomicUsize,
    lookups: AtomicUsize,
    lookup_failures: AtomicUsize,
    findings: AtomicUsize,
}

impl Counters {
    fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> ScanStats {
        ScanStats {
            observed: self.observed.load(Ordering::Relaxed),
            analysed: self.analysed.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
            unparseable: self.unparseable.load(Ordering::Relaxed),
            lookups: self.lookups.load(Ordering::Relaxed),
            lookup_failures: self.lookup_failures.load(Ordering::Relaxed),
            findings: self.findings.load(Ordering::Relaxed),
        }
    }
}

/// Analyses observed traffic for private node module names.
///
/// Each target (scheme, host, port and path of a request) is analysed at most once
/// for the lifetime of the scanner, no matter how many times or how concurrently it
/// is observed. Only the claim of a target is serialised; extraction and registry
/// lookups for different targets run in parallel.
pub struct Scanner {
    checker: Arc<dyn RegistryChecker>,
    findings: Arc<dyn FindingSink>,
    log: Arc<dyn LogSink>,
    targets: ProcessedTargets,
    lookup_concurrency: usize,
    counters: Counters,
}

impl Scanner {
    /// Create a scanner from its collaborators.
    pub fn new(
        checker: Arc<dyn RegistryChecker>,
        findings: Arc<dyn FindingSink>,
        log: Arc<dyn LogSink>,
    ) -> Self {
        Self {
            checker,
            findings,
            log,
            targets: ProcessedTargets::new(),
            lookup_concurrency: DEFAULT_LOOKUP_CONCURRENCY,
            counters: Counters::default(),
        }
    }

    /// Create a scanner checking against the npm registry described by `config`.
    pub fn with_npm(
        config: &RegistryConfig,
        findings: Arc<dyn FindingSink>,
        log: Arc<dyn LogSink>,
    ) -> Result<Self> {
        let checker = Arc::new(NpmRegistry::new(config)?);
        Ok(Self::new(checker, findings, log))
    }

    /// Set how many registry lookups may run at once for one target.
    pub fn with_lookup_concurrency(mut self, concurrency: usize) -> Self {
        self.lookup_concurrency = concurrency.max(1);
        self
    }

    pub fn targets(&self) -> &ProcessedTargets {
        &self.targets
    }

    pub fn stats(&self) -> ScanStats {
        self.counters.snapshot()
    }

    /// Handle one observed request/response pair.
    ///
    /// Never fails: unparseable requests are skipped with a warning and registry
    /// failures count as "not public".
    pub async fn on_observed(&self, transaction: Arc<ObservedTransaction>) {
        Counters::bump(&self.counters.observed);

        let request = match transaction.request_info() {
            Ok(request) => request,
            Err(e) => {
                warn!(
                    "Skipping request to {}:{}: {}",
                    transaction.service.host, transaction.service.port, e
                );
                Counters::bump(&self.counters.unparseable);
                return;
            }
        };

        let target = request.target();
        if !self.targets.claim(&target) {
            trace!("Already analysed: {}", target);
            Counters::bump(&self.counters.duplicates);
            return;
        }

        self.analyse(&request, &target, &transaction).await;

        self.targets.complete(&target);
        Counters::bump(&self.counters.analysed);
    }

    /// Handle many transactions, up to `parallel` at a time.
    pub async fn observe_all(
        &self,
        transactions: Vec<Arc<ObservedTransaction>>,
        parallel: usize,
        progress: Option<&ProgressBar>,
    ) {
        stream::iter(transactions)
            .map(|transaction| self.on_observed(transaction))
            .buffer_unordered(parallel.max(1))
            .for_each(|_| {
                if let Some(pb) = progress {
                    pb.inc(1);
                }
                future::ready(())
            })
            .await;
    }

    /// Check a single package name, logging lookup failures.
    ///
    /// A failed lookup counts as not public, so the name gets reported.
    pub async fn is_public(&self, name: &str) -> bool {
        let verdict = self.lookup(name).await;
        self.settle(verdict)
    }

    async fn lookup(&self, name: &str) -> Result<RegistryVerdict> {
        Counters::bump(&self.counters.lookups);

        let verdict = self.checker.lookup(name).await;
        if let Err(ref e) = verdict {
            debug!("Registry lookup for {} failed: {}", name, e);
            Counters::bump(&self.counters.lookup_failures);
        }
        verdict
    }

    /// Turn a lookup result into "public or not", writing the failure line if any.
    fn settle(&self, verdict: Result<RegistryVerdict>) -> bool {
        match verdict {
            Ok(verdict) => verdict.is_public(),
            Err(e) => {
                self.log.line(&e.to_string());
                false
            }
        }
    }

    /// Check every referenced module and report the private ones.
    ///
    /// Lookups overlap, but their outcomes are settled in extraction order, so both
    /// findings and log lines (failures included) come out in that order.
    async fn analyse(
        &self,
        request: &RequestInfo,
        target: &TargetId,
        transaction: &Arc<ObservedTransaction>,
    ) {
        let candidates = extract_module_names(transaction.body_text());
        if candidates.is_empty() {
            trace!("No node modules referenced by {}", request.url);
            return;
        }

        debug!(
            "Extracted {} candidate modules from {}",
            candidates.len(),
            request.url
        );

        stream::iter(candidates)
            .map(|name| async move {
                let verdict = self.lookup(&name).await;
                (name, verdict)
            })
            .buffered(self.lookup_concurrency)
            .for_each(|(name, verdict)| {
                if !self.settle(verdict) {
                    self.report(request, target, transaction, &name);
                }
                future::ready(())
            })
            .await;
    }

    fn report(
        &self,
        request: &RequestInfo,
        target: &TargetId,
        transaction: &Arc<ObservedTransaction>,
        name: &str,
    ) {
        let finding = Finding::new(
            request.url.clone(),
            target.clone(),
            name,
            Arc::clone(transaction),
        );
        let line = finding.log_line();

        self.findings.add_finding(finding);
        self.log.line(&line);
        Counters::bump(&self.counters.findings);
    }
}
