//! Reconciliation of configured records against the provider's record set
//!
//! For each domain the record list is fetched once, then every desired
//! record is compared against it and at most one create, update or delete
//! call is issued for it. The first failing call aborts the rest of that
//! domain; other domains are still processed.

use anyhow::{anyhow, bail, Context as _, Result};
use indexmap::IndexMap;
use tracing::{debug, error, info};

use crate::config::{Config, DomainConfig, RecordConfig};
use crate::constants::{EXIT_DOMAIN_FAILED, EXIT_NO_DOMAINS, EXIT_SUCCESS};
use crate::dns_provider::{DnsProvider, DomainRecord, RecordList};
use crate::ip_discovery::{CurrentIps, IpDiscovery};
use crate::metrics;

//==============================================================================
// Types
//==============================================================================

/// What has to happen to converge one record
#[derive(Debug, Clone, PartialEq)]
pub enum RecordAction {
    /// Already converged, or nothing to create and nothing to remove
    Noop,
    /// No record exists; create this one
    Create(DomainRecord),
    /// Record `id` exists with another value; replace it with `record`
    Update { id: u64, record: DomainRecord },
    /// Record `id` exists but no value is desired
    Delete { id: u64 },
}

impl RecordAction {
    pub fn kind(&self) -> &'static str {
        match self {
            RecordAction::Noop => "noop",
            RecordAction::Create(_) => "create",
            RecordAction::Update { .. } => "update",
            RecordAction::Delete { .. } => "delete",
        }
    }
}

/// Per-domain action counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DomainSummary {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub unchanged: usize,
}

impl DomainSummary {
    fn count(&mut self, action: &RecordAction) {
        match action {
            RecordAction::Noop => self.unchanged += 1,
            RecordAction::Create(_) => self.created += 1,
            RecordAction::Update { .. } => self.updated += 1,
            RecordAction::Delete { .. } => self.deleted += 1,
        }
    }
}

/// Result of reconciling one domain
#[derive(Debug)]
pub struct DomainOutcome {
    pub domain: String,
    pub result: Result<DomainSummary>,
}

impl DomainOutcome {
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }
}

//==============================================================================
// Planning
//==============================================================================

/// Decides the action converging `existing` towards `desired`
///
/// | existing | desired             | action |
/// |----------|---------------------|--------|
/// | no       | absent/empty        | noop   |
/// | no       | value               | create |
/// | yes      | absent/empty        | delete |
/// | yes      | equal to existing   | noop   |
/// | yes      | different value     | update (payload without id) |
pub fn plan(
    record: &RecordConfig,
    desired: Option<&str>,
    existing: Option<&DomainRecord>,
) -> Result<RecordAction> {
    let desired = desired.filter(|v| !v.is_empty());

    let action = match (existing, desired) {
        (None, None) => RecordAction::Noop,
        (None, Some(value)) => {
            RecordAction::Create(DomainRecord::new(&record.record_type, &record.name, value))
        }
        (Some(current), None) => RecordAction::Delete {
            id: record_id(current)?,
        },
        (Some(current), Some(value)) if current.data == value => RecordAction::Noop,
        (Some(current), Some(value)) => RecordAction::Update {
            id: record_id(current)?,
            record: current.with_data(value),
        },
    };
    Ok(action)
}

fn record_id(record: &DomainRecord) -> Result<u64> {
    record
        .id
        .ok_or_else(|| anyhow!("Provider returned {} without an id", record))
}

//==============================================================================
// Reconciler
//==============================================================================

/// Drives one reconciliation pass through a [`DnsProvider`]
pub struct Reconciler<'a, P: DnsProvider + ?Sized> {
    provider: &'a P,
    ips: &'a CurrentIps,
    dry_run: bool,
}

impl<'a, P: DnsProvider + ?Sized> Reconciler<'a, P> {
    pub fn new(provider: &'a P, ips: &'a CurrentIps) -> Self {
        Self {
            provider,
            ips,
            dry_run: false,
        }
    }

    /// Plan and log actions without issuing mutating calls
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Reconciles every domain in order, never stopping at a failed one
    pub async fn run_all(&self, domains: &IndexMap<String, DomainConfig>) -> Vec<DomainOutcome> {
        let mut outcomes = Vec::with_capacity(domains.len());
        for (domain, config) in domains {
            let result = self.reconcile_domain(domain, config).await;
            match &result {
                Ok(summary) => info!(
                    "{}: done ({} created, {} updated, {} deleted, {} unchanged)",
                    domain, summary.created, summary.updated, summary.deleted, summary.unchanged
                ),
                Err(e) => {
                    metrics::record_domain_failure(domain);
                    error!("{}: failed: {:#}", domain, e);
                }
            }
            outcomes.push(DomainOutcome {
                domain: domain.clone(),
                result,
            });
        }
        outcomes
    }

    /// Converges the records of one domain
    pub async fn reconcile_domain(
        &self,
        domain: &str,
        config: &DomainConfig,
    ) -> Result<DomainSummary> {
        let Some(api_key) = config.api_key() else {
            bail!("No API key configured, skipping domain");
        };

        info!("{}: fetching records", domain);
        let existing: RecordList = self
            .provider
            .list_records(domain, api_key)
            .await
            .context("Failed to fetch records")?;
        debug!("{}: {} existing records", domain, existing.records.len());

        let mut summary = DomainSummary::default();
        for record in &config.records {
            let desired = record
                .source
                .resolve(&self.ips.ipv4, self.ips.ipv6.as_deref());
            let current = existing.find(&record.record_type, &record.name);
            let action = plan(record, desired, current)
                .with_context(|| format!("{} {}", record.record_type, record.name))?;

            self.apply(domain, api_key, record, action.clone())
                .await
                .with_context(|| {
                    format!("{} {} {}", action.kind(), record.record_type, record.name)
                })?;
            metrics::record_action(domain, action.kind());
            summary.count(&action);
        }

        Ok(summary)
    }

    async fn apply(
        &self,
        domain: &str,
        api_key: &str,
        record: &RecordConfig,
        action: RecordAction,
    ) -> Result<()> {
        let prefix = if self.dry_run { "[dry-run] " } else { "" };
        match action {
            RecordAction::Noop => {
                debug!(
                    "{}: {} {} unchanged",
                    domain, record.record_type, record.name
                );
            }
            RecordAction::Create(new_record) => {
                info!(
                    "{}{}: creating {} {} -> {}",
                    prefix, domain, record.record_type, record.name, new_record.data
                );
                if !self.dry_run {
                    let created = self
                        .provider
                        .create_record(domain, api_key, &new_record)
                        .await?;
                    debug!("{}: created {}", domain, created);
                }
            }
            RecordAction::Update { id, record: payload } => {
                info!(
                    "{}{}: updating {} {} -> {} (ID: {})",
                    prefix, domain, record.record_type, record.name, payload.data, id
                );
                if !self.dry_run {
                    let updated = self
                        .provider
                        .update_record(domain, api_key, id, &payload)
                        .await?;
                    debug!("{}: updated {}", domain, updated);
                }
            }
            RecordAction::Delete { id } => {
                info!(
                    "{}{}: deleting {} {} (ID: {})",
                    prefix, domain, record.record_type, record.name, id
                );
                if !self.dry_run {
                    self.provider.delete_record(domain, api_key, id).await?;
                }
            }
        }
        Ok(())
    }
}

/// One complete pass: discover addresses, then reconcile every domain
///
/// Returns an empty outcome list without touching the network when no
/// domain is configured. IPv4 discovery failure is returned as an error.
pub async fn run<P: DnsProvider + ?Sized>(
    config: &Config,
    discovery: &IpDiscovery,
    provider: &P,
    dry_run: bool,
) -> Result<Vec<DomainOutcome>> {
    if config.domains.is_empty() {
        error!("No domains configured");
        return Ok(Vec::new());
    }
    if dry_run {
        info!("Dry run: no records will be changed");
    }

    let ips = discovery.discover().await?;
    let outcomes = Reconciler::new(provider, &ips)
        .dry_run(dry_run)
        .run_all(&config.domains)
        .await;

    let failed: Vec<&str> = outcomes
        .iter()
        .filter(|o| !o.succeeded())
        .map(|o| o.domain.as_str())
        .collect();
    if failed.is_empty() {
        info!("All {} domains reconciled", outcomes.len());
    } else {
        error!(
            "{} of {} domains failed: {}",
            failed.len(),
            outcomes.len(),
            failed.join(", ")
        );
    }

    Ok(outcomes)
}

/// Maps per-domain outcomes to the process exit code
///
/// 0 when every domain succeeded, 1 when no domain is configured, 2 when
/// any domain failed.
pub fn exit_status(outcomes: &[DomainOutcome]) -> u8 {
    if outcomes.is_empty() {
        EXIT_NO_DOMAINS
    } else if outcomes.iter().all(DomainOutcome::succeeded) {
        EXIT_SUCCESS
    } else {
        EXIT_DOMAIN_FAILED
    }
}

//==============================================================================
// Tests
//==============================================================================
