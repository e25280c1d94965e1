//! Reconciliation engine
//!
//! The Reconciler is responsible for:
//! - Verifying the API token before anything can be written
//! - Fetching the current public address per record type
//! - Resolving zone and record identifiers (via [`IdentityResolver`])
//! - Deciding whether to skip, create or update
//! - Applying the decision and persisting the caches
//!
//! ## Architecture
//!
//! ```text
//!  DesiredState ──► ┌──────────────┐ ◄── IpSource (current address)
//!                   │  Reconciler  │
//!                   └──────────────┘
//!                     │         │
//!          ┌──────────┘         └──────────┐
//!          ▼                               ▼
//! ┌──────────────────┐            ┌──────────────┐
//! │ IdentityResolver │───────────►│ DnsProvider  │
//! │ (zone/record id) │            │ (API calls)  │
//! └──────────────────┘            └──────────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │   StateStore     │
//! │ (ids, last addr) │
//! └──────────────────┘
//! ```
//!
//! ## Per-type state machine
//!
//! `Start → AddressFetched → IdentityResolved → Decided{Skip|Create|Update}
//! → Applied|Failed`
//!
//! A is fully reconciled before AAAA begins. A failure for A does not stop
//! AAAA from being attempted; the run as a whole still reports failure.

pub mod identity;

pub use identity::{IdentityResolver, RecordIdentity};

use crate::config::{DesiredState, RecordType};
use crate::error::{Error, Result};
use crate::traits::{DnsProvider, IpSource, RecordPayload, RecordState, StateStore};
use std::fmt;
use tracing::{debug, error, info, warn};

/// Terminal success state for one record type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Address unchanged and not forced; no write was made
    Skipped {
        /// The current address
        address: String,
    },
    /// The record did not exist and was created
    Created {
        /// New provider record ID
        record_id: String,
        /// Applied address
        address: String,
    },
    /// The record was updated in place
    Updated {
        /// Record ID that was updated
        record_id: String,
        /// Applied address
        address: String,
        /// Whether the record ID had to be refreshed first
        recovered: bool,
    },
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Skipped { address } => write!(f, "skip ({address})"),
            Outcome::Created { record_id, address } => {
                write!(f, "created ({address}, id {record_id})")
            }
            Outcome::Updated {
                record_id, address, ..
            } => write!(f, "updated ({address}, id {record_id})"),
        }
    }
}

/// Decision taken once identity is resolved
#[derive(Debug, Clone, PartialEq, Eq)]
enum Decision {
    Skip,
    Create,
    Update { record_id: String },
}

/// Result of reconciling one record type
#[derive(Debug)]
pub struct RecordReport {
    /// Record type
    pub record_type: RecordType,
    /// Fully-qualified record name
    pub record_name: String,
    /// Terminal state
    pub result: Result<Outcome>,
}

impl RecordReport {
    /// One status line for log-based auditing
    pub fn status_line(&self) -> String {
        match &self.result {
            Ok(outcome) => format!("{} {}: {}", self.record_type, self.record_name, outcome),
            Err(e) => format!("{} {}: error: {}", self.record_type, self.record_name, e),
        }
    }
}

/// Result of a whole run
#[derive(Debug, Default)]
pub struct RunReport {
    /// One report per record type, in processing order
    pub records: Vec<RecordReport>,
}

impl RunReport {
    /// Whether every record type reached `Applied`
    pub fn is_success(&self) -> bool {
        self.records.iter().all(|report| report.result.is_ok())
    }

    /// Number of failed record types
    pub fn failures(&self) -> usize {
        self.records
            .iter()
            .filter(|report| report.result.is_err())
            .count()
    }
}

/// Core reconciliation engine
///
/// Holds an immutable desired state and the three collaborators. One call to
/// [`Reconciler::run`] is one invocation's worth of work; nothing runs in
/// the background.
pub struct Reconciler {
    /// DNS provider for lookups and writes
    provider: Box<dyn DnsProvider>,

    /// Public address discovery
    ip_source: Box<dyn IpSource>,

    /// Identifier and address caches
    state_store: Box<dyn StateStore>,

    /// Validated desired state
    desired: DesiredState,
}

impl Reconciler {
    /// Create a new reconciler
    ///
    /// Fails with `Error::Config` if the desired state does not validate, so
    /// no network call is ever made with a bad configuration.
    pub fn new(
        provider: Box<dyn DnsProvider>,
        ip_source: Box<dyn IpSource>,
        state_store: Box<dyn StateStore>,
        desired: DesiredState,
    ) -> Result<Self> {
        desired.validate()?;

        let mut desired = desired;
        desired.refresh_record_name();

        Ok(Self {
            provider,
            ip_source,
            state_store,
            desired,
        })
    }

    /// Status lines for a run that failed before any record work, one per
    /// selected record type
    pub fn abort_lines(&self, error: &Error) -> Vec<String> {
        let record_name = self.desired.record_name();
        self.desired
            .record_type
            .types()
            .iter()
            .map(|record_type| format!("{} {}: error: {}", record_type, record_name, error))
            .collect()
    }

    /// Run one reconciliation pass over every selected record type.
    ///
    /// Returns `Err` only for run-level failures that precede any record
    /// work (token verification). Per-type failures are in the report.
    pub async fn run(&self) -> Result<RunReport> {
        let record_name = self.desired.record_name();

        info!(
            "Reconciling {} ({}) via {}",
            record_name,
            self.desired.record_type.as_str(),
            self.provider.provider_name()
        );

        self.provider.verify_token().await?;
        debug!("API token verified");

        let mut zone_memo: Option<String> = None;
        let mut report = RunReport::default();

        for &record_type in self.desired.record_type.types() {
            let result = self
                .reconcile(record_type, &record_name, &mut zone_memo)
                .await;

            match &result {
                Ok(outcome) => info!("{} {}: {}", record_type, record_name, outcome),
                Err(e) => error!("{} {} failed: {}", record_type, record_name, e),
            }

            report.records.push(RecordReport {
                record_type,
                record_name: record_name.clone(),
                result,
            });
        }

        Ok(report)
    }

    /// Reconcile a single record type.
    ///
    /// `zone_memo` carries the resolved zone across record types of one run.
    async fn reconcile(
        &self,
        record_type: RecordType,
        record_name: &str,
        zone_memo: &mut Option<String>,
    ) -> Result<Outcome> {
        // Start → AddressFetched
        let address = self.ip_source.resolve(record_type).await?;
        debug!("Current {} address: {}", record_type, address);

        // AddressFetched → IdentityResolved
        let identity = IdentityResolver::new(self.provider.as_ref(), self.state_store.as_ref());
        let zone_id = match zone_memo.clone() {
            Some(zone_id) => zone_id,
            None => {
                let resolved = identity.resolve_zone_id(&self.desired).await?;
                *zone_memo = Some(resolved.clone());
                resolved
            }
        };
        let record = identity
            .resolve_record_id(&zone_id, record_type, record_name)
            .await?;

        // IdentityResolved → Decided
        let decision = self.decide(&record, &address);
        debug!("{} {}: decision {:?}", record_type, record_name, decision);

        let payload = RecordPayload::new(
            record_type,
            record_name,
            address.clone(),
            self.desired.ttl,
            self.desired.proxied,
        );

        // Decided → Applied
        match decision {
            Decision::Skip => Ok(Outcome::Skipped { address }),
            Decision::Create => self.create(&zone_id, &payload).await,
            Decision::Update { record_id } => {
                self.update(&identity, &zone_id, &record_id, &payload).await
            }
        }
    }

    fn decide(&self, record: &RecordIdentity, address: &str) -> Decision {
        let Some(record_id) = &record.record_id else {
            return Decision::Create;
        };

        if record.last_ip.as_deref() == Some(address) && !self.desired.force {
            return Decision::Skip;
        }

        Decision::Update {
            record_id: record_id.clone(),
        }
    }

    async fn create(&self, zone_id: &str, payload: &RecordPayload) -> Result<Outcome> {
        info!(
            "Creating {} record {} -> {}",
            payload.record_type, payload.name, payload.content
        );

        let record_id = self.provider.create_record(zone_id, payload).await?;
        if record_id.is_empty() {
            return Err(Error::apply("provider returned an empty record ID"));
        }

        self.state_store
            .set_record(
                &payload.name,
                payload.record_type,
                &RecordState::applied(record_id.clone(), payload.content.clone()),
            )
            .await?;

        Ok(Outcome::Created {
            record_id,
            address: payload.content.clone(),
        })
    }

    /// Update with exactly one recovery attempt.
    ///
    /// If the update using the known ID fails, the ID is re-resolved from
    /// the provider and the update retried once. If the record has vanished
    /// in the meantime it is created instead.
    async fn update(
        &self,
        identity: &IdentityResolver<'_>,
        zone_id: &str,
        record_id: &str,
        payload: &RecordPayload,
    ) -> Result<Outcome> {
        info!(
            "Updating {} record {} -> {}",
            payload.record_type, payload.name, payload.content
        );

        let (record_id, recovered) =
            match self.provider.update_record(zone_id, record_id, payload).await {
                Ok(()) => (record_id.to_string(), false),
                Err(first) => {
                    warn!(
                        "Update of {} record {} failed: {}. Refreshing record ID and retrying once",
                        payload.record_type, record_id, first
                    );

                    let Some(fresh_id) = identity
                        .refresh_record_id(zone_id, payload.record_type, &payload.name)
                        .await?
                    else {
                        warn!("{} record {} no longer exists", payload.record_type, payload.name);
                        return self.create(zone_id, payload).await;
                    };

                    self.provider
                        .update_record(zone_id, &fresh_id, payload)
                        .await
                        .map_err(|second| {
                            Error::apply(format!(
                                "update failed after refreshing record ID (first: {first}; retry: {second})"
                            ))
                        })?;

                    (fresh_id, true)
                }
            };

        self.state_store
            .set_record(
                &payload.name,
                payload.record_type,
                &RecordState::applied(record_id.clone(), payload.content.clone()),
            )
            .await?;

        Ok(Outcome::Updated {
            record_id,
            address: payload.content.clone(),
            recovered,
        })
    }
}
