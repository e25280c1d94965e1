// # ddns-core
//
// Core library for keeping one DNS record in sync with this host's public
// address.
//
// ## Architecture Overview
//
// This library provides the update reconciliation engine:
// - **IpSource**: Trait for discovering the current public address
// - **DnsProvider**: Trait for provider lookups and record writes
// - **StateStore**: Trait for the run-to-run identifier/address caches
// - **IdentityResolver**: Zone and record ID resolution with cache invalidation
// - **Reconciler**: Decides skip/create/update per record type and applies it
// - **ConfigStore**: Owner-only persistence of the desired state
//
// ## Design Principles
//
// 1. **Pull, compare, converge**: each invocation is one synchronous pass
// 2. **Caches are hints**: every cached identifier yields to a live answer
// 3. **Minimal writes**: an unchanged address costs no mutating API call
// 4. **Explicit configuration**: no ambient lookups inside the engine

pub mod address;
pub mod traits;
pub mod engine;
pub mod config;
pub mod config_store;
pub mod error;
pub mod state;

// Re-export core types for convenience
pub use traits::{IpSource, DnsProvider, StateStore, RecordPayload, RecordState};
pub use engine::{IdentityResolver, Outcome, Reconciler, RecordReport, RunReport};
pub use config::{DesiredState, ProxyPolicy, RecordSelection, RecordType, mask_token};
pub use config_store::ConfigStore;
pub use error::{Error, Result};
pub use state::{MemoryStateStore, FileStateStore};
