//! Core traits for the DDNS system
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`IpSource`]: Discover the current public address
//! - [`DnsProvider`]: Look up and write DNS records via provider APIs
//! - [`StateStore`]: Run-to-run caches of identifiers and applied addresses

pub mod ip_source;
pub mod dns_provider;
pub mod state_store;

pub use ip_source::IpSource;
pub use dns_provider::{DnsProvider, RecordPayload};
pub use state_store::{StateStore, RecordState};
