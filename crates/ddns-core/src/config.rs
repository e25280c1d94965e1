//! Desired-state configuration
//!
//! [`DesiredState`] is the single input that drives a reconciliation run.
//! It is produced by the setup collaborator, persisted by
//! [`ConfigStore`](crate::config_store::ConfigStore), and read-only to the
//! engine. Boolean-like and tri-state fields are parsed into typed values
//! once, at deserialization.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::error::{Error, Result};

/// Smallest TTL the provider accepts for a non-automatic record
pub const MIN_TTL: u32 = 120;

/// Largest TTL accepted
pub const MAX_TTL: u32 = 86_400;

/// Default address-echo service for IPv4
pub const DEFAULT_IPV4_URL: &str = "https://api.ipify.org";

/// Default address-echo service for IPv6
pub const DEFAULT_IPV6_URL: &str = "https://api6.ipify.org";

/// A single DNS record type managed by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordType {
    /// IPv4 address record
    #[serde(rename = "A")]
    A,
    /// IPv6 address record
    #[serde(rename = "AAAA")]
    Aaaa,
}

impl RecordType {
    /// The wire name used by the provider API
    pub fn as_str(self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which record types to keep in sync
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordSelection {
    /// A only
    #[serde(rename = "A")]
    A,
    /// AAAA only
    #[serde(rename = "AAAA")]
    Aaaa,
    /// A, then AAAA
    #[serde(rename = "BOTH")]
    Both,
}

impl RecordSelection {
    /// Record types in processing order (A always before AAAA)
    pub fn types(self) -> &'static [RecordType] {
        match self {
            RecordSelection::A => &[RecordType::A],
            RecordSelection::Aaaa => &[RecordType::Aaaa],
            RecordSelection::Both => &[RecordType::A, RecordType::Aaaa],
        }
    }

    /// Parse the operator-facing name (case-insensitive)
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "A" => Some(RecordSelection::A),
            "AAAA" => Some(RecordSelection::Aaaa),
            "BOTH" => Some(RecordSelection::Both),
            _ => None,
        }
    }

    /// The operator-facing name
    pub fn as_str(self) -> &'static str {
        match self {
            RecordSelection::A => "A",
            RecordSelection::Aaaa => "AAAA",
            RecordSelection::Both => "BOTH",
        }
    }
}

/// Proxy-status policy for the managed record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProxyPolicy {
    /// Leave whatever proxy status the record already has
    #[default]
    Preserve,
    /// Route through the provider's edge network
    Enabled,
    /// DNS only
    Disabled,
}

impl ProxyPolicy {
    /// Value for the `proxied` field of a create/update payload.
    ///
    /// `None` means the field is omitted.
    pub fn as_payload(self) -> Option<bool> {
        match self {
            ProxyPolicy::Preserve => None,
            ProxyPolicy::Enabled => Some(true),
            ProxyPolicy::Disabled => Some(false),
        }
    }

    /// Parse `preserve`, or any boolean-like value
    pub fn parse(value: &str) -> Option<Self> {
        if value.trim().eq_ignore_ascii_case("preserve") {
            return Some(ProxyPolicy::Preserve);
        }
        parse_bool_like(value).map(|enabled| {
            if enabled {
                ProxyPolicy::Enabled
            } else {
                ProxyPolicy::Disabled
            }
        })
    }

    /// The persisted name
    pub fn as_str(self) -> &'static str {
        match self {
            ProxyPolicy::Preserve => "preserve",
            ProxyPolicy::Enabled => "true",
            ProxyPolicy::Disabled => "false",
        }
    }
}

impl Serialize for ProxyPolicy {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ProxyPolicy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        match BoolOrString::deserialize(deserializer)? {
            BoolOrString::Bool(true) => Ok(ProxyPolicy::Enabled),
            BoolOrString::Bool(false) => Ok(ProxyPolicy::Disabled),
            BoolOrString::String(s) => ProxyPolicy::parse(&s).ok_or_else(|| {
                serde::de::Error::custom(format!(
                    "invalid proxied value '{s}', expected preserve, true or false"
                ))
            }),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BoolOrString {
    Bool(bool),
    String(String),
}

/// Interpret a boolean-like string (`true/false`, `yes/no`, `on/off`, `1/0`)
pub fn parse_bool_like(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn deserialize_bool_like<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<bool, D::Error> {
    match BoolOrString::deserialize(deserializer)? {
        BoolOrString::Bool(b) => Ok(b),
        BoolOrString::String(s) => parse_bool_like(&s).ok_or_else(|| {
            serde::de::Error::custom(format!("invalid force value '{s}', expected a boolean"))
        }),
    }
}

/// Persisted desired state for the managed record
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredState {
    /// Provider API token (bearer credential)
    /// ⚠️ NEVER log this value
    pub api_token: String,

    /// Explicit zone identifier; wins over the cache when it verifies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<String>,

    /// Zone (apex domain) name, e.g. "example.com"
    pub zone_name: String,

    /// Label prefix; empty or "@" means the zone apex
    #[serde(default)]
    pub subdomain: String,

    /// Fully-qualified record name as of the last save.
    ///
    /// Informational only: [`DesiredState::record_name`] re-derives it.
    #[serde(default)]
    pub record_name: String,

    /// Which record types to manage
    #[serde(default = "default_record_type")]
    pub record_type: RecordSelection,

    /// Record TTL in seconds
    #[serde(default = "default_ttl")]
    pub ttl: u32,

    /// Update even when the address is unchanged
    #[serde(default, deserialize_with = "deserialize_bool_like")]
    pub force: bool,

    /// Proxy-status policy
    #[serde(default)]
    pub proxied: ProxyPolicy,

    /// IPv4 address-echo endpoint
    #[serde(default = "default_ipv4_url")]
    pub ipv4_url: String,

    /// IPv6 address-echo endpoint
    #[serde(default = "default_ipv6_url")]
    pub ipv6_url: String,
}

fn default_record_type() -> RecordSelection {
    RecordSelection::A
}

fn default_ttl() -> u32 {
    300
}

fn default_ipv4_url() -> String {
    DEFAULT_IPV4_URL.to_string()
}

fn default_ipv6_url() -> String {
    DEFAULT_IPV6_URL.to_string()
}

// Custom Debug implementation that hides the API token
impl fmt::Debug for DesiredState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DesiredState")
            .field("api_token", &"<REDACTED>")
            .field("zone_id", &self.zone_id)
            .field("zone_name", &self.zone_name)
            .field("subdomain", &self.subdomain)
            .field("record_type", &self.record_type)
            .field("ttl", &self.ttl)
            .field("force", &self.force)
            .field("proxied", &self.proxied)
            .field("ipv4_url", &self.ipv4_url)
            .field("ipv6_url", &self.ipv6_url)
            .finish()
    }
}

impl DesiredState {
    /// Create a desired state for the apex of `zone_name` with defaults
    pub fn new(api_token: impl Into<String>, zone_name: impl Into<String>) -> Self {
        let mut state = Self {
            api_token: api_token.into(),
            zone_id: None,
            zone_name: zone_name.into(),
            subdomain: String::new(),
            record_name: String::new(),
            record_type: default_record_type(),
            ttl: default_ttl(),
            force: false,
            proxied: ProxyPolicy::default(),
            ipv4_url: default_ipv4_url(),
            ipv6_url: default_ipv6_url(),
        };
        state.refresh_record_name();
        state
    }

    /// Set the subdomain prefix
    pub fn with_subdomain(mut self, subdomain: impl Into<String>) -> Self {
        self.subdomain = subdomain.into();
        self.refresh_record_name();
        self
    }

    /// Set the explicit zone identifier
    pub fn with_zone_id(mut self, zone_id: impl Into<String>) -> Self {
        self.zone_id = Some(zone_id.into());
        self
    }

    /// Set the record type selection
    pub fn with_record_type(mut self, record_type: RecordSelection) -> Self {
        self.record_type = record_type;
        self
    }

    /// Set the TTL
    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the force-update flag
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Set the proxy policy
    pub fn with_proxied(mut self, proxied: ProxyPolicy) -> Self {
        self.proxied = proxied;
        self
    }

    /// Set both address-echo endpoints
    pub fn with_address_urls(mut self, ipv4_url: impl Into<String>, ipv6_url: impl Into<String>) -> Self {
        self.ipv4_url = ipv4_url.into();
        self.ipv6_url = ipv6_url.into();
        self
    }

    /// The fully-qualified record name, derived from zone name and subdomain
    pub fn record_name(&self) -> String {
        derive_record_name(&self.zone_name, &self.subdomain)
    }

    /// Overwrite the persisted `record_name` with the derived one
    pub fn refresh_record_name(&mut self) {
        self.record_name = self.record_name();
    }

    /// Explicit zone identifier, treating a blank value as absent
    pub fn explicit_zone_id(&self) -> Option<&str> {
        self.zone_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    /// Validate the desired state
    pub fn validate(&self) -> Result<()> {
        if self.api_token.trim().is_empty() {
            return Err(Error::config("API token cannot be empty"));
        }

        let zone_name = self.zone_name.trim();
        if zone_name.is_empty() {
            return Err(Error::config("Zone name cannot be empty"));
        }
        validate_domain_name(zone_name)?;

        let record_name = self.record_name();
        if record_name.is_empty() {
            return Err(Error::config("Derived record name is empty"));
        }
        validate_domain_name(&record_name)?;

        if !(MIN_TTL..=MAX_TTL).contains(&self.ttl) {
            return Err(Error::config(format!(
                "TTL must be between {MIN_TTL} and {MAX_TTL} seconds. Got: {}",
                self.ttl
            )));
        }

        validate_service_url("ipv4_url", &self.ipv4_url)?;
        validate_service_url("ipv6_url", &self.ipv6_url)?;

        Ok(())
    }
}

/// Derive the fully-qualified record name.
///
/// An empty or `@` subdomain names the zone apex.
pub fn derive_record_name(zone_name: &str, subdomain: &str) -> String {
    let zone = zone_name.trim().trim_end_matches('.').to_ascii_lowercase();
    let sub = subdomain.trim().trim_end_matches('.').to_ascii_lowercase();

    if sub.is_empty() || sub == "@" {
        zone
    } else if zone.is_empty() {
        String::new()
    } else {
        format!("{sub}.{zone}")
    }
}

/// Mask a credential for display.
///
/// Tokens of eight characters or fewer are fully masked; longer tokens keep
/// their first and last four characters around a fixed-width mask so the
/// original length is not disclosed.
pub fn mask_token(token: &str) -> String {
    const MASK: &str = "********";

    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 8 {
        return MASK.to_string();
    }

    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}{MASK}{tail}")
}

/// Basic DNS name validation (RFC 1035 lengths, LDH labels plus `_`).
///
/// A leading `*` label is accepted for wildcard records.
fn validate_domain_name(domain: &str) -> Result<()> {
    if domain.len() > 253 {
        return Err(Error::config(format!(
            "Domain name too long: {} chars (max 253). Got: {domain}",
            domain.len()
        )));
    }

    for (index, label) in domain.split('.').enumerate() {
        if label.is_empty() {
            return Err(Error::config(format!("Domain name has empty label: '{domain}'")));
        }

        if index == 0 && label == "*" {
            continue;
        }

        if label.len() > 63 {
            return Err(Error::config(format!(
                "Domain label too long: {} chars (max 63). Label: '{label}'",
                label.len()
            )));
        }

        if !label
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(Error::config(format!(
                "Domain label contains invalid characters. Label: '{label}'. \
                Valid: alphanumeric, hyphen and underscore only."
            )));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(Error::config(format!(
                "Domain label cannot start or end with hyphen. Label: '{label}'"
            )));
        }
    }

    Ok(())
}

fn validate_service_url(field: &str, url: &str) -> Result<()> {
    if url.is_empty() {
        return Err(Error::config(format!("{field} cannot be empty")));
    }
    if !url.starts_with("https://") && !url.starts_with("http://") {
        return Err(Error::config(format!(
            "{field} must use HTTP or HTTPS scheme. Got: {url}"
        )));
    }
    Ok(())
}
