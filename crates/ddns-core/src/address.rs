//! Public address validation
//!
//! Address services are untrusted: whatever they return is checked here and
//! rejected with the raw value attached. Nothing is ever normalized into a
//! valid-looking address.

use crate::error::{Error, Result};

/// Validate an IPv4 literal: four dot-separated decimal octets in `0..=255`.
///
/// Surrounding whitespace (e.g. a trailing newline) is tolerated and
/// stripped from the returned value.
pub fn validate_ipv4(raw: &str) -> Result<String> {
    let candidate = raw.trim();
    let octets: Vec<&str> = candidate.split('.').collect();

    let valid = octets.len() == 4
        && octets.iter().all(|octet| {
            !octet.is_empty()
                && octet.len() <= 3
                && octet.chars().all(|c| c.is_ascii_digit())
                && octet.parse::<u16>().is_ok_and(|value| value <= 255)
        });

    if valid {
        Ok(candidate.to_string())
    } else {
        Err(Error::invalid_ipv4(raw))
    }
}

/// Validate an IPv6 literal: at least one colon, only hex digits and colons.
pub fn validate_ipv6(raw: &str) -> Result<String> {
    let candidate = raw.trim();

    let valid = candidate.contains(':')
        && candidate
            .chars()
            .all(|c| c.is_ascii_hexdigit() || c == ':');

    if valid {
        Ok(candidate.to_string())
    } else {
        Err(Error::invalid_ipv6(raw))
    }
}
