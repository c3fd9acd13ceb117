//! Validation utilities for doddns
//!
//! This module provides validation functions for configured names and for
//! addresses returned by the reflection services.

use std::net::{Ipv4Addr, Ipv6Addr};

use anyhow::{anyhow, Result};

use crate::constants::{MAX_LABEL_LENGTH, MAX_RECORD_NAME_LENGTH, SUPPORTED_RECORD_TYPES};

/// Validates a record host name relative to its domain
///
/// # Validation Rules
///
/// 1. **Length constraints**:
///    - Maximum total length: 253 characters (excluding trailing dot)
///    - Maximum label length: 63 characters
///
/// 2. **Syntax rules**:
///    - Labels cannot start or end with hyphens (`-`)
///    - Empty labels, spaces and leading dots are rejected
///
/// 3. **Special cases**:
///    - `@` represents the apex of the domain
///    - `_acme-challenge` style labels are allowed
///    - `*` is allowed as a complete label only
///
/// # Examples
///
/// ```
/// use doddns::validation::validate_record_name;
///
/// assert!(validate_record_name("@").is_ok());
/// assert!(validate_record_name("www").is_ok());
/// assert!(validate_record_name("_acme-challenge").is_ok());
/// assert!(validate_record_name("*.lab").is_ok());
///
/// assert!(validate_record_name("").is_err());
/// assert!(validate_record_name("-www").is_err());
/// assert!(validate_record_name("w w w").is_err());
/// ```
pub fn validate_record_name(record_name: &str) -> Result<()> {
    let trimmed = record_name.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("Record name cannot be empty"));
    }
    if trimmed == "@" {
        return Ok(());
    }
    if trimmed.contains(' ') {
        return Err(anyhow!("Record name cannot contain spaces"));
    }

    let name = trimmed.strip_suffix('.').unwrap_or(trimmed);
    if name.is_empty() {
        return Err(anyhow!("Record name cannot be empty"));
    }
    if name.len() > MAX_RECORD_NAME_LENGTH {
        return Err(anyhow!(
            "Record name too long (max {} characters, got {})",
            MAX_RECORD_NAME_LENGTH,
            name.len()
        ));
    }
    if name.starts_with('.') {
        return Err(anyhow!("Record name cannot start with a dot"));
    }
    if name.contains("..") {
        return Err(anyhow!("Record name cannot contain consecutive dots"));
    }

    for label in name.split('.') {
        validate_label(label, true)?;
    }

    Ok(())
}

/// Validates a domain (zone) name such as `example.org`
///
/// Domain names must have at least two labels; wildcards, underscores and
/// the `@` shorthand are not accepted here.
pub fn validate_domain_name(domain: &str) -> Result<()> {
    let name = domain.trim();
    let name = name.strip_suffix('.').unwrap_or(name);
    if name.is_empty() {
        return Err(anyhow!("Domain name cannot be empty"));
    }
    if name.len() > MAX_RECORD_NAME_LENGTH {
        return Err(anyhow!(
            "Domain name too long (max {} characters, got {})",
            MAX_RECORD_NAME_LENGTH,
            name.len()
        ));
    }
    if !name.contains('.') {
        return Err(anyhow!("Domain name must contain at least one dot: {}", name));
    }
    for label in name.split('.') {
        if label.is_empty() {
            return Err(anyhow!("Domain name contains empty label"));
        }
        validate_label(label, false)?;
    }
    Ok(())
}

fn validate_label(label: &str, relaxed: bool) -> Result<()> {
    if label.is_empty() {
        return Err(anyhow!("Record name contains empty label"));
    }
    if relaxed && label == "*" {
        return Ok(());
    }
    if label.len() > MAX_LABEL_LENGTH {
        return Err(anyhow!(
            "Label too long (max {} characters, got {})",
            MAX_LABEL_LENGTH,
            label.len()
        ));
    }
    if label.starts_with('-') || label.ends_with('-') {
        return Err(anyhow!("Label cannot start or end with hyphen: {}", label));
    }
    for ch in label.chars() {
        let allowed = ch.is_alphanumeric() || ch == '-' || (relaxed && ch == '_');
        if !allowed {
            return Err(anyhow!(
                "Name contains invalid character: '{}' in label '{}'",
                ch,
                label
            ));
        }
    }
    Ok(())
}

/// Normalizes a record type to upper case and checks it is one the provider accepts
///
/// ```
/// use doddns::validation::normalize_record_type;
///
/// assert_eq!(normalize_record_type("aaaa").unwrap(), "AAAA");
/// assert!(normalize_record_type("BOGUS").is_err());
/// ```
pub fn normalize_record_type(record_type: &str) -> Result<String> {
    let normalized = record_type.trim().to_ascii_uppercase();
    if normalized.is_empty() {
        return Err(anyhow!("Record type cannot be empty"));
    }
    if !SUPPORTED_RECORD_TYPES.contains(&normalized.as_str()) {
        return Err(anyhow!(
            "Unsupported record type '{}' (supported: {})",
            record_type,
            SUPPORTED_RECORD_TYPES.join(", ")
        ));
    }
    Ok(normalized)
}

/// Parses a reflection service body as an IPv4 address
///
/// Surrounding whitespace (the trailing newline most services append) is
/// ignored. The canonical textual form is returned.
pub fn parse_ipv4(body: &str) -> Result<String> {
    let trimmed = body.trim();
    let addr: Ipv4Addr = trimmed
        .parse()
        .map_err(|_| anyhow!("Invalid IPv4 address: {:?}", trimmed))?;
    Ok(addr.to_string())
}

/// Parses a reflection service body as an IPv6 address
///
/// Unspecified, loopback, link-local and multicast addresses are rejected
/// since they are never the host's public address.
pub fn parse_ipv6(body: &str) -> Result<String> {
    let trimmed = body.trim();
    let addr: Ipv6Addr = trimmed
        .parse()
        .map_err(|_| anyhow!("Invalid IPv6 address: {:?}", trimmed))?;

    let segments = addr.segments();
    // fe80::/10
    let link_local = segments[0] & 0xffc0 == 0xfe80;
    // ff00::/8
    let multicast = segments[0] & 0xff00 == 0xff00;
    if addr.is_unspecified() || addr.is_loopback() || link_local || multicast {
        return Err(anyhow!("Not a public IPv6 address: {}", addr));
    }

    Ok(addr.to_string())
}
