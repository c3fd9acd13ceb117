//! Public IP discovery through HTTP reflection services
//!
//! The IPv4 address is mandatory. The IPv6 address is optional: a host
//! without IPv6 connectivity simply has none, and records bound to it are
//! treated as having no desired value.

use std::io;
use std::time::Duration;

use anyhow::{bail, Context as _, Result};
use tracing::{debug, info, warn};

use crate::constants::USER_AGENT;
use crate::validation::{parse_ipv4, parse_ipv6};

//==============================================================================
// Types
//==============================================================================

/// Addresses resolved once per run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentIps {
    pub ipv4: String,
    pub ipv6: Option<String>,
}

/// Resolver-side messages meaning "this host has no address of that family"
const NO_ADDRESS_MESSAGES: &[&str] = &[
    "No address associated with hostname",
    "Address family for hostname not supported",
];

pub struct IpDiscovery {
    client: reqwest::Client,
    ipv4_url: String,
    ipv6_url: String,
}

//==============================================================================
// Implementation
//==============================================================================

impl IpDiscovery {
    pub fn new(ipv4_url: &str, ipv6_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("build reqwest client")?;

        Ok(Self {
            client,
            ipv4_url: ipv4_url.to_string(),
            ipv6_url: ipv6_url.to_string(),
        })
    }

    async fn fetch(&self, url: &str) -> Result<String> {
        debug!("GET {}", url);
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("GET {} failed", url))?;

        let status = resp.status();
        if !status.is_success() {
            bail!("{} returned HTTP {}", url, status.as_u16());
        }

        resp.text()
            .await
            .with_context(|| format!("Failed to read response from {}", url))
    }

    /// Current public IPv4 address
    pub async fn ipv4(&self) -> Result<String> {
        let body = self.fetch(&self.ipv4_url).await?;
        parse_ipv4(&body).context("IPv4 reflection returned garbage")
    }

    /// Current public IPv6 address, `None` when the host has no IPv6 route
    pub async fn ipv6(&self) -> Result<Option<String>> {
        match self.fetch(&self.ipv6_url).await {
            Ok(body) => {
                let addr = parse_ipv6(&body).context("IPv6 reflection returned garbage")?;
                Ok(Some(addr))
            }
            Err(e) if is_no_ipv6_connectivity(&e) => {
                warn!("No IPv6 connectivity: {:#}", e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Resolves both address families; IPv4 failure is fatal
    pub async fn discover(&self) -> Result<CurrentIps> {
        let ipv4 = self.ipv4().await.context("IPv4 discovery failed")?;
        info!("Current IPv4: {}", ipv4);

        let ipv6 = self.ipv6().await.context("IPv6 discovery failed")?;
        match &ipv6 {
            Some(addr) => info!("Current IPv6: {}", addr),
            None => info!("Current IPv6: none"),
        }

        Ok(CurrentIps { ipv4, ipv6 })
    }
}

/// Whether `err` was caused by the host lacking IPv6 connectivity
///
/// Walks the source chain for an OS-level "unreachable"/"address not
/// available" error, or a resolver reporting no address for the host.
pub fn is_no_ipv6_connectivity(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        let Some(io_err) = cause.downcast_ref::<io::Error>() else {
            return false;
        };
        if let Some(code) = io_err.raw_os_error() {
            return matches!(
                code,
                libc::ENETUNREACH | libc::EHOSTUNREACH | libc::EADDRNOTAVAIL | libc::EAFNOSUPPORT
            );
        }
        let message = io_err.to_string();
        NO_ADDRESS_MESSAGES.iter().any(|m| message.contains(m))
    })
}

//==============================================================================
// Tests
//==============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreachable_network_means_no_ipv6() {
        for code in [libc::ENETUNREACH, libc::EHOSTUNREACH, libc::EADDRNOTAVAIL] {
            let err = anyhow::Error::new(io::Error::from_raw_os_error(code))
                .context("GET https://api6.ipify.org failed");
            assert!(is_no_ipv6_connectivity(&err), "errno {code}");
        }
    }

    #[test]
    fn test_resolver_without_address_means_no_ipv6() {
        let err = anyhow::Error::new(io::Error::new(
            io::ErrorKind::Other,
            "failed to lookup address information: No address associated with hostname",
        ))
        .context("GET failed");
        assert!(is_no_ipv6_connectivity(&err));
    }

    #[test]
    fn test_other_failures_are_not_missing_ipv6() {
        let refused = anyhow::Error::new(io::Error::from_raw_os_error(libc::ECONNREFUSED));
        assert!(!is_no_ipv6_connectivity(&refused));

        let timeout = anyhow::Error::new(io::Error::new(io::ErrorKind::TimedOut, "timed out"));
        assert!(!is_no_ipv6_connectivity(&timeout));

        let status = anyhow::anyhow!("https://api6.ipify.org returned HTTP 503");
        assert!(!is_no_ipv6_connectivity(&status));
    }
}
