//! doddns - DigitalOcean DNS record reconciler
//!
//! Architecture:
//! - Current public addresses resolved once per run through HTTP reflection services
//! - Declarative JSON config of desired records per domain
//! - One record listing per domain, then at most one create/update/delete per record
//! - Uses reqwest for HTTP (rustls)

pub mod config;
pub mod constants;
pub mod digitalocean;
pub mod dns_provider;
pub mod ip_discovery;
pub mod metrics;
pub mod reconciler;
pub mod validation;
