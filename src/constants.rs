//! Common constants used throughout the doddns application

//==============================================================================
// DigitalOcean API Constants
//==============================================================================

/// DigitalOcean domains API base URL (domain name is appended)
pub const DIGITALOCEAN_API_BASE: &str = "https://api.digitalocean.com/v2/domains/";

/// User agent string for all outgoing requests
pub const USER_AGENT: &str = "doddns/1.0";

//==============================================================================
// IP Reflection Endpoints
//==============================================================================

/// Reflection service reachable over IPv4 only
pub const DEFAULT_IPV4_URL: &str = "https://api.ipify.org";

/// Reflection service reachable over IPv6 only
pub const DEFAULT_IPV6_URL: &str = "https://api6.ipify.org";

//==============================================================================
// HTTP Status Codes
//==============================================================================

/// HTTP status code for unauthorized requests (401)
pub const HTTP_STATUS_UNAUTHORIZED: u16 = 401;

/// HTTP status code for forbidden requests (403)
pub const HTTP_STATUS_FORBIDDEN: u16 = 403;

/// HTTP status code for rate limiting (429)
pub const HTTP_STATUS_TOO_MANY_REQUESTS: u16 = 429;

//==============================================================================
// Timeout Constants
//==============================================================================

/// Default HTTP request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Minimum HTTP request timeout in seconds
pub const MIN_TIMEOUT_SECS: u64 = 1;

/// Maximum HTTP request timeout in seconds
pub const MAX_TIMEOUT_SECS: u64 = 300;

//==============================================================================
// Validation Constants
//==============================================================================

/// Maximum DNS name length in characters
pub const MAX_RECORD_NAME_LENGTH: usize = 253;

/// Maximum DNS label length in characters
pub const MAX_LABEL_LENGTH: usize = 63;

/// Record types the DigitalOcean domains API accepts
pub const SUPPORTED_RECORD_TYPES: &[&str] =
    &["A", "AAAA", "CAA", "CNAME", "MX", "NS", "SOA", "SRV", "TXT"];

//==============================================================================
// Configuration
//==============================================================================

/// Config file name looked up next to the executable
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Environment variable name for the HTTP timeout override
pub const ENV_TIMEOUT: &str = "DODDNS_TIMEOUT";

/// Environment variable name for the verbose logging override
pub const ENV_VERBOSE: &str = "DODDNS_VERBOSE";

//==============================================================================
// Exit Codes
//==============================================================================

/// Every configured domain reconciled
pub const EXIT_SUCCESS: u8 = 0;

/// No domains configured
pub const EXIT_NO_DOMAINS: u8 = 1;

/// At least one domain failed
pub const EXIT_DOMAIN_FAILED: u8 = 2;

/// Run aborted before reconciliation (config or IPv4 discovery)
pub const EXIT_FATAL: u8 = 3;
