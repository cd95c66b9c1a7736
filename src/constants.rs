//! Default limits shared by the batcher, the HTTP client, and configuration.

/// Upper bound on a request URL accepted by COMS and intermediate proxies.
pub const DEFAULT_URL_BUDGET_BYTES: usize = 2000;

/// Bytes reserved for scheme, host, API path, and non-id query parameters.
pub const DEFAULT_URL_FIXED_OVERHEAD_BYTES: usize = 200;

/// Cost of one repeated id parameter: `&objectId=` plus a 36-character UUID.
pub const DEFAULT_URL_PER_ID_BYTES: usize = 46;

/// Per-call timeout applied by the HTTP client.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
