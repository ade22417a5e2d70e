// =============================================================================
// Application Identity
// =============================================================================

/// Application name in lowercase (for paths and identifiers)
pub const APP_NAME_LOWER: &str = "couchquery";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".couchquery";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "couchquery.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "COUCHQUERY_CONFIG";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "COUCHQUERY_LOG";

// =============================================================================
// Environment Variables - Bucket
// =============================================================================

/// Environment variable for the bucket name
pub const ENV_BUCKET: &str = "COUCHQUERY_BUCKET";

/// Environment variable marking the bucket as Sync Gateway managed
pub const ENV_WITH_SYNC_GATEWAY: &str = "COUCHQUERY_WITH_SYNC_GATEWAY";

/// Environment variable selecting the default id field strategy
pub const ENV_USE_DEFAULT_ID_FIELDS: &str = "COUCHQUERY_USE_DEFAULT_ID_FIELDS";

/// Environment variable for a local bucket file (runs queries in memory)
pub const ENV_DATA: &str = "COUCHQUERY_DATA";

// =============================================================================
// Environment Variables - Query Service
// =============================================================================

/// Environment variable for the query service endpoint
pub const ENV_QUERY_ENDPOINT: &str = "COUCHQUERY_QUERY_ENDPOINT";

/// Environment variable for the query service user
pub const ENV_QUERY_USERNAME: &str = "COUCHQUERY_QUERY_USERNAME";

/// Environment variable for the query service password
pub const ENV_QUERY_PASSWORD: &str = "COUCHQUERY_QUERY_PASSWORD";

/// Environment variable for the query request timeout in seconds
pub const ENV_QUERY_TIMEOUT_SECS: &str = "COUCHQUERY_QUERY_TIMEOUT_SECS";

// =============================================================================
// Defaults
// =============================================================================

/// Default Couchbase query service endpoint
pub const DEFAULT_QUERY_ENDPOINT: &str = "http://127.0.0.1:8093";

/// Default query request timeout
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 75;

/// Default page size for the `page` command
pub const DEFAULT_PAGE_SIZE: u32 = 20;
