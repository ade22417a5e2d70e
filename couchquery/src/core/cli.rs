use clap::{Args, Parser, Subcommand};

use std::path::PathBuf;

use crate::data::filters::FilterMap;
use crate::data::n1ql::{Order, PageRequest};

use super::constants::{
    DEFAULT_PAGE_SIZE, ENV_BUCKET, ENV_CONFIG, ENV_DATA, ENV_QUERY_ENDPOINT, ENV_QUERY_PASSWORD,
    ENV_QUERY_TIMEOUT_SECS, ENV_QUERY_USERNAME, ENV_USE_DEFAULT_ID_FIELDS, ENV_WITH_SYNC_GATEWAY,
};

#[derive(Parser)]
#[command(name = "couchquery")]
#[command(version, about = "Filter-map queries against Couchbase buckets", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Bucket to query
    #[arg(long, short = 'b', global = true, env = ENV_BUCKET)]
    pub bucket: Option<String>,

    /// Bucket is managed by Sync Gateway
    #[arg(long, global = true, env = ENV_WITH_SYNC_GATEWAY)]
    pub with_sync_gateway: Option<bool>,

    /// Inject document ids under the default id field
    #[arg(long, global = true, env = ENV_USE_DEFAULT_ID_FIELDS)]
    pub use_default_id_fields: Option<bool>,

    /// Query service endpoint, e.g. http://127.0.0.1:8093
    #[arg(long, short = 'e', global = true, env = ENV_QUERY_ENDPOINT)]
    pub endpoint: Option<String>,

    /// Query service user
    #[arg(long, short = 'u', global = true, env = ENV_QUERY_USERNAME)]
    pub username: Option<String>,

    /// Query service password
    #[arg(long, global = true, env = ENV_QUERY_PASSWORD, hide_env_values = true)]
    pub password: Option<String>,

    /// Query request timeout in seconds
    #[arg(long, global = true, env = ENV_QUERY_TIMEOUT_SECS)]
    pub timeout_secs: Option<u64>,

    /// JSON file of `{"<id>": <document>}` queried in memory instead of a cluster
    #[arg(long, global = true, env = ENV_DATA)]
    pub data: Option<PathBuf>,
}

/// Parse a JSON object of filters from CLI string
fn parse_filters(s: &str) -> Result<FilterMap, String> {
    serde_json::from_str(s).map_err(|e| format!("Invalid filters '{}': {}", s, e))
}

/// Parse a sort entry (`property[:asc|:desc]`) from CLI string
fn parse_order(s: &str) -> Result<Order, String> {
    s.parse::<Order>().map_err(|e| e.to_string())
}

/// Filter map shared by every command
#[derive(Args, Clone, Debug)]
pub struct FilterArgs {
    /// Filters as a JSON object, e.g. '{"age_from": 18, "name_contains": "ann"}'
    #[arg(long, short = 'f', value_parser = parse_filters, default_value = "{}")]
    pub filters: FilterMap,
}

/// Page bounds and sort
#[derive(Args, Clone, Debug)]
pub struct PageArgs {
    /// 0-based page index
    #[arg(long, short = 'p', default_value_t = 0)]
    pub page: u32,

    /// Explicit row offset, used instead of --page
    #[arg(long, conflicts_with = "page")]
    pub offset: Option<u64>,

    /// Page size
    #[arg(long, short = 's', default_value_t = DEFAULT_PAGE_SIZE)]
    pub size: u32,

    /// Sort entry, repeatable, e.g. --sort name_ignorecase:asc --sort age:desc
    #[arg(long = "sort", short = 'o', value_parser = parse_order)]
    pub sort: Vec<Order>,
}

impl PageArgs {
    pub fn request(&self) -> PageRequest {
        let request = match self.offset {
            Some(offset) => PageRequest::at_offset(offset, self.size),
            None => PageRequest::of(self.page, self.size),
        };
        request.with_sort(self.sort.clone())
    }
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// List every matching document
    Find {
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Fetch the single matching document, failing when several match
    FindOne {
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Fetch one sorted page of matching documents with the total count
    Page {
        #[command(flatten)]
        filters: FilterArgs,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Count matching documents
    Count {
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Sum a numeric field over matching documents
    Sum {
        #[command(flatten)]
        filters: FilterArgs,
        /// Field to sum
        #[arg(long)]
        field: String,
    },
    /// Print the statements a filter map compiles to, without running them
    Explain {
        #[command(flatten)]
        filters: FilterArgs,
        #[command(flatten)]
        page: PageArgs,
        /// Field for the sum statement
        #[arg(long)]
        field: Option<String>,
    },
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub config: Option<PathBuf>,
    pub bucket: Option<String>,
    pub with_sync_gateway: Option<bool>,
    pub use_default_id_fields: Option<bool>,
    pub endpoint: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout_secs: Option<u64>,
    pub data: Option<PathBuf>,
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Commands) {
    let cli = Cli::parse();
    let config = CliConfig {
        config: cli.config,
        bucket: cli.bucket,
        with_sync_gateway: cli.with_sync_gateway,
        use_default_id_fields: cli.use_default_id_fields,
        endpoint: cli.endpoint,
        username: cli.username,
        password: cli.password,
        timeout_secs: cli.timeout_secs,
        data: cli.data,
    };
    (config, cli.command)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::n1ql::Direction;
    use serde_json::json;

    #[test]
    fn test_parse_filters() {
        let filters = parse_filters(r#"{"age_from": 18, "status_in": ["a"]}"#).unwrap();
        assert_eq!(filters["age_from"], json!(18));
        assert_eq!(filters["status_in"], json!(["a"]));
    }

    #[test]
    fn test_parse_filters_rejects_non_objects() {
        assert!(parse_filters("[1, 2]").is_err());
        assert!(parse_filters("age=1").is_err());
    }

    #[test]
    fn test_parse_order() {
        let order = parse_order("name_ignorecase:desc").unwrap();
        assert_eq!(order.property, "name");
        assert_eq!(order.direction, Direction::Desc);
        assert!(order.ignore_case);
        assert!(parse_order("name:sideways").is_err());
    }

    #[test]
    fn test_cli_page_command() {
        let cli = Cli::try_parse_from([
            "couchquery",
            "--bucket",
            "people",
            "page",
            "--filters",
            r#"{"age_from": 18}"#,
            "--sort",
            "name_ignorecase:asc",
            "--sort",
            "age:desc",
            "--page",
            "2",
            "--size",
            "10",
        ])
        .unwrap();

        assert_eq!(cli.bucket.as_deref(), Some("people"));
        let Commands::Page { filters, page } = cli.command else {
            panic!("expected page command");
        };
        assert_eq!(filters.filters["age_from"], json!(18));

        let request = page.request();
        assert_eq!(request.offset, 20);
        assert_eq!(request.size, 10);
        assert_eq!(request.sort.len(), 2);
        assert!(request.sort[0].ignore_case);
    }

    #[test]
    fn test_cli_page_explicit_offset() {
        let cli = Cli::try_parse_from(["couchquery", "page", "--offset", "15", "--size", "10"])
            .unwrap();
        let Commands::Page { page, .. } = cli.command else {
            panic!("expected page command");
        };
        let request = page.request();
        assert_eq!(request.offset, 15);
        assert_eq!(request.size, 10);
    }

    #[test]
    fn test_cli_page_offset_conflicts_with_page() {
        let result =
            Cli::try_parse_from(["couchquery", "page", "--page", "1", "--offset", "15"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["couchquery", "count"]).unwrap();
        let Commands::Count { filters } = cli.command else {
            panic!("expected count command");
        };
        assert!(filters.filters.is_empty());
    }

    #[test]
    fn test_cli_sum_requires_field() {
        assert!(Cli::try_parse_from(["couchquery", "sum"]).is_err());
        assert!(Cli::try_parse_from(["couchquery", "sum", "--field", "amount"]).is_ok());
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "couchquery",
            "find-one",
            "--with-sync-gateway",
            "true",
            "--use-default-id-fields",
            "false",
        ])
        .unwrap();
        assert_eq!(cli.with_sync_gateway, Some(true));
        assert_eq!(cli.use_default_id_fields, Some(false));
    }
}
