//! Core application

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{Value, json};

use crate::core::cli::{self, Commands};
use crate::core::config::AppConfig;
use crate::core::constants::{APP_NAME_LOWER, ENV_LOG};
use crate::data::filters::FilterMap;
use crate::data::n1ql::{Expression, PageRequest, Statement};
use crate::data::{HttpTransport, MemoryTransport, QueryExecutor, QueryTransport};

pub struct CoreApp {
    pub config: AppConfig,
    pub executor: QueryExecutor,
}

/// What a command prints on stdout
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    /// Query results, printed as pretty JSON
    Json(Value),
    /// Rendered statements
    Text(String),
}

impl Output {
    fn print(&self) -> Result<()> {
        match self {
            Self::Json(value) => {
                let text =
                    serde_json::to_string_pretty(value).context("Failed to format result")?;
                println!("{}", text);
            }
            Self::Text(text) => print!("{}", text),
        }
        Ok(())
    }
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        let config = AppConfig::load(&cli_config)?;
        let app = Self::init(config)?;
        app.execute(command).await?.print()
    }

    fn init(config: AppConfig) -> Result<Self> {
        let transport: Arc<dyn QueryTransport> = match &config.data {
            Some(path) => Arc::new(
                MemoryTransport::load(config.bucket.clone(), path)
                    .with_context(|| format!("Failed to load bucket file: {}", path.display()))?,
            ),
            None => Arc::new(HttpTransport::new(
                config.query.endpoint.clone(),
                config.query.username.clone(),
                config.query.password.clone(),
                config.query.timeout,
            )),
        };

        let executor = QueryExecutor::with_flags(
            config.bucket.clone(),
            transport,
            config.with_sync_gateway,
            config.use_default_id_fields,
        );
        tracing::debug!(executor = ?executor, "Query executor ready");

        Ok(Self { config, executor })
    }

    /// Run one command and return its output
    ///
    /// `explain` only renders statements and never reaches the transport.
    pub async fn execute(&self, command: Commands) -> Result<Output> {
        let output = match command {
            Commands::Find { filters } => {
                to_json(self.executor.find::<Value>(&filters.filters).await?)?
            }
            Commands::FindOne { filters } => {
                to_json(self.executor.find_one::<Value>(&filters.filters).await?)?
            }
            Commands::Page { filters, page } => to_json(
                self.executor
                    .find_page::<Value>(&filters.filters, &page.request())
                    .await?,
            )?,
            Commands::Count { filters } => json!(self.executor.count(&filters.filters).await?),
            Commands::Sum { filters, field } => {
                json!(self.executor.sum(&filters.filters, &field).await?)
            }
            Commands::Explain {
                filters,
                page,
                field,
            } => {
                return Ok(Output::Text(explain(
                    &self.config.bucket,
                    &filters.filters,
                    &page.request(),
                    field.as_deref(),
                )));
            }
        };
        Ok(Output::Json(output))
    }

    fn init_logging() {
        let default_filter = format!("info,{}=info", APP_NAME_LOWER);

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .compact()
            .with_env_filter(filter)
            .init();
    }
}

/// Render every statement shape a filter map compiles to
fn explain(bucket: &str, filters: &FilterMap, page: &PageRequest, field: Option<&str>) -> String {
    let mut out = String::new();
    let mut section = |title: &str, statement: Statement| {
        out.push_str(&format!("-- {}\n{};\n\n", title, statement));
    };

    section("list", Statement::list(bucket, filters));
    section("page", Statement::paged(bucket, filters, page));
    section("count", Statement::count(bucket, filters));
    if let Some(field) = field {
        section("sum", Statement::sum(bucket, filters, field));
    }

    if !filters.is_empty() {
        let names: Vec<String> = filters
            .keys()
            .map(|k| Expression::param(k.as_str()).to_string())
            .collect();
        out.push_str(&format!("-- parameters: {}\n", names.join(", ")));
    }
    out
}

fn to_json<T: Serialize>(value: T) -> Result<Value> {
    serde_json::to_value(value).context("Failed to serialize result")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cli::{FilterArgs, PageArgs};
    use crate::core::config::QueryConfig;
    use std::time::Duration;

    fn filters(value: Value) -> FilterMap {
        value.as_object().cloned().unwrap()
    }

    fn filter_args(value: Value) -> FilterArgs {
        FilterArgs {
            filters: filters(value),
        }
    }

    async fn run_json(app: &CoreApp, command: Commands) -> Value {
        match app.execute(command).await.unwrap() {
            Output::Json(value) => value,
            Output::Text(text) => panic!("expected JSON output, got {}", text),
        }
    }

    fn app() -> CoreApp {
        let config = AppConfig {
            bucket: "people".to_string(),
            with_sync_gateway: false,
            use_default_id_fields: true,
            query: QueryConfig {
                endpoint: "http://127.0.0.1:8093".to_string(),
                username: None,
                password: None,
                timeout: Duration::from_secs(1),
            },
            data: None,
        };
        let transport = MemoryTransport::new("people")
            .with_document("p1", json!({"name": "Ann", "age": 31, "score": 10}))
            .with_document("p2", json!({"name": "bob", "age": 17, "score": 5}))
            .with_document("p3", json!({"name": "Cid", "age": 45}));
        let executor = QueryExecutor::with_flags("people", Arc::new(transport), false, true);
        CoreApp { config, executor }
    }

    #[test]
    fn test_explain_renders_each_shape() {
        let page = PageRequest::of(1, 10);
        let text = explain("people", &filters(json!({"age_from": 18})), &page, Some("score"));

        assert!(text.contains("-- list\nSELECT `people` AS data"));
        assert!(text.contains("LIMIT 10 OFFSET 10;"));
        assert!(text.contains("-- count\n"));
        assert!(text.contains("-- sum\n"));
        assert!(text.contains("-- parameters: $age_from\n"));
    }

    #[test]
    fn test_explain_without_sum_field() {
        let text = explain("people", &FilterMap::new(), &PageRequest::of(0, 5), None);
        assert!(!text.contains("-- sum"));
        assert!(!text.contains("-- parameters"));
    }

    #[tokio::test]
    async fn test_execute_find_and_count() {
        let app = app();

        let found = run_json(
            &app,
            Commands::Find {
                filters: filter_args(json!({"age_from": 18})),
            },
        )
        .await;
        assert_eq!(found.as_array().unwrap().len(), 2);

        let count = run_json(
            &app,
            Commands::Count {
                filters: filter_args(json!({})),
            },
        )
        .await;
        assert_eq!(count, json!(3));
    }

    #[tokio::test]
    async fn test_execute_sum() {
        let sum = run_json(
            &app(),
            Commands::Sum {
                filters: filter_args(json!({})),
                field: "score".to_string(),
            },
        )
        .await;
        assert_eq!(sum, json!(15));
    }

    #[tokio::test]
    async fn test_execute_page_sorted_ignoring_case() {
        let page = run_json(
            &app(),
            Commands::Page {
                filters: filter_args(json!({})),
                page: PageArgs {
                    page: 0,
                    offset: None,
                    size: 2,
                    sort: vec!["name_ignorecase:desc".parse().unwrap()],
                },
            },
        )
        .await;

        let names: Vec<&str> = page["content"]
            .as_array()
            .unwrap()
            .iter()
            .map(|doc| doc["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Cid", "bob"]);
        assert_eq!(page["meta"]["total_elements"], json!(3));
        assert_eq!(page["meta"]["total_pages"], json!(2));
    }

    #[tokio::test]
    async fn test_execute_find_one_non_unique() {
        let err = app()
            .execute(Commands::FindOne {
                filters: filter_args(json!({"age_from": 18})),
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("age_from"));
    }

    #[tokio::test]
    async fn test_execute_find_one_injects_id() {
        let doc = run_json(
            &app(),
            Commands::FindOne {
                filters: filter_args(json!({"name": "bob"})),
            },
        )
        .await;
        assert_eq!(doc["id"], json!("p2"));
    }

    #[tokio::test]
    async fn test_execute_page_at_explicit_offset() {
        let page = run_json(
            &app(),
            Commands::Page {
                filters: filter_args(json!({})),
                page: PageArgs {
                    page: 0,
                    offset: Some(1),
                    size: 5,
                    sort: vec!["age:asc".parse().unwrap()],
                },
            },
        )
        .await;

        let ages: Vec<&Value> = page["content"]
            .as_array()
            .unwrap()
            .iter()
            .map(|doc| &doc["age"])
            .collect();
        assert_eq!(ages, vec![&json!(31), &json!(45)]);
        assert_eq!(page["meta"]["offset"], json!(1));
    }

    #[tokio::test]
    async fn test_execute_explain_renders_text() {
        let output = app()
            .execute(Commands::Explain {
                filters: filter_args(json!({"first name": "Ann"})),
                page: PageArgs {
                    page: 0,
                    offset: None,
                    size: 5,
                    sort: Vec::new(),
                },
                field: None,
            })
            .await
            .unwrap();

        let Output::Text(text) = output else {
            panic!("expected rendered statements");
        };
        assert!(text.contains("`first name` = $`first name`"));
        assert!(text.contains("-- parameters: $`first name`\n"));
    }
}
