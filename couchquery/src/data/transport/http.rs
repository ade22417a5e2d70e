use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::data::error::TransportError;
use crate::data::n1ql::Query;

use super::QueryTransport;

/// Query service REST path
pub const QUERY_SERVICE_PATH: &str = "/query/service";

const SUCCESS_STATUS: &str = "success";

/// Couchbase query service transport
///
/// Every call opens its own HTTP client, so no connection outlives the call
/// that created it.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    endpoint: String,
    username: Option<String>,
    password: Option<String>,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct QueryServiceError {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    msg: String,
}

#[derive(Debug, Deserialize)]
struct QueryServiceResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    results: Vec<Value>,
    #[serde(default)]
    errors: Vec<QueryServiceError>,
}

impl HttpTransport {
    pub fn new(
        endpoint: impl Into<String>,
        username: Option<String>,
        password: Option<String>,
        timeout: Duration,
    ) -> Self {
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        tracing::debug!(endpoint = %endpoint, timeout_secs = timeout.as_secs(), "HTTP query transport initialized");
        Self {
            endpoint,
            username,
            password,
            timeout,
        }
    }

    fn url(&self) -> String {
        format!("{}{}", self.endpoint, QUERY_SERVICE_PATH)
    }

    fn connect(&self) -> Result<reqwest::Client, TransportError> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| TransportError::Config(format!("failed to build HTTP client: {}", e)))
    }
}

/// Request body: the statement text plus one `$name` entry per parameter
fn request_body(query: &Query) -> Value {
    let mut body = Map::new();
    body.insert(
        "statement".to_string(),
        Value::String(query.statement.to_string()),
    );
    for (key, value) in &query.params {
        body.insert(format!("${}", key), value.clone());
    }
    Value::Object(body)
}

/// Interpret a query service reply
fn parse_response(http_status: u16, body: &str) -> Result<Vec<Value>, TransportError> {
    let response: QueryServiceResponse = match serde_json::from_str(body) {
        Ok(response) => response,
        Err(e) if (200..300).contains(&http_status) => {
            return Err(TransportError::response(e.to_string()));
        }
        Err(_) => return Err(TransportError::query(http_status.to_string(), body.trim())),
    };

    if response.status != SUCCESS_STATUS || !response.errors.is_empty() {
        let status = if response.status.is_empty() {
            http_status.to_string()
        } else {
            response.status
        };
        let message = response
            .errors
            .iter()
            .map(|e| match e.code {
                Some(code) => format!("[{}] {}", code, e.msg),
                None => e.msg.clone(),
            })
            .collect::<Vec<_>>()
            .join("; ");
        return Err(TransportError::query(status, message));
    }

    Ok(response.results)
}

#[async_trait]
impl QueryTransport for HttpTransport {
    async fn execute(&self, query: &Query) -> Result<Vec<Value>, TransportError> {
        let client = self.connect()?;
        let url = self.url();

        let mut request = client.post(&url).json(&request_body(query));
        if let Some(username) = &self.username {
            request = request.basic_auth(username, self.password.as_deref());
        }

        let resp = request.send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;

        let rows = parse_response(status, &body)?;
        tracing::trace!(url = %url, http_status = status, rows = rows.len(), "Query service responded");
        Ok(rows)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filters::FilterMap;
    use crate::data::n1ql::Statement;
    use httpmock::prelude::*;
    use serde_json::json;

    fn filters(value: Value) -> FilterMap {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn request_body_carries_named_params() {
        let params = filters(json!({"age_from": 18, "status_in": ["a", "b"]}));
        let query = Query::new(Statement::count("people", &params), &params);
        let body = request_body(&query);

        assert_eq!(body["statement"], json!(query.statement.to_string()));
        assert_eq!(body["$age_from"], json!(18));
        assert_eq!(body["$status_in"], json!(["a", "b"]));
        assert_eq!(body.as_object().unwrap().len(), 3);
    }

    #[test]
    fn parse_response_success() {
        let rows = parse_response(
            200,
            r#"{"status": "success", "results": [{"id": "a", "data": {}}]}"#,
        )
        .unwrap();
        assert_eq!(rows, vec![json!({"id": "a", "data": {}})]);
    }

    #[test]
    fn parse_response_service_errors() {
        let err = parse_response(
            400,
            r#"{"status": "fatal", "errors": [{"code": 3000, "msg": "syntax error"}]}"#,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Query failed (fatal): [3000] syntax error");
    }

    #[test]
    fn parse_response_non_json_error_body() {
        let err = parse_response(503, "Service Unavailable\n").unwrap_err();
        assert!(matches!(
            err,
            TransportError::Query { ref status, ref message }
                if status == "503" && message == "Service Unavailable"
        ));
    }

    #[test]
    fn parse_response_non_json_success_body() {
        let err = parse_response(200, "<html>").unwrap_err();
        assert!(matches!(err, TransportError::Response(_)));
    }

    #[tokio::test]
    async fn execute_posts_statement_with_credentials() {
        let server = MockServer::start_async().await;
        let params = filters(json!({"status": "open"}));
        let query = Query::new(Statement::list("tickets", &params), &params);

        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path(QUERY_SERVICE_PATH)
                    .header_exists("authorization")
                    .json_body(request_body(&query));
                then.status(200).json_body(json!({
                    "status": "success",
                    "results": [{"data": {"status": "open"}, "id": "t1"}]
                }));
            })
            .await;

        let transport = HttpTransport::new(
            server.base_url(),
            Some("admin".to_string()),
            Some("secret".to_string()),
            Duration::from_secs(5),
        );
        let rows = transport.execute(&query).await.unwrap();

        mock.assert_async().await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], json!("t1"));
    }

    #[tokio::test]
    async fn execute_surfaces_query_errors() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path(QUERY_SERVICE_PATH);
                then.status(404).json_body(json!({
                    "status": "fatal",
                    "errors": [{"code": 12003, "msg": "Keyspace not found"}]
                }));
            })
            .await;

        let transport = HttpTransport::new(server.base_url(), None, None, Duration::from_secs(5));
        let params = FilterMap::new();
        let query = Query::new(Statement::count("missing", &params), &params);
        let err = transport.execute(&query).await.unwrap_err();

        assert_eq!(err.to_string(), "Query failed (fatal): [12003] Keyspace not found");
    }
}
