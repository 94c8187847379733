//! LokiSource - Loki `query_range` over HTTP

use std::time::Duration;

use contracts::{AuthConfig, ContractError, LogQuery, LogSource, Record, SourceConfig};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::error::{IngestionError, Result};

/// Path of the range query endpoint, relative to the configured base URL
pub const QUERY_RANGE_PATH: &str = "/loki/api/v1/query_range";

/// Bytes of an error body kept in error messages
const ERROR_BODY_LIMIT: usize = 512;

#[derive(Debug, Deserialize)]
struct QueryRangeResponse {
    data: QueryRangeData,
}

#[derive(Debug, Deserialize)]
struct QueryRangeData {
    #[serde(default)]
    result: Vec<StreamResult>,
}

#[derive(Debug, Deserialize)]
struct StreamResult {
    #[serde(default)]
    values: Vec<(String, String)>,
}

/// Log source backed by a Loki-compatible HTTP API
pub struct LokiSource {
    name: String,
    client: reqwest::Client,
    url: String,
    auth: Option<AuthConfig>,
    timestamp_field: String,
}

impl LokiSource {
    /// Create a source from the `[source]` config section.
    ///
    /// `timestamp_field` is the reserved column name; a payload field with the
    /// same name is discarded in favor of the transport timestamp.
    pub fn new(
        name: impl Into<String>,
        config: &SourceConfig,
        timestamp_field: impl Into<String>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| IngestionError::Client(e.to_string()))?;

        Ok(Self {
            name: name.into(),
            client,
            url: format!("{}{QUERY_RANGE_PATH}", config.endpoint.trim_end_matches('/')),
            auth: config.auth.clone(),
            timestamp_field: timestamp_field.into(),
        })
    }

    async fn query_range(&self, query: &LogQuery) -> Result<String> {
        let mut request = self.client.get(&self.url).query(&[
            ("query", query.query.clone()),
            ("start", query.start_nanos.to_string()),
            ("limit", query.limit.to_string()),
            ("direction", query.direction.as_str().to_string()),
        ]);

        request = match &self.auth {
            None => request,
            Some(AuthConfig::Basic { username, password }) => {
                request.basic_auth(username, Some(password))
            }
            Some(AuthConfig::Bearer { token }) => request.bearer_auth(token),
        };

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let mut snippet = body;
            if snippet.len() > ERROR_BODY_LIMIT {
                let mut cut = ERROR_BODY_LIMIT;
                while !snippet.is_char_boundary(cut) {
                    cut -= 1;
                }
                snippet.truncate(cut);
            }
            return Err(IngestionError::Status {
                status: status.as_u16(),
                body: snippet,
            });
        }

        Ok(body)
    }
}

impl LogSource for LokiSource {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "loki_fetch",
        skip(self, query),
        fields(source = %self.name, start = query.start_nanos, limit = query.limit)
    )]
    async fn fetch(&self, query: &LogQuery) -> std::result::Result<Vec<Record>, ContractError> {
        let body = self.query_range(query).await?;
        let (records, dropped) = parse_query_range(&body, &self.timestamp_field)?;

        for _ in 0..dropped {
            observability::record_payload_unparsable(&self.name);
        }
        debug!(records = records.len(), dropped, "query_range parsed");
        Ok(records)
    }
}

/// Parse a `query_range` response body into records.
///
/// Entries from all streams are merged and ordered by timestamp (stable, so
/// entries sharing a timestamp keep their stream order). Returns the records
/// and the number of entries dropped because they could not be parsed.
pub fn parse_query_range(body: &str, timestamp_field: &str) -> Result<(Vec<Record>, usize)> {
    let response: QueryRangeResponse =
        serde_json::from_str(body).map_err(|e| IngestionError::Decode(e.to_string()))?;

    let mut records = Vec::new();
    let mut dropped = 0;
    for (ts, line) in response.data.result.into_iter().flat_map(|s| s.values) {
        match parse_entry(&ts, &line, timestamp_field) {
            Ok(record) => records.push(record),
            Err(e) => {
                warn!(timestamp = %ts, error = %e, "dropping log line");
                dropped += 1;
            }
        }
    }

    records.sort_by_key(|r| r.timestamp);
    Ok((records, dropped))
}

fn parse_entry(
    ts: &str,
    line: &str,
    timestamp_field: &str,
) -> std::result::Result<Record, ContractError> {
    let timestamp: i64 = ts
        .parse()
        .map_err(|_| ContractError::record_parse(format!("invalid entry timestamp '{ts}'")))?;

    match serde_json::from_str::<Value>(line) {
        Ok(Value::Object(object)) => Ok(Record::from_json_object(timestamp, object, timestamp_field)),
        Ok(other) => Err(ContractError::record_parse(format!(
            "payload is not a JSON object (got {})",
            json_kind(&other)
        ))),
        Err(e) => Err(ContractError::record_parse(e.to_string())),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
