use serde::Deserialize;
use std::future::Future;
use std::time::Duration;

use super::InventoryError;
use crate::config::SheetConfig;

/// Body of a `spreadsheets.values.get` response
#[derive(Debug, Default, Deserialize)]
pub struct ValuesResponse {
    #[serde(default)]
    pub range: Option<String>,
    #[serde(default)]
    pub values: Option<Vec<Vec<serde_json::Value>>>,
}

impl ValuesResponse {
    /// Rows as strings. Numbers and booleans are stringified, null becomes empty.
    pub fn into_rows(self) -> Vec<Vec<String>> {
        self.values
            .unwrap_or_default()
            .into_iter()
            .map(|row| row.into_iter().map(cell_to_string).collect())
            .collect()
    }
}

fn cell_to_string(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Anything that can produce the raw rows of the configured range
pub trait SheetSource {
    fn fetch_rows(&self) -> impl Future<Output = Result<Vec<Vec<String>>, InventoryError>> + Send;
}

/// HTTP client for the Google Sheets values endpoint
#[derive(Debug, Clone)]
pub struct SheetsClient {
    client: reqwest::Client,
    url: reqwest::Url,
}

impl SheetsClient {
    pub fn new(config: &SheetConfig) -> Result<Self, InventoryError> {
        let url = values_url(config)?;

        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client: builder.build()?,
            url,
        })
    }
}

impl SheetSource for SheetsClient {
    async fn fetch_rows(&self) -> Result<Vec<Vec<String>>, InventoryError> {
        tracing::debug!("GET {}", redact_key(&self.url));

        let response = self.client.get(self.url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(InventoryError::Fetch {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        let parsed: ValuesResponse = serde_json::from_slice(&body)?;
        tracing::debug!(
            "Received range {}",
            parsed.range.as_deref().unwrap_or("<unknown>")
        );

        Ok(parsed.into_rows())
    }
}

/// `{base}/v4/spreadsheets/{id}/values/{range}?key={key}`
pub fn values_url(config: &SheetConfig) -> Result<reqwest::Url, InventoryError> {
    if config.spreadsheet_id.trim().is_empty() {
        return Err(InventoryError::MissingCredentials("spreadsheet id"));
    }
    let api_key = config
        .api_key
        .as_deref()
        .filter(|k| !k.trim().is_empty())
        .ok_or(InventoryError::MissingCredentials("API key"))?;

    let invalid_base = || InventoryError::MissingCredentials("valid base URL");
    let mut url = reqwest::Url::parse(&config.base_url).map_err(|_| invalid_base())?;
    url.path_segments_mut()
        .map_err(|_| invalid_base())?
        .pop_if_empty()
        .extend(["v4", "spreadsheets", config.spreadsheet_id.trim(), "values", config.range.as_str()]);
    url.query_pairs_mut().append_pair("key", api_key);

    Ok(url)
}

fn redact_key(url: &reqwest::Url) -> String {
    let mut shown = url.clone();
    shown.set_query(Some("key=***"));
    shown.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ColumnMapping;
    use crate::inventory::build_catalog;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn sheet_config() -> SheetConfig {
        SheetConfig {
            spreadsheet_id: "sheet-123".to_string(),
            api_key: Some("k3y".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_values_url() {
        let url = values_url(&sheet_config()).unwrap();

        assert_eq!(url.host_str(), Some("sheets.googleapis.com"));
        let segments: Vec<_> = url.path_segments().unwrap().collect();
        assert_eq!(segments[..4], ["v4", "spreadsheets", "sheet-123", "values"]);
        assert!(segments[4].starts_with("Sheet1"));
        assert_eq!(
            url.query_pairs().find(|(k, _)| k == "key").map(|(_, v)| v.into_owned()),
            Some("k3y".to_string())
        );
    }

    #[test]
    fn test_values_url_encodes_range_spaces() {
        let mut config = sheet_config();
        config.range = "My Stock!A:F".to_string();
        let url = values_url(&config).unwrap();
        assert!(url.path().contains("My%20Stock"));
    }

    #[test]
    fn test_values_url_requires_credentials() {
        let mut config = sheet_config();
        config.api_key = None;
        assert!(matches!(
            values_url(&config),
            Err(InventoryError::MissingCredentials("API key"))
        ));

        let mut config = sheet_config();
        config.spreadsheet_id = String::new();
        assert!(matches!(
            values_url(&config),
            Err(InventoryError::MissingCredentials("spreadsheet id"))
        ));
    }

    #[test]
    fn test_redact_key() {
        let url = values_url(&sheet_config()).unwrap();
        let shown = redact_key(&url);
        assert!(!shown.contains("k3y"));
        assert!(shown.ends_with("key=***"));
    }

    #[test]
    fn test_response_into_rows() {
        let body = r#"{
            "range": "Sheet1!A1:F3",
            "majorDimension": "ROWS",
            "values": [
                ["SKU", "Name"],
                ["A1", "Alpha", "", 3, null, true]
            ]
        }"#;
        let parsed: ValuesResponse = serde_json::from_str(body).unwrap();
        let rows = parsed.into_rows();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], vec!["A1", "Alpha", "", "3", "", "true"]);
    }

    #[test]
    fn test_response_without_values() {
        let parsed: ValuesResponse = serde_json::from_str(r#"{"range": "Sheet1!A1:F1"}"#).unwrap();
        assert!(parsed.into_rows().is_empty());
    }

    /// Serve a single canned HTTP response on a local port, returning its base URL
    async fn serve_once(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });

        format!("http://{}", addr)
    }

    fn local_client(base_url: String) -> SheetsClient {
        SheetsClient::new(&SheetConfig {
            base_url,
            ..sheet_config()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_rows_not_found_is_fetch_error() {
        let client = local_client(serve_once("404 Not Found", r#"{"error":"missing"}"#).await);

        let err = client.fetch_rows().await.unwrap_err();
        assert!(matches!(err, InventoryError::Fetch { status: 404 }));
        assert!(err.is_fetch_error());
    }

    #[tokio::test]
    async fn test_fetch_rows_non_json_body_is_decode_error() {
        let client = local_client(serve_once("200 OK", "<html>quota exceeded</html>").await);

        let err = client.fetch_rows().await.unwrap_err();
        assert!(matches!(err, InventoryError::Decode(_)));
        assert!(!err.is_fetch_error());
    }

    #[tokio::test]
    async fn test_fetch_rows_without_values_builds_empty_data() {
        let client = local_client(serve_once("200 OK", r#"{"range":"Sheet1!A1:F1"}"#).await);

        let rows = client.fetch_rows().await.unwrap();
        assert!(rows.is_empty());
        assert!(matches!(
            build_catalog(&rows, &ColumnMapping::default(), &[]),
            Err(InventoryError::EmptyData)
        ));
    }

    #[tokio::test]
    async fn test_fetch_rows_success() {
        let client = local_client(
            serve_once(
                "200 OK",
                r#"{"range":"Sheet1!A1:F2","values":[["SKU","Name"],["A1","Alpha","",3,"",1]]}"#,
            )
            .await,
        );

        let rows = client.fetch_rows().await.unwrap();
        let catalog = build_catalog(&rows, &ColumnMapping::default(), &[]).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].current_stock, 3);
        assert_eq!(catalog[0].incoming_stock, 1);
    }
}
