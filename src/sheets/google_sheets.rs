//! Google Sheets v4 values API client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use log::warn;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use wreq::Client;
use wreq::StatusCode;
use wreq::Url;
use wreq::header::CONTENT_TYPE;
use wreq::header::HeaderMap;
use wreq::header::HeaderValue;
use wreq::header::USER_AGENT;

use crate::credential::CredentialProvider;
use crate::sheets::CellBlock;
use crate::sheets::SpreadsheetStore;
use crate::sheets::cell_to_string;
use crate::sheets::error::SheetsError;

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ValueRangeUpdate<'a> {
    range: &'a str,
    major_dimension: &'static str,
    values: CellBlock,
}

/// Client for one spreadsheet.
pub struct GoogleSheetsClient {
    /// e.g. `https://sheets.googleapis.com/v4`
    pub api_url: Url,
    spreadsheet_id: String,
    client: Client,
    credentials: Arc<dyn CredentialProvider>,
}

impl GoogleSheetsClient {
    pub fn new(
        api_url: impl Into<String>,
        spreadsheet_id: impl Into<String>,
        credentials: Arc<dyn CredentialProvider>,
        timeout: Duration,
    ) -> Result<Self, SheetsError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("signup-sync/0.1"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        let api_url = api_url.into();
        let api_url = Url::parse(&api_url).map_err(|e| SheetsError::InvalidUrl {
            url: api_url.clone(),
            reason: e.to_string(),
        })?;
        if api_url.cannot_be_a_base() {
            return Err(SheetsError::InvalidUrl {
                url: api_url.to_string(),
                reason: "not a base URL".to_string(),
            });
        }

        Ok(Self {
            api_url,
            spreadsheet_id: spreadsheet_id.into(),
            client,
            credentials,
        })
    }

    /// `{api_url}/spreadsheets/{id}/values/{range}`, with the range
    /// percent-encoded as a single path segment.
    pub fn values_url(&self, range: &str) -> Url {
        let mut url = self.api_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend([
                "spreadsheets",
                self.spreadsheet_id.as_str(),
                "values",
                range,
            ]);
        }
        url
    }

    /// Sends an authorized request and returns the body of a successful response.
    async fn send(&self, request: wreq::RequestBuilder) -> Result<String, SheetsError> {
        let token = self.credentials.token().await?;
        let req = request.bearer_auth(&token).build()?;
        debug!("Making request to: {} {}", req.method(), req.url());

        let response = self.client.execute(req).await?;
        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::UNAUTHORIZED {
            warn!("Spreadsheet API returned 401, invalidating token.");
            self.credentials.invalidate(&token);
            return Err(SheetsError::Unauthorized);
        }
        if !status.is_success() {
            return Err(SheetsError::ApiError {
                status: status.as_u16(),
                message: Self::extract_error_message(&body),
            });
        }
        Ok(body)
    }

    fn extract_error_message(body: &str) -> String {
        serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|v| {
                v.get("error")
                    .and_then(|e| e.get("message"))
                    .and_then(|m| m.as_str())
                    .map(|m| m.to_string())
            })
            .unwrap_or_else(|| body.to_string())
    }
}

#[async_trait]
impl SpreadsheetStore for GoogleSheetsClient {
    async fn get_range(&self, range: &str) -> Result<CellBlock, SheetsError> {
        let request = self.client.get(self.values_url(range));
        let body = self.send(request).await?;
        let resp: ValueRange = serde_json::from_str(&body)?;

        Ok(resp
            .values
            .iter()
            .map(|row| row.iter().map(cell_to_string).collect())
            .collect())
    }

    async fn update_range(&self, range: &str, values: CellBlock) -> Result<(), SheetsError> {
        let payload = serde_json::to_string(&ValueRangeUpdate {
            range,
            major_dimension: "ROWS",
            values,
        })?;
        let request = self
            .client
            .put(self.values_url(range))
            .query(&[("valueInputOption", "RAW")])
            .header(CONTENT_TYPE, "application/json")
            .body(payload);

        self.send(request).await?;
        Ok(())
    }
}
