//! Google Sheets v4 REST implementation of [`SpreadsheetStore`].

use super::auth::ServiceAccountAuth;
use super::store::{a1_range, quote_title, SheetsError, Spreadsheet, SpreadsheetStore, WorksheetRef};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com";
const SPREADSHEET_FIELDS: &str = "spreadsheetId,properties.title,sheets.properties(sheetId,title)";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpreadsheetResponse {
    spreadsheet_id: String,
    #[serde(default)]
    properties: SpreadsheetProperties,
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct SpreadsheetProperties {
    #[serde(default)]
    title: String,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    #[serde(default)]
    sheet_id: i64,
    title: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValueRange<'a> {
    range: &'a str,
    major_dimension: &'static str,
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateValuesResponse {
    #[serde(default)]
    updated_rows: usize,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Authorized Google Sheets client.
pub struct GoogleSheetsClient {
    client: Client,
    auth: ServiceAccountAuth,
    base_url: String,
}

impl GoogleSheetsClient {
    pub fn new(auth: ServiceAccountAuth) -> Result<Self, SheetsError> {
        Self::with_base_url(auth, DEFAULT_BASE_URL)
    }

    /// Point the client at a different API host (tests use a local mock).
    pub fn with_base_url(auth: ServiceAccountAuth, base_url: &str) -> Result<Self, SheetsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SheetsError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            auth,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// `{base}/v4/spreadsheets/{id}[/values/{range}]`, with each segment percent-encoded.
    fn url(&self, spreadsheet_id: &str, values_range: Option<&str>) -> Result<Url, SheetsError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| SheetsError::Network(format!("invalid base URL: {e}")))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| SheetsError::Network("base URL cannot carry a path".into()))?;
            segments.pop_if_empty().extend(["v4", "spreadsheets", spreadsheet_id]);
            if let Some(range) = values_range {
                segments.extend(["values", range]);
            }
        }
        Ok(url)
    }

    /// Attach the bearer token, send, and map error statuses.
    fn execute(&self, request: RequestBuilder, spreadsheet_id: &str) -> Result<Response, SheetsError> {
        let token = self.auth.access_token(&self.client)?;
        let resp = request
            .bearer_auth(token)
            .send()
            .map_err(|e| SheetsError::Network(e.to_string()))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(SheetsError::Unauthorized {
                spreadsheet_id: spreadsheet_id.to_string(),
            }),
            StatusCode::NOT_FOUND => Err(SheetsError::SpreadsheetNotFound {
                spreadsheet_id: spreadsheet_id.to_string(),
            }),
            _ => {
                let body = resp.text().unwrap_or_default();
                let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                Err(SheetsError::Api {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }
}

impl SpreadsheetStore for GoogleSheetsClient {
    fn open(&self, spreadsheet_id: &str) -> Result<Spreadsheet, SheetsError> {
        let mut url = self.url(spreadsheet_id, None)?;
        url.query_pairs_mut().append_pair("fields", SPREADSHEET_FIELDS);
        debug!(%url, "opening spreadsheet");

        let resp = self.execute(self.client.get(url), spreadsheet_id)?;
        let body: SpreadsheetResponse = resp
            .json()
            .map_err(|e| SheetsError::Api {
                status: 200,
                message: format!("malformed spreadsheet metadata: {e}"),
            })?;

        let worksheets = body
            .sheets
            .into_iter()
            .map(|sheet| WorksheetRef {
                spreadsheet_id: body.spreadsheet_id.clone(),
                sheet_id: sheet.properties.sheet_id,
                title: sheet.properties.title,
            })
            .collect();

        Ok(Spreadsheet {
            id: body.spreadsheet_id,
            title: body.properties.title,
            worksheets,
        })
    }

    fn clear(&self, worksheet: &WorksheetRef) -> Result<(), SheetsError> {
        // A bare sheet title addresses every cell of the worksheet.
        let range = format!("{}:clear", quote_title(&worksheet.title));
        let url = self.url(&worksheet.spreadsheet_id, Some(&range))?;
        debug!(%url, "clearing worksheet");

        let request = self.client.post(url).json(&serde_json::json!({}));
        self.execute(request, &worksheet.spreadsheet_id)?;
        Ok(())
    }

    fn write(
        &self,
        worksheet: &WorksheetRef,
        anchor: &str,
        rows: Vec<Vec<Value>>,
    ) -> Result<usize, SheetsError> {
        let range = a1_range(worksheet, anchor);
        let mut url = self.url(&worksheet.spreadsheet_id, Some(&range))?;
        // Entered as if typed, so the sheet parses dates and numbers itself.
        url.query_pairs_mut().append_pair("valueInputOption", "USER_ENTERED");
        debug!(%url, rows = rows.len(), "writing values");

        let body = ValueRange {
            range: &range,
            major_dimension: "ROWS",
            values: rows,
        };
        let resp = self.execute(self.client.put(url).json(&body), &worksheet.spreadsheet_id)?;
        let update: UpdateValuesResponse = resp.json().map_err(|e| SheetsError::Api {
            status: 200,
            message: format!("malformed update response: {e}"),
        })?;
        Ok(update.updated_rows)
    }
}
