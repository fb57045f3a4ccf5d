//! Blocking values-API client.

use std::time::Duration;

use reqwest::blocking::Response;
use tracing::debug;
use url::Url;

use gridport_core::{CellValue, RangeRef, trim_trailing_blanks};
use gridport_engine::{
    AppendOutcome, BackendError, RangeWrite, SetOutcome, SheetTab, UpdateOutcome, ValueInput,
    ValueRender, ValuesBackend,
};

use crate::wire::{
    AppendResponse, BatchUpdateRequest, BatchUpdateResponse, ErrorEnvelope, SpreadsheetMeta,
    UpdateValuesResponse, ValueRange,
};

pub const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings. The token is a ready-to-use OAuth bearer token;
/// acquiring and refreshing it is the caller's concern.
#[derive(Debug, Clone)]
pub struct SheetsConfig {
    pub spreadsheet_id: String,
    pub token: String,
    /// Override for tests and self-hosted proxies.
    pub base_url: Option<String>,
}

/// Values-API client for one spreadsheet (blocking).
pub struct SheetsClient {
    http: reqwest::blocking::Client,
    base_url: Url,
    spreadsheet_id: String,
    token: String,
}

impl SheetsClient {
    pub fn new(config: SheetsConfig) -> Result<Self, BackendError> {
        let base = config.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        let base_url = Url::parse(base)
            .map_err(|e| BackendError::Transport(format!("invalid base url `{base}`: {e}")))?;
        let http = reqwest::blocking::Client::builder()
            .user_agent(format!("gridport/{}", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            base_url,
            spreadsheet_id: config.spreadsheet_id,
            token: config.token,
        })
    }

    /// Build a URL under `.../spreadsheets/{id}`, percent-encoding each
    /// path segment (ranges carry quotes and `!`).
    fn endpoint(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Url, BackendError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| BackendError::Transport("base url cannot be a base".to_string()))?;
            path.push(&self.spreadsheet_id);
            for segment in segments {
                path.push(segment);
            }
        }
        for (key, value) in query {
            url.query_pairs_mut().append_pair(key, value);
        }
        Ok(url)
    }

    fn check(&self, response: Response) -> Result<Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let code = status.as_u16();
        let body = response.text().unwrap_or_default();
        let message = serde_json::from_str::<ErrorEnvelope>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);
        Err(BackendError::Remote {
            status: Some(code),
            message,
        })
    }

    fn get(&self, url: Url) -> Result<Response, BackendError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        self.check(response)
    }

    fn send_json<T: serde::Serialize>(
        &self,
        request: reqwest::blocking::RequestBuilder,
        body: &T,
    ) -> Result<Response, BackendError> {
        let response = request
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        self.check(response)
    }
}

fn render_param(render: ValueRender) -> &'static str {
    match render {
        ValueRender::Formatted => "FORMATTED_VALUE",
        ValueRender::Unformatted => "UNFORMATTED_VALUE",
    }
}

fn input_param(input: ValueInput) -> &'static str {
    match input {
        ValueInput::Raw => "RAW",
        ValueInput::UserEntered => "USER_ENTERED",
    }
}

fn rows_to_wire(rows: &[Vec<CellValue>]) -> Vec<Vec<serde_json::Value>> {
    rows.iter()
        .map(|row| row.iter().map(CellValue::to_json).collect())
        .collect()
}

fn parse_json<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, BackendError> {
    response
        .json::<T>()
        .map_err(|e| BackendError::Transport(format!("malformed response: {e}")))
}

impl ValuesBackend for SheetsClient {
    fn get_values(
        &self,
        range: &RangeRef,
        render: ValueRender,
    ) -> Result<Vec<Vec<CellValue>>, BackendError> {
        let url = self.endpoint(
            &["values", &range.to_string()],
            &[("valueRenderOption", render_param(render))],
        )?;
        debug!(range = %range, "get values");
        let body: ValueRange = parse_json(self.get(url)?)?;
        let mut rows: Vec<Vec<CellValue>> = body
            .values
            .iter()
            .map(|row| {
                let mut cells: Vec<CellValue> = row.iter().map(CellValue::from_json).collect();
                trim_trailing_blanks(&mut cells);
                cells
            })
            .collect();
        while rows.last().is_some_and(Vec::is_empty) {
            rows.pop();
        }
        Ok(rows)
    }

    fn append_values(
        &mut self,
        range: &RangeRef,
        rows: &[Vec<CellValue>],
        input: ValueInput,
    ) -> Result<AppendOutcome, BackendError> {
        let url = self.endpoint(
            &["values", &format!("{range}:append")],
            &[
                ("valueInputOption", input_param(input)),
                ("insertDataOption", "INSERT_ROWS"),
            ],
        )?;
        let body = ValueRange {
            range: None,
            major_dimension: Some("ROWS".to_string()),
            values: rows_to_wire(rows),
        };
        debug!(range = %range, rows = rows.len(), "append values");
        let response: AppendResponse =
            parse_json(self.send_json(self.http.post(url), &body)?)?;
        let updates = response.updates.ok_or_else(|| BackendError::Remote {
            status: None,
            message: "append response carried no updates".to_string(),
        })?;
        let range = updates.updated_range.ok_or_else(|| BackendError::Remote {
            status: None,
            message: "append response carried no updated range".to_string(),
        })?;
        Ok(AppendOutcome {
            range,
            row_count: updates.updated_rows,
        })
    }

    fn batch_update_values(
        &mut self,
        writes: &[RangeWrite],
        input: ValueInput,
    ) -> Result<UpdateOutcome, BackendError> {
        let url = self.endpoint(&["values:batchUpdate"], &[])?;
        let body = BatchUpdateRequest {
            value_input_option: input_param(input).to_string(),
            data: writes
                .iter()
                .map(|write| ValueRange {
                    range: Some(write.range.to_string()),
                    major_dimension: None,
                    values: rows_to_wire(&write.rows),
                })
                .collect(),
        };
        debug!(ranges = writes.len(), "batch update values");
        let response: BatchUpdateResponse =
            parse_json(self.send_json(self.http.post(url), &body)?)?;
        Ok(UpdateOutcome {
            updated_cells: response.total_updated_cells,
        })
    }

    fn set_values(
        &mut self,
        range: &RangeRef,
        rows: &[Vec<CellValue>],
        input: ValueInput,
    ) -> Result<SetOutcome, BackendError> {
        let url = self.endpoint(
            &["values", &range.to_string()],
            &[("valueInputOption", input_param(input))],
        )?;
        let body = ValueRange {
            range: Some(range.to_string()),
            major_dimension: None,
            values: rows_to_wire(rows),
        };
        debug!(range = %range, "set values");
        let response: UpdateValuesResponse =
            parse_json(self.send_json(self.http.put(url), &body)?)?;
        Ok(SetOutcome {
            range: response.updated_range.unwrap_or_else(|| range.to_string()),
            cell_count: response.updated_cells,
        })
    }

    fn list_sheet_tabs(&self) -> Result<Vec<SheetTab>, BackendError> {
        let url = self.endpoint(&[], &[("fields", "sheets.properties")])?;
        let meta: SpreadsheetMeta = parse_json(self.get(url)?)?;
        Ok(meta
            .sheets
            .into_iter()
            .map(|entry| SheetTab {
                name: entry.properties.title,
                id: entry.properties.sheet_id,
                index: entry.properties.index,
            })
            .collect())
    }
}
