#![cfg(feature = "web")]

use crate::drive::spreadsheet_id;
use crate::error::SheetError;
use crate::store::SheetStore;
use crate::table::a1_cell;
use serde::Deserialize;
use serde_json::{Value, json};

const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Spreadsheet document reached through the Sheets REST API.
///
/// Requests carry a bearer token obtained outside this program. There is
/// no retry and no timeout beyond the client defaults.
#[derive(Debug, Clone)]
pub struct GoogleSheets {
    client: reqwest::Client,
    spreadsheet_id: String,
    access_token: String,
}

#[derive(Deserialize)]
struct Document {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    sheet_id: i64,
    title: String,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

impl GoogleSheets {
    /// Open the document behind `sheet_url`.
    pub fn open(sheet_url: &str, access_token: String) -> Result<Self, SheetError> {
        Ok(GoogleSheets {
            client: reqwest::Client::new(),
            spreadsheet_id: spreadsheet_id(sheet_url)?,
            access_token,
        })
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    fn document_url(&self) -> String {
        format!("{}/{}", SHEETS_API, self.spreadsheet_id)
    }

    fn values_url(&self, range: &str) -> String {
        format!(
            "{}/values/{}",
            self.document_url(),
            urlencoding::encode(range)
        )
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, SheetError> {
        let response = request.bearer_auth(&self.access_token).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SheetError::Status { status, body });
        }

        Ok(response)
    }

    async fn properties(&self) -> Result<Vec<SheetProperties>, SheetError> {
        let request = self
            .client
            .get(self.document_url())
            .query(&[("fields", "sheets.properties(sheetId,title)")]);
        let document: Document = self.send(request).await?.json().await?;
        Ok(document.sheets.into_iter().map(|s| s.properties).collect())
    }
}

/// Whole-worksheet range, e.g. `'Kho hàng'`.
fn tab_range(tab: &str) -> String {
    format!("'{}'", tab.replace('\'', "''"))
}

fn cell_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl SheetStore for GoogleSheets {
    async fn list_tabs(&self) -> Result<Vec<String>, SheetError> {
        Ok(self.properties().await?.into_iter().map(|p| p.title).collect())
    }

    async fn read_values(&self, tab: &str) -> Result<Vec<Vec<String>>, SheetError> {
        let request = self.client.get(self.values_url(&tab_range(tab)));
        let range: ValueRange = self.send(request).await?.json().await?;

        Ok(range
            .values
            .into_iter()
            .map(|line| line.into_iter().map(cell_text).collect())
            .collect())
    }

    async fn append_row(&self, tab: &str, row: Vec<String>) -> Result<(), SheetError> {
        let url = format!("{}:append", self.values_url(&tab_range(tab)));
        let request = self
            .client
            .post(url)
            .query(&[("valueInputOption", "RAW"), ("insertDataOption", "INSERT_ROWS")])
            .json(&json!({ "values": [row] }));

        self.send(request).await?;
        log::info!("appended a row to '{}'", tab);
        Ok(())
    }

    async fn update_cell(
        &self,
        tab: &str,
        row: usize,
        col: usize,
        value: &str,
    ) -> Result<(), SheetError> {
        let range = format!("{}!{}", tab_range(tab), a1_cell(row, col));
        let request = self
            .client
            .put(self.values_url(&range))
            .query(&[("valueInputOption", "USER_ENTERED")])
            .json(&json!({ "range": range, "values": [[value]] }));

        self.send(request).await?;
        log::info!("updated {} in '{}'", a1_cell(row, col), tab);
        Ok(())
    }

    async fn delete_row(&self, tab: &str, row: usize) -> Result<(), SheetError> {
        if row == 0 {
            return Err(SheetError::RowOutOfRange {
                tab: tab.to_string(),
                row,
            });
        }

        let sheet_id = self
            .properties()
            .await?
            .into_iter()
            .find(|p| p.title == tab)
            .map(|p| p.sheet_id)
            .ok_or_else(|| SheetError::TabNotFound(tab.to_string()))?;

        let body = json!({
            "requests": [{
                "deleteDimension": {
                    "range": {
                        "sheetId": sheet_id,
                        "dimension": "ROWS",
                        "startIndex": row - 1,
                        "endIndex": row,
                    }
                }
            }]
        });
        let request = self
            .client
            .post(format!("{}:batchUpdate", self.document_url()))
            .json(&body);

        self.send(request).await?;
        log::info!("deleted row {} of '{}'", row, tab);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_quote_tab_titles() {
        assert_eq!(tab_range("Kho"), "'Kho'");
        assert_eq!(tab_range("Bob's"), "'Bob''s'");
    }

    #[test]
    fn opens_document_by_url() {
        let sheets = GoogleSheets::open(
            "https://docs.google.com/spreadsheets/d/1my6VbCa/edit?usp=sharing",
            "token".to_string(),
        )
        .unwrap();
        assert_eq!(sheets.spreadsheet_id(), "1my6VbCa");
        assert!(sheets.values_url("'A B'").ends_with("/values/%27A%20B%27"));
    }

    #[test]
    fn non_string_cells_become_text() {
        assert_eq!(cell_text(json!(12)), "12");
        assert_eq!(cell_text(Value::Null), "");
        assert_eq!(cell_text(json!("x")), "x");
    }
}
