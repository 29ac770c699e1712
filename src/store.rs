use crate::error::SheetError;
use serde::Deserialize;
use std::future::Future;
use std::path::Path;
use std::sync::Mutex;

/// Operations the catalog needs from a spreadsheet service.
///
/// Rows and columns are 1-based worksheet offsets; row 1 is the header.
pub trait SheetStore: Send + Sync + 'static {
    /// Titles of every worksheet, in document order.
    fn list_tabs(&self) -> impl Future<Output = Result<Vec<String>, SheetError>> + Send;

    /// Every non-empty line of a worksheet as text.
    fn read_values(
        &self,
        tab: &str,
    ) -> impl Future<Output = Result<Vec<Vec<String>>, SheetError>> + Send;

    /// Add `row` after the last line of `tab`.
    ///
    /// Cells are stored as given; the remote store does not reinterpret
    /// them as formulas or numbers.
    fn append_row(
        &self,
        tab: &str,
        row: Vec<String>,
    ) -> impl Future<Output = Result<(), SheetError>> + Send;

    /// Replace one cell at 1-based `row` and `col`.
    ///
    /// # Arguments
    /// * `tab` - Worksheet title
    /// * `row` - Worksheet row, where 1 is the header
    /// * `col` - Worksheet column, where 1 is column `A`
    /// * `value` - New cell text
    fn update_cell(
        &self,
        tab: &str,
        row: usize,
        col: usize,
        value: &str,
    ) -> impl Future<Output = Result<(), SheetError>> + Send;

    /// Remove worksheet row `row` (1-based), shifting later rows up.
    fn delete_row(&self, tab: &str, row: usize)
    -> impl Future<Output = Result<(), SheetError>> + Send;
}

/// A write performed against a `MemorySheets` store.
#[derive(Clone, Debug, PartialEq)]
pub enum Mutation {
    Append { tab: String, row: Vec<String> },
    Update { tab: String, row: usize, col: usize, value: String },
    Delete { tab: String, row: usize },
}

/// One worksheet of a seed file.
#[derive(Clone, Debug, Deserialize)]
pub struct SeedTab {
    pub title: String,
    #[serde(default)]
    pub values: Vec<Vec<String>>,
}

/// In-process spreadsheet with the same offset rules as the remote one.
///
/// Used for demo mode and tests; every write is recorded in a journal.
#[derive(Debug, Default)]
pub struct MemorySheets {
    tabs: Mutex<Vec<SeedTab>>,
    journal: Mutex<Vec<Mutation>>,
}

impl MemorySheets {
    pub fn new(tabs: Vec<SeedTab>) -> Self {
        MemorySheets {
            tabs: Mutex::new(tabs),
            journal: Mutex::new(Vec::new()),
        }
    }

    /// Seed a store from a JSON file.
    ///
    /// The file holds an array of worksheets in document order, each
    /// `{"title": "Products", "values": [["id", "name"], ["P1", "Lamp"]]}`;
    /// `values` may be left out for an empty worksheet.
    ///
    /// # Errors
    /// * `SheetError::Io` if the file cannot be read
    /// * `SheetError::Decode` if it is not in the shape above
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SheetError> {
        let data = std::fs::read_to_string(path)?;
        let tabs: Vec<SeedTab> = serde_json::from_str(&data)?;
        Ok(Self::new(tabs))
    }

    /// Convenience for building a single worksheet from string slices.
    pub fn with_tab(self, title: &str, values: &[&[&str]]) -> Self {
        let values = values
            .iter()
            .map(|line| line.iter().map(|s| s.to_string()).collect())
            .collect();
        self.tabs.lock().unwrap_or_else(|e| e.into_inner()).push(SeedTab {
            title: title.to_string(),
            values,
        });
        self
    }

    /// Writes performed so far, oldest first.
    pub fn journal(&self) -> Vec<Mutation> {
        self.journal.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Current contents of a worksheet.
    pub fn values(&self, tab: &str) -> Option<Vec<Vec<String>>> {
        let tabs = self.tabs.lock().unwrap_or_else(|e| e.into_inner());
        tabs.iter().find(|t| t.title == tab).map(|t| t.values.clone())
    }

    fn with_values<T>(
        &self,
        tab: &str,
        f: impl FnOnce(&mut Vec<Vec<String>>) -> Result<T, SheetError>,
    ) -> Result<T, SheetError> {
        let mut tabs = self.tabs.lock().unwrap_or_else(|e| e.into_inner());
        let sheet = tabs
            .iter_mut()
            .find(|t| t.title == tab)
            .ok_or_else(|| SheetError::TabNotFound(tab.to_string()))?;
        f(&mut sheet.values)
    }

    fn record(&self, mutation: Mutation) {
        self.journal
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(mutation);
    }
}

impl SheetStore for MemorySheets {
    async fn list_tabs(&self) -> Result<Vec<String>, SheetError> {
        let tabs = self.tabs.lock().unwrap_or_else(|e| e.into_inner());
        Ok(tabs.iter().map(|t| t.title.clone()).collect())
    }

    async fn read_values(&self, tab: &str) -> Result<Vec<Vec<String>>, SheetError> {
        self.with_values(tab, |values| Ok(values.clone()))
    }

    async fn append_row(&self, tab: &str, row: Vec<String>) -> Result<(), SheetError> {
        self.with_values(tab, |values| {
            values.push(row.clone());
            Ok(())
        })?;
        self.record(Mutation::Append {
            tab: tab.to_string(),
            row,
        });
        Ok(())
    }

    async fn update_cell(
        &self,
        tab: &str,
        row: usize,
        col: usize,
        value: &str,
    ) -> Result<(), SheetError> {
        if row == 0 || col == 0 {
            return Err(SheetError::RowOutOfRange {
                tab: tab.to_string(),
                row,
            });
        }

        self.with_values(tab, |values| {
            if values.len() < row {
                values.resize(row, Vec::new());
            }
            let line = &mut values[row - 1];
            if line.len() < col {
                line.resize(col, String::new());
            }
            line[col - 1] = value.to_string();
            Ok(())
        })?;
        self.record(Mutation::Update {
            tab: tab.to_string(),
            row,
            col,
            value: value.to_string(),
        });
        Ok(())
    }

    async fn delete_row(&self, tab: &str, row: usize) -> Result<(), SheetError> {
        self.with_values(tab, |values| {
            if row == 0 || row > values.len() {
                return Err(SheetError::RowOutOfRange {
                    tab: tab.to_string(),
                    row,
                });
            }
            values.remove(row - 1);
            Ok(())
        })?;
        self.record(Mutation::Delete {
            tab: tab.to_string(),
            row,
        });
        Ok(())
    }
}
