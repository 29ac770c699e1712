use crate::drive::find_image_column;
use crate::error::SheetError;
use crate::store::SheetStore;
use crate::table::{ID_COLUMN, NAME_COLUMN, Table};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const QUANTITY_COLUMN: &str = "quantity";

/// A recoverable outcome shown inline on the page.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "level", content = "message", rename_all = "lowercase")]
pub enum Notice {
    Success(String),
    Info(String),
    Warning(String),
    Error(String),
}

impl Notice {
    pub fn level(&self) -> &'static str {
        match self {
            Notice::Success(_) => "success",
            Notice::Info(_) => "info",
            Notice::Warning(_) => "warning",
            Notice::Error(_) => "error",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Notice::Success(m) | Notice::Info(m) | Notice::Warning(m) | Notice::Error(m) => m,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Notice::Error(_))
    }
}

/// One worksheet as read at the start of an interaction.
#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub tab: String,
    pub table: Table,
    pub notices: Vec<Notice>,
    pub loaded_at: DateTime<Utc>,
}

/// Result of filtering a snapshot by a search term.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SearchOutcome {
    pub term: String,
    pub results: Option<Table>,
    pub notice: Option<Notice>,
}

/// Fields collected by the add form.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct NewProduct {
    pub id: String,
    pub name: String,
    pub quantity: String,
    pub image: String,
}

/// Target identifier plus replacement values; blank means keep.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ProductUpdate {
    pub id: String,
    pub name: String,
    pub quantity: String,
    pub image: String,
}

/// Read/search/add/update/delete over one spreadsheet document.
///
/// Nothing is cached: each call works from the snapshot it is given or
/// reads a new one.
pub struct Catalog<S> {
    store: S,
}

impl<S: SheetStore> Catalog<S> {
    pub fn new(store: S) -> Self {
        Catalog { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Titles of every worksheet in the document.
    pub async fn connect(&self) -> Result<Vec<String>, SheetError> {
        self.store.list_tabs().await
    }

    /// Read `tab` into a snapshot.
    ///
    /// A header that cannot be read as records is not fatal: a warning is
    /// attached and the raw values are used with normalised column names.
    pub async fn load(&self, tab: &str) -> Result<Snapshot, SheetError> {
        let values = self.store.read_values(tab).await?;
        let mut notices = Vec::new();

        let table = match Table::from_records(values.clone()) {
            Ok(table) => table,
            Err(e) => {
                log::warn!("reading '{}' as records failed ({}), using raw values", tab, e);
                notices.push(Notice::Warning(format!(
                    "Could not read records ({}); falling back to raw values.",
                    e
                )));
                Table::from_raw_values(values)
            }
        };

        log::debug!("loaded {} rows from '{}'", table.rows.len(), tab);
        Ok(Snapshot {
            tab: tab.to_string(),
            table,
            notices,
            loaded_at: Utc::now(),
        })
    }

    /// Append a product as a new worksheet row.
    ///
    /// The row is aligned to the snapshot's columns: `id`, `name` and
    /// `quantity` go to the columns of those names, the image link to the
    /// detected image column, and every other cell is left blank.
    ///
    /// # Arguments
    /// * `snapshot` - The worksheet as read for this interaction
    /// * `product` - Form values; surrounding whitespace is dropped
    ///
    /// # Returns
    /// * `Notice::Success` once the row is appended
    /// * `Notice::Error` without writing when the sheet has no header
    /// * `SheetError` when the store rejects the append
    pub async fn add(&self, snapshot: &Snapshot, product: &NewProduct) -> Result<Notice, SheetError> {
        let table = &snapshot.table;
        if table.columns.is_empty() {
            return Ok(Notice::Error(
                "No header found in this sheet. Check the spreadsheet.".to_string(),
            ));
        }

        let mut fields = vec![
            (ID_COLUMN, product.id.trim()),
            (NAME_COLUMN, product.name.trim()),
            (QUANTITY_COLUMN, product.quantity.trim()),
        ];
        if let Some(image) = find_image_column(&table.columns) {
            fields.push((image, product.image.trim()));
        }

        let row = table.aligned_row(&fields);
        self.store.append_row(&snapshot.tab, row).await?;
        log::info!("added product '{}' to '{}'", product.id.trim(), snapshot.tab);

        Ok(Notice::Success(
            "Row added. Reload to see the result.".to_string(),
        ))
    }

    /// Overwrite the non-blank fields of the first row matching `update.id`.
    ///
    /// Each replacement is a single-cell write at the row's worksheet
    /// offset. Fields left blank, and fields whose column the sheet does
    /// not have, are skipped, so an update with every field blank writes
    /// nothing.
    ///
    /// # Arguments
    /// * `snapshot` - The worksheet as read for this interaction
    /// * `update` - Target identifier plus replacement values
    ///
    /// # Returns
    /// * `Notice::Success` after the writes
    /// * `Notice::Error` without writing when no row has that identifier
    /// * `SheetError` when a cell write fails
    pub async fn update(
        &self,
        snapshot: &Snapshot,
        update: &ProductUpdate,
    ) -> Result<Notice, SheetError> {
        let table = &snapshot.table;
        let id = update.id.trim();
        let Some(index) = table.find_by_id(id) else {
            return Ok(not_found(id));
        };
        let row = Table::sheet_row_offset(index);

        let mut changes = vec![
            (NAME_COLUMN, update.name.trim()),
            (QUANTITY_COLUMN, update.quantity.trim()),
        ];
        if let Some(image) = find_image_column(&table.columns) {
            changes.push((image, update.image.trim()));
        }

        for (column, value) in changes {
            if value.is_empty() {
                continue;
            }
            if let Some(col) = table.sheet_column_offset(column) {
                self.store.update_cell(&snapshot.tab, row, col, value).await?;
            }
        }

        log::info!("updated product '{}' at row {} of '{}'", id, row, snapshot.tab);
        Ok(Notice::Success(format!("Updated product with ID = {}", id)))
    }

    /// Remove the first row matching `id`.
    ///
    /// # Arguments
    /// * `snapshot` - The worksheet as read for this interaction
    /// * `id` - Identifier to match exactly after trimming
    ///
    /// # Returns
    /// * `Notice::Success` naming the deleted worksheet row
    /// * `Notice::Error` without writing when no row matches, including
    ///   sheets with no `id` column
    pub async fn delete(&self, snapshot: &Snapshot, id: &str) -> Result<Notice, SheetError> {
        let id = id.trim();
        let Some(index) = snapshot.table.find_by_id(id) else {
            return Ok(not_found(id));
        };
        let row = Table::sheet_row_offset(index);

        self.store.delete_row(&snapshot.tab, row).await?;
        log::info!("deleted product '{}' (row {}) from '{}'", id, row, snapshot.tab);

        Ok(Notice::Success(format!(
            "Deleted product with ID = {} (row {})",
            id, row
        )))
    }
}

fn not_found(id: &str) -> Notice {
    Notice::Error(format!("No product found with ID = {}", id))
}

/// Filter a snapshot by `term` against the `id` and `name` columns.
///
/// A blank term filters nothing and reports nothing.
pub fn search(snapshot: &Snapshot, term: &str) -> SearchOutcome {
    let term = term.trim();
    if term.is_empty() {
        return SearchOutcome::default();
    }

    match snapshot.table.search(term) {
        None => SearchOutcome {
            term: term.to_string(),
            results: None,
            notice: Some(Notice::Warning(
                "This sheet has no 'id' or 'name' column, search is unavailable.".to_string(),
            )),
        },
        Some(results) => {
            let notice = results
                .is_empty()
                .then(|| Notice::Info(format!("No rows match '{}'.", term)));
            SearchOutcome {
                term: term.to_string(),
                results: Some(results),
                notice,
            }
        }
    }
}
