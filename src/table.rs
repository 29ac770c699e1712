use crate::error::TableError;
use serde::Serialize;
use std::collections::HashSet;

/// Name of the identifier column used by search, update and delete.
pub const ID_COLUMN: &str = "id";

/// Name of the display column used by search and image captions.
pub const NAME_COLUMN: &str = "name";

/// Worksheet rows above the first data row (the header line).
const HEADER_ROWS: usize = 1;

/// A point-in-time copy of one worksheet.
///
/// Columns come from the worksheet's first line. Every row holds exactly
/// `columns.len()` values.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Builds a table the strict way: the first line is the header and
    /// must not repeat a name.
    ///
    /// # Errors
    /// * `TableError::DuplicateHeader` if two header cells hold the same
    ///   text; two blank cells count as a repeat
    pub fn from_records(values: Vec<Vec<String>>) -> Result<Self, TableError> {
        let mut lines = values.into_iter();
        let Some(header) = lines.next() else {
            return Ok(Table::default());
        };

        let mut seen = HashSet::new();
        for name in &header {
            if !seen.insert(name.as_str()) {
                return Err(TableError::DuplicateHeader(name.clone()));
            }
        }

        Ok(Self::with_columns(header, lines))
    }

    /// Builds a table from raw cell values without failing.
    ///
    /// Header names are trimmed and lower-cased; a blank header cell
    /// becomes `col_<position>`.
    pub fn from_raw_values(values: Vec<Vec<String>>) -> Self {
        let mut lines = values.into_iter();
        let Some(header) = lines.next() else {
            return Table::default();
        };

        let columns = header
            .iter()
            .enumerate()
            .map(|(i, h)| {
                let name = h.trim().to_lowercase();
                if name.is_empty() {
                    format!("col_{}", i)
                } else {
                    name
                }
            })
            .collect();

        Self::with_columns(columns, lines)
    }

    fn with_columns(columns: Vec<String>, lines: impl Iterator<Item = Vec<String>>) -> Self {
        let width = columns.len();
        let rows = lines
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Table { columns, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Value of `column` in the row at `index`, if both exist.
    pub fn value(&self, index: usize, column: &str) -> Option<&str> {
        let col = self.column_index(column)?;
        self.rows.get(index).map(|row| row[col].as_str())
    }

    /// Position of the first row whose identifier equals `id` exactly.
    pub fn find_by_id(&self, id: &str) -> Option<usize> {
        let col = self.column_index(ID_COLUMN)?;
        self.rows.iter().position(|row| row[col] == id)
    }

    /// 1-based worksheet row holding snapshot row `index`.
    ///
    /// # Examples
    /// ```
    /// use catalog::table::Table;
    ///
    /// // Row 1 is the header, so the first data row is row 2
    /// assert_eq!(Table::sheet_row_offset(0), 2);
    /// ```
    pub fn sheet_row_offset(index: usize) -> usize {
        index + HEADER_ROWS + 1
    }

    /// 1-based worksheet column holding `name`.
    pub fn sheet_column_offset(&self, name: &str) -> Option<usize> {
        self.column_index(name).map(|i| i + 1)
    }

    /// Rows whose `id` or `name` contains `term`, ignoring case.
    ///
    /// # Arguments
    /// * `term` - Text to look for; matched as a substring
    ///
    /// # Returns
    /// * `Some` table with the same columns and only the matching rows
    /// * `None` when the table lacks either column
    pub fn search(&self, term: &str) -> Option<Table> {
        let id = self.column_index(ID_COLUMN)?;
        let name = self.column_index(NAME_COLUMN)?;
        let needle = term.to_lowercase();

        let rows = self
            .rows
            .iter()
            .filter(|row| {
                row[id].to_lowercase().contains(&needle) || row[name].to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();

        Some(Table {
            columns: self.columns.clone(),
            rows,
        })
    }

    /// A new row in column order: the given value where a field names an
    /// existing column, empty text everywhere else.
    ///
    /// # Examples
    /// ```
    /// use catalog::table::Table;
    ///
    /// let table = Table {
    ///     columns: vec!["id".into(), "price".into(), "name".into()],
    ///     rows: Vec::new(),
    /// };
    /// assert_eq!(table.aligned_row(&[("name", "Lamp"), ("id", "P1"), ("color", "red")]), vec!["P1", "", "Lamp"]);
    /// ```
    pub fn aligned_row(&self, fields: &[(&str, &str)]) -> Vec<String> {
        self.columns
            .iter()
            .map(|column| {
                fields
                    .iter()
                    .find(|(field, _)| field == column)
                    .map(|(_, value)| value.to_string())
                    .unwrap_or_default()
            })
            .collect()
    }
}

/// Convert column number to letter (A=1, B=2, etc.)
///
/// # Examples
/// ```
/// use catalog::table::column_letter;
///
/// assert_eq!(column_letter(1), "A");
/// assert_eq!(column_letter(26), "Z");
/// assert_eq!(column_letter(27), "AA");
/// assert_eq!(column_letter(52), "AZ");
/// ```
pub fn column_letter(col: usize) -> String {
    let mut name = String::new();
    let mut n = col;

    while n > 0 {
        n -= 1;
        name.insert(0, (b'A' + (n % 26) as u8) as char);
        n /= 26;
    }

    name
}

/// A1 reference for a 1-based row and column, e.g. `C7`.
pub fn a1_cell(row: usize, col: usize) -> String {
    format!("{}{}", column_letter(col), row)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&[&str]]) -> Vec<Vec<String>> {
        raw.iter()
            .map(|line| line.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    #[test]
    fn short_rows_are_padded_and_long_rows_cut() {
        let table = Table::from_records(lines(&[&["id", "name"], &["1"], &["2", "b", "extra"]])).unwrap();
        assert_eq!(table.rows, lines(&[&["1", ""], &["2", "b"]]));
    }

    #[test]
    fn duplicate_header_is_rejected() {
        let err = Table::from_records(lines(&[&["id", "name", "id"]])).unwrap_err();
        assert_eq!(err, TableError::DuplicateHeader("id".to_string()));
    }

    #[test]
    fn repeated_blank_header_is_rejected_but_single_blank_is_not() {
        let err = Table::from_records(lines(&[&["id", "", "name", ""]])).unwrap_err();
        assert_eq!(err, TableError::DuplicateHeader(String::new()));

        let table = Table::from_records(lines(&[&["id", "", "name"], &["1", "x", "Lamp"]])).unwrap();
        assert_eq!(table.columns, vec!["id", "", "name"]);
    }

    #[test]
    fn raw_values_normalise_header() {
        let table = Table::from_raw_values(lines(&[&[" ID ", "", "Name"], &["1", "x", "y"]]));
        assert_eq!(table.columns, vec!["id", "col_1", "name"]);
    }

    #[test]
    fn offsets_skip_header() {
        let table = Table::from_records(lines(&[&["id", "name"], &["7", "x"]])).unwrap();
        assert_eq!(Table::sheet_row_offset(0), 2);
        assert_eq!(table.sheet_column_offset("name"), Some(2));
        assert_eq!(table.sheet_column_offset("price"), None);
    }

    #[test]
    fn a1_references() {
        assert_eq!(a1_cell(5, 3), "C5");
        assert_eq!(a1_cell(1, 28), "AB1");
    }
}
