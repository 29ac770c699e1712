use crate::table::Table;
#[cfg(feature = "web")]
use std::error::Error;
use std::str::FromStr;

/// Download formats for a worksheet snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Xlsx,
}

impl ExportFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "xlsx" => Ok(ExportFormat::Xlsx),
            other => Err(format!("Unsupported export format: {}", other)),
        }
    }
}

fn push_field(out: &mut String, value: &str) {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        out.push('"');
        out.push_str(&value.replace('"', "\"\""));
        out.push('"');
    } else {
        out.push_str(value);
    }
}

fn push_line(out: &mut String, fields: &[String]) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        push_field(out, field);
    }
    out.push('\n');
}

/// Convert a snapshot to CSV, header line first.
///
/// Fields holding commas, quotes or line breaks are quoted, with inner
/// quotes doubled.
///
/// # Examples
/// ```
/// use catalog::export::to_csv;
/// use catalog::table::Table;
///
/// let table = Table {
///     columns: vec!["id".into(), "name".into()],
///     rows: vec![vec!["1".into(), "Lamp, brass".into()]],
/// };
/// assert_eq!(to_csv(&table), "id,name\n1,\"Lamp, brass\"\n");
/// ```
pub fn to_csv(table: &Table) -> String {
    let mut csv_content = String::new();

    push_line(&mut csv_content, &table.columns);
    for row in &table.rows {
        push_line(&mut csv_content, row);
    }

    csv_content
}

/// Convert a snapshot to an XLSX workbook with one worksheet.
///
/// All cells are written as text, matching how they were read.
///
/// # Errors
/// * A table wider than 65,536 columns or taller than `u32` rows cannot be
///   addressed and is refused rather than written to the wrong cells
/// * Any `rust_xlsxwriter` error, including positions past the XLSX grid
#[cfg(feature = "web")]
pub fn to_xlsx(table: &Table) -> Result<Vec<u8>, Box<dyn Error>> {
    use rust_xlsxwriter::{Workbook, Worksheet};

    let mut workbook = Workbook::new();
    let mut worksheet = Worksheet::new();

    for (c, name) in table.columns.iter().enumerate() {
        worksheet.write_string(0, u16::try_from(c)?, name)?;
    }

    for (r, row) in table.rows.iter().enumerate() {
        let sheet_row = u32::try_from(r + 1)?;
        for (c, value) in row.iter().enumerate() {
            if !value.is_empty() {
                worksheet.write_string(sheet_row, u16::try_from(c)?, value)?;
            }
        }
    }

    workbook.push_worksheet(worksheet);
    let buffer = workbook.save_to_buffer()?;

    Ok(buffer)
}

/// Render a snapshot in `format`.
#[cfg(feature = "web")]
pub fn export(table: &Table, format: ExportFormat) -> Result<Vec<u8>, Box<dyn Error>> {
    match format {
        ExportFormat::Csv => Ok(to_csv(table).into_bytes()),
        ExportFormat::Xlsx => to_xlsx(table),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_are_doubled() {
        let table = Table {
            columns: vec!["note".to_string()],
            rows: vec![vec!["say \"hi\"".to_string()], vec!["two\nlines".to_string()]],
        };
        assert_eq!(to_csv(&table), "note\n\"say \"\"hi\"\"\"\n\"two\nlines\"\n");
    }

    #[test]
    fn format_names() {
        assert_eq!("XLSX".parse::<ExportFormat>().unwrap(), ExportFormat::Xlsx);
        assert!("pdf".parse::<ExportFormat>().is_err());
        assert_eq!(ExportFormat::Csv.extension(), "csv");
    }

    #[cfg(feature = "web")]
    #[test]
    fn xlsx_is_a_zip_container() {
        let table = Table {
            columns: vec!["id".to_string()],
            rows: vec![vec!["1".to_string()]],
        };
        let bytes = to_xlsx(&table).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[cfg(feature = "web")]
    #[test]
    fn xlsx_refuses_columns_past_the_grid() {
        let columns: Vec<String> = (0..=u16::MAX as usize + 1).map(|c| format!("c{}", c)).collect();
        let table = Table {
            columns,
            rows: Vec::new(),
        };
        assert!(to_xlsx(&table).is_err());
    }
}
