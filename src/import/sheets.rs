use std::collections::{BTreeMap, HashMap};
use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use serde_json::Value;

use super::ImportError;

/// Header text as a lookup key: `" Destination ID"` and `destination_id`
/// name the same column.
fn header_key(header: &str) -> String {
    header
        .trim()
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c.to_ascii_lowercase() })
        .collect()
}

/// One data row of a sheet, keyed by header text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetRow {
    /// 1-based spreadsheet row number; the header occupies row 1.
    pub number: usize,
    cells: BTreeMap<String, String>,
}

impl SheetRow {
    pub fn new(number: usize, cells: BTreeMap<String, String>) -> Self {
        let cells = cells
            .into_iter()
            .map(|(header, value)| (header_key(&header), value))
            .collect();
        Self { number, cells }
    }

    /// Trimmed cell text, `None` when absent or blank. Column names match
    /// regardless of case.
    pub fn text(&self, column: &str) -> Option<&str> {
        self.cells
            .get(&header_key(column))
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    pub fn string(&self, column: &str) -> String {
        self.text(column).unwrap_or_default().to_string()
    }

    pub fn number(&self, column: &str) -> Option<f64> {
        let raw = self.text(column)?;
        let cleaned: String = raw
            .chars()
            .filter(|c| c.is_ascii_digit() || matches!(c, '.' | '-'))
            .collect();
        cleaned.parse().ok()
    }

    pub fn whole(&self, column: &str) -> Option<u32> {
        self.number(column)
            .filter(|n| *n >= 0.0)
            .map(|n| n.round() as u32)
    }

    pub fn flag(&self, column: &str) -> Option<bool> {
        match self.text(column)?.to_ascii_lowercase().as_str() {
            "yes" | "y" | "true" | "1" => Some(true),
            "no" | "n" | "false" | "0" => Some(false),
            _ => None,
        }
    }

    /// Split a multi-value cell on `|`, `;` or newlines.
    pub fn list(&self, column: &str) -> Vec<String> {
        self.text(column)
            .map(|raw| {
                raw.split(['|', ';', '\n'])
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn is_blank(&self) -> bool {
        self.cells.values().all(|value| value.trim().is_empty())
    }
}

/// Sheets by name, each a list of rows below its header row.
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    sheets: HashMap<String, Vec<SheetRow>>,
}

impl Workbook {
    /// Read an `.xlsx`/`.xls` file from memory, or a JSON workbook when the
    /// payload starts with `{`.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, ImportError> {
        let looks_like_json = bytes
            .iter()
            .find(|b| !b.is_ascii_whitespace())
            .is_some_and(|b| *b == b'{');
        if looks_like_json {
            let value: Value = serde_json::from_slice(&bytes)
                .map_err(|err| ImportError::InvalidJson(err.to_string()))?;
            Self::from_json(&value)
        } else {
            Self::from_spreadsheet(bytes)
        }
    }

    pub fn from_spreadsheet(bytes: Vec<u8>) -> Result<Self, ImportError> {
        let mut source = open_workbook_auto_from_rs(Cursor::new(bytes))
            .map_err(|err| ImportError::Spreadsheet(err.to_string()))?;

        let mut workbook = Workbook::default();
        for name in source.sheet_names() {
            let range = source
                .worksheet_range(&name)
                .map_err(|err| ImportError::Spreadsheet(format!("{name}: {err}")))?;
            let first_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);

            let mut rows = range.rows();
            let headers: Vec<String> = match rows.next() {
                Some(header) => header.iter().map(cell_text).collect(),
                None => Vec::new(),
            };

            let parsed = rows
                .enumerate()
                .map(|(offset, cells)| {
                    let cells = headers
                        .iter()
                        .zip(cells.iter())
                        .filter(|(header, _)| !header.is_empty())
                        .map(|(header, cell)| (header.clone(), cell_text(cell)))
                        .collect();
                    SheetRow::new(first_row + offset + 2, cells)
                })
                .filter(|row| !row.is_blank())
                .collect();
            workbook.sheets.insert(name, parsed);
        }

        tracing::debug!(sheets = workbook.sheets.len(), "spreadsheet parsed");
        Ok(workbook)
    }

    /// `{"Sheet": [{"Header": value, ...}, ...], ...}`; rows are numbered as
    /// if the array followed a header row.
    pub fn from_json(value: &Value) -> Result<Self, ImportError> {
        let sheets = value
            .as_object()
            .ok_or_else(|| ImportError::InvalidJson("expected an object of sheets".into()))?;

        let mut workbook = Workbook::default();
        for (name, rows) in sheets {
            let rows = rows
                .as_array()
                .ok_or_else(|| ImportError::InvalidJson(format!("sheet `{name}` is not an array")))?;
            let parsed = rows
                .iter()
                .enumerate()
                .map(|(index, row)| {
                    let cells = row
                        .as_object()
                        .map(|object| {
                            object
                                .iter()
                                .map(|(header, value)| (header.trim().to_string(), json_text(value)))
                                .collect()
                        })
                        .unwrap_or_default();
                    SheetRow::new(index + 2, cells)
                })
                .filter(|row| !row.is_blank())
                .collect();
            workbook.sheets.insert(name.clone(), parsed);
        }
        Ok(workbook)
    }

    pub fn insert_sheet(&mut self, name: impl Into<String>, rows: Vec<SheetRow>) {
        self.sheets.insert(name.into(), rows);
    }

    pub fn has_sheet(&self, name: &str) -> bool {
        self.sheets.keys().any(|sheet| sheet.eq_ignore_ascii_case(name))
    }

    /// Rows of the named sheet (case-insensitive); empty when missing.
    pub fn rows(&self, name: &str) -> &[SheetRow] {
        self.sheets
            .iter()
            .find(|(sheet, _)| sheet.eq_ignore_ascii_case(name))
            .map(|(_, rows)| rows.as_slice())
            .unwrap_or(&[])
    }
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(text) => text.trim().to_string(),
        Data::Float(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
            format!("{}", *value as i64)
        }
        Data::Float(value) => value.to_string(),
        Data::Int(value) => value.to_string(),
        Data::Bool(value) => value.to_string(),
        other => other.to_string(),
    }
}

fn json_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.trim().to_string(),
        Value::Array(items) => items
            .iter()
            .map(json_text)
            .filter(|item| !item.is_empty())
            .collect::<Vec<_>>()
            .join("|"),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_workbook_rows_start_at_two() {
        let workbook = Workbook::from_json(&json!({
            "Packages_Master": [
                {"Destination_ID": " dxb001 ", "Title": "Dubai Escape", "Price": 1299},
                {"Destination_ID": "", "Title": ""},
                {"Destination_ID": "BKK002", "Featured": true}
            ]
        }))
        .unwrap();

        let rows = workbook.rows("packages_master");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].number, 2);
        assert_eq!(rows[0].text("Destination_ID"), Some("dxb001"));
        assert_eq!(rows[0].number("Price"), Some(1299.0));
        assert_eq!(rows[1].number, 4);
        assert_eq!(rows[1].flag("Featured"), Some(true));
        assert!(workbook.rows("Reviews").is_empty());
    }

    #[test]
    fn list_cells_split_on_separators() {
        let row = SheetRow::new(
            2,
            BTreeMap::from([("Highlights".to_string(), "Desert safari | Marina cruise;\nBurj Khalifa".to_string())]),
        );
        assert_eq!(row.list("Highlights"), vec!["Desert safari", "Marina cruise", "Burj Khalifa"]);
        assert!(row.list("Missing").is_empty());
    }

    #[test]
    fn numbers_tolerate_currency_formatting() {
        let row = SheetRow::new(2, BTreeMap::from([("Price".to_string(), "$1,499".to_string())]));
        assert_eq!(row.number("Price"), Some(1499.0));
        assert_eq!(row.whole("Price"), Some(1499));
    }

    #[test]
    fn headers_match_regardless_of_case_and_spacing() {
        let workbook = Workbook::from_json(&json!({
            "Packages_Master": [{"destination_id": "dxb9", "TITLE": "Dubai", "Duration Days": 4}]
        }))
        .unwrap();
        let row = &workbook.rows("Packages_Master")[0];
        assert_eq!(row.text("Destination_ID"), Some("dxb9"));
        assert_eq!(row.text("Title"), Some("Dubai"));
        assert_eq!(row.whole("Duration_Days"), Some(4));
    }

    #[test]
    fn from_bytes_sniffs_json() {
        let bytes = br#"  {"FAQs": [{"Destination_ID": "X1", "Question": "Visa?"}]}"#.to_vec();
        let workbook = Workbook::from_bytes(bytes).unwrap();
        assert_eq!(workbook.rows("FAQs").len(), 1);
    }

    #[test]
    fn garbage_is_a_spreadsheet_error() {
        let err = Workbook::from_bytes(b"not a workbook".to_vec()).unwrap_err();
        assert!(matches!(err, ImportError::Spreadsheet(_)));
    }
}
