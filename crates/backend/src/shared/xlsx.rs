//! Tabular export model rendered to XLSX with `rust_xlsxwriter`.

use anyhow::Context;
use rust_xlsxwriter::Format;

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        Cell::Number(v)
    }
}

impl From<i32> for Cell {
    fn from(v: i32) -> Self {
        Cell::Number(v as f64)
    }
}

impl From<i64> for Cell {
    fn from(v: i64) -> Self {
        Cell::Number(v as f64)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Cell::Empty)
    }
}

#[derive(Debug, Clone)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn new(name: &str, headers: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            rows: vec![headers.iter().map(|h| Cell::from(*h)).collect()],
        }
    }

    pub fn push(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }
}

#[derive(Debug, Clone, Default)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_sheet(&mut self, sheet: Sheet) {
        self.sheets.push(sheet);
    }

    /// Serializes the workbook into XLSX bytes
    pub fn to_bytes(&self) -> anyhow::Result<Vec<u8>> {
        if self.sheets.is_empty() {
            anyhow::bail!("workbook has no sheets");
        }

        let mut workbook = rust_xlsxwriter::Workbook::new();
        let bold = Format::new().set_bold();

        for sheet in &self.sheets {
            let name = sheet_name(&sheet.name);
            let worksheet = workbook.add_worksheet();
            worksheet
                .set_name(&name)
                .with_context(|| format!("naming sheet '{}'", name))?;

            for (r, row) in sheet.rows.iter().enumerate() {
                let row_idx = u32::try_from(r).context("too many rows")?;
                for (c, cell) in row.iter().enumerate() {
                    let col_idx = u16::try_from(c).context("too many columns")?;
                    match cell {
                        Cell::Text(s) if row_idx == 0 => {
                            worksheet.write_string_with_format(row_idx, col_idx, s.as_str(), &bold)?;
                        }
                        Cell::Text(s) => {
                            worksheet.write_string(row_idx, col_idx, s.as_str())?;
                        }
                        Cell::Number(v) if v.is_finite() => {
                            worksheet.write_number(row_idx, col_idx, *v)?;
                        }
                        Cell::Number(_) | Cell::Empty => {}
                    }
                }
            }
        }

        workbook.save_to_buffer().context("serializing xlsx workbook")
    }
}

/// Excel limits sheet names to 31 chars without `[]:*?/\` or edge apostrophes
fn sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | ':' | '*' | '?' | '/' | '\\'))
        .take(31)
        .collect::<String>()
        .trim_matches('\'')
        .to_string();
    if cleaned.is_empty() {
        "Sheet".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read};

    fn read_entry(archive: &mut zip::ZipArchive<Cursor<Vec<u8>>>, name: &str) -> String {
        let mut content = String::new();
        archive.by_name(name).unwrap().read_to_string(&mut content).unwrap();
        content
    }

    #[test]
    fn test_workbook_archive_layout() {
        let mut sheet = Sheet::new("Level Report", &["Sr No", "Member Name", "Amount"]);
        sheet.push(vec![Cell::Number(1.0), "Ravi & Sons <A>".into(), Cell::Number(300.5)]);
        sheet.push(vec![Cell::Number(2.0), Cell::Empty, Option::<f64>::None.into()]);

        let mut workbook = Workbook::new();
        workbook.add_sheet(sheet);
        workbook.add_sheet(Sheet::new("Multiple Payments", &["Book Number"]));
        let bytes = workbook.to_bytes().unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert!(archive.by_name("xl/worksheets/sheet2.xml").is_ok());

        let strings = read_entry(&mut archive, "xl/sharedStrings.xml");
        assert!(strings.contains("Ravi &amp; Sons &lt;A&gt;"));

        let sheet1 = read_entry(&mut archive, "xl/worksheets/sheet1.xml");
        assert!(sheet1.contains("<v>300.5</v>"));
        assert!(!sheet1.contains(r#"r="B3""#));

        let wb = read_entry(&mut archive, "xl/workbook.xml");
        assert!(wb.contains(r#"name="Multiple Payments""#));
    }

    #[test]
    fn test_sheet_names_are_cleaned() {
        assert_eq!(sheet_name("Q1/Q2 [draft]"), "Q1Q2 draft");
        assert_eq!(sheet_name("???"), "Sheet");
        assert_eq!(sheet_name(&"x".repeat(40)).len(), 31);

        let mut workbook = Workbook::new();
        workbook.add_sheet(Sheet::new("Members: 2025/26", &["Name"]));
        assert!(workbook.to_bytes().is_ok());
    }

    #[test]
    fn test_empty_workbook_rejected() {
        assert!(Workbook::new().to_bytes().is_err());
    }
}
