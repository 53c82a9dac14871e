use contracts::shared::excel::ImportRowError;
use std::collections::HashMap;

/// Uploaded table as header -> cell maps, the same shape the client sends
/// for parsed workbooks
pub type TableRow = HashMap<String, String>;

/// Parsed CSV upload. A record that could not be read keeps its place in
/// `rows` as an empty row and is listed in `malformed` with its row number.
#[derive(Debug, Default)]
pub struct CsvTable {
    pub rows: Vec<TableRow>,
    pub malformed: Vec<ImportRowError>,
}

/// Reads CSV text with a header row. Cells are trimmed; ragged rows are kept.
pub fn csv_to_rows(csv_text: &str) -> anyhow::Result<CsvTable> {
    csv_bytes_to_rows(csv_text.as_bytes())
}

/// Same as [`csv_to_rows`] for raw bytes; records with invalid UTF-8 are malformed
pub fn csv_bytes_to_rows(bytes: &[u8]) -> anyhow::Result<CsvTable> {
    // Strip UTF-8 BOM if present
    let data = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| anyhow::anyhow!("Failed to read CSV headers: {}", e))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut table = CsvTable::default();
    for (idx, result) in reader.records().enumerate() {
        let row_no = idx + 2;
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("Malformed CSV record {}: {}", row_no, e);
                table.rows.push(TableRow::new());
                table
                    .malformed
                    .push(ImportRowError::new(row_no, format!("Malformed CSV record: {}", e)));
                continue;
            }
        };
        let row = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.clone(), record.get(i).unwrap_or("").trim().to_string()))
            .collect();
        table.rows.push(row);
    }
    Ok(table)
}

/// Adds the unreadable records to an import's row errors, keeping row order
pub fn report_malformed(errors: &mut Vec<ImportRowError>, malformed: Vec<ImportRowError>) {
    if malformed.is_empty() {
        return;
    }
    errors.extend(malformed);
    errors.sort_by_key(|e| e.row);
}

/// Cell by header name (case-insensitive, surrounding spaces ignored);
/// None when missing or blank
pub fn field<'a>(row: &'a TableRow, name: &str) -> Option<&'a str> {
    row.iter()
        .find(|(k, _)| k.trim().eq_ignore_ascii_case(name))
        .map(|(_, v)| v.trim())
        .filter(|v| !v.is_empty())
}

/// True when no cell of the row has content
pub fn is_blank(row: &TableRow) -> bool {
    row.values().all(|v| v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::hashmap;

    #[test]
    fn test_csv_rows_and_fields() {
        let table = csv_to_rows("\u{FEFF}Book Number, Member Name ,Amount\n1,Ravi,300\n2,,\n").unwrap();
        assert!(table.malformed.is_empty());
        let rows = table.rows;
        assert_eq!(rows.len(), 2);
        assert_eq!(field(&rows[0], "member name"), Some("Ravi"));
        assert_eq!(field(&rows[0], "Amount"), Some("300"));
        assert_eq!(field(&rows[1], "Member Name"), None);
        assert_eq!(field(&rows[0], "Missing"), None);
    }

    #[test]
    fn test_malformed_record_is_reported() {
        let table = csv_bytes_to_rows(b"Book Number,Member Name\n1,Ravi\n2,\xff\xfe\n3,Meena\n").unwrap();
        assert_eq!(table.rows.len(), 3);
        assert!(is_blank(&table.rows[1]));
        assert_eq!(field(&table.rows[2], "Member Name"), Some("Meena"));
        assert_eq!(table.malformed.len(), 1);
        assert_eq!(table.malformed[0].row, 3);

        let mut errors = vec![ImportRowError::new(4, "Book not found")];
        report_malformed(&mut errors, table.malformed);
        assert_eq!(errors.iter().map(|e| e.row).collect::<Vec<_>>(), vec![3, 4]);
    }

    #[test]
    fn test_blank_rows() {
        let blank = hashmap! { "A".to_string() => " ".to_string() };
        assert!(is_blank(&blank));
        let filled = hashmap! { "A".to_string() => "x".to_string() };
        assert!(!is_blank(&filled));
    }
}
