use crate::Result;
use std::io::{self, Read};

/// Raw CSV contents: one header row plus string records
#[derive(Debug, Clone)]
pub struct CsvData {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Read CSV data from stdin
pub fn read_csv_from_stdin() -> Result<CsvData> {
    let stdin = io::stdin();
    read_csv(stdin.lock())
}

/// Read CSV data from any reader. Records must all have the header's width.
pub fn read_csv<R: Read>(reader: R) -> Result<CsvData> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers = rdr.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(CsvData { headers, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_csv() {
        let data = read_csv("name, qty\nAAA,500\nBBB,1000\n".as_bytes()).unwrap();
        assert_eq!(data.headers, vec!["name", "qty"]);
        assert_eq!(data.rows.len(), 2);
        assert_eq!(data.rows[1], vec!["BBB", "1000"]);
    }

    #[test]
    fn test_read_csv_header_only() {
        let data = read_csv("a,b\n".as_bytes()).unwrap();
        assert!(data.rows.is_empty());
    }

    #[test]
    fn test_read_csv_ragged_record() {
        let err = read_csv("a,b\n1,2\n3\n".as_bytes()).unwrap_err();
        assert!(matches!(err, crate::TableError::Csv(_)));
    }
}
