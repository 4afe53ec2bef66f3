use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};

use super::types::{CellValue, Row, Sheet, SheetFormat};
use super::utils::{clean_headers, extension_of};
use crate::error::SheetError;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0];
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

impl SheetFormat {
    /// Picks a decode path from a MIME type or file name. `None` means the
    /// hint says nothing useful and the bytes have to be sniffed.
    pub fn from_hint(hint: &str) -> Option<Self> {
        let hint = hint.trim().to_ascii_lowercase();
        if hint.is_empty() {
            return None;
        }
        let mime = hint.split(';').next().unwrap_or("").trim();
        match mime {
            "text/csv" | "application/csv" => return Some(SheetFormat::Csv { delimiter: b',' }),
            "text/tab-separated-values" => return Some(SheetFormat::Csv { delimiter: b'\t' }),
            "application/vnd.ms-excel"
            | "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            | "application/vnd.ms-excel.sheet.macroenabled.12"
            | "application/vnd.ms-excel.sheet.binary.macroenabled.12"
            | "application/vnd.oasis.opendocument.spreadsheet" => return Some(SheetFormat::Workbook),
            _ => {}
        }
        match extension_of(&hint).as_deref() {
            Some("csv") => Some(SheetFormat::Csv { delimiter: b',' }),
            Some("tsv") | Some("tab") => Some(SheetFormat::Csv { delimiter: b'\t' }),
            Some("xlsx") | Some("xlsm") | Some("xlsb") | Some("xls") | Some("xla")
            | Some("xlam") | Some("ods") => Some(SheetFormat::Workbook),
            _ => None,
        }
    }

    pub fn sniff(bytes: &[u8]) -> Result<Self, SheetError> {
        if bytes.starts_with(ZIP_MAGIC) || bytes.starts_with(OLE_MAGIC) {
            Ok(SheetFormat::Workbook)
        } else if std::str::from_utf8(bytes).is_ok() {
            Ok(SheetFormat::Csv { delimiter: b',' })
        } else {
            Err(SheetError::Parse("Unrecognized spreadsheet format".to_string()))
        }
    }
}

/// Decodes spreadsheet bytes into columns and uniform rows. The hint is a MIME
/// type or file name and only selects the decode path.
pub fn parse(bytes: &[u8], hint: Option<&str>) -> Result<Sheet, SheetError> {
    if bytes.is_empty() {
        return Ok(Sheet::default());
    }
    let format = match hint.and_then(SheetFormat::from_hint) {
        Some(format) => format,
        None => SheetFormat::sniff(bytes)?,
    };
    tracing::debug!("Decoding {} bytes as {:?}", bytes.len(), format);

    match format {
        SheetFormat::Workbook => parse_workbook(bytes),
        SheetFormat::Csv { delimiter } => parse_delimited(bytes, delimiter),
    }
}

pub fn parse_workbook(bytes: &[u8]) -> Result<Sheet, SheetError> {
    let cursor = Cursor::new(bytes);
    let mut workbook = open_workbook_auto_from_rs(cursor).map_err(|e| {
        tracing::error!("Failed to open workbook: {}", e);
        SheetError::Parse(format!("Failed to open workbook: {}", e))
    })?;

    let sheet_names = workbook.sheet_names().to_vec();
    tracing::debug!("Found {} sheets: {:?}", sheet_names.len(), sheet_names);

    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range.map_err(|e| {
            SheetError::Parse(format!("Failed to read worksheet: {}", e))
        })?,
        None => {
            tracing::warn!("Workbook has no sheets");
            return Ok(Sheet::default());
        }
    };

    let mut rows = range.rows();
    let headers = match rows.next() {
        Some(header_row) => clean_headers(header_row.iter().map(header_text)),
        None => return Ok(Sheet::default()),
    };

    Ok(build_sheet(headers, rows.map(|row| row.iter().map(cell_from_data).collect())))
}

pub fn parse_delimited(bytes: &[u8], delimiter: u8) -> Result<Sheet, SheetError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true)
        .from_reader(bytes);

    let mut records = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.map_err(|e| {
            SheetError::Parse(format!("Failed to read line {}: {}", idx + 1, e))
        })?;
        records.push(record);
    }

    let mut records = records.into_iter();
    let headers = match records.next() {
        Some(header_row) => clean_headers(header_row.iter()),
        None => return Ok(Sheet::default()),
    };

    Ok(build_sheet(
        headers,
        records.map(|record| record.iter().map(CellValue::from).collect()),
    ))
}

fn build_sheet<I>(columns: Vec<String>, records: I) -> Sheet
where
    I: Iterator<Item = Vec<CellValue>>,
{
    let rows = records
        .filter(|cells| cells.iter().any(|cell| !cell.is_empty()))
        .map(|cells| {
            let mut cells = cells.into_iter();
            columns
                .iter()
                .map(|name| (name.clone(), cells.next().unwrap_or_default()))
                .collect::<Row>()
        })
        .collect();

    Sheet { columns, rows }
}

fn header_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

fn cell_from_data(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::from(s.as_str()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::from(s.as_str()),
        // "#DIV/0!" and friends carry no value; as text they would coerce to 0
        Data::Error(_) => CellValue::Empty,
    }
}
