//! Tabular export of the ledger listing, as CSV or as an XLSX workbook.
//!
//! One row per stock record, in listing order (part number, then location).
//! Timestamps use the `YYYY-MM-DD HH:MM:SS` form the warehouse sheets expect.

use std::collections::BTreeMap;
use std::io::Write;

use rust_xlsxwriter::{Workbook, Worksheet};
use serde::Serialize;
use thiserror::Error;

use stockroom_inventory::{PartNumber, StockRecord};

pub const EXPORT_COLUMNS: [&str; 7] = [
    "id",
    "part_number",
    "location",
    "quantity",
    "date_in",
    "last_updated",
    "status",
];

pub const CSV_FILE_NAME: &str = "inventory_export.csv";
pub const XLSX_FILE_NAME: &str = "inventory_export.xlsx";
pub const XLSX_SHEET_NAME: &str = "inventory";

/// Largest integer an XLSX number cell holds exactly (2^53).
const XLSX_MAX_EXACT_NUMBER: u64 = 1 << 53;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("xlsx error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("too many rows for a worksheet: {0}")]
    TooManyRows(usize),
}

#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    id: String,
    part_number: &'a str,
    location: &'a str,
    quantity: u64,
    date_in: String,
    last_updated: String,
    status: &'static str,
}

impl<'a> From<&'a StockRecord> for ExportRow<'a> {
    fn from(record: &'a StockRecord) -> Self {
        Self {
            id: record.id().to_string(),
            part_number: record.part_number().as_str(),
            location: record.location().as_str(),
            quantity: record.quantity(),
            date_in: record.date_in().format(TIMESTAMP_FORMAT).to_string(),
            last_updated: record.last_updated().format(TIMESTAMP_FORMAT).to_string(),
            status: record.status().as_str(),
        }
    }
}

/// Write the grouped listing as CSV (header always present).
pub fn write_csv<W: Write>(
    grouped: &BTreeMap<PartNumber, Vec<StockRecord>>,
    writer: W,
) -> Result<W, ExportError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    csv_writer.write_record(EXPORT_COLUMNS)?;
    for record in grouped.values().flatten() {
        csv_writer.serialize(ExportRow::from(record))?;
    }

    csv_writer.into_inner().map_err(|e| ExportError::Io(e.into_error()))
}

pub fn csv_bytes(grouped: &BTreeMap<PartNumber, Vec<StockRecord>>) -> Result<Vec<u8>, ExportError> {
    write_csv(grouped, Vec::new())
}

/// Fill `worksheet` with the header row and one row per record.
///
/// Quantities are number cells unless they exceed what a spreadsheet number
/// holds exactly, in which case they are written as text.
pub fn write_xlsx(
    grouped: &BTreeMap<PartNumber, Vec<StockRecord>>,
    worksheet: &mut Worksheet,
) -> Result<(), ExportError> {
    for (col, name) in (0u16..).zip(EXPORT_COLUMNS) {
        worksheet.write_string(0, col, name)?;
    }

    for (index, record) in grouped.values().flatten().enumerate() {
        let row = u32::try_from(index + 1).map_err(|_| ExportError::TooManyRows(index + 1))?;
        let r = ExportRow::from(record);

        worksheet.write_string(row, 0, r.id)?;
        worksheet.write_string(row, 1, r.part_number)?;
        worksheet.write_string(row, 2, r.location)?;
        if r.quantity <= XLSX_MAX_EXACT_NUMBER {
            worksheet.write_number(row, 3, r.quantity as f64)?;
        } else {
            worksheet.write_string(row, 3, r.quantity.to_string())?;
        }
        worksheet.write_string(row, 4, r.date_in)?;
        worksheet.write_string(row, 5, r.last_updated)?;
        worksheet.write_string(row, 6, r.status)?;
    }

    Ok(())
}

/// Whole workbook (one `inventory` sheet) as XLSX bytes.
pub fn xlsx_bytes(grouped: &BTreeMap<PartNumber, Vec<StockRecord>>) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(XLSX_SHEET_NAME)?;
    write_xlsx(grouped, worksheet)?;
    Ok(workbook.save_to_buffer()?)
}
