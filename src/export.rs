use std::error::Error;

use crate::grid::{MetricKind, YearSeries};

/// Convert a dense series to an XLSX workbook
///
/// Writes one header row (Year plus each metric label with its unit) and one
/// row per dense year. A metric that is not populated for a year leaves its
/// cell blank, so sparse data stays visibly sparse in the sheet.
///
/// # Arguments
/// * `series` - The dense per-year series to export
///
/// # Returns
/// * `Result<Vec<u8>, Box<dyn Error>>` - XLSX file content as bytes or an error
pub fn to_xlsx(series: &[YearSeries]) -> Result<Vec<u8>, Box<dyn Error>> {
    use rust_xlsxwriter::{Workbook, Worksheet};

    let mut workbook = Workbook::new();
    let mut worksheet = Worksheet::new();

    worksheet.write_string(0, 0, "Year")?;
    for (col, kind) in MetricKind::ALL.iter().enumerate() {
        let header = format!("{} ({})", kind.label(), kind.unit());
        worksheet.write_string(0, (col + 1) as u16, &header)?;
    }

    for (row, entry) in series.iter().enumerate() {
        let row = (row + 1) as u32;
        worksheet.write_number(row, 0, entry.year as f64)?;
        for (col, kind) in MetricKind::ALL.iter().enumerate() {
            if let Some(value) = entry.get(*kind) {
                worksheet.write_number(row, (col + 1) as u16, value)?;
            }
        }
    }

    workbook.push_worksheet(worksheet);

    let buffer = workbook.save_to_buffer()?;

    Ok(buffer)
}

/// Convert a dense series to pretty-printed JSON
///
/// Each entry carries `year` plus only its populated metric fields, the same
/// shape the charts consume.
///
/// # Arguments
/// * `series` - The dense per-year series to export
///
/// # Returns
/// * `Result<String, Box<dyn Error>>` - JSON text or an error
pub fn to_json(series: &[YearSeries]) -> Result<String, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(series)?;
    Ok(json)
}
