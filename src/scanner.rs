use tracing::{debug, instrument};

use crate::report_error::ReportError;

/// Tag name of a table cell carrying one measurement value.
pub const DATA_CELL_MARKER: &[u8] = b"TD";

/// Tag name of the heading that carries the meter serial number.
pub const IDENTITY_MARKER: &[u8] = b"H2";

/// Raw output of a line scan over a console export
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScannedExport {
    /// Inner text of every data cell, in document order
    pub values: Vec<String>,
    /// First non-empty serial number found on an identity line
    pub meter: Option<String>,
}

/// Scan an export line by line, collecting data-cell values and the meter serial.
///
/// The console writes one cell per line, so no HTML parsing is attempted:
/// a line is a data cell when it contains [`DATA_CELL_MARKER`] and an
/// identity line when it contains [`IDENTITY_MARKER`]. Cell lines win when a
/// line carries both.
#[instrument(skip(data), fields(input_size = data.len()))]
pub fn scan(data: &[u8]) -> Result<ScannedExport, ReportError> {
    if data.is_empty() {
        return Err(ReportError::EmptyInput);
    }

    let mut export = ScannedExport::default();

    for line in data.split(|b| *b == b'\n') {
        if contains(line, DATA_CELL_MARKER) {
            export.values.push(cell_value(line));
        } else if export.meter.is_none() && contains(line, IDENTITY_MARKER) {
            let serial = serial_number(line);
            if !serial.is_empty() {
                debug!("Found meter serial number {}", serial);
                export.meter = Some(serial);
            }
        }
    }

    debug!(
        "Scanned {} cell values, meter serial {:?}",
        export.values.len(),
        export.meter
    );
    Ok(export)
}

/// Text between the first `>` and the `<` that follows it.
///
/// Empty cells, or lines without such a span, yield an empty string so the
/// cell still occupies its slot in the record batch.
pub fn cell_value(line: &[u8]) -> String {
    let Some(start) = line.iter().position(|b| *b == b'>') else {
        return String::new();
    };
    let rest = &line[start + 1..];
    match rest.iter().position(|b| *b == b'<') {
        Some(end) => String::from_utf8_lossy(&rest[..end]).into_owned(),
        None => String::new(),
    }
}

/// Serial number from a heading such as
/// `<H2>M234 (Network address - 17, Serial number - 23456789)</H2>`:
/// the text between the last space and the next `)`.
pub fn serial_number(line: &[u8]) -> String {
    let Some(start) = line.iter().rposition(|b| *b == b' ') else {
        return String::new();
    };
    let rest = &line[start + 1..];
    match rest.iter().position(|b| *b == b')') {
        Some(end) => String::from_utf8_lossy(&rest[..end]).into_owned(),
        None => String::new(),
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}
