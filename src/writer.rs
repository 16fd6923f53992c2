use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::document::DailyHeader;
use crate::report_error::ReportError;

/// Directory holding all day files of one month: `80020-MM-YYYY`.
pub fn report_dir_name(month: u32, year: i32) -> String {
    format!("80020-{month:02}-{year}")
}

/// File name of one day's document: `80020_001_<contract>_DDMMYYYY.xml`.
pub fn day_file_name(header: &DailyHeader) -> String {
    format!(
        "80020_001_{}_{:0>2}{:0>2}{}.xml",
        header.contract, header.day, header.month, header.year
    )
}

/// Create the month directory under `root` if it does not exist yet.
pub fn ensure_report_dir(root: &Path, month: u32, year: i32) -> Result<PathBuf, ReportError> {
    let dir = root.join(report_dir_name(month, year));
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Write a rendered day document into `dir`, replacing any previous file.
pub fn write_day(dir: &Path, header: &DailyHeader, contents: &str) -> Result<PathBuf, ReportError> {
    let path = dir.join(day_file_name(header));
    fs::write(&path, contents)?;
    debug!("Wrote {} ({} bytes)", path.display(), contents.len());
    Ok(path)
}
