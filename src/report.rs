use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

use crate::document::{DailyDocument, DailyHeader};
use crate::record::{self, MeasurementRecord};
use crate::report_error::ReportError;
use crate::scanner;
use crate::series::{MonthlySeries, SeriesBuilder};
use crate::template::DailyTemplate;
use crate::writer;

/// Caller-supplied report parameters
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub contract: String,
    pub company_name: String,
    /// Meter serial; when blank the serial found in the export is used
    pub meter: Option<String>,
    /// Multiplier applied to every P+ reading
    pub coefficient: f64,
    /// Directory under which the `80020-MM-YYYY` folder is created
    pub output_root: PathBuf,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            contract: String::new(),
            company_name: String::new(),
            meter: None,
            coefficient: 1.0,
            output_root: PathBuf::from("."),
        }
    }
}

/// Result of a completed run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Sum of every placed value after the coefficient, kWh
    pub total: f64,
    /// Number of measurement records read from the export
    pub values: usize,
    pub days_written: u32,
    pub output_dir: PathBuf,
}

/// One month of meter data ready to be written out as daily 80020 files
#[derive(Debug, Clone)]
pub struct MeterReport {
    pub contract: String,
    pub company_name: String,
    pub meter: String,
    pub coefficient: f64,
    pub output_root: PathBuf,
    pub series: MonthlySeries,
}

impl MeterReport {
    /// Read and parse a console export from disk.
    #[instrument(skip(path, options), fields(path = %path.display()))]
    pub fn from_file(path: &Path, options: ReportOptions) -> Result<Self, ReportError> {
        let data = fs::read(path).map_err(|source| ReportError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(&data, options)
    }

    /// Parse a console export already held in memory.
    pub fn from_bytes(data: &[u8], options: ReportOptions) -> Result<Self, ReportError> {
        let (records, scanned_meter) = parse_export(data)?;
        let series = MonthlySeries::from_records(records)?;

        let meter = match options.meter {
            Some(m) if !m.trim().is_empty() => m,
            _ => scanned_meter.unwrap_or_default(),
        };

        info!(
            "Loaded {} records for {:02}.{} starting day {} hour {}, meter '{}'",
            series.records.len(),
            series.month,
            series.year,
            series.first_day,
            series.first_hour,
            meter
        );

        Ok(Self {
            contract: options.contract,
            company_name: options.company_name,
            meter,
            coefficient: options.coefficient,
            output_root: options.output_root,
            series,
        })
    }

    /// Write one document per calendar day of the month.
    ///
    /// Stops at the first failing day; files already written are left in place.
    #[instrument(skip(self, template), fields(contract = %self.contract))]
    pub fn run(&self, template: &DailyTemplate) -> Result<RunSummary, ReportError> {
        let series = &self.series;
        if series.days_in_month == 0 {
            return Err(ReportError::Configuration(
                "a month cannot have zero days".to_string(),
            ));
        }

        let dir = writer::ensure_report_dir(&self.output_root, series.month, series.year)?;
        let mut builder = SeriesBuilder::new(series, self.coefficient);

        for day in 1..=series.days_in_month {
            let date = NaiveDate::from_ymd_opt(series.year, series.month, day).ok_or_else(|| {
                ReportError::Configuration(format!(
                    "invalid date {}-{:02}-{:02}",
                    series.year, series.month, day
                ))
            })?;

            let grid = builder.day_grid(day);
            let header = DailyHeader::new(date, &self.contract, &self.company_name, &self.meter);
            let document = DailyDocument::build(header, &grid)?;
            writer::write_day(&dir, &document.header, &template.render(&document))?;
        }

        let summary = RunSummary {
            total: builder.total(),
            values: series.records.len(),
            days_written: series.days_in_month,
            output_dir: dir,
        };
        info!(
            "Wrote {} daily files to {}, total {:.2} kWh from {} values ({} placed)",
            summary.days_written,
            summary.output_dir.display(),
            summary.total,
            summary.values,
            builder.consumed()
        );
        Ok(summary)
    }
}

/// Scan an export and assemble its measurement records.
pub fn parse_export(data: &[u8]) -> Result<(Vec<MeasurementRecord>, Option<String>), ReportError> {
    let scanned = scanner::scan(data)?;
    let records = record::assemble(scanned.values)?;
    debug!("Parsed {} records from export", records.len());
    Ok((records, scanned.meter))
}
