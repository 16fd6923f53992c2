use chrono::{Datelike, Months, NaiveDate, Timelike};
use tracing::debug;

use crate::record::MeasurementRecord;
use crate::report_error::ReportError;

pub const HOURS_PER_DAY: usize = 24;

/// One calendar day of hourly values; slot `i` holds hour `i + 1`.
pub type DailyGrid = [f64; HOURS_PER_DAY];

/// Measurement records of one reporting month plus the calendar anchors
/// taken from the first record.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlySeries {
    pub records: Vec<MeasurementRecord>,
    pub first_day: u32,
    pub first_hour: u32,
    pub month: u32,
    pub year: i32,
    pub days_in_month: u32,
}

impl MonthlySeries {
    /// Anchor the series on its first record. Records are used in scan
    /// order and never re-sorted.
    pub fn from_records(records: Vec<MeasurementRecord>) -> Result<Self, ReportError> {
        let first = records.first().ok_or(ReportError::NoRecords)?.timestamp;
        let date = first.date_naive();

        Ok(Self {
            first_day: date.day(),
            first_hour: first.hour(),
            month: date.month(),
            year: date.year(),
            days_in_month: days_in_month(date)?,
            records,
        })
    }
}

/// Number of days in the month containing `date`.
pub fn days_in_month(date: NaiveDate) -> Result<u32, ReportError> {
    let first = date.with_day(1);
    let next = first.and_then(|d| d.checked_add_months(Months::new(1)));
    match (first, next) {
        (Some(first), Some(next)) => Ok(next.signed_duration_since(first).num_days() as u32),
        _ => Err(ReportError::Configuration(format!(
            "cannot determine month length for {date}"
        ))),
    }
}

/// Positional cursor over the month's records. Each hourly slot that is
/// eligible for data takes the next record, regardless of its timestamp.
#[derive(Debug)]
pub struct RecordCursor<'a> {
    records: &'a [MeasurementRecord],
    position: usize,
}

impl<'a> RecordCursor<'a> {
    pub fn new(records: &'a [MeasurementRecord]) -> Self {
        Self {
            records,
            position: 0,
        }
    }

    pub fn consumed(&self) -> usize {
        self.position
    }

    pub fn is_exhausted(&self) -> bool {
        self.position >= self.records.len()
    }
}

impl<'a> Iterator for RecordCursor<'a> {
    type Item = &'a MeasurementRecord;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.records.get(self.position)?;
        self.position += 1;
        Some(record)
    }
}

/// Lays a month's records onto the day/hour grid.
///
/// Owns the record cursor and the running total for one run; days must be
/// requested in ascending order.
#[derive(Debug)]
pub struct SeriesBuilder<'a> {
    series: &'a MonthlySeries,
    cursor: RecordCursor<'a>,
    coefficient: f64,
    total: f64,
}

impl<'a> SeriesBuilder<'a> {
    pub fn new(series: &'a MonthlySeries, coefficient: f64) -> Self {
        Self {
            series,
            cursor: RecordCursor::new(&series.records),
            coefficient,
            total: 0.0,
        }
    }

    /// Values for calendar day `day` (1-based).
    ///
    /// Days before the anchor day stay zero; on and after it, only hours at
    /// or past the anchor hour take records. Once records run out the
    /// remaining slots stay zero.
    pub fn day_grid(&mut self, day: u32) -> DailyGrid {
        let mut grid = [0.0; HOURS_PER_DAY];
        if day < self.series.first_day {
            return grid;
        }

        for (slot, value) in grid.iter_mut().enumerate() {
            let hour = slot as u32 + 1;
            if hour < self.series.first_hour {
                continue;
            }
            let Some(record) = self.cursor.next() else {
                break;
            };
            let scaled = record.positive_active_power * self.coefficient;
            self.total += scaled;
            *value = scaled;
        }

        if self.cursor.is_exhausted() {
            debug!(
                "Records exhausted on day {} after {} values",
                day,
                self.cursor.consumed()
            );
        }
        grid
    }

    /// Sum of every value placed so far, after the coefficient.
    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn consumed(&self) -> usize {
        self.cursor.consumed()
    }
}
