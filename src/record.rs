use chrono::{DateTime, Utc};
use std::str::FromStr;
use tracing::{debug, instrument};

use crate::report_error::ReportError;

/// Number of table cells that make up one measurement row.
pub const FIELDS_PER_RECORD: usize = 10;

/// Leading characters of the UTC column holding whole epoch seconds.
/// The console writes milliseconds; the trailing digits are ignored.
const TIMESTAMP_DIGITS: usize = 10;

/// One measurement row of the console's power profile table
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementRecord {
    pub id: i64,
    /// P+, kW
    pub positive_active_power: f64,
    /// P-, kW
    pub negative_active_power: f64,
    /// Q+, kvar
    pub positive_reactive_power: f64,
    /// Q-, kvar
    pub negative_reactive_power: f64,
    /// Interval length label, e.g. "30+30"
    pub period: String,
    pub note: String,
    pub timestamp: DateTime<Utc>,
}

impl MeasurementRecord {
    /// Build a record from exactly ten scanned cell values.
    ///
    /// Columns 5 and 6 (local clock time and date) duplicate the UTC column
    /// and are not kept.
    pub fn from_fields<S: AsRef<str>>(fields: &[S]) -> Result<Self, ReportError> {
        if fields.len() != FIELDS_PER_RECORD {
            return Err(ReportError::Shape {
                what: "measurement record",
                expected: FIELDS_PER_RECORD,
                actual: fields.len(),
            });
        }

        Ok(Self {
            id: parse_field(fields[0].as_ref(), "id")?,
            positive_active_power: parse_field(fields[1].as_ref(), "positive active power")?,
            negative_active_power: parse_field(fields[2].as_ref(), "negative active power")?,
            positive_reactive_power: parse_field(fields[3].as_ref(), "positive reactive power")?,
            negative_reactive_power: parse_field(fields[4].as_ref(), "negative reactive power")?,
            period: fields[7].as_ref().to_string(),
            note: fields[8].as_ref().to_string(),
            timestamp: parse_timestamp(fields[9].as_ref())?,
        })
    }
}

fn parse_field<T>(value: &str, field: &'static str) -> Result<T, ReportError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.parse::<T>().map_err(|e| ReportError::Conversion {
        field,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// Decode the first ten characters of the UTC column as epoch seconds.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, ReportError> {
    let malformed = || ReportError::MalformedTimestamp(value.to_string());

    let seconds = value
        .get(..TIMESTAMP_DIGITS)
        .ok_or_else(malformed)?
        .parse::<i64>()
        .map_err(|_| malformed())?;

    DateTime::from_timestamp(seconds, 0).ok_or_else(malformed)
}

/// Groups scanned cell values into records, ten at a time
#[derive(Debug, Default)]
pub struct RecordAssembler {
    pending: Vec<String>,
    records: Vec<MeasurementRecord>,
}

impl RecordAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the next cell value. Completes a record on every tenth value.
    pub fn push(&mut self, value: String) -> Result<(), ReportError> {
        self.pending.push(value);
        if self.pending.len() == FIELDS_PER_RECORD {
            let record = MeasurementRecord::from_fields(&self.pending)?;
            self.records.push(record);
            self.pending.clear();
        }
        Ok(())
    }

    /// Finished records. A trailing incomplete group is discarded.
    pub fn finish(self) -> Vec<MeasurementRecord> {
        if !self.pending.is_empty() {
            debug!(
                "Discarding {} trailing cell values that do not form a full record",
                self.pending.len()
            );
        }
        self.records
    }
}

/// Assemble all complete records from scanned values, in scan order.
#[instrument(skip(values), fields(value_count = values.len()))]
pub fn assemble(values: Vec<String>) -> Result<Vec<MeasurementRecord>, ReportError> {
    let mut assembler = RecordAssembler::new();
    for value in values {
        assembler.push(value)?;
    }
    let records = assembler.finish();
    debug!("Assembled {} measurement records", records.len());
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn valid_fields() -> Vec<&'static str> {
        vec![
            "4",
            "0.0686",
            "0.0000",
            "0.0018",
            "0.0031",
            "02:00",
            "01.02.20",
            "30+30",
            "-",
            "1580522400000",
        ]
    }

    #[test]
    fn test_from_fields_valid() {
        let record = MeasurementRecord::from_fields(&valid_fields()).unwrap();
        assert_eq!(
            record,
            MeasurementRecord {
                id: 4,
                positive_active_power: 0.0686,
                negative_active_power: 0.0,
                positive_reactive_power: 0.0018,
                negative_reactive_power: 0.0031,
                period: "30+30".to_string(),
                note: "-".to_string(),
                timestamp: Utc.with_ymd_and_hms(2020, 2, 1, 2, 0, 0).unwrap(),
            }
        );
    }

    #[test]
    fn test_from_fields_too_few() {
        let result = MeasurementRecord::from_fields(&["1", "fail"]);
        assert!(matches!(
            result,
            Err(ReportError::Shape {
                expected: 10,
                actual: 2,
                ..
            })
        ));
    }

    #[test]
    fn test_from_fields_bad_id() {
        let mut fields = valid_fields();
        fields[0] = "fail";
        assert!(matches!(
            MeasurementRecord::from_fields(&fields),
            Err(ReportError::Conversion { field: "id", .. })
        ));
    }

    #[test]
    fn test_from_fields_bad_positive_active_power() {
        let mut fields = valid_fields();
        fields[1] = "fail";
        match MeasurementRecord::from_fields(&fields) {
            Err(ReportError::Conversion { field, value, .. }) => {
                assert_eq!(field, "positive active power");
                assert_eq!(value, "fail");
            }
            other => panic!("Expected Conversion error, got {other:?}"),
        }
    }

    #[test]
    fn test_from_fields_bad_reactive_power() {
        let mut fields = valid_fields();
        fields[4] = "1,5";
        assert!(matches!(
            MeasurementRecord::from_fields(&fields),
            Err(ReportError::Conversion {
                field: "negative reactive power",
                ..
            })
        ));
    }

    #[test]
    fn test_from_fields_short_timestamp() {
        let mut fields = valid_fields();
        fields[9] = "158052240";
        assert!(matches!(
            MeasurementRecord::from_fields(&fields),
            Err(ReportError::MalformedTimestamp(_))
        ));
    }

    #[test]
    fn test_from_fields_non_numeric_timestamp() {
        let mut fields = valid_fields();
        fields[9] = "failfailfa";
        assert!(matches!(
            MeasurementRecord::from_fields(&fields),
            Err(ReportError::MalformedTimestamp(_))
        ));
    }

    #[test]
    fn test_parse_timestamp_uses_first_ten_digits() {
        let ts = parse_timestamp("1580518800999").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2020, 2, 1, 1, 0, 0).unwrap());
        assert_eq!(parse_timestamp("1580518800").unwrap(), ts);
    }

    #[test]
    fn test_assemble_drops_trailing_partial_group() {
        let mut values: Vec<String> = valid_fields().into_iter().map(String::from).collect();
        values.extend(["5", "0.1", "0.0"].map(String::from));

        let records = assemble(values).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, 4);
    }

    #[test]
    fn test_assemble_keeps_scan_order_and_duplicates() {
        let mut values = Vec::new();
        for id in ["7", "3", "7"] {
            let mut fields: Vec<String> = valid_fields().into_iter().map(String::from).collect();
            fields[0] = id.to_string();
            values.extend(fields);
        }

        let ids: Vec<i64> = assemble(values).unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![7, 3, 7]);
    }

    #[test]
    fn test_assemble_fails_fast_on_bad_group() {
        let mut values: Vec<String> = valid_fields().into_iter().map(String::from).collect();
        values[1] = "n/a".to_string();
        values.extend(valid_fields().into_iter().map(String::from));

        assert!(matches!(
            assemble(values),
            Err(ReportError::Conversion { .. })
        ));
    }
}
