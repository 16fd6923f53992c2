use chrono::{Datelike, NaiveDate};

use crate::report_error::ReportError;
use crate::series::HOURS_PER_DAY;

/// Header fields of a daily 80020 document, already in their textual form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyHeader {
    /// Two-digit day of month
    pub day: String,
    pub contract: String,
    pub company_name: String,
    pub meter: String,
    /// Two-digit month
    pub month: String,
    pub year: String,
}

impl DailyHeader {
    pub fn new(date: NaiveDate, contract: &str, company_name: &str, meter: &str) -> Self {
        Self {
            day: format!("{:02}", date.day()),
            contract: contract.to_string(),
            company_name: company_name.to_string(),
            meter: meter.to_string(),
            month: format!("{:02}", date.month()),
            year: date.year().to_string(),
        }
    }
}

/// One hourly interval `[start, end)` of the document body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyEntry {
    pub start_hour: String,
    pub end_hour: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyDocument {
    pub header: DailyHeader,
    pub entries: Vec<BodyEntry>,
}

impl DailyDocument {
    /// Build the document for one day from exactly 24 hourly values.
    pub fn build(header: DailyHeader, values: &[f64]) -> Result<Self, ReportError> {
        if values.len() != HOURS_PER_DAY {
            return Err(ReportError::Shape {
                what: "daily grid",
                expected: HOURS_PER_DAY,
                actual: values.len(),
            });
        }

        let entries = values
            .iter()
            .enumerate()
            .map(|(i, v)| BodyEntry {
                start_hour: format!("{i:02}"),
                end_hour: end_hour(i),
                value: format_value(*v),
            })
            .collect();

        Ok(Self { header, entries })
    }
}

/// End of the hour starting at slot `i`; the last hour wraps to "00".
pub fn end_hour(i: usize) -> String {
    if i == HOURS_PER_DAY - 1 {
        "00".to_string()
    } else {
        format!("{:02}", i + 1)
    }
}

/// Zero is written as "0"; anything else with one decimal and a comma separator.
pub fn format_value(v: f64) -> String {
    if v == 0.0 {
        "0".to_string()
    } else {
        format!("{v:.1}").replacen('.', ",", 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_fields() {
        let date = NaiveDate::from_ymd_opt(2020, 2, 2).unwrap();
        let header = DailyHeader::new(date, "98765432", "OOO STAR", "23456789");
        assert_eq!(
            header,
            DailyHeader {
                day: "02".to_string(),
                contract: "98765432".to_string(),
                company_name: "OOO STAR".to_string(),
                meter: "23456789".to_string(),
                month: "02".to_string(),
                year: "2020".to_string(),
            }
        );
    }

    #[test]
    fn test_header_two_digit_day_and_month() {
        let date = NaiveDate::from_ymd_opt(2020, 11, 17).unwrap();
        let header = DailyHeader::new(date, "", "", "");
        assert_eq!(header.day, "17");
        assert_eq!(header.month, "11");
        assert_eq!(header.year, "2020");
    }

    #[test]
    fn test_end_hour() {
        assert_eq!(end_hour(0), "01");
        assert_eq!(end_hour(8), "09");
        assert_eq!(end_hour(22), "23");
        assert_eq!(end_hour(23), "00");
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(0.0), "0");
        assert_eq!(format_value(-0.0), "0");
        assert_eq!(format_value(45.0), "45,0");
        assert_eq!(format_value(24.23), "24,2");
        assert_eq!(format_value(282.0), "282,0");
        assert_eq!(format_value(0.04), "0,0");
        assert_eq!(format_value(1234.56), "1234,6");
    }

    #[test]
    fn test_format_value_half_steps() {
        // 43.85 is stored slightly above the half step
        assert_eq!(format_value(43.85), "43,9");
        // 0.25 is an exact binary tie and rounds half to even
        assert_eq!(format_value(0.25), "0,2");
    }

    #[test]
    fn test_build_rejects_wrong_length() {
        let header = DailyHeader::new(NaiveDate::from_ymd_opt(2020, 2, 1).unwrap(), "", "", "");
        assert!(matches!(
            DailyDocument::build(header, &[0.0, 0.0]),
            Err(ReportError::Shape {
                expected: 24,
                actual: 2,
                ..
            })
        ));
    }

    #[test]
    fn test_build_zero_day() {
        let header = DailyHeader::new(NaiveDate::from_ymd_opt(2020, 2, 1).unwrap(), "", "", "");
        let doc = DailyDocument::build(header, &[0.0; 24]).unwrap();

        assert_eq!(doc.entries.len(), 24);
        for (i, entry) in doc.entries.iter().enumerate() {
            assert_eq!(entry.start_hour, format!("{i:02}"));
            assert_eq!(entry.value, "0");
        }
        assert_eq!(doc.entries[23].end_hour, "00");
    }

    #[test]
    fn test_build_formats_values() {
        let header = DailyHeader::new(NaiveDate::from_ymd_opt(2020, 2, 1).unwrap(), "", "", "");
        let mut values = [0.0; 24];
        values[0] = 282.0;
        values[9] = 65.24;

        let doc = DailyDocument::build(header, &values).unwrap();
        assert_eq!(doc.entries[0].value, "282,0");
        assert_eq!(doc.entries[9].value, "65,2");
        assert_eq!(doc.entries[1].value, "0");
    }
}
