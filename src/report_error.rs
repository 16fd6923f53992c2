use std::path::PathBuf;

/// Everything that can abort a report run.
///
/// All variants are terminal: the run stops at the first error and the
/// caller decides how to present it.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Input is empty")]
    EmptyInput,

    #[error("Failed to read input {path:?}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Input contains no measurement records")]
    NoRecords,

    #[error("Invalid {what}: expected {expected} values, got {actual}")]
    Shape {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Failed to parse {field} from '{value}': {reason}")]
    Conversion {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("Malformed timestamp '{0}': expected at least 10 leading digits")]
    MalformedTimestamp(String),

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Failed to write report output: {0}")]
    Output(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_message_names_field() {
        let err = ReportError::Conversion {
            field: "positive active power",
            value: "abc".to_string(),
            reason: "invalid float literal".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("positive active power"));
        assert!(msg.contains("'abc'"));
    }

    #[test]
    fn test_io_error_converts_to_output() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = ReportError::from(io);
        assert!(matches!(err, ReportError::Output(_)));
        assert!(err.to_string().contains("denied"));
    }
}
