use clap::Parser;
use hourly_meter::report::{MeterReport, ReportOptions};
use hourly_meter::template::DailyTemplate;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "hourly-report")]
#[command(about = "Convert a meter console power profile export into daily 80020 XML files", long_about = None)]
struct Cli {
    /// Power profile export (*.html)
    #[arg(long)]
    filename: PathBuf,

    /// Contract number
    #[arg(long, env = "REPORT_CONTRACT", default_value = "")]
    contract: String,

    /// Company name
    #[arg(long, env = "REPORT_COMPANY_NAME", default_value = "")]
    name: String,

    /// Meter serial number (taken from the export when omitted)
    #[arg(long)]
    meter: Option<String>,

    /// Multiplier applied to every P+ value
    #[arg(long, default_value = "1")]
    coefficient: f64,

    /// Directory under which the 80020-MM-YYYY folder is created
    #[arg(long, env = "OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if it exists (ignore errors if not found)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let start_time = Instant::now();

    let options = ReportOptions {
        contract: cli.contract,
        company_name: cli.name,
        meter: cli.meter,
        coefficient: cli.coefficient,
        output_root: cli.output_dir,
    };

    let summary = MeterReport::from_file(&cli.filename, options)
        .and_then(|report| report.run(&DailyTemplate::default()))
        .map_err(|e| {
            error!("Report generation failed for {:?}: {}", cli.filename, e);
            e
        })?;

    info!(
        "Wrote {} files to {} in {:.2?}",
        summary.days_written,
        summary.output_dir.display(),
        start_time.elapsed()
    );
    println!("total:\t{:.2} kWh\nvalues:\t{}", summary.total, summary.values);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_and_name_default_to_empty() {
        let cli = Cli::try_parse_from(["hourly-report", "--filename", "export.html"]).unwrap();
        assert_eq!(cli.contract, "");
        assert_eq!(cli.name, "");
        assert_eq!(cli.meter, None);
        assert_eq!(cli.coefficient, 1.0);
    }

    #[test]
    fn test_filename_is_required() {
        assert!(Cli::try_parse_from(["hourly-report", "--contract", "98765432"]).is_err());
    }
}
