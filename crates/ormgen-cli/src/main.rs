//! ormgen - metamodel resolver command line.
//!
//! Loads a metamodel from JSON, resolves it and prints either the collected
//! issues or a description of every resolved object.

mod describe;

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;

use describe::DescribeEmitter;
use ormgen_core::{
    EmissionScheduler, GeneratorConfig, Metamodel, Resolver, Severity, TimezoneConversion,
    TracingLogger, ValidationReport,
};
use thiserror::Error;

/// Failures specific to the command line front end.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("cannot read metamodel {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("describe output still shared after emission")]
    OutputShared,
}

/// What to do with the resolved metamodel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Validate only
    Check,
    /// Validate and describe every object
    Describe,
}

/// Output format of the issue report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One line per issue
    Text,
    /// JSON document
    Json,
}

/// Timezone policy flag values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TimezoneFlag {
    /// No conversion
    None,
    /// Convert to UTC
    Utc,
    /// Convert to the database timezone
    Database,
}

impl From<TimezoneFlag> for TimezoneConversion {
    fn from(flag: TimezoneFlag) -> Self {
        match flag {
            TimezoneFlag::None => TimezoneConversion::None,
            TimezoneFlag::Utc => TimezoneConversion::ConvertToUtc,
            TimezoneFlag::Database => TimezoneConversion::ConvertToDatabaseTimezone,
        }
    }
}

/// ormgen metamodel resolver
#[derive(Parser, Debug)]
#[command(name = "ormgen")]
#[command(version, about = "Resolve and validate an ormgen metamodel")]
pub struct Args {
    /// Metamodel JSON file
    pub metamodel: PathBuf,

    /// What to do after resolution
    #[arg(long, default_value = "check", value_enum)]
    pub mode: Mode,

    /// Issue report format
    #[arg(long, default_value = "text", value_enum)]
    pub format: OutputFormat,

    /// Make getters final unless an object overrides it
    #[arg(long)]
    pub default_final_getters: bool,

    /// Default timezone conversion for as-of attributes
    #[arg(long, default_value = "none", value_enum)]
    pub timezone_conversion: TimezoneFlag,

    /// Number of emission workers
    #[arg(long)]
    pub workers: Option<usize>,

    /// Treat warnings as errors
    #[arg(long)]
    pub warnings_as_errors: bool,
}

impl Args {
    fn config(&self) -> GeneratorConfig {
        let config = GeneratorConfig::new()
            .with_default_final_getters(self.default_final_getters)
            .with_default_timezone_conversion(self.timezone_conversion.into())
            .with_warnings_as_errors(self.warnings_as_errors);
        match self.workers {
            Some(workers) => config.with_emission_workers(workers),
            None => config,
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ormgen=info".parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let json = std::fs::read_to_string(&args.metamodel).map_err(|source| CliError::Read {
        path: args.metamodel.clone(),
        source,
    })?;
    let metamodel = Metamodel::from_json(&json)?;
    let config = args.config();
    tracing::info!(
        path = %args.metamodel.display(),
        declarations = metamodel.len(),
        "metamodel loaded"
    );

    let scheduler = EmissionScheduler::from_config(&config);
    let resolver = Resolver::new(metamodel, config, Arc::new(TracingLogger));
    let (result, report) = resolver.resolve_with_report();
    print_report(&report, args.format)?;
    let graph = Arc::new(result?);

    if args.mode == Mode::Describe {
        let emitter = Arc::new(DescribeEmitter::new());
        let summary = scheduler.run(Arc::clone(&graph), emitter.clone())?;
        let emitter = Arc::try_unwrap(emitter).map_err(|_| CliError::OutputShared)?;
        for description in emitter.into_output().values() {
            println!("{}\n", description);
        }
        println!("{} object(s) in {} slot(s)", summary.emitted, summary.slots);
    }
    println!("fingerprint: {}", graph.fingerprint()?);
    Ok(())
}

fn print_report(
    report: &ValidationReport,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        OutputFormat::Text => {
            // Errors are printed by `main` through the returned error.
            for issue in report.issues.iter().filter(|i| i.severity == Severity::Warning) {
                println!("warning: {}: {}", issue.object, issue);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_flags_map_onto_config() {
        let args = Args::parse_from([
            "ormgen",
            "model.json",
            "--default-final-getters",
            "--timezone-conversion",
            "utc",
            "--workers",
            "2",
        ]);
        let config = args.config();

        assert!(config.default_final_getters);
        assert_eq!(config.default_timezone_conversion, TimezoneConversion::ConvertToUtc);
        assert_eq!(config.emission_workers, 2);
        assert!(!config.warnings_as_errors);
        assert_eq!(args.mode, Mode::Check);
    }

    #[test]
    fn test_run_describe_on_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"objects": {{"com.acme.Order": {{
                "package": "com.acme",
                "class_name": "Order",
                "attributes": [{{"name": "id", "data_type": "int", "primary_key": true}}]
            }}}}}}"#
        )
        .unwrap();
        let path = file.path().to_string_lossy().to_string();

        let args =
            Args::parse_from(["ormgen", path.as_str(), "--mode", "describe", "--workers", "1"]);
        assert!(run(args).is_ok());
    }

    #[test]
    fn test_missing_file_names_path() {
        let err = run(Args::parse_from(["ormgen", "/nonexistent/model.json"])).unwrap_err();
        assert!(err.to_string().contains("cannot read metamodel /nonexistent/model.json"));
    }

    #[test]
    fn test_run_reports_failure() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"objects": {{"com.acme.Order": {{
                "package": "com.acme",
                "class_name": "Order",
                "super_class": "Missing"
            }}}}}}"#
        )
        .unwrap();
        let path = file.path().to_string_lossy().to_string();

        let err = run(Args::parse_from(["ormgen", path.as_str()])).unwrap_err();
        assert!(err.to_string().contains("SuperClass name 'Missing' not defined"));
    }
}
