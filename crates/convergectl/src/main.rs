// # convergectl
//
// Thin command-line front end over converge-core. Every subcommand reads
// JSON documents from disk, calls one core operation and prints the result
// as JSON on stdout. No reconciliation logic lives here.
//
// ## Commands
//
// - `encode <declaration.json>`: zone declaration to provider record sets
// - `decode <record-sets.json>`: provider record sets to a zone declaration
//   (needs `CONVERGE_DNS_NAME`)
// - `diff <desired.json> <observed.json>`: structural delta of two documents
// - `plan-zone <declaration.json> <record-sets.json>`: change batch that
//   converges the listed zone to the declaration
//
// ## Configuration
//
// Configuration is via environment variables only:
// - `CONVERGE_LOG_LEVEL`: trace, debug, info, warn or error (default info)
// - `CONVERGE_DNS_NAME`: zone apex, e.g. `example.com.`; overrides the
//   declaration's `dns_name` where one is read
//
// Logs go to stderr so stdout stays valid JSON.
//
// ## Example
//
// ```bash
// export CONVERGE_DNS_NAME=example.com.
// convergectl decode listing.json
// ```

use anyhow::{Context, Result};
use converge_core::codec::{from_flat_records, to_flat_records, FlatRecordSet, ZoneState};
use converge_core::config::load_json;
use converge_core::{diff, ZoneDeclaration, ZonePlanner};
use serde_json::{json, Value};
use std::env;
use std::process::ExitCode;
use tracing::{debug, error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
///
/// - 0: Success
/// - 1: Configuration or usage error
/// - 2: Runtime error (unreadable or invalid input)
#[derive(Debug, Clone, Copy)]
enum CtlExitCode {
    Success = 0,
    UsageError = 1,
    RuntimeError = 2,
}

impl From<CtlExitCode> for ExitCode {
    fn from(code: CtlExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

const USAGE: &str = "usage: convergectl <encode|decode|diff|plan-zone> <file.json> [file.json]";

/// Application configuration
struct Config {
    log_level: String,
    dns_name: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Self {
        Self {
            log_level: env::var("CONVERGE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            dns_name: env::var("CONVERGE_DNS_NAME").ok().filter(|s| !s.is_empty()),
        }
    }

    fn validate(&self) -> Result<()> {
        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "CONVERGE_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        if let Some(dns_name) = &self.dns_name
            && !dns_name.ends_with('.')
        {
            anyhow::bail!(
                "CONVERGE_DNS_NAME must be fully qualified (end with '.'). Got: {}",
                dns_name
            );
        }

        Ok(())
    }

    fn level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }

    /// Zone apex: the environment wins over the declaration
    fn dns_name_or(&self, declared: &str) -> String {
        self.dns_name.clone().unwrap_or_else(|| declared.to_string())
    }
}

/// One parsed invocation
#[derive(Debug, PartialEq)]
enum Command {
    Encode { declaration: String },
    Decode { record_sets: String },
    Diff { desired: String, observed: String },
    PlanZone { declaration: String, record_sets: String },
}

impl Command {
    fn parse(args: &[String]) -> Result<Self> {
        let arg = |i: usize| {
            args.get(i)
                .cloned()
                .with_context(|| format!("missing argument\n{USAGE}"))
        };

        let command = match args.first().map(String::as_str) {
            Some("encode") => Self::Encode { declaration: arg(1)? },
            Some("decode") => Self::Decode { record_sets: arg(1)? },
            Some("diff") => Self::Diff {
                desired: arg(1)?,
                observed: arg(2)?,
            },
            Some("plan-zone") => Self::PlanZone {
                declaration: arg(1)?,
                record_sets: arg(2)?,
            },
            Some(other) => anyhow::bail!("unknown command '{other}'\n{USAGE}"),
            None => anyhow::bail!("{USAGE}"),
        };
        Ok(command)
    }
}

fn main() -> ExitCode {
    let config = Config::from_env();
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return CtlExitCode::UsageError.into();
    }

    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.level())
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return CtlExitCode::UsageError.into();
    }

    let args: Vec<String> = env::args().skip(1).collect();
    let command = match Command::parse(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{}", e);
            return CtlExitCode::UsageError.into();
        }
    };
    debug!("Running {:?}", command);

    match run(&config, &command) {
        Ok(output) => match serde_json::to_string_pretty(&output) {
            Ok(text) => {
                println!("{text}");
                CtlExitCode::Success.into()
            }
            Err(e) => {
                error!("Failed to render output: {}", e);
                CtlExitCode::RuntimeError.into()
            }
        },
        Err(e) => {
            error!("{:#}", e);
            CtlExitCode::RuntimeError.into()
        }
    }
}

/// Execute one command and return the document to print
fn run(config: &Config, command: &Command) -> Result<Value> {
    match command {
        Command::Encode { declaration } => {
            let declaration = ZoneDeclaration::from_file(declaration)
                .with_context(|| format!("failed to load declaration {declaration}"))?;
            let dns_name = config.dns_name_or(&declaration.dns_name);
            let encoded = match to_flat_records(
                &dns_name,
                declaration.records.as_ref(),
                declaration.soa.as_ref(),
            ) {
                Ok(encoded) => encoded,
                Err(e) if e.is_noop() => {
                    info!("{}", e);
                    return Ok(json!({ "record_sets": [], "comment": e.to_string() }));
                }
                Err(e) => return Err(e.into()),
            };
            Ok(json!({
                "record_sets": encoded.record_sets,
                "warnings": warnings(&encoded.diagnostics),
            }))
        }
        Command::Decode { record_sets } => {
            let dns_name = config
                .dns_name
                .as_deref()
                .context("CONVERGE_DNS_NAME is required to decode record sets")?;
            let listed: Vec<FlatRecordSet> = load_json(record_sets)
                .with_context(|| format!("failed to load record sets {record_sets}"))?;
            let decoded = from_flat_records(dns_name, &listed)?;
            Ok(json!({
                "zone": decoded.zone.to_value(),
                "warnings": warnings(&decoded.diagnostics),
            }))
        }
        Command::Diff { desired, observed } => {
            let desired: Value = load_json(desired)
                .with_context(|| format!("failed to load {desired}"))?;
            let observed: Value = load_json(observed)
                .with_context(|| format!("failed to load {observed}"))?;
            Ok(diff(&desired, &observed).to_value())
        }
        Command::PlanZone {
            declaration,
            record_sets,
        } => {
            let declaration = ZoneDeclaration::from_file(declaration)
                .with_context(|| format!("failed to load declaration {declaration}"))?;
            let listed: Vec<FlatRecordSet> = load_json(record_sets)
                .with_context(|| format!("failed to load record sets {record_sets}"))?;

            let planner = ZonePlanner::new(config.dns_name_or(&declaration.dns_name));
            let desired = ZoneState::new(declaration.soa.clone(), declaration.records.clone());
            let changes = planner.plan_update(&listed, &desired)?;
            Ok(json!({
                "additions": changes.additions,
                "deletions": changes.deletions,
                "changes": changes.delta.to_value(),
                "warnings": warnings(&changes.diagnostics),
            }))
        }
    }
}

fn warnings<T: ToString>(diagnostics: &[T]) -> Vec<String> {
    diagnostics.iter().map(ToString::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn config(dns_name: Option<&str>) -> Config {
        Config {
            log_level: "info".to_string(),
            dns_name: dns_name.map(str::to_string),
        }
    }

    fn write(dir: &TempDir, name: &str, value: Value) -> String {
        let path = dir.path().join(name);
        fs::write(&path, value.to_string()).unwrap();
        path.to_string_lossy().into_owned()
    }

    fn declaration() -> Value {
        json!({
            "name": "example-com",
            "dns_name": "example.com.",
            "project": "test-project",
            "records": {
                "A": {"www": ["10.0.0.1"]},
                "NS": {"@": ["ns1.example.com."]},
                "SRV": {"_sip._tcp": ["0 5 5060 sip.example.com."]}
            }
        })
    }

    #[test]
    fn test_parse_commands() {
        let args = |s: &str| s.split(' ').map(str::to_string).collect::<Vec<_>>();

        assert_eq!(
            Command::parse(&args("diff a.json b.json")).unwrap(),
            Command::Diff {
                desired: "a.json".to_string(),
                observed: "b.json".to_string()
            }
        );
        assert!(Command::parse(&args("diff a.json")).is_err());
        assert!(Command::parse(&args("apply a.json")).is_err());
        assert!(Command::parse(&[]).is_err());
    }

    #[test]
    fn test_config_validation() {
        assert!(config(Some("example.com.")).validate().is_ok());
        assert!(config(Some("example.com")).validate().is_err());

        let mut bad_level = config(None);
        bad_level.log_level = "loud".to_string();
        assert!(bad_level.validate().is_err());
    }

    #[test]
    fn test_encode_reports_skipped_types() {
        let dir = TempDir::new().unwrap();
        let declaration = write(&dir, "zone.json", declaration());

        let output = run(&config(None), &Command::Encode { declaration }).unwrap();
        assert_eq!(output["record_sets"].as_array().unwrap().len(), 2);
        assert_eq!(output["record_sets"][0]["name"], json!("www.example.com."));
        assert_eq!(output["warnings"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_encode_empty_declaration_is_a_noop() {
        let dir = TempDir::new().unwrap();
        let declaration = write(
            &dir,
            "empty.json",
            json!({"name": "example-com", "dns_name": "example.com.", "project": "p"}),
        );

        let output = run(&config(None), &Command::Encode { declaration }).unwrap();
        assert_eq!(output["record_sets"], json!([]));
        assert!(output["comment"].as_str().unwrap().contains("nothing to do"));
    }

    #[test]
    fn test_decode_requires_dns_name() {
        let dir = TempDir::new().unwrap();
        let record_sets = write(
            &dir,
            "listing.json",
            json!([{"name": "www.example.com.", "type": "A", "ttl": 300, "rrdatas": ["10.0.0.1"]}]),
        );

        let command = Command::Decode { record_sets };
        assert!(run(&config(None), &command).is_err());

        let output = run(&config(Some("example.com.")), &command).unwrap();
        assert_eq!(output["zone"], json!({"records": {"A": {"www": ["10.0.0.1"]}}}));
    }

    #[test]
    fn test_diff_prints_delta() {
        let dir = TempDir::new().unwrap();
        let desired = write(&dir, "desired.json", json!({"a": {"b": 1}}));
        let observed = write(&dir, "observed.json", json!({"a": {"b": 2, "c": 3}}));

        let output = run(&config(None), &Command::Diff { desired, observed }).unwrap();
        assert_eq!(output, json!({"new": {"a": {"b": 1}}, "old": {"a": {"b": 2}}}));
    }

    #[test]
    fn test_plan_zone() {
        let dir = TempDir::new().unwrap();
        let declaration = write(&dir, "zone.json", declaration());
        let record_sets = write(
            &dir,
            "listing.json",
            json!([
                {"name": "example.com.", "type": "NS", "ttl": 21600, "rrdatas": ["ns1.example.com."]},
                {"name": "old.example.com.", "type": "A", "ttl": 300, "rrdatas": ["10.0.0.9"]}
            ]),
        );

        let output = run(
            &config(None),
            &Command::PlanZone {
                declaration,
                record_sets,
            },
        )
        .unwrap();

        assert_eq!(output["additions"][0]["name"], json!("www.example.com."));
        assert_eq!(output["deletions"][0]["name"], json!("old.example.com."));
        assert_eq!(output["deletions"][0]["ttl"], json!(300));
    }
}
