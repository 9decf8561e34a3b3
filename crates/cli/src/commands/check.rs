use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use rulekit_core::options::{validate_options, ValidationIssue};
use rulekit_core::{parse_applications, ParserMessage, Severity};
use serde::Serialize;
use serde_json::json;

use crate::commands::{load_record, load_source, output_format, OutputFormat};

/// Parse a rule source and report diagnostics
#[derive(Debug, Parser)]
pub struct CheckCommand {
    /// Path to the rule source file
    #[arg(value_name = "SOURCE")]
    pub source_path: PathBuf,

    /// JSON or YAML file holding top-level options
    #[arg(long, value_name = "FILE")]
    pub options: Option<PathBuf>,

    /// Output format (human, json)
    #[arg(long, value_name = "FORMAT", default_value = "human")]
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CheckReport {
    applications: Vec<String>,
    messages: Vec<ParserMessage>,
    option_issues: Vec<ValidationIssue>,
    error: Option<String>,
}

impl CheckCommand {
    pub fn execute(&self) -> Result<i32> {
        let format = output_format(&self.output)?;
        let source = match load_source(&self.source_path) {
            Ok(source) => source,
            Err(error) => {
                eprintln!("error: {error:#}");
                return Ok(2);
            }
        };
        let options = match &self.options {
            Some(path) => match load_record(path, "options") {
                Ok(options) => options,
                Err(error) => {
                    eprintln!("error: {error:#}");
                    return Ok(2);
                }
            },
            None => json!({}),
        };

        let mut report = CheckReport {
            applications: Vec::new(),
            messages: Vec::new(),
            option_issues: validate_options(&options),
            error: None,
        };
        match parse_applications(&source, &options) {
            Ok((references, messages)) => {
                report.applications = references
                    .iter()
                    .map(|reference| reference.ref_name.clone())
                    .collect();
                report.messages = messages.iter().cloned().collect();
                // Explicit options are what the source itself carries; the
                // inherited layers were already checked at the top level.
                for reference in &references {
                    report
                        .option_issues
                        .extend(validate_options(&reference.explicit_options));
                }
            }
            Err(error) => report.error = Some(error.to_string()),
        }

        self.report(&report, format)?;
        Ok(exit_code(&report))
    }

    fn report(&self, report: &CheckReport, format: OutputFormat) -> Result<()> {
        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
            OutputFormat::Human => {
                if let Some(error) = &report.error {
                    println!("parse error: {error}");
                } else {
                    println!("applications: {}", report.applications.join(", "));
                }
                for message in &report.messages {
                    let label = match message.severity {
                        Severity::Info => "info",
                        Severity::Warning => "warning",
                    };
                    println!("{label}: {} (near: {})", message.message, message.near);
                }
                for issue in &report.option_issues {
                    println!("options issue at {}: {}", issue.path, issue.message);
                }
            }
        }
        Ok(())
    }
}

fn exit_code(report: &CheckReport) -> i32 {
    let has_warnings = report
        .messages
        .iter()
        .any(|message| message.severity == Severity::Warning);
    if report.error.is_some() || has_warnings || !report.option_issues.is_empty() {
        1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn command(source: &std::path::Path) -> CheckCommand {
        CheckCommand {
            source_path: source.to_path_buf(),
            options: None,
            output: "human".to_string(),
        }
    }

    #[test]
    fn check_clean_source_returns_zero() {
        let dir = tempdir().unwrap();
        let source_path = dir.path().join("rules.txt");
        std::fs::write(&source_path, "<<ap name=A>> <<rs name=S>> <<ru name=R>> x = 1").unwrap();
        assert_eq!(command(&source_path).execute().unwrap(), 0);
    }

    #[test]
    fn check_reports_parse_error_as_finding() {
        let dir = tempdir().unwrap();
        let source_path = dir.path().join("rules.txt");
        std::fs::write(&source_path, "<<ap name=A>> stray body text").unwrap();
        assert_eq!(command(&source_path).execute().unwrap(), 1);
    }

    #[test]
    fn check_flags_duplicate_names() {
        let dir = tempdir().unwrap();
        let source_path = dir.path().join("rules.txt");
        std::fs::write(
            &source_path,
            "<<ap name=A>> <<ru name=R>> x = 1 <<ap name=A>> <<ru name=R>> x = 2",
        )
        .unwrap();
        assert_eq!(command(&source_path).execute().unwrap(), 1);
    }

    #[test]
    fn check_flags_malformed_override_lists() {
        let dir = tempdir().unwrap();
        let source_path = dir.path().join("rules.txt");
        std::fs::write(&source_path, "<<ap name=A>> <<ru name=R>> x = 1").unwrap();
        let options_path = dir.path().join("options.json");
        std::fs::write(
            &options_path,
            r#"{"rule_overrides": [{"options": {"x": 1}}]}"#,
        )
        .unwrap();

        let mut cmd = command(&source_path);
        cmd.options = Some(options_path);
        cmd.output = "json".to_string();
        assert_eq!(cmd.execute().unwrap(), 1);
    }

    #[test]
    fn check_missing_source_returns_two() {
        let dir = tempdir().unwrap();
        assert_eq!(command(&dir.path().join("missing.txt")).execute().unwrap(), 2);
    }

    #[test]
    fn check_implicit_blocks_are_informational_only() {
        let dir = tempdir().unwrap();
        let source_path = dir.path().join("rules.txt");
        std::fs::write(&source_path, "<<ru name=R>> x = 1").unwrap();
        assert_eq!(command(&source_path).execute().unwrap(), 0);
    }
}
