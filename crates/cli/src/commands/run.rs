use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use futures::executor::block_on;
use rulekit_core::{parse_applications, Application, ApplicationResult, Severity};
use serde_json::json;

use crate::commands::{load_record, load_source, output_format, OutputFormat};

/// Evaluate a rule source against a data record
#[derive(Debug, Parser)]
pub struct RunCommand {
    /// Path to the rule source file
    #[arg(value_name = "SOURCE")]
    pub source_path: PathBuf,

    /// JSON or YAML file holding the data record to evaluate against
    #[arg(long, value_name = "FILE")]
    pub data: Option<PathBuf>,

    /// JSON or YAML file holding top-level options
    #[arg(long, value_name = "FILE")]
    pub options: Option<PathBuf>,

    /// Output format (human, json)
    #[arg(long, value_name = "FORMAT", default_value = "human")]
    pub output: String,
}

impl RunCommand {
    pub fn execute(&self) -> Result<i32> {
        let format = output_format(&self.output)?;
        let results = match self.evaluate() {
            Ok(results) => results,
            Err(error) => {
                eprintln!("error: {error:#}");
                return Ok(2);
            }
        };

        self.report(&results, format)?;
        Ok(if results.iter().all(|result| result.valid) {
            0
        } else {
            1
        })
    }

    fn evaluate(&self) -> Result<Vec<ApplicationResult>> {
        let source = load_source(&self.source_path)?;
        let domain = match &self.data {
            Some(path) => load_record(path, "data")?,
            None => json!({}),
        };
        let options = match &self.options {
            Some(path) => load_record(path, "options")?,
            None => json!({}),
        };

        let (references, messages) = parse_applications(&source, &options)?;
        for message in messages.iter() {
            let label = match message.severity {
                Severity::Info => "info",
                Severity::Warning => "warning",
            };
            eprintln!("{label}: {} (near: {})", message.message, message.near);
        }

        let mut results = Vec::with_capacity(references.len());
        for reference in &references {
            if let Some(scope) = &reference.loaded_scope {
                block_on(scope.resolve().settle())?;
            }
            let application = Application::from_reference(reference, None)?;
            let result = block_on(application.evaluate(&domain).settle())?;
            results.push(result);
        }
        Ok(results)
    }

    fn report(&self, results: &[ApplicationResult], format: OutputFormat) -> Result<()> {
        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(results)?),
            OutputFormat::Human => {
                for result in results {
                    println!(
                        "application {}: {}",
                        result.application_ref,
                        verdict(result.valid)
                    );
                    for rule_set in &result.rule_set_results {
                        println!(
                            "  rule set {}: {}",
                            rule_set.rule_set_ref,
                            verdict(rule_set.valid)
                        );
                        for rule in &rule_set.rule_results {
                            println!("    rule {}: {}", rule.rule_ref, verdict(rule.valid));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

fn verdict(valid: bool) -> &'static str {
    if valid {
        "PASS"
    } else {
        "FAIL"
    }
}
