use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use rulekit_core::{parse_applications, stringify_applications};
use serde_json::json;

use crate::commands::load_source;

/// Rewrite a rule source in canonical form
#[derive(Debug, Parser)]
pub struct FmtCommand {
    /// Path to the rule source file
    #[arg(value_name = "SOURCE")]
    pub source_path: PathBuf,

    /// Rewrite the file in place instead of printing to stdout
    #[arg(long)]
    pub write: bool,
}

impl FmtCommand {
    pub fn execute(&self) -> Result<i32> {
        let rendered = match self.render() {
            Ok(rendered) => rendered,
            Err(error) => {
                eprintln!("error: {error:#}");
                return Ok(2);
            }
        };

        if self.write {
            std::fs::write(&self.source_path, format!("{rendered}\n"))?;
        } else {
            println!("{rendered}");
        }
        Ok(0)
    }

    fn render(&self) -> Result<String> {
        let source = load_source(&self.source_path)?;
        let (references, _) = parse_applications(&source, &json!({}))?;
        Ok(stringify_applications(&references))
    }
}
