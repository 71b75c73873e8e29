//! Run summary formatting
//!
//! JSON and YAML render the full [`RunSummary`]; the human format is a short
//! tree meant for a terminal.

use anyhow::{Context, Result};
use std::fmt::Write as _;

use crate::manager::RunSummary;

/// Output format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON format (machine-readable)
    Json,
    /// YAML format (human-friendly, version-control friendly)
    Yaml,
    /// Human-readable formatted text
    Human,
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self, summary: &RunSummary) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(summary)
                .context("Failed to serialize run summary to JSON"),
            OutputFormat::Yaml => {
                serde_yaml::to_string(summary).context("Failed to serialize run summary to YAML")
            }
            OutputFormat::Human => self.format_human(summary),
        }
    }

    fn format_human(&self, summary: &RunSummary) -> Result<String> {
        let mut output = String::new();

        if summary.exit_code() == 0 {
            writeln!(output, "\u{2713} Realignment Result")?;
        } else {
            writeln!(output, "\u{26A0} Realignment Result (attention needed)")?;
        }
        writeln!(output, "{}\n", "\u{2501}".repeat(42))?;

        writeln!(output, "Target:        {}", summary.target.display())?;
        if summary.boms.is_empty() {
            writeln!(output, "BOMs:          (none loaded)")?;
        } else {
            writeln!(output, "BOMs:          {}", summary.boms.join(", "))?;
        }
        if let Some(toolchain) = &summary.toolchain {
            writeln!(output, "Toolchain:     {}", toolchain)?;
        }
        writeln!(output)?;

        writeln!(output, "Descriptors:")?;
        writeln!(output, "\u{251C}\u{2500} Scanned:  {}", summary.scanned)?;
        writeln!(output, "\u{251C}\u{2500} Loaded:   {}", summary.loaded)?;
        writeln!(output, "\u{251C}\u{2500} Changed:  {}", summary.changed)?;
        writeln!(output, "\u{2514}\u{2500} Written:  {}", summary.written.len())?;
        writeln!(output)?;

        writeln!(output, "Unresolved:")?;
        writeln!(output, "\u{251C}\u{2500} Versions:  {}", summary.missing_versions)?;
        writeln!(output, "\u{251C}\u{2500} Plugins:   {}", summary.unmanaged_plugins)?;
        writeln!(output, "\u{2514}\u{2500} Parents:   {}", summary.missing_parents.len())?;
        for parent in &summary.missing_parents {
            writeln!(output, "     \u{2500} {}", parent)?;
        }

        if !summary.errors.is_empty() {
            writeln!(output)?;
            writeln!(output, "Errors ({}):", summary.error_count())?;
            for error in &summary.errors {
                writeln!(output, "  {}:", error.scope)?;
                for message in &error.messages {
                    writeln!(output, "    - {}", message)?;
                }
            }
        }

        if !summary.reports.is_empty() || summary.capture.is_some() {
            writeln!(output)?;
            writeln!(output, "Reports:")?;
            for report in &summary.reports {
                writeln!(output, "  {}", report.display())?;
            }
            if let Some(capture) = &summary.capture {
                writeln!(output, "  {} (capture)", capture.display())?;
            }
        }

        writeln!(output)?;
        write!(output, "Completed in {} ms", summary.duration_ms)?;
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::ErrorSummary;
    use chrono::Utc;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn create_test_summary() -> RunSummary {
        RunSummary {
            target: PathBuf::from("/src/tree"),
            started_at: Utc::now(),
            duration_ms: 42,
            boms: vec!["org.platform:platform-bom:7".to_string()],
            toolchain: None,
            scanned: 3,
            loaded: 3,
            changed: 2,
            written: vec![PathBuf::from("/src/tree/app/pom.xml")],
            changes: BTreeMap::new(),
            missing_versions: 1,
            unmanaged_plugins: 0,
            missing_parents: vec!["org.corp:corp-parent:12".to_string()],
            errors: vec![ErrorSummary {
                scope: "/src/tree/lib/pom.xml".to_string(),
                messages: vec!["Missing parent version for org.corp:corp-parent:12".to_string()],
            }],
            reports: vec![PathBuf::from("/tmp/pomalign/reports/errors.log")],
            capture: None,
        }
    }

    #[test]
    fn test_json_format() {
        let output = OutputFormatter::new(OutputFormat::Json)
            .format(&create_test_summary())
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["changed"], 2);
        assert_eq!(parsed["boms"][0], "org.platform:platform-bom:7");
        assert_eq!(parsed["errors"][0]["messages"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_yaml_format() {
        let output = OutputFormatter::new(OutputFormat::Yaml)
            .format(&create_test_summary())
            .unwrap();
        let parsed: serde_yaml::Value = serde_yaml::from_str(&output).unwrap();
        assert_eq!(parsed["scanned"].as_u64(), Some(3));
        assert!(output.contains("org.corp:corp-parent:12"));
    }

    #[test]
    fn test_human_format() {
        let output = OutputFormatter::new(OutputFormat::Human)
            .format(&create_test_summary())
            .unwrap();
        assert!(output.contains("attention needed"));
        assert!(output.contains("BOMs:          org.platform:platform-bom:7"));
        assert!(output.contains("Changed:  2"));
        assert!(output.contains("Errors (1):"));
        assert!(output.contains("org.corp:corp-parent:12"));
        assert!(output.ends_with("Completed in 42 ms"));
    }

    #[test]
    fn test_human_format_clean_run() {
        let mut summary = create_test_summary();
        summary.errors.clear();
        summary.missing_parents.clear();
        summary.reports.clear();
        let output = OutputFormatter::new(OutputFormat::Human)
            .format(&summary)
            .unwrap();
        assert!(output.starts_with("\u{2713} Realignment Result"));
        assert!(!output.contains("Errors"));
        assert!(!output.contains("Reports:"));
    }
}
