//! Structured run report for downstream tool consumption.
//!
//! Written as JSON when `--report` is given: the options the run used and the
//! final tallies from the [`ErrorLedger`](crate::ledger::ErrorLedger).

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;

use crate::config::PipelineConfig;
use crate::pipeline::RunSummary;

/// Complete report of an annotation run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Tool version
    pub version: String,
    /// Timestamp of run (RFC 3339)
    pub timestamp: String,
    pub inputs: Vec<String>,
    pub reference: String,
    pub options: OptionsInfo,
    pub statistics: Statistics,
}

#[derive(Debug, Clone, Serialize)]
pub struct OptionsInfo {
    pub delimiter: String,
    pub header: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insert_column: Option<usize>,
    pub column_name: String,
    pub short_names: bool,
    pub filter_errors: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub skip: usize,
    pub chrom_prefix: String,
}

impl From<&PipelineConfig> for OptionsInfo {
    fn from(config: &PipelineConfig) -> Self {
        OptionsInfo {
            delimiter: config.delimiter.clone(),
            header: config.has_header,
            insert_column: config.insert_at,
            column_name: config.column_name.clone(),
            short_names: config.short_names,
            filter_errors: config.filter_errors,
            comment: config.comment.clone(),
            skip: config.skip,
            chrom_prefix: config.chrom_prefix.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Statistics {
    pub lines_read: u64,
    pub data_records: u64,
    pub emitted_records: u64,
    pub successes: u64,
    pub errors: BTreeMap<String, u64>,
}

impl From<&RunSummary> for Statistics {
    fn from(s: &RunSummary) -> Self {
        Statistics {
            lines_read: s.lines_read,
            data_records: s.data_records,
            emitted_records: s.emitted_records,
            successes: s.ledger.successes(),
            errors: s
                .ledger
                .errors()
                .map(|(code, count)| (code.to_string(), count))
                .collect(),
        }
    }
}

impl RunReport {
    pub fn new(
        inputs: Vec<String>,
        reference: &Path,
        config: &PipelineConfig,
        summary: &RunSummary,
    ) -> Self {
        let now = time::OffsetDateTime::now_utc();
        let timestamp = now
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_else(|_| "unknown".to_string());

        RunReport {
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp,
            inputs,
            reference: reference.display().to_string(),
            options: OptionsInfo::from(config),
            statistics: Statistics::from(summary),
        }
    }

    pub fn write(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)?;
        tracing::info!("Wrote run report to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::ErrorLedger;

    #[test]
    fn report_serializes_counts() {
        let mut ledger = ErrorLedger::new();
        ledger.record_success();
        ledger.record("ERROR_not_AGCT");
        let summary = RunSummary {
            lines_read: 3,
            data_records: 2,
            emitted_records: 2,
            ledger,
        };
        let report = RunReport::new(
            vec![String::from("table.tsv")],
            Path::new("ref.fa"),
            &PipelineConfig::default(),
            &summary,
        );

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        report.write(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["statistics"]["successes"], 1);
        assert_eq!(value["statistics"]["errors"]["ERROR_not_AGCT"], 1);
        assert_eq!(value["options"]["column_name"], "TOPBOT");
        assert_eq!(value["options"]["comment"], "#");
        assert!(value["options"].get("insert_column").is_none());
    }
}
