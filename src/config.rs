use thiserror::Error;

use crate::column::{ColumnRoles, Role};

pub const DEFAULT_COLUMN_NAME: &str = "TOPBOT";
pub const DEFAULT_COMMENT: &str = "#";

/// Options controlling a single annotation run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Field separator, at least one character.
    pub delimiter: String,
    /// Whether the first surviving line is a header.
    pub has_header: bool,
    pub columns: ColumnRoles,
    /// Where the strand column is spliced in; `None` appends.
    pub insert_at: Option<usize>,
    /// Emit `T`/`B` instead of `TOP`/`BOT`.
    pub short_names: bool,
    pub column_name: String,
    /// Drop records whose result is an error code.
    pub filter_errors: bool,
    pub comment: Option<String>,
    /// Leading lines discarded unconditionally.
    pub skip: usize,
    /// Prepended to the chromosome field before reference lookup.
    pub chrom_prefix: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            delimiter: String::from("\t"),
            has_header: true,
            columns: ColumnRoles::default(),
            insert_at: None,
            short_names: false,
            column_name: String::from(DEFAULT_COLUMN_NAME),
            filter_errors: false,
            comment: Some(String::from(DEFAULT_COMMENT)),
            skip: 0,
            chrom_prefix: String::new(),
        }
    }
}

impl PipelineConfig {
    /// Checks that can be made before any input is read.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.delimiter.is_empty() {
            return Err(ConfigError::EmptyDelimiter);
        }

        if !self.has_header {
            for (role, id) in self.columns.iter() {
                if id.as_index().is_none() {
                    return Err(ConfigError::NamedColumnWithoutHeader {
                        role,
                        name: id.to_string(),
                    });
                }
            }
        }

        Ok(())
    }
}

/// Fatal configuration problems, all detected before the first data record is annotated.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("delimiter must be at least one character")]
    EmptyDelimiter,
    #[error("Column {0} not found")]
    MissingColumn(String),
    #[error("Column {0} appears more than once in the header")]
    DuplicateColumn(String),
    #[error("--{role} must be a column index when --noheader is set, got '{name}'")]
    NamedColumnWithoutHeader { role: Role, name: String },
    #[error("--{role} column {index} is out of range for {column_count} columns")]
    ColumnOutOfRange {
        role: Role,
        index: usize,
        column_count: usize,
    },
    #[error("insertion column {index} is out of range for {column_count} columns")]
    InsertionOutOfRange { index: usize, column_count: usize },
}
