#![doc = include_str!("../README.md")]

pub mod alleles;
pub mod cli;
pub mod column;
pub mod config;
pub mod input;
pub mod ledger;
pub mod pipeline;
pub mod reference;
pub mod report;
pub mod strand;
pub mod topbot;

pub use alleles::{AlleleCall, Base};
pub use column::{AlleleColumns, ColumnId, ColumnPlan, ColumnRoles};
pub use config::{ConfigError, PipelineConfig};
pub use ledger::ErrorLedger;
pub use pipeline::{PipelineError, RecordPipeline, RunSummary};
pub use reference::ReferenceGenome;
pub use strand::{Strand, StrandOracle, StrandResolutionClient, StrandResult};
pub use topbot::ReferenceOracle;
