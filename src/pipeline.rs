//! Line-at-a-time annotation of a delimited variant table.
//!
//! A [`RecordPipeline`] owns the run configuration, the strand client and the
//! [`ErrorLedger`]. Lines are fed in order, possibly from several sources; the first
//! surviving line fixes the [`ColumnPlan`] and every later line is annotated with it.

use std::{
    borrow::Cow,
    io::{self, BufRead, Write},
};

use serde::Serialize;
use thiserror::Error;

use crate::{
    alleles,
    column::ColumnPlan,
    config::{ConfigError, PipelineConfig},
    ledger::ErrorLedger,
    strand::{OracleError, StrandOracle, StrandResolutionClient},
};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("line {line}: {source}")]
    Oracle {
        line: u64,
        #[source]
        source: OracleError,
    },
}

/// Counters for a completed run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub lines_read: u64,
    pub data_records: u64,
    pub emitted_records: u64,
    pub ledger: ErrorLedger,
}

pub struct RecordPipeline<O> {
    config: PipelineConfig,
    client: StrandResolutionClient<O>,
    /// Fixed by the first surviving line.
    plan: Option<ColumnPlan>,
    skip_remaining: usize,
    summary: RunSummary,
    line: Vec<u8>,
}

impl<O> RecordPipeline<O>
where
    O: StrandOracle,
{
    pub fn new(config: PipelineConfig, oracle: O) -> Result<Self, ConfigError> {
        config.validate()?;
        let client = StrandResolutionClient::new(oracle, config.chrom_prefix.clone());
        let skip_remaining = config.skip;
        Ok(Self {
            config,
            client,
            plan: None,
            skip_remaining,
            summary: RunSummary::default(),
            line: Vec::new(),
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The resolved layout, once the first surviving line has been seen.
    pub fn plan(&self) -> Option<&ColumnPlan> {
        self.plan.as_ref()
    }

    /// Feed every line of `input`. May be called once per input source.
    pub fn run<R, W>(&mut self, mut input: R, out: &mut W) -> Result<(), PipelineError>
    where
        R: BufRead,
        W: Write,
    {
        let mut line = std::mem::take(&mut self.line);
        let result = loop {
            line.clear();
            match input.read_until(b'\n', &mut line) {
                Ok(0) => break Ok(()),
                Ok(_) => {
                    if let Err(e) = self.process_line(&line, out) {
                        break Err(e);
                    }
                }
                Err(e) => break Err(PipelineError::Io(e)),
            }
        };
        self.line = line;
        result
    }

    /// Handle one raw line, with or without its terminator.
    ///
    /// Fields are split on the delimiter's bytes and written back untouched; only the
    /// fields the column roles read are decoded, lossily, so stray non-UTF-8 bytes in
    /// other columns pass through.
    pub fn process_line<W>(&mut self, raw: &[u8], out: &mut W) -> Result<(), PipelineError>
    where
        W: Write,
    {
        let line = raw.strip_suffix(b"\n").unwrap_or(raw);
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        self.summary.lines_read += 1;
        let line_number = self.summary.lines_read;

        if self.skip_remaining > 0 {
            self.skip_remaining -= 1;
            return Ok(());
        }
        if line.is_empty() || self.is_comment(line) {
            return Ok(());
        }

        let mut fields = split_fields(line, self.config.delimiter.as_bytes());

        let plan = match &self.plan {
            Some(plan) => plan,
            None => {
                let roles = &self.config.columns;
                let insert_at = self.config.insert_at;
                if self.config.has_header {
                    let names: Vec<Cow<'_, str>> =
                        fields.iter().copied().map(String::from_utf8_lossy).collect();
                    let names: Vec<&str> = names.iter().map(AsRef::as_ref).collect();
                    let plan = ColumnPlan::from_header(roles, &names, insert_at)?;
                    tracing::debug!(?plan, "resolved columns from header");
                    fields.insert(plan.insert_at(), self.config.column_name.as_bytes());
                    write_fields(out, &fields, self.config.delimiter.as_bytes())?;
                    self.plan = Some(plan);
                    return Ok(());
                }
                let plan = ColumnPlan::from_indices(roles, fields.len(), insert_at)?;
                tracing::debug!(?plan, "resolved column indices from first record");
                &*self.plan.insert(plan)
            }
        };

        let text = decode_roles(&fields, plan);
        let text: Vec<&str> = text.iter().map(AsRef::as_ref).collect();
        let alleles = alleles::extract(&text, plan.alleles());
        let result = self
            .client
            .resolve(
                text.get(plan.chromosome()).copied(),
                text.get(plan.position()).copied(),
                alleles,
            )
            .map_err(|source| PipelineError::Oracle {
                line: line_number,
                source,
            })?;

        self.summary.data_records += 1;
        self.summary.ledger.record_result(&result);

        if result.is_error() && self.config.filter_errors {
            return Ok(());
        }

        let insert_at = if plan.insert_at() > fields.len() {
            tracing::warn!(
                line = line_number,
                fields = fields.len(),
                insert_at = plan.insert_at(),
                "record is shorter than the insertion column; appending"
            );
            fields.len()
        } else {
            plan.insert_at()
        };
        fields.insert(
            insert_at,
            result.render(self.config.short_names).as_bytes(),
        );
        write_fields(out, &fields, self.config.delimiter.as_bytes())?;
        self.summary.emitted_records += 1;

        Ok(())
    }

    /// End of input: flush `out` and hand back the run counters.
    pub fn finish<W>(self, out: &mut W) -> Result<RunSummary, PipelineError>
    where
        W: Write,
    {
        out.flush()?;
        tracing::info!(
            lines = self.summary.lines_read,
            records = self.summary.data_records,
            emitted = self.summary.emitted_records,
            errors = self.summary.ledger.total_errors(),
            "annotation finished"
        );
        Ok(self.summary)
    }

    fn is_comment(&self, line: &[u8]) -> bool {
        self.config.comment.as_deref().is_some_and(|marker| {
            !marker.is_empty() && line.trim_ascii_start().starts_with(marker.as_bytes())
        })
    }
}

/// Split like `str::split`: non-overlapping, left to right, empty fields kept.
fn split_fields<'a>(line: &'a [u8], delimiter: &[u8]) -> Vec<&'a [u8]> {
    let mut fields = Vec::new();
    let mut rest = line;
    while let Some(at) = rest
        .windows(delimiter.len())
        .position(|window| window == delimiter)
    {
        fields.push(&rest[..at]);
        rest = &rest[at + delimiter.len()..];
    }
    fields.push(rest);
    fields
}

/// Text of the fields the plan reads; every other field decodes to an empty string.
fn decode_roles<'a>(fields: &[&'a [u8]], plan: &ColumnPlan) -> Vec<Cow<'a, str>> {
    let mut text = vec![Cow::Borrowed(""); fields.len()];
    for idx in plan.role_indices() {
        if let Some(field) = fields.get(idx) {
            text[idx] = String::from_utf8_lossy(field);
        }
    }
    text
}

fn write_fields<W>(out: &mut W, fields: &[&[u8]], delimiter: &[u8]) -> io::Result<()>
where
    W: Write,
{
    let mut iter = fields.iter();
    if let Some(first) = iter.next() {
        out.write_all(first)?;
    }
    for field in iter {
        out.write_all(delimiter)?;
        out.write_all(field)?;
    }
    out.write_all(b"\n")
}
