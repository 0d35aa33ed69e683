//! Strand codes and the call-out to the strand resolution oracle.
//!
//! The oracle answers with a token: `TOP`, `BOT`, or a code starting with [`ERROR_PREFIX`].
//! [`StrandResolutionClient`] turns record fields into an oracle query and the token into a
//! [`StrandResult`], short-circuiting records whose fields are unusable.

use std::fmt;

use thiserror::Error;

use crate::alleles::AlleleCall;

/// Every error code, local or from the oracle, starts with this.
pub const ERROR_PREFIX: &str = "ERROR";

/// Illumina strand designation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strand {
    Top,
    Bot,
}

impl Strand {
    pub fn label(self) -> &'static str {
        match self {
            Self::Top => "TOP",
            Self::Bot => "BOT",
        }
    }

    /// `T` or `B`: the label without its trailing vowel and consonant.
    pub fn short_label(self) -> &'static str {
        let label = self.label();
        &label[..label.len() - 2]
    }

    fn from_token(token: &str) -> Option<Self> {
        match token {
            "TOP" => Some(Self::Top),
            "BOT" => Some(Self::Bot),
            _ => None,
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Problems detected in a record before the oracle is consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalError {
    /// Allele columns did not yield exactly two of `A`, `C`, `G`, `T`.
    NotAcgt,
    /// The record has no chromosome or position field.
    MissingColumn,
    /// The position field is not a positive integer.
    BadPosition,
}

impl LocalError {
    pub fn code(self) -> &'static str {
        match self {
            Self::NotAcgt => "ERROR_not_AGCT",
            Self::MissingColumn => "ERROR_missing_column",
            Self::BadPosition => "ERROR_bad_position",
        }
    }
}

/// Outcome for one data record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrandResult {
    Oriented(Strand),
    Error(String),
}

impl StrandResult {
    /// Classify an oracle token.
    pub fn from_token(token: &str) -> Result<Self, OracleError> {
        if token.starts_with(ERROR_PREFIX) {
            return Ok(Self::Error(token.to_string()));
        }
        Strand::from_token(token)
            .map(Self::Oriented)
            .ok_or_else(|| OracleError::UnrecognizedToken(token.to_string()))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    pub fn error_code(&self) -> Option<&str> {
        match self {
            Self::Error(code) => Some(code.as_str()),
            Self::Oriented(_) => None,
        }
    }

    /// Text for the output column. Error codes are never shortened.
    pub fn render(&self, short: bool) -> &str {
        match self {
            Self::Oriented(strand) if short => strand.short_label(),
            Self::Oriented(strand) => strand.label(),
            Self::Error(code) => code,
        }
    }
}

impl From<LocalError> for StrandResult {
    fn from(err: LocalError) -> Self {
        Self::Error(err.code().to_string())
    }
}

/// Failures of the oracle itself, as opposed to error codes it returns. Always fatal.
#[derive(Debug, Error)]
pub enum OracleError {
    /// The oracle's backing store could not answer.
    #[error("reference lookup failed: {0}")]
    Lookup(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("strand oracle returned unrecognized token '{0}'")]
    UnrecognizedToken(String),
}

/// Decides the strand of an allele pair at a locus.
pub trait StrandOracle {
    /// `chromosome` already carries any configured prefix; `position` is 1-based.
    fn resolve_strand(
        &self,
        chromosome: &str,
        position: u64,
        alleles: AlleleCall,
    ) -> Result<String, OracleError>;
}

impl<T: StrandOracle + ?Sized> StrandOracle for &T {
    fn resolve_strand(
        &self,
        chromosome: &str,
        position: u64,
        alleles: AlleleCall,
    ) -> Result<String, OracleError> {
        (**self).resolve_strand(chromosome, position, alleles)
    }
}

impl<T: StrandOracle + ?Sized> StrandOracle for Box<T> {
    fn resolve_strand(
        &self,
        chromosome: &str,
        position: u64,
        alleles: AlleleCall,
    ) -> Result<String, OracleError> {
        (**self).resolve_strand(chromosome, position, alleles)
    }
}

pub struct StrandResolutionClient<O> {
    oracle: O,
    chrom_prefix: String,
    chromosome: String,
}

impl<O> StrandResolutionClient<O>
where
    O: StrandOracle,
{
    pub fn new(oracle: O, chrom_prefix: impl Into<String>) -> Self {
        Self {
            oracle,
            chrom_prefix: chrom_prefix.into(),
            chromosome: String::new(),
        }
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Resolve one record. The oracle is only consulted when every field is usable.
    pub fn resolve(
        &mut self,
        chromosome: Option<&str>,
        position: Option<&str>,
        alleles: Result<AlleleCall, LocalError>,
    ) -> Result<StrandResult, OracleError> {
        let alleles = match alleles {
            Ok(alleles) => alleles,
            Err(err) => return Ok(err.into()),
        };
        let (Some(chromosome), Some(position)) = (chromosome, position) else {
            return Ok(LocalError::MissingColumn.into());
        };
        let position = match parse_position(position) {
            Some(position) => position,
            None => return Ok(LocalError::BadPosition.into()),
        };

        self.chromosome.clear();
        self.chromosome.push_str(&self.chrom_prefix);
        self.chromosome.push_str(chromosome);

        let token = self
            .oracle
            .resolve_strand(&self.chromosome, position, alleles)?;
        StrandResult::from_token(&token)
    }
}

fn parse_position(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok().filter(|&p| p > 0)
}
