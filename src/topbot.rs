//! Reference-backed strand oracle using Illumina's TOP/BOT designation.
//!
//! Unambiguous SNPs are designated from the alleles alone: `A/C` and `A/G` are TOP,
//! `T/C` and `T/G` are BOT. Ambiguous SNPs (`A/T`, `C/G`) are designated by walking
//! outwards from the variant on the forward reference strand, comparing the bases `n`
//! positions 5' and 3' of it. The first pair made of one `A`/`T` and one `C`/`G` decides:
//! `A`/`T` on the 5' side means TOP, `C`/`G` on the 5' side means BOT.

use crate::{
    alleles::{AlleleCall, Base},
    reference::{ReferenceError, ReferenceGenome},
    strand::{OracleError, Strand, StrandOracle},
};

pub const IDENTICAL_ALLELES: &str = "ERROR_identical_alleles";
pub const UNKNOWN_CHROMOSOME: &str = "ERROR_unknown_chromosome";
pub const POSITION_OUT_OF_RANGE: &str = "ERROR_position_out_of_range";
pub const REF_MISMATCH: &str = "ERROR_ref_mismatch";
pub const NO_INFORMATIVE_FLANK: &str = "ERROR_no_informative_flank";

const INITIAL_FLANK: u64 = 64;
const MAX_FLANK: u64 = 4096;

/// How an allele pair relates to strand designation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairClass {
    Identical,
    Unambiguous(Strand),
    /// `A/T` or `C/G`: both strands carry the same pair.
    Ambiguous,
}

pub fn classify(alleles: AlleleCall) -> PairClass {
    let AlleleCall { a, b } = alleles;
    if a == b {
        PairClass::Identical
    } else if a == b.complement() {
        PairClass::Ambiguous
    } else if alleles.contains(Base::A) {
        PairClass::Unambiguous(Strand::Top)
    } else {
        // Remaining pairs hold T with C or G.
        PairClass::Unambiguous(Strand::Bot)
    }
}

/// Walk flanking pairs around `offset` in `seq`. `None` when no pair is informative.
pub fn walk_flanks(seq: &[u8], offset: usize) -> Option<Strand> {
    let reach = offset.min(seq.len().saturating_sub(offset + 1));
    (1..=reach).find_map(|n| {
        let five = Base::from_ascii(seq[offset - n])?;
        let three = Base::from_ascii(seq[offset + n])?;
        match (five.is_weak(), three.is_weak()) {
            (true, false) => Some(Strand::Top),
            (false, true) => Some(Strand::Bot),
            _ => None,
        }
    })
}

pub struct ReferenceOracle {
    genome: ReferenceGenome,
}

impl ReferenceOracle {
    pub fn new(genome: ReferenceGenome) -> Self {
        Self { genome }
    }

    fn designate_ambiguous(
        &self,
        chromosome: &str,
        position: u64,
        length: u64,
    ) -> Result<Option<Strand>, OracleError> {
        let mut flank = INITIAL_FLANK;
        loop {
            let start = position.saturating_sub(flank).max(1);
            let end = position.saturating_add(flank).min(length);
            let seq = self.genome.sequence(chromosome, start, end)?;
            let offset = usize::try_from(position - start).unwrap_or(usize::MAX);
            if offset < seq.len()
                && let Some(strand) = walk_flanks(&seq, offset)
            {
                return Ok(Some(strand));
            }

            let at_contig_edge = start == 1 || end == length;
            if at_contig_edge || flank >= MAX_FLANK {
                return Ok(None);
            }
            flank *= 2;
        }
    }
}

impl From<ReferenceError> for OracleError {
    fn from(err: ReferenceError) -> Self {
        Self::Lookup(Box::new(err))
    }
}

impl StrandOracle for ReferenceOracle {
    fn resolve_strand(
        &self,
        chromosome: &str,
        position: u64,
        alleles: AlleleCall,
    ) -> Result<String, OracleError> {
        let class = classify(alleles);
        if class == PairClass::Identical {
            return Ok(IDENTICAL_ALLELES.to_string());
        }

        let Some(length) = self.genome.contig(chromosome).map(|contig| contig.length) else {
            return Ok(UNKNOWN_CHROMOSOME.to_string());
        };
        if position == 0 || position > length {
            return Ok(POSITION_OUT_OF_RANGE.to_string());
        }

        let reference = self.genome.base(chromosome, position)?;
        if let Some(reference) = Base::from_char(reference)
            && !alleles.contains(reference)
            && !alleles.contains(reference.complement())
        {
            return Ok(REF_MISMATCH.to_string());
        }

        let strand = match class {
            PairClass::Unambiguous(strand) => Some(strand),
            PairClass::Ambiguous => self.designate_ambiguous(chromosome, position, length)?,
            PairClass::Identical => None,
        };
        tracing::trace!(chromosome, position, ?strand, "designated strand");

        Ok(match strand {
            Some(strand) => strand.label().to_string(),
            None => NO_INFORMATIVE_FLANK.to_string(),
        })
    }
}
