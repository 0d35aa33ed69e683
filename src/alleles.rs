//! Allele extraction from a split record.

use std::fmt;

use crate::column::AlleleColumns;
use crate::strand::LocalError;

/// A nucleotide accepted as an allele.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Base {
    A,
    C,
    G,
    T,
}

impl Base {
    /// Uppercase `A`, `C`, `G` or `T` only.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'A' => Some(Self::A),
            'C' => Some(Self::C),
            'G' => Some(Self::G),
            'T' => Some(Self::T),
            _ => None,
        }
    }

    /// Case-insensitive, for reference sequence bytes.
    pub fn from_ascii(b: u8) -> Option<Self> {
        Self::from_char(char::from(b.to_ascii_uppercase()))
    }

    pub fn as_char(self) -> char {
        match self {
            Self::A => 'A',
            Self::C => 'C',
            Self::G => 'G',
            Self::T => 'T',
        }
    }

    pub fn complement(self) -> Self {
        match self {
            Self::A => Self::T,
            Self::T => Self::A,
            Self::C => Self::G,
            Self::G => Self::C,
        }
    }

    /// A or T.
    pub fn is_weak(self) -> bool {
        matches!(self, Self::A | Self::T)
    }
}

impl fmt::Display for Base {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// The two alleles of a biallelic site, in column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlleleCall {
    pub a: Base,
    pub b: Base,
}

impl AlleleCall {
    pub fn new(a: Base, b: Base) -> Self {
        Self { a, b }
    }

    pub fn contains(&self, base: Base) -> bool {
        self.a == base || self.b == base
    }
}

/// Pull the allele pair for one record according to the resolved columns.
///
/// Columns missing from a short record are treated like any other unusable value.
pub fn extract(fields: &[&str], columns: &AlleleColumns<usize>) -> Result<AlleleCall, LocalError> {
    match *columns {
        AlleleColumns::Split { a, b } => {
            let a = fields.get(a).and_then(|raw| single_base(raw));
            let b = fields.get(b).and_then(|raw| single_base(raw));
            match (a, b) {
                (Some(a), Some(b)) => Ok(AlleleCall::new(a, b)),
                _ => Err(LocalError::NotAcgt),
            }
        }
        AlleleColumns::Combined(ab) => fields
            .get(ab)
            .ok_or(LocalError::NotAcgt)
            .and_then(|raw| scan_combined(raw)),
    }
}

/// Collect every `A`/`C`/`G`/`T` in `raw` and require exactly two.
pub fn scan_combined(raw: &str) -> Result<AlleleCall, LocalError> {
    let mut bases = raw.chars().filter_map(Base::from_char);
    match (bases.next(), bases.next(), bases.next()) {
        (Some(a), Some(b), None) => Ok(AlleleCall::new(a, b)),
        _ => Err(LocalError::NotAcgt),
    }
}

fn single_base(raw: &str) -> Option<Base> {
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Base::from_char(c),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combined_scan_ignores_separators() {
        assert_eq!(
            scan_combined("[A/G]").unwrap(),
            AlleleCall::new(Base::A, Base::G)
        );
        assert_eq!(
            scan_combined("G A").unwrap(),
            AlleleCall::new(Base::G, Base::A)
        );
        assert_eq!(scan_combined("AG").unwrap(), AlleleCall::new(Base::A, Base::G));
    }

    #[test]
    fn combined_scan_requires_exactly_two() {
        assert_eq!(scan_combined(""), Err(LocalError::NotAcgt));
        assert_eq!(scan_combined("A"), Err(LocalError::NotAcgt));
        assert_eq!(scan_combined("AGT"), Err(LocalError::NotAcgt));
        assert_eq!(scan_combined("ag"), Err(LocalError::NotAcgt));
    }

    #[test]
    fn split_columns_must_be_single_bases() {
        let columns = AlleleColumns::Split { a: 0, b: 1 };
        assert_eq!(
            extract(&["C", "T"], &columns).unwrap(),
            AlleleCall::new(Base::C, Base::T)
        );
        assert_eq!(extract(&["X", "T"], &columns), Err(LocalError::NotAcgt));
        assert_eq!(extract(&["CT", "T"], &columns), Err(LocalError::NotAcgt));
        assert_eq!(extract(&["c", "T"], &columns), Err(LocalError::NotAcgt));
        assert_eq!(extract(&["C"], &columns), Err(LocalError::NotAcgt));
    }

    #[test]
    fn identical_alleles_pass_through() {
        let columns = AlleleColumns::Combined(0);
        assert_eq!(
            extract(&["AA"], &columns).unwrap(),
            AlleleCall::new(Base::A, Base::A)
        );
    }

    #[test]
    fn complement_pairs() {
        assert_eq!(Base::A.complement(), Base::T);
        assert_eq!(Base::G.complement(), Base::C);
        assert!(Base::T.is_weak());
        assert!(!Base::C.is_weak());
        assert_eq!(Base::from_ascii(b'g'), Some(Base::G));
        assert_eq!(Base::from_ascii(b'N'), None);
    }
}
