//! Column addressing.
//!
//! Users select columns either by header name or by zero-based index. Both forms are held as a
//! [`ColumnId`] until the header (or, without a header, the first data record) is seen, at which
//! point they are resolved exactly once into a [`ColumnPlan`] of plain offsets.

use std::{
    collections::{HashMap, HashSet},
    convert::Infallible,
    fmt,
    str::FromStr,
};

use crate::config::ConfigError;

/// A column selector as written on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnId {
    Index(usize),
    Name(String),
}

impl ColumnId {
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    pub fn as_index(&self) -> Option<usize> {
        match self {
            Self::Index(index) => Some(*index),
            Self::Name(_) => None,
        }
    }
}

impl FromStr for ColumnId {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !s.is_empty()
            && s.bytes().all(|b| b.is_ascii_digit())
            && let Ok(index) = s.parse::<usize>()
        {
            return Ok(Self::Index(index));
        }
        Ok(Self::Name(s.to_string()))
    }
}

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "{index}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

/// Where the two alleles of a variant live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlleleColumns<T> {
    /// One column per allele.
    Split { a: T, b: T },
    /// Both alleles in one column, e.g. `AG` or `[A/G]`.
    Combined(T),
}

/// Logical role a column plays in a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Chromosome,
    Position,
    AlleleA,
    AlleleB,
    AlleleAB,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Chromosome => "chrom",
            Self::Position => "position",
            Self::AlleleA => "A",
            Self::AlleleB => "B",
            Self::AlleleAB => "AB",
        };
        f.write_str(name)
    }
}

/// Unresolved column selectors for every role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRoles {
    pub chromosome: ColumnId,
    pub position: ColumnId,
    pub alleles: AlleleColumns<ColumnId>,
}

impl Default for ColumnRoles {
    fn default() -> Self {
        Self {
            chromosome: ColumnId::name("chrom"),
            position: ColumnId::name("position"),
            alleles: AlleleColumns::Split {
                a: ColumnId::name("A"),
                b: ColumnId::name("B"),
            },
        }
    }
}

impl ColumnRoles {
    /// Every configured role with its selector.
    pub fn iter(&self) -> impl Iterator<Item = (Role, &ColumnId)> {
        let alleles: Vec<(Role, &ColumnId)> = match &self.alleles {
            AlleleColumns::Split { a, b } => vec![(Role::AlleleA, a), (Role::AlleleB, b)],
            AlleleColumns::Combined(ab) => vec![(Role::AlleleAB, ab)],
        };
        [
            (Role::Chromosome, &self.chromosome),
            (Role::Position, &self.position),
        ]
        .into_iter()
        .chain(alleles)
    }
}

/// Resolved, immutable column layout for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnPlan {
    chromosome: usize,
    position: usize,
    alleles: AlleleColumns<usize>,
    column_count: usize,
    insert_at: usize,
}

impl ColumnPlan {
    /// Resolve selectors against a header row.
    pub fn from_header(
        roles: &ColumnRoles,
        header: &[&str],
        insert_at: Option<usize>,
    ) -> Result<Self, ConfigError> {
        let index = HeaderIndex::new(header);
        Self::build(roles, header.len(), insert_at, |_, id| match id {
            ColumnId::Index(i) => Ok(*i),
            ColumnId::Name(name) => index.lookup(name),
        })
    }

    /// Resolve selectors that must all be indices. `column_count` comes from the first record.
    pub fn from_indices(
        roles: &ColumnRoles,
        column_count: usize,
        insert_at: Option<usize>,
    ) -> Result<Self, ConfigError> {
        Self::build(roles, column_count, insert_at, |role, id| match id {
            ColumnId::Index(i) => Ok(*i),
            ColumnId::Name(name) => Err(ConfigError::NamedColumnWithoutHeader {
                role,
                name: name.clone(),
            }),
        })
    }

    fn build<F>(
        roles: &ColumnRoles,
        column_count: usize,
        insert_at: Option<usize>,
        mut resolve: F,
    ) -> Result<Self, ConfigError>
    where
        F: FnMut(Role, &ColumnId) -> Result<usize, ConfigError>,
    {
        let mut resolve_in_range = |role: Role, id: &ColumnId| -> Result<usize, ConfigError> {
            let index = resolve(role, id)?;
            if index >= column_count {
                return Err(ConfigError::ColumnOutOfRange {
                    role,
                    index,
                    column_count,
                });
            }
            Ok(index)
        };

        let chromosome = resolve_in_range(Role::Chromosome, &roles.chromosome)?;
        let position = resolve_in_range(Role::Position, &roles.position)?;
        let alleles = match &roles.alleles {
            AlleleColumns::Split { a, b } => AlleleColumns::Split {
                a: resolve_in_range(Role::AlleleA, a)?,
                b: resolve_in_range(Role::AlleleB, b)?,
            },
            AlleleColumns::Combined(ab) => {
                AlleleColumns::Combined(resolve_in_range(Role::AlleleAB, ab)?)
            }
        };

        let insert_at = match insert_at {
            None => column_count,
            Some(index) if index <= column_count => index,
            Some(index) => {
                return Err(ConfigError::InsertionOutOfRange {
                    index,
                    column_count,
                });
            }
        };

        Ok(Self {
            chromosome,
            position,
            alleles,
            column_count,
            insert_at,
        })
    }

    pub fn chromosome(&self) -> usize {
        self.chromosome
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn alleles(&self) -> &AlleleColumns<usize> {
        &self.alleles
    }

    pub fn column_count(&self) -> usize {
        self.column_count
    }

    /// Every column a role reads from, in role order.
    pub fn role_indices(&self) -> impl Iterator<Item = usize> {
        let alleles = match self.alleles {
            AlleleColumns::Split { a, b } => [Some(a), Some(b)],
            AlleleColumns::Combined(ab) => [Some(ab), None],
        };
        [self.chromosome, self.position]
            .into_iter()
            .chain(alleles.into_iter().flatten())
    }

    pub fn insert_at(&self) -> usize {
        self.insert_at
    }
}

/// Name to offset map over a header row.
struct HeaderIndex<'a> {
    positions: HashMap<&'a str, usize>,
    duplicated: HashSet<&'a str>,
}

impl<'a> HeaderIndex<'a> {
    fn new(header: &[&'a str]) -> Self {
        let mut positions = HashMap::with_capacity(header.len());
        let mut duplicated = HashSet::new();
        for (index, &name) in header.iter().enumerate() {
            if positions.insert(name, index).is_some() {
                duplicated.insert(name);
            }
        }
        Self {
            positions,
            duplicated,
        }
    }

    fn lookup(&self, name: &str) -> Result<usize, ConfigError> {
        if self.duplicated.contains(name) {
            return Err(ConfigError::DuplicateColumn(name.to_string()));
        }
        self.positions
            .get(name)
            .copied()
            .ok_or_else(|| ConfigError::MissingColumn(name.to_string()))
    }
}
