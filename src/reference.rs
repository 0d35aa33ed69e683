use std::{
    collections::HashMap,
    fs, io,
    num::NonZeroUsize,
    path::{Path, PathBuf},
    sync::Arc,
};

use lru::LruCache;
use noodles::{
    core::{Position, Region},
    fasta::{self, fai},
};
use parking_lot::Mutex;
use std::str::Utf8Error;
use thiserror::Error;

const BASE_CACHE_CAPACITY: usize = 64 * 1024;

#[derive(Debug, Clone)]
pub struct ReferenceContig {
    pub name: String,
    pub length: u64,
}

/// Indexed FASTA with chromosome aliasing (`chr1` == `1`, `M` == `MT`).
pub struct ReferenceGenome {
    path: PathBuf,
    reader: Arc<Mutex<fasta::io::IndexedReader<fasta::io::BufReader<fs::File>>>>,
    contigs: Arc<Vec<ReferenceContig>>,
    alias_to_index: Arc<HashMap<String, usize>>,
    cache: Arc<Mutex<LruCache<(usize, u64), u8>>>,
}

impl Clone for ReferenceGenome {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            reader: Arc::clone(&self.reader),
            contigs: Arc::clone(&self.contigs),
            alias_to_index: Arc::clone(&self.alias_to_index),
            cache: Arc::clone(&self.cache),
        }
    }
}

#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid UTF-8 contig name: {0}")]
    InvalidContigName(#[from] Utf8Error),
    #[error("unknown contig: {query}")]
    UnknownContig { query: String },
    #[error("region {start}-{end} is outside contig {contig} length {length}")]
    OutOfBounds {
        contig: String,
        start: u64,
        end: u64,
        length: u64,
    },
    #[error("invalid genomic position: {0}")]
    InvalidPosition(#[from] noodles::core::position::TryFromIntError),
}

impl ReferenceGenome {
    /// Open `path`, reading the `.fai` next to it (or `fai_path`), building it when absent.
    pub fn open<P: AsRef<Path>>(
        path: P,
        fai_path: Option<PathBuf>,
    ) -> Result<Self, ReferenceError> {
        let path = path.as_ref();
        let canonical = fs::canonicalize(path)?;

        let index_path = fai_path.unwrap_or_else(|| default_index_path(&canonical));
        let index = if index_path.exists() {
            fai::fs::read(&index_path)?
        } else {
            tracing::info!(path = %index_path.display(), "building FASTA index");
            let index = fasta::fs::index(&canonical)?;
            fai::fs::write(&index_path, &index)?;
            index
        };

        let reader = fasta::io::indexed_reader::Builder::default()
            .set_index(index.clone())
            .build_from_path(&canonical)?;

        let contigs = index
            .as_ref()
            .iter()
            .map(|record| -> Result<ReferenceContig, ReferenceError> {
                let name = std::str::from_utf8(record.name().as_ref())?.to_string();
                Ok(ReferenceContig {
                    name,
                    length: record.length(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let alias_to_index = build_alias_map(&contigs);

        let cache_capacity =
            NonZeroUsize::new(BASE_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN);

        Ok(Self {
            path: canonical,
            reader: Arc::new(Mutex::new(reader)),
            contigs: Arc::new(contigs),
            alias_to_index: Arc::new(alias_to_index),
            cache: Arc::new(Mutex::new(LruCache::new(cache_capacity))),
        })
    }

    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    pub fn contigs(&self) -> &[ReferenceContig] {
        self.contigs.as_slice()
    }

    pub fn resolve_contig_name(&self, query: &str) -> Option<&str> {
        self.contig(query).map(|contig| contig.name.as_str())
    }

    pub fn contig(&self, query: &str) -> Option<&ReferenceContig> {
        self.contig_index(query).map(|idx| &self.contigs[idx])
    }

    fn contig_index(&self, query: &str) -> Option<usize> {
        self.alias_to_index.get(&canonical_key(query)).copied()
    }

    /// Uppercased base at a 1-based position.
    pub fn base(&self, query: &str, position: u64) -> Result<char, ReferenceError> {
        let idx = self
            .contig_index(query)
            .ok_or_else(|| ReferenceError::UnknownContig {
                query: query.to_string(),
            })?;

        if let Some(base) = self.cache.lock().get(&(idx, position)).copied() {
            return Ok(char::from(base));
        }

        let base = self
            .sequence(query, position, position)?
            .first()
            .copied()
            .unwrap_or(b'N');
        self.cache.lock().put((idx, position), base);
        Ok(char::from(base))
    }

    /// Uppercased bases for the inclusive 1-based range `start..=end`.
    pub fn sequence(&self, query: &str, start: u64, end: u64) -> Result<Vec<u8>, ReferenceError> {
        let contig = self
            .contig(query)
            .ok_or_else(|| ReferenceError::UnknownContig {
                query: query.to_string(),
            })?;

        if start == 0 || start > end || end > contig.length {
            return Err(ReferenceError::OutOfBounds {
                contig: contig.name.clone(),
                start,
                end,
                length: contig.length,
            });
        }

        let start = Position::try_from(to_usize(start, contig)?)?;
        let end = Position::try_from(to_usize(end, contig)?)?;
        let region = Region::new(contig.name.clone(), start..=end);
        let record = self.reader.lock().query(&region)?;
        let mut seq = record.sequence().as_ref().to_vec();
        seq.make_ascii_uppercase();
        Ok(seq)
    }
}

fn to_usize(position: u64, contig: &ReferenceContig) -> Result<usize, ReferenceError> {
    usize::try_from(position).map_err(|_| ReferenceError::OutOfBounds {
        contig: contig.name.clone(),
        start: position,
        end: position,
        length: contig.length,
    })
}

fn default_index_path(path: &Path) -> PathBuf {
    let mut s = path.as_os_str().to_os_string();
    s.push(".fai");
    PathBuf::from(s)
}

fn canonical_key(raw: &str) -> String {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix("chr").unwrap_or(trimmed);
    let upper = trimmed.to_ascii_uppercase();
    match upper.as_str() {
        "M" => "MT".to_string(),
        _ => upper,
    }
}

fn build_alias_map(contigs: &[ReferenceContig]) -> HashMap<String, usize> {
    let mut map = HashMap::new();
    for (idx, contig) in contigs.iter().enumerate() {
        let name = contig.name.as_str();
        map.entry(canonical_key(name)).or_insert(idx);
        map.entry(name.to_ascii_uppercase()).or_insert(idx);
        if name.eq_ignore_ascii_case("chrM") || name.eq_ignore_ascii_case("MT") {
            map.entry("MT".into()).or_insert(idx);
        }
    }
    map
}
